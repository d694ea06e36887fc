use super::{BoxRead, Transport};
use crate::retry::{Failure, RetryState};
use crate::status::Verdict;
use crate::{RequestSpec, Response, Result, TransportError};
use tracing::{debug, instrument};

/// Blocking twin of the async executor, retry pauses block the calling thread
#[instrument(skip(transport, spec), fields(URL = %spec.url(), method = %spec.method()))]
pub(crate) fn execute(transport: &dyn Transport, spec: &RequestSpec) -> Result<Response<BoxRead>> {
    let request = spec.prepare();
    let mut state = RetryState::new(spec);
    loop {
        let attempt = state.begin();
        let failure = match transport.send(&request) {
            Ok(response) => match spec.status().classify(response.status()) {
                Verdict::Accept => {
                    debug!(attempt, status = %response.status(), "Response accepted");
                    return Ok(response);
                }
                Verdict::NotFound => return Err(state.not_found()),
                Verdict::Retry => Failure::Status(response.status()),
            },
            Err(TransportError::Build(e)) => return Err(state.fatal(e)),
            Err(TransportError::Network(e)) => Failure::Transport(e),
        };
        let wait = state.fail(failure)?;
        std::thread::sleep(wait);
    }
}
