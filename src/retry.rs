use crate::error::BoxError;
use crate::sink::Sink;
use crate::{FetchError, RequestSpec};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, warn};

/// How many times a request is repeated and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Extra attempts after the first one
    pub count: u32,
    /// Fixed pause between two attempts
    pub interval: Duration,
}

impl Retry {
    pub fn new(count: u32, interval: Duration) -> Self {
        Self { count, interval }
    }
    /// Upper bound of transport calls for one request
    pub fn max_attempts(&self) -> u32 {
        self.count.saturating_add(1)
    }
}

/// Why a single attempt didn't produce an accepted response
#[derive(Debug)]
pub(crate) enum Failure {
    Transport(BoxError),
    Status(StatusCode),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Transport(e) => write!(f, "{}", e),
            Failure::Status(status) => write!(f, "response status code {}", status.as_u16()),
        }
    }
}

/// Attempt bookkeeping for one call, dropped when the call ends
pub(crate) struct RetryState<'a> {
    spec: &'a RequestSpec,
    attempts: u32,
}

impl<'a> RetryState<'a> {
    pub(crate) fn new(spec: &'a RequestSpec) -> Self {
        Self { spec, attempts: 0 }
    }

    pub(crate) fn begin(&mut self) -> u32 {
        self.attempts += 1;
        debug!(attempt = self.attempts, "Sending request");
        self.attempts
    }

    fn log(&self, line: String) {
        if let Some(sink) = self.spec.log_sink() {
            sink.send(line);
        }
    }

    /// Record a failed attempt
    ///
    /// Returns the pause before the next attempt, or the error that ends the
    /// call once every attempt is used up.
    pub(crate) fn fail(&mut self, failure: Failure) -> Result<Duration, FetchError> {
        let retry = self.spec.retry();
        let url = self.spec.url();
        if self.attempts < retry.max_attempts() {
            let remain = retry.max_attempts() - self.attempts;
            warn!(reason = %failure, attempt = self.attempts, remain, "Request failed, retrying");
            self.log(format!(
                "request to {} failed due to {}, retry in {:?} (remain {} times)",
                url, failure, retry.interval, remain
            ));
            return Ok(retry.interval);
        }
        error!(reason = %failure, attempts = self.attempts, "Request failed, giving up");
        self.log(format!(
            "request to {} failed due to {}, tried {} times",
            url, failure, self.attempts
        ));
        Err(match failure {
            Failure::Transport(source) => FetchError::Transport {
                attempts: self.attempts,
                source,
            },
            Failure::Status(status) => FetchError::InvalidStatusCode {
                status,
                attempts: self.attempts,
            },
        })
    }

    /// The transport refused to build the request
    pub(crate) fn fatal(&self, source: BoxError) -> FetchError {
        error!(reason = %source, "Request could not be built");
        self.log(format!(
            "init request to {} failed due to {}",
            self.spec.url(),
            source
        ));
        FetchError::Build(source)
    }

    pub(crate) fn not_found(&self) -> FetchError {
        debug!(attempt = self.attempts, "Resource not found, not retrying");
        FetchError::NotFound {
            url: self.spec.url().clone(),
            attempts: self.attempts,
        }
    }
}
