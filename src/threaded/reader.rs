use crate::progress::{Clock, Sampler, SystemClock};
use crate::sink::{ProgressSink, Sink};
use std::io::{self, Read};
use std::time::Duration;

/// Blocking body reader reporting progress while it is consumed
pub struct ProgressReader<R, C = SystemClock> {
    inner: R,
    meter: Option<(Sampler<C>, ProgressSink)>,
}

impl<R> ProgressReader<R, SystemClock> {
    pub fn new(inner: R, total: Option<u64>, sink: ProgressSink, interval: Duration) -> Self {
        Self::with_clock(inner, total, sink, interval, SystemClock)
    }
}

impl<R, C: Clock> ProgressReader<R, C> {
    pub fn with_clock(
        inner: R,
        total: Option<u64>,
        sink: ProgressSink,
        interval: Duration,
        clock: C,
    ) -> Self {
        Self {
            inner,
            meter: Some((Sampler::with_clock(total, interval, clock), sink)),
        }
    }

    pub fn passthrough(inner: R) -> Self {
        Self { inner, meter: None }
    }

    /// Bytes delivered so far, `None` when progress is disabled
    pub fn completed(&self) -> Option<u64> {
        self.meter.as_ref().map(|(sampler, _)| sampler.completed())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read, C: Clock> Read for ProgressReader<R, C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            if let Some((sampler, sink)) = &mut self.meter {
                if let Some(sample) = sampler.record(n) {
                    sink.send(sample);
                }
            }
        }
        Ok(n)
    }
}
