use crate::progress::{Clock, Sampler, SystemClock};
use crate::sink::{ProgressSink, Sink};
use bytes::Bytes;
use futures::{ready, Stream};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Body stream reporting progress while it is consumed
///
/// Chunks, errors and the end of the stream are passed through untouched.
pub struct ProgressStream<S, C = SystemClock> {
    inner: S,
    meter: Option<(Sampler<C>, ProgressSink)>,
}

impl<S> ProgressStream<S, SystemClock> {
    pub fn new(inner: S, total: Option<u64>, sink: ProgressSink, interval: Duration) -> Self {
        Self::with_clock(inner, total, sink, interval, SystemClock)
    }
}

impl<S, C: Clock> ProgressStream<S, C> {
    pub fn with_clock(
        inner: S,
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

    /// Wrap `inner` without any progress reporting
    pub fn passthrough(inner: S) -> Self {
        Self { inner, meter: None }
    }

    /// Bytes delivered so far, `None` when progress is disabled
    pub fn completed(&self) -> Option<u64> {
        self.meter.as_ref().map(|(sampler, _)| sampler.completed())
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, C> Stream for ProgressStream<S, C>
where
    S: Stream<Item = io::Result<Bytes>> + Unpin,
    C: Clock + Unpin,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));
        if let (Some(Ok(chunk)), Some((sampler, sink))) = (&item, &mut this.meter) {
            if !chunk.is_empty() {
                if let Some(sample) = sampler.record(chunk.len()) {
                    sink.send(sample);
                }
            }
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
