//! Write-only destinations for log lines and progress samples
//!
//! Delivery is best-effort: a sink never blocks the caller. Bounded channels
//! drop the event when they are full, closed receivers are ignored.
use crate::progress::ProgressSample;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::{info, trace};

/// Destination accepting events of type `T`
pub trait Sink<T>: Send + Sync {
    /// Hand the event over without blocking
    fn send(&self, item: T);
}

/// Shared log destination
pub type LogSink = Arc<dyn Sink<String>>;
/// Shared progress destination
pub type ProgressSink = Arc<dyn Sink<ProgressSample>>;

/// Adapter turning a closure into a [`Sink`]
///
/// ```
/// use manic_fetch::{FnSink, Sink};
/// let sink = FnSink(|line: String| println!("{}", line));
/// sink.send("hello".to_string());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnSink<F>(pub F);

impl<T, F> Sink<T> for FnSink<F>
where
    F: Fn(T) + Send + Sync,
{
    fn send(&self, item: T) {
        (self.0)(item)
    }
}

impl<T, S> Sink<T> for Arc<S>
where
    S: Sink<T> + ?Sized,
{
    fn send(&self, item: T) {
        (**self).send(item)
    }
}

/// Forwards log lines to [`tracing`] at the info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl Sink<String> for TracingLog {
    fn send(&self, item: String) {
        info!(target: "manic_fetch::log", "{}", item);
    }
}

impl<T: Send> Sink<T> for mpsc::Sender<T> {
    fn send(&self, item: T) {
        let _ = mpsc::Sender::send(self, item);
    }
}

impl<T: Send> Sink<T> for mpsc::SyncSender<T> {
    fn send(&self, item: T) {
        if let Err(mpsc::TrySendError::Full(_)) = self.try_send(item) {
            trace!("Sink full, event dropped");
        }
    }
}

#[cfg(feature = "async")]
impl<T: Send> Sink<T> for tokio::sync::mpsc::Sender<T> {
    fn send(&self, item: T) {
        if let Err(tokio::sync::mpsc::error::TrySendError::Full(_)) = self.try_send(item) {
            trace!("Sink full, event dropped");
        }
    }
}

#[cfg(feature = "async")]
impl<T: Send> Sink<T> for tokio::sync::mpsc::UnboundedSender<T> {
    fn send(&self, item: T) {
        let _ = tokio::sync::mpsc::UnboundedSender::send(self, item);
    }
}

#[cfg(feature = "progress")]
impl Sink<ProgressSample> for indicatif::ProgressBar {
    fn send(&self, item: ProgressSample) {
        if let Some(total) = item.total {
            self.set_length(total);
        }
        self.set_position(item.completed);
    }
}
