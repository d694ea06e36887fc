use super::{Clock, ProgressSample, SystemClock};
use std::time::{Duration, Instant};

/// Throughput bookkeeping for a body consumed one read at a time
///
/// Feed every read to [`Sampler::record`]; it hands back a sample at most once
/// per call, and only when at least `interval` passed since the previous one,
/// at least one whole second elapsed and the measured speed is non-zero.
/// Bytes of skipped rounds carry over to the next window.
#[derive(Debug)]
pub struct Sampler<C = SystemClock> {
    clock: C,
    total: Option<u64>,
    interval: Duration,
    completed: u64,
    window_bytes: u64,
    started_at: Instant,
    last_sample_at: Instant,
}

impl Sampler<SystemClock> {
    pub fn new(total: Option<u64>, interval: Duration) -> Self {
        Self::with_clock(total, interval, SystemClock)
    }
}

impl<C: Clock> Sampler<C> {
    pub fn with_clock(total: Option<u64>, interval: Duration, clock: C) -> Self {
        let now = clock.now();
        Self {
            clock,
            total,
            interval,
            completed: 0,
            window_bytes: 0,
            started_at: now,
            last_sample_at: now,
        }
    }

    /// Bytes seen since the sampler was created
    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn record(&mut self, read: usize) -> Option<ProgressSample> {
        self.completed += read as u64;
        self.window_bytes += read as u64;

        let now = self.clock.now();
        let window = now.saturating_duration_since(self.last_sample_at);
        if window < self.interval {
            return None;
        }
        let seconds = window.as_secs();
        if seconds == 0 {
            return None;
        }
        let speed = self.window_bytes / seconds;
        if speed == 0 {
            return None;
        }
        let remaining = self
            .total
            .map(|total| Duration::from_secs(total.saturating_sub(self.completed) / speed));

        self.last_sample_at = now;
        self.window_bytes = 0;
        Some(ProgressSample {
            total: self.total,
            completed: self.completed,
            speed,
            elapsed: now.saturating_duration_since(self.started_at),
            remaining,
        })
    }
}
