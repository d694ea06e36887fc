//! Download progress: samples, the stream sampler and the push based rate meter
mod clock;
mod meter;
mod sampler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use meter::{RateMeter, SAMPLE_CADENCE};
pub use sampler::Sampler;

use std::fmt;
use std::time::Duration;

/// Point-in-time snapshot of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSample {
    /// Expected size in bytes, `None` when the server didn't announce it
    pub total: Option<u64>,
    /// Bytes completed so far
    pub completed: u64,
    /// Bytes per second over the last sampling window
    pub speed: u64,
    /// Time since the transfer started
    pub elapsed: Duration,
    /// Estimated time left, `None` when it can't be estimated
    pub remaining: Option<Duration>,
}

impl ProgressSample {
    /// Completion in percent, `None` when the total is unknown
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.completed as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

fn human_bytes(n: u64) -> String {
    let n = n as f64;
    if n > GB {
        format!("{:.2}GB", n / GB)
    } else if n > MB {
        format!("{:.2}MB", n / MB)
    } else if n > KB {
        format!("{:.2}KB", n / KB)
    } else {
        format!("{:.2}B", n)
    }
}

impl fmt::Display for ProgressSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(p) => write!(f, "progress: {:.2}%", p)?,
            None => write!(f, "progress: -")?,
        }
        match self.total {
            Some(total) => write!(f, "  total: {}", human_bytes(total))?,
            None => write!(f, "  total: -")?,
        }
        write!(
            f,
            "  speed: {}/s  elapsed: {:?}  remain: ",
            human_bytes(self.speed),
            self.elapsed
        )?;
        match self.remaining {
            Some(remaining) => write!(f, "{:?}", remaining),
            None => write!(f, "-"),
        }
    }
}
