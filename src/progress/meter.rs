use super::{Clock, ProgressSample, SystemClock};
use crate::{FetchError, Result};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// How often a started meter recomputes its speed
pub const SAMPLE_CADENCE: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Counters {
    total: u64,
    completed: u64,
    last_completed: u64,
    speed: u64,
    stopped: bool,
}

struct Shared {
    counters: RwLock<Counters>,
    cadence: Duration,
    clock: Arc<dyn Clock>,
    started_at: Instant,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, Counters> {
        self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }
    fn write(&self) -> RwLockWriteGuard<'_, Counters> {
        self.counters.write().unwrap_or_else(PoisonError::into_inner)
    }
    fn tick(&self) {
        let mut counters = self.write();
        if counters.stopped {
            return;
        }
        let delta = counters.completed - counters.last_completed;
        counters.speed = (delta as f64 / self.cadence.as_secs_f64()) as u64;
        counters.last_completed = counters.completed;
        trace!(speed = counters.speed, completed = counters.completed, "Rate meter tick");
    }
}

enum Ticker {
    #[cfg(feature = "async")]
    Task(tokio::task::JoinHandle<()>),
    #[cfg(feature = "threaded")]
    Thread(std::sync::mpsc::Sender<()>),
}

/// Push based progress tracking for transfers that report their own work
///
/// A background timer recomputes the speed once per cadence from the bytes
/// reported through [`RateMeter::add_completed`]. Snapshots take a shared read
/// lock, so any number of observers can poll while one writer reports.
///
/// ```no_run
/// use manic_fetch::progress::RateMeter;
/// # #[tokio::main]
/// # async fn main() -> manic_fetch::Result<()> {
/// let meter = RateMeter::start(10_000)?;
/// meter.add_completed(2_500);
/// println!("{}", meter.snapshot());
/// meter.stop();
/// # Ok(())
/// # }
/// ```
pub struct RateMeter {
    shared: Arc<Shared>,
    ticker: Mutex<Option<Ticker>>,
}

impl RateMeter {
    fn idle(total: u64, cadence: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        if cadence.is_zero() {
            return Err(FetchError::InvalidInterval(cadence));
        }
        let started_at = clock.now();
        Ok(Self {
            shared: Arc::new(Shared {
                counters: RwLock::new(Counters {
                    total,
                    completed: 0,
                    last_completed: 0,
                    speed: 0,
                    stopped: false,
                }),
                cadence,
                clock,
                started_at,
            }),
            ticker: Mutex::new(None),
        })
    }

    /// Start a meter on the current Tokio runtime with the default cadence
    #[cfg(feature = "async")]
    pub fn start(total: u64) -> Result<Self> {
        Self::spawn(total, SAMPLE_CADENCE, Arc::new(SystemClock))
    }

    /// Start a meter on the current Tokio runtime
    ///
    /// # Arguments
    /// * `total` - size of the whole transfer in bytes
    /// * `cadence` - how often the speed is recomputed, must not be zero
    /// * `clock` - source of the elapsed time reported by snapshots
    #[cfg(feature = "async")]
    pub fn spawn(total: u64, cadence: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| FetchError::NoRuntime)?;
        let meter = Self::idle(total, cadence, clock)?;
        let shared = meter.shared.clone();
        let task = handle.spawn(async move {
            let first = tokio::time::Instant::now() + cadence;
            let mut interval = tokio::time::interval_at(first, cadence);
            loop {
                interval.tick().await;
                shared.tick();
            }
        });
        meter.set_ticker(Ticker::Task(task));
        debug!(total, ?cadence, "Rate meter started");
        Ok(meter)
    }

    /// Start a meter driven by its own thread with the default cadence
    #[cfg(feature = "threaded")]
    pub fn start_threaded(total: u64) -> Result<Self> {
        Self::spawn_threaded(total, SAMPLE_CADENCE, Arc::new(SystemClock))
    }

    /// Start a meter driven by its own thread
    #[cfg(feature = "threaded")]
    pub fn spawn_threaded(total: u64, cadence: Duration, clock: Arc<dyn Clock>) -> Result<Self> {
        use std::sync::mpsc::{self, RecvTimeoutError};

        let meter = Self::idle(total, cadence, clock)?;
        let shared = meter.shared.clone();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        std::thread::Builder::new()
            .name("manic-rate-meter".to_string())
            .spawn(move || {
                let mut next = Instant::now() + cadence;
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match stop_rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {
                            shared.tick();
                            next += cadence;
                        }
                        _ => break,
                    }
                }
            })
            .map_err(FetchError::Spawn)?;
        meter.set_ticker(Ticker::Thread(stop_tx));
        debug!(total, ?cadence, "Rate meter thread started");
        Ok(meter)
    }

    #[allow(dead_code)]
    fn set_ticker(&self, ticker: Ticker) {
        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(ticker);
    }

    /// Report `n` more bytes as done, the total is never exceeded
    pub fn add_completed(&self, n: u64) {
        if n == 0 {
            return;
        }
        let mut counters = self.shared.write();
        counters.completed = counters.completed.saturating_add(n).min(counters.total);
    }

    pub fn snapshot(&self) -> ProgressSample {
        let counters = self.shared.read();
        let remaining = if counters.speed > 0 {
            Some(Duration::from_secs(
                (counters.total - counters.completed) / counters.speed,
            ))
        } else {
            None
        };
        ProgressSample {
            total: Some(counters.total),
            completed: counters.completed,
            speed: counters.speed,
            elapsed: self
                .shared
                .clock
                .now()
                .saturating_duration_since(self.shared.started_at),
            remaining,
        }
    }

    /// Halt the background timer, the last computed speed stays frozen
    pub fn stop(&self) {
        self.shared.write().stopped = true;
        let ticker = self
            .ticker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(ticker) = ticker {
            match ticker {
                #[cfg(feature = "async")]
                Ticker::Task(task) => task.abort(),
                #[cfg(feature = "threaded")]
                Ticker::Thread(stop_tx) => drop(stop_tx),
            }
            debug!("Rate meter stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.read().stopped
    }
}

impl Drop for RateMeter {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ManualClock;

    fn idle(total: u64) -> RateMeter {
        RateMeter::idle(total, SAMPLE_CADENCE, Arc::new(SystemClock)).unwrap()
    }

    #[test]
    fn completed_is_clamped_to_total() {
        let meter = idle(1000);
        meter.add_completed(2000);
        assert_eq!(meter.snapshot().completed, 1000);
        meter.add_completed(u64::MAX);
        assert_eq!(meter.snapshot().completed, 1000);
    }

    #[test]
    fn zero_work_is_ignored() {
        let meter = idle(1000);
        meter.add_completed(0);
        meter.shared.tick();
        let snap = meter.snapshot();
        assert_eq!(snap.completed, 0);
        assert_eq!(snap.speed, 0);
        assert_eq!(snap.remaining, None);
    }

    #[test]
    fn tick_computes_speed_and_remaining() {
        let meter = idle(1000);
        meter.add_completed(250);
        meter.add_completed(250);
        meter.shared.tick();
        let snap = meter.snapshot();
        assert_eq!(snap.speed, 500);
        assert_eq!(snap.remaining, Some(Duration::from_secs(1)));
        meter.shared.tick();
        let snap = meter.snapshot();
        assert_eq!(snap.speed, 0);
        assert_eq!(snap.remaining, None);
    }

    #[test]
    fn sub_second_cadence_scales_speed() {
        let meter =
            RateMeter::idle(10_000, Duration::from_millis(250), Arc::new(SystemClock)).unwrap();
        meter.add_completed(100);
        meter.shared.tick();
        assert_eq!(meter.snapshot().speed, 400);
    }

    #[test]
    fn stop_freezes_speed() {
        let meter = idle(10_000);
        meter.add_completed(300);
        meter.shared.tick();
        meter.stop();
        meter.stop();
        assert!(meter.is_stopped());
        meter.add_completed(600);
        meter.shared.tick();
        let snap = meter.snapshot();
        assert_eq!(snap.speed, 300);
        assert_eq!(snap.completed, 900);
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let res = RateMeter::idle(10, Duration::ZERO, Arc::new(SystemClock));
        assert!(matches!(res, Err(FetchError::InvalidInterval(_))));
    }

    #[test]
    fn elapsed_follows_the_clock() {
        let clock = ManualClock::new();
        let meter = RateMeter::idle(10, SAMPLE_CADENCE, Arc::new(clock.clone())).unwrap();
        clock.advance(Duration::from_secs(7));
        assert_eq!(meter.snapshot().elapsed, Duration::from_secs(7));
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let meter = Arc::new(idle(40_000));
        let handles = (0..4)
            .map(|_| {
                let m = meter.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.add_completed(10);
                        let snap = m.snapshot();
                        assert!(snap.completed <= 40_000);
                    }
                })
            })
            .collect::<Vec<_>>();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(meter.snapshot().completed, 40_000);
    }

    #[cfg(feature = "async")]
    #[test]
    fn start_requires_runtime() {
        assert!(matches!(RateMeter::start(10), Err(FetchError::NoRuntime)));
    }

    #[cfg(feature = "async")]
    #[tokio::test(start_paused = true)]
    async fn timer_task_samples_each_cadence() {
        let meter = RateMeter::start(100_000).unwrap();
        meter.add_completed(2000);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(meter.snapshot().speed, 2000);

        meter.add_completed(1000);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(meter.snapshot().speed, 1000);

        meter.stop();
        meter.add_completed(5000);
        tokio::time::sleep(Duration::from_secs(2)).await;
        let snap = meter.snapshot();
        assert_eq!(snap.speed, 1000);
        assert_eq!(snap.completed, 8000);
    }

    #[cfg(feature = "threaded")]
    #[test]
    fn timer_thread_ticks_until_stopped() {
        let meter =
            RateMeter::spawn_threaded(10_000, Duration::from_millis(20), Arc::new(SystemClock))
                .unwrap();
        meter.add_completed(1000);
        std::thread::sleep(Duration::from_millis(150));
        assert_eq!(meter.shared.read().last_completed, 1000);

        meter.stop();
        meter.add_completed(10);
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(meter.shared.read().last_completed, 1000);
        assert_eq!(meter.snapshot().completed, 1010);
    }
}
