use std::{future::Future, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{runtime::Handle, sync::Semaphore, time::{self, Instant}};
use tokio_util::sync::CancellationToken;

use crate::errors::SamplingError;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// How many dispatched actions may overlap before ticks start being skipped.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Cancels a scheduled timer. Cloning shares the same timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    cancel_token: CancellationToken,
}

impl TimerHandle {
    /// Stops future fires. Actions already dispatched keep running.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Fixed-period repeating scheduler.
///
/// Fire `n` happens at `start + n * interval` regardless of how long earlier
/// actions took. Every fire spawns the action as its own task; at most
/// `max_in_flight` of them run at once and a fire that finds no free slot is
/// skipped rather than queued.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    name: &'static str,
    interval: Duration,
    max_in_flight: usize,
}

impl IntervalTimer {
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule on the ambient Tokio runtime.
    pub fn schedule<F, Fut>(self, action: F) -> Result<TimerHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current()
            .with_context(|| format!("timer {} must be scheduled inside a Tokio runtime", self.name))?;
        self.schedule_on(&runtime, action)
    }

    /// Fails for a zero interval, which would never advance the schedule.
    pub fn schedule_on<F, Fut>(self, runtime: &Handle, action: F) -> Result<TimerHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.interval.is_zero() {
            return Err(SamplingError::configuration(format!(
                "timer {} needs a non-zero interval",
                self.name
            ))
            .into());
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let permits = Arc::new(Semaphore::new(self.max_in_flight));
        let dispatcher = runtime.clone();
        let IntervalTimer {
            name,
            interval,
            max_in_flight,
        } = self;

        runtime.spawn(async move {
            let mut next_fire = Instant::now() + interval;
            let mut fires: u64 = 0;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        log_debug!("timer {} cancelled after {} fires", name, fires);
                        break;
                    }
                    _ = time::sleep_until(next_fire) => {}
                }

                match Arc::clone(&permits).try_acquire_owned() {
                    Ok(permit) => {
                        let fut = action();
                        dispatcher.spawn(async move {
                            fut.await;
                            drop(permit);
                        });
                    }
                    Err(_) => {
                        log_warn!(
                            "timer {}: {} action(s) still running, skipping fire",
                            name,
                            max_in_flight
                        );
                    }
                }

                fires = fires.wrapping_add(1);
                next_fire += interval;
            }
        });

        Ok(TimerHandle { cancel_token })
    }
}

/// `schedule(interval, action)` from the ambient runtime with default bounds.
pub fn schedule<F, Fut>(interval: Duration, action: F) -> Result<TimerHandle>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    IntervalTimer::new("timer", interval).schedule(action)
}

/// Idempotent; only prevents future fires.
pub fn cancel(handle: &TimerHandle) {
    handle.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    fn counting_action(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = schedule(Duration::from_secs(60), counting_action(&counter)).unwrap();

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_secs(3 * 60 - 59 + 1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_actions_do_not_shift_fire_times() {
        let start = Instant::now();
        let fired_at = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&fired_at);

        let handle = IntervalTimer::new("slow", Duration::from_secs(60))
            .with_max_in_flight(1)
            .schedule(move || {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(Instant::now());
                    time::sleep(Duration::from_secs(45)).await;
                }
            })
            .unwrap();

        time::sleep(Duration::from_secs(181)).await;
        handle.cancel();

        let offsets: Vec<u64> = fired_at
            .lock()
            .unwrap()
            .iter()
            .map(|at| (*at - start).as_secs())
            .collect();
        assert_eq!(offsets, vec![60, 120, 180]);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_timer_skips_instead_of_queueing() {
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);

        let handle = IntervalTimer::new("busy", Duration::from_secs(60))
            .with_max_in_flight(1)
            .schedule(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    time::sleep(Duration::from_secs(90)).await;
                }
            })
            .unwrap();

        // fires at 60 (busy until 150), 120 skipped, 180 runs
        time::sleep(Duration::from_secs(181)).await;
        assert_eq!(started.load(Ordering::SeqCst), 2);
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_stops_future_fires() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = schedule(Duration::from_secs(1), counting_action(&counter)).unwrap();

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        cancel(&handle);
        cancel(&handle);
        assert!(handle.is_cancelled());

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let err = schedule(Duration::ZERO, counting_action(&counter)).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SamplingError>(),
            Some(SamplingError::Configuration { .. })
        ));
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn scheduling_outside_a_runtime_is_an_error() {
        let counter = Arc::new(AtomicUsize::new(0));
        assert!(schedule(Duration::from_secs(1), counting_action(&counter)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn supports_multi_hour_intervals() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = schedule(Duration::from_secs(6 * 3600), counting_action(&counter)).unwrap();

        time::sleep(Duration::from_secs(24 * 3600 + 1)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        handle.cancel();
    }
}
