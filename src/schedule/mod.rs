//! Jittered claim scheduling
//!
//! Ticks at the configured base interval, each cycle stretched or shrunk
//! by a uniform random factor so attempts never land on a fixed grid. The
//! producer task is cancellable through the handle; dropping the handle
//! stops it too.


use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::errors::{ClaimerError, ClaimerResult};

/// Floor below which a jittered delay is never allowed to fall.
pub const MIN_DELAY: Duration = Duration::from_secs(1);

/// Scale a base interval by a jitter draw, clamped to [`MIN_DELAY`].
pub fn jittered_delay(base: Duration, spread: f64) -> Duration {
    let seconds = (base.as_secs_f64() * (1.0 + spread)).max(MIN_DELAY.as_secs_f64());
    Duration::from_secs_f64(seconds)
}

/// Tick producer configuration: base period plus jitter fraction in [0, 1).
#[derive(Debug, Clone)]
pub struct JitterScheduler {
    base: Duration,
    jitter: f64,
}

impl JitterScheduler {
    pub fn new(base: Duration, jitter: f64) -> ClaimerResult<Self> {
        if !(0.0..1.0).contains(&jitter) {
            return Err(ClaimerError::Config(format!(
                "jitter must be in [0, 1), got {}",
                jitter
            )));
        }
        Ok(Self { base, jitter })
    }

    /// Spawn the tick task and hand back its control handle.
    ///
    /// The channel holds a single tick, so a slow consumer delays the next
    /// cycle instead of accumulating a backlog of missed ticks.
    pub fn start(self) -> ScheduleHandle {
        let (tick_tx, tick_rx) = mpsc::channel(1);
        let stop = Arc::new(Notify::new());
        let stop_signal = stop.clone();
        let task = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            loop {
                let spread = if self.jitter > 0.0 {
                    rng.gen_range(-self.jitter..=self.jitter)
                } else {
                    0.0
                };
                let delay = jittered_delay(self.base, spread);
                tokio::select! {
                    _ = stop_signal.notified() => break,
                    _ = tokio::time::sleep(delay) => {
                        if tick_tx.send(Instant::now()).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });
        ScheduleHandle {
            ticks: tick_rx,
            stop,
            task,
        }
    }
}

/// Running scheduler: receive ticks, stop it explicitly.
pub struct ScheduleHandle {
    ticks: mpsc::Receiver<Instant>,
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    /// Wait for the next tick. `None` once the producer has stopped.
    pub async fn tick(&mut self) -> Option<Instant> {
        self.ticks.recv().await
    }

    /// Ask the producer to stop after its current cycle.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Stop the producer and wait for the task to finish.
    pub async fn shutdown(self) {
        let ScheduleHandle { ticks, stop, task } = self;
        stop.notify_one();
        // Dropping the receiver unblocks a producer mid-handoff.
        drop(ticks);
        let _ = task.await;
    }
}
