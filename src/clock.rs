//! One-second clock source.
//!
//! A tokio interval delivers ticks to anything `Tickable` behind a mutex. A late tick
//! pushes the schedule back instead of bursting to catch up, so every delivered tick is
//! exactly one unit of elapsed time for the receiver.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

pub trait Tickable: Send + 'static {
    fn on_tick(&mut self);
}

#[derive(Debug, Clone, Copy)]
pub struct Clock {
    period: Duration,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl Clock {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Spawns the tick loop on the current tokio runtime.
    pub fn spawn<T: Tickable>(self, target: Arc<Mutex<T>>) -> ClockHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            let mut delivered: u64 = 0;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match target.lock() {
                            Ok(mut guard) => guard.on_tick(),
                            Err(_) => {
                                tracing::error!("tick target lock poisoned, stopping clock");
                                break;
                            }
                        }
                        delivered += 1;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!(delivered, "clock stopped");
            delivered
        });
        ClockHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct ClockHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl ClockHandle {
    /// Stops the clock and returns how many ticks were delivered.
    pub async fn stop(self) -> u64 {
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(delivered) => delivered,
            Err(err) => {
                tracing::error!(error = %err, "clock task failed");
                0
            }
        }
    }
}
