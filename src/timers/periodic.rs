// Cancellable fixed-period tick source

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::TimerTick;

/// Sender side of the tick channel the workflow loop listens on
pub type TickSender = mpsc::UnboundedSender<TimerTick>;

/// A background task that sends the same tick on a fixed period until cancelled.
///
/// The task is aborted on [`PeriodicTask::cancel`] or on drop, so a handle that
/// goes out of scope never leaves a ticking source behind.
#[derive(Debug)]
pub struct PeriodicTask {
    handle: JoinHandle<()>,
    tick: TimerTick,
}

impl PeriodicTask {
    /// Spawn the tick loop. The first tick fires one full period after spawn.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(period: Duration, tx: TickSender, tick: TimerTick) -> Self {
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if tx.send(tick).is_err() {
                    log::debug!("Tick receiver dropped, stopping {:?}", tick);
                    break;
                }
            }
        });

        log::trace!("Started periodic task for {:?} every {:?}", tick, period);
        Self { handle, tick }
    }

    /// Stop the tick loop
    pub fn cancel(self) {
        // Drop aborts the task
        log::trace!("Cancelled periodic task for {:?}", self.tick);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
