// Countdown for the time-boxed question session

use std::time::Duration;

use super::periodic::{PeriodicTask, TickSender};
use super::TimerTick;

/// Result of applying one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Tick was stale or the timer is not running
    Ignored,
    /// One second elapsed; seconds left
    Remaining(u32),
    /// The last second elapsed and the timer stopped itself
    Expired,
}

/// Whole-second countdown that decrements once per tick and stops at zero
#[derive(Debug)]
pub struct CountdownTimer {
    period: Duration,
    remaining: u32,
    active: bool,
    epoch: u64,
    task: Option<PeriodicTask>,
}

impl CountdownTimer {
    /// Create an idle timer showing `budget_secs`
    pub fn new(budget_secs: u32, period: Duration) -> Self {
        Self {
            period,
            remaining: budget_secs,
            active: false,
            epoch: 0,
            task: None,
        }
    }

    /// Reset to `budget_secs` and start counting down.
    ///
    /// Any running source is stopped first. When `ticks` is `None` no task is
    /// spawned and the caller delivers ticks through [`CountdownTimer::tick`].
    pub fn start(&mut self, budget_secs: u32, ticks: Option<&TickSender>) {
        self.stop();
        self.remaining = budget_secs;
        self.active = budget_secs > 0;

        if self.active {
            if let Some(tx) = ticks {
                self.task = Some(PeriodicTask::spawn(
                    self.period,
                    tx.clone(),
                    TimerTick::Countdown { epoch: self.epoch },
                ));
            }
        }

        log::debug!(
            "Countdown started at {}s (epoch {})",
            budget_secs,
            self.epoch
        );
    }

    /// Release the tick source. Later ticks are ignored.
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        self.active = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Apply a tick scheduled under `epoch`
    pub fn tick(&mut self, epoch: u64) -> CountdownTick {
        if !self.active || epoch != self.epoch {
            return CountdownTick::Ignored;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.stop();
            log::debug!("Countdown expired");
            return CountdownTick::Expired;
        }

        CountdownTick::Remaining(self.remaining)
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Epoch that ticks must carry to be applied
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a periodic task is currently attached
    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn timer() -> CountdownTimer {
        CountdownTimer::new(60, Duration::from_secs(1))
    }

    #[test]
    fn test_new_timer_is_idle() {
        let t = timer();
        assert_eq!(t.remaining(), 60);
        assert!(!t.is_active());
        assert!(!t.is_expired());
    }

    #[test]
    fn test_sixty_ticks_expire() {
        let mut t = timer();
        t.start(60, None);

        for expected in (1..60).rev() {
            assert_eq!(t.tick(t.epoch()), CountdownTick::Remaining(expected));
        }
        assert_eq!(t.tick(t.epoch()), CountdownTick::Expired);
        assert_eq!(t.remaining(), 0);
        assert!(t.is_expired());
        assert!(!t.is_active());

        // Self-stopped, never negative
        assert_eq!(t.tick(t.epoch()), CountdownTick::Ignored);
        assert_eq!(t.remaining(), 0);
    }

    #[test]
    fn test_stop_freezes_remaining() {
        let mut t = timer();
        t.start(60, None);
        let epoch = t.epoch();
        t.tick(epoch);
        t.tick(epoch);
        t.stop();

        for _ in 0..10 {
            assert_eq!(t.tick(epoch), CountdownTick::Ignored);
            assert_eq!(t.tick(t.epoch()), CountdownTick::Ignored);
        }
        assert_eq!(t.remaining(), 58);
    }

    #[test]
    fn test_restart_resets_budget_and_drops_old_ticks() {
        let mut t = timer();
        t.start(60, None);
        let old = t.epoch();
        t.tick(old);

        t.start(60, None);
        assert_eq!(t.remaining(), 60);
        assert_ne!(t.epoch(), old);
        assert_eq!(t.tick(old), CountdownTick::Ignored);
        assert_eq!(t.remaining(), 60);
    }

    #[test]
    fn test_zero_budget_starts_expired() {
        let mut t = timer();
        t.start(0, None);
        assert!(t.is_expired());
        assert!(!t.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_keeps_one_source() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut t = timer();
        t.start(60, Some(&tx));
        t.start(60, Some(&tx));
        assert!(t.has_task());

        tokio::time::advance(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        let mut applied = 0;
        while let Ok(TimerTick::Countdown { epoch }) = rx.try_recv() {
            if t.tick(epoch) != CountdownTick::Ignored {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
        assert_eq!(t.remaining(), 59);
    }
}
