// Advisory tips cycled while a document is being generated

use std::time::Duration;

use super::periodic::{PeriodicTask, TickSender};
use super::TimerTick;

/// Tips shown when no custom list is configured
pub const DEFAULT_TIPS: [&str; 8] = [
    "Paste the whole document into your AI coding tool as the first message.",
    "Ask your coding tool to build one phase of the implementation plan at a time.",
    "Keep the data schema section open while reviewing generated code.",
    "Hex colors and spacing values in the design system are meant to be copied as-is.",
    "Edge case tables make good acceptance tests.",
    "Regenerate with different answers to compare architectures.",
    "Trim features you do not need before the first build to save credits.",
    "The API reference doubles as a checklist for backend routes.",
];

/// Cycles through a fixed, non-empty list of tips on a fixed period
#[derive(Debug)]
pub struct TipRotator {
    tips: Vec<String>,
    period: Duration,
    index: usize,
    active: bool,
    epoch: u64,
    task: Option<PeriodicTask>,
}

impl TipRotator {
    /// Create a stopped rotator. An empty list falls back to [`DEFAULT_TIPS`].
    pub fn new(tips: Vec<String>, period: Duration) -> Self {
        let tips = if tips.is_empty() {
            log::warn!("Tip list is empty, using built-in tips");
            DEFAULT_TIPS.iter().map(|t| t.to_string()).collect()
        } else {
            tips
        };

        Self {
            tips,
            period,
            index: 0,
            active: false,
            epoch: 0,
            task: None,
        }
    }

    /// Reset to the first tip and start rotating
    pub fn start(&mut self, ticks: Option<&TickSender>) {
        self.stop();
        self.index = 0;
        self.active = true;

        if let Some(tx) = ticks {
            self.task = Some(PeriodicTask::spawn(
                self.period,
                tx.clone(),
                TimerTick::Tip { epoch: self.epoch },
            ));
        }
    }

    /// Stop rotating; the index stays where it is
    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
        }
        self.active = false;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Advance to the next tip if the tick is current. Returns whether it applied.
    pub fn tick(&mut self, epoch: u64) -> bool {
        if !self.active || epoch != self.epoch {
            return false;
        }
        self.index = (self.index + 1) % self.tips.len();
        true
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_tip(&self) -> &str {
        &self.tips[self.index]
    }

    pub fn tips(&self) -> &[String] {
        &self.tips
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotator() -> TipRotator {
        TipRotator::new(Vec::new(), Duration::from_secs(4))
    }

    #[test]
    fn test_empty_list_uses_defaults() {
        let r = rotator();
        assert_eq!(r.tips().len(), 8);
        assert_eq!(r.current_tip(), DEFAULT_TIPS[0]);
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let mut r = rotator();
        r.start(None);
        for expected in 1..8 {
            assert!(r.tick(r.epoch()));
            assert_eq!(r.current_index(), expected);
        }
        assert!(r.tick(r.epoch()));
        assert_eq!(r.current_index(), 0);
    }

    #[test]
    fn test_stop_freezes_index() {
        let mut r = rotator();
        r.start(None);
        let epoch = r.epoch();
        r.tick(epoch);
        r.tick(epoch);
        r.stop();

        for _ in 0..5 {
            assert!(!r.tick(epoch));
            assert!(!r.tick(r.epoch()));
        }
        assert_eq!(r.current_index(), 2);
    }

    #[test]
    fn test_start_resets_index() {
        let mut r = rotator();
        r.start(None);
        r.tick(r.epoch());
        r.tick(r.epoch());
        r.start(None);
        assert_eq!(r.current_index(), 0);
    }

    #[test]
    fn test_custom_single_tip() {
        let mut r = TipRotator::new(vec!["Only tip".to_string()], Duration::from_secs(4));
        r.start(None);
        r.tick(r.epoch());
        assert_eq!(r.current_index(), 0);
        assert_eq!(r.current_tip(), "Only tip");
    }
}
