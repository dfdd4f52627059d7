// Configuration for the interview workflow

pub mod loader;
pub mod merger;

pub use loader::ConfigLoader;
pub use merger::{ConfigMerger, PartialConfig, PartialCopyConfig, PartialInterviewConfig, PartialTipsConfig};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timers::DEFAULT_TIPS;

/// ClearPRD configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClearPrdConfig {
    /// Question session settings
    #[serde(default)]
    pub interview: InterviewConfig,
    /// Tip rotation settings
    #[serde(default)]
    pub tips: TipsConfig,
    /// Copy action settings
    #[serde(default)]
    pub copy: CopyConfig,
}

/// Question session configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterviewConfig {
    /// Countdown budget when the question phase is entered
    #[serde(rename = "questionBudgetSecs", alias = "question_budget_secs", default = "default_question_budget")]
    pub question_budget_secs: u32,
    /// Countdown tick period
    #[serde(rename = "tickIntervalMs", alias = "tick_interval_ms", default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_question_budget() -> u32 { 60 }
fn default_tick_interval() -> u64 { 1000 }

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            question_budget_secs: default_question_budget(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl InterviewConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Tip rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TipsConfig {
    /// Seconds between tips
    #[serde(rename = "intervalSecs", alias = "interval_secs", default = "default_tip_interval")]
    pub interval_secs: u64,
    /// Tips shown while generating
    #[serde(default = "default_tips")]
    pub messages: Vec<String>,
}

fn default_tip_interval() -> u64 { 4 }
fn default_tips() -> Vec<String> {
    DEFAULT_TIPS.iter().map(|t| t.to_string()).collect()
}

impl Default for TipsConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_tip_interval(),
            messages: default_tips(),
        }
    }
}

impl TipsConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Copy action configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CopyConfig {
    /// Fall back to an OSC 52 terminal escape when the system clipboard fails
    #[serde(rename = "osc52Fallback", alias = "osc52_fallback", default = "default_true")]
    pub osc52_fallback: bool,
}

fn default_true() -> bool { true }

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            osc52_fallback: default_true(),
        }
    }
}
