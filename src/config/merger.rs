// Configuration merging with priority

use super::{ClearPrdConfig, CopyConfig, InterviewConfig, TipsConfig};
use serde::{Deserialize, Serialize};

/// Partial configuration for merging
/// Uses Option<T> for all fields to support partial overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialConfig {
    #[serde(default)]
    pub interview: Option<PartialInterviewConfig>,
    #[serde(default)]
    pub tips: Option<PartialTipsConfig>,
    #[serde(default)]
    pub copy: Option<PartialCopyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialInterviewConfig {
    pub question_budget_secs: Option<u32>,
    pub tick_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialTipsConfig {
    pub interval_secs: Option<u64>,
    pub messages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PartialCopyConfig {
    pub osc52_fallback: Option<bool>,
}

/// Configuration merger
/// Priority order: CLI -> File -> Defaults
pub struct ConfigMerger {
    defaults: ClearPrdConfig,
    file: Option<ClearPrdConfig>,
    cli: Option<PartialConfig>,
}

impl ConfigMerger {
    /// Create a new config merger with defaults
    pub fn new() -> Self {
        Self {
            defaults: ClearPrdConfig::default(),
            file: None,
            cli: None,
        }
    }

    /// Set the config loaded from disk
    pub fn with_file(mut self, config: Option<ClearPrdConfig>) -> Self {
        self.file = config;
        self
    }

    /// Set CLI overrides
    pub fn with_cli(mut self, config: Option<PartialConfig>) -> Self {
        self.cli = config;
        self
    }

    /// Merge all configs with priority
    pub fn merge(&self) -> ClearPrdConfig {
        // A file config is complete (serde fills defaults), so it replaces the base
        let mut result = self.file.clone().unwrap_or_else(|| self.defaults.clone());

        if let Some(ref cli) = self.cli {
            result = self.merge_partial(&result, cli);
        }

        result
    }

    /// Merge partial config into full config
    fn merge_partial(&self, base: &ClearPrdConfig, partial: &PartialConfig) -> ClearPrdConfig {
        ClearPrdConfig {
            interview: partial
                .interview
                .as_ref()
                .map(|p| self.merge_partial_interview(&base.interview, p))
                .unwrap_or_else(|| base.interview.clone()),
            tips: partial
                .tips
                .as_ref()
                .map(|p| self.merge_partial_tips(&base.tips, p))
                .unwrap_or_else(|| base.tips.clone()),
            copy: partial
                .copy
                .as_ref()
                .map(|p| self.merge_partial_copy(&base.copy, p))
                .unwrap_or_else(|| base.copy.clone()),
        }
    }

    fn merge_partial_interview(
        &self,
        base: &InterviewConfig,
        partial: &PartialInterviewConfig,
    ) -> InterviewConfig {
        InterviewConfig {
            question_budget_secs: partial
                .question_budget_secs
                .unwrap_or(base.question_budget_secs),
            tick_interval_ms: partial.tick_interval_ms.unwrap_or(base.tick_interval_ms),
        }
    }

    fn merge_partial_tips(&self, base: &TipsConfig, partial: &PartialTipsConfig) -> TipsConfig {
        TipsConfig {
            interval_secs: partial.interval_secs.unwrap_or(base.interval_secs),
            messages: partial
                .messages
                .clone()
                .unwrap_or_else(|| base.messages.clone()),
        }
    }

    fn merge_partial_copy(&self, base: &CopyConfig, partial: &PartialCopyConfig) -> CopyConfig {
        CopyConfig {
            osc52_fallback: partial.osc52_fallback.unwrap_or(base.osc52_fallback),
        }
    }
}

impl Default for ConfigMerger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_only() {
        let merged = ConfigMerger::new().merge();
        assert_eq!(merged, ClearPrdConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = ClearPrdConfig::default();
        file.interview.question_budget_secs = 30;

        let merged = ConfigMerger::new().with_file(Some(file)).merge();
        assert_eq!(merged.interview.question_budget_secs, 30);
        assert_eq!(merged.tips.interval_secs, 4);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = ClearPrdConfig::default();
        file.interview.question_budget_secs = 30;
        file.copy.osc52_fallback = false;

        let cli = PartialConfig {
            interview: Some(PartialInterviewConfig {
                question_budget_secs: Some(45),
                tick_interval_ms: None,
            }),
            ..Default::default()
        };

        let merged = ConfigMerger::new()
            .with_file(Some(file))
            .with_cli(Some(cli))
            .merge();

        assert_eq!(merged.interview.question_budget_secs, 45);
        assert_eq!(merged.interview.tick_interval_ms, 1000);
        // Untouched sections keep the file value
        assert!(!merged.copy.osc52_fallback);
    }

    #[test]
    fn test_cli_tips_replace_list() {
        let cli = PartialConfig {
            tips: Some(PartialTipsConfig {
                interval_secs: Some(2),
                messages: Some(vec!["focus".to_string()]),
            }),
            ..Default::default()
        };

        let merged = ConfigMerger::new().with_cli(Some(cli)).merge();
        assert_eq!(merged.tips.interval_secs, 2);
        assert_eq!(merged.tips.messages, vec!["focus"]);
    }
}
