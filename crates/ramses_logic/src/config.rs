//! Logic engine configuration (ramses_logic.toml)

use crate::statistics::{StatisticsLogLevel, StatisticsLogMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogicEngineConfig {
    /// Updates per statistics block, 0 disables statistics
    #[serde(default = "default_statistics_logging_rate")]
    pub statistics_logging_rate: usize,
    #[serde(default)]
    pub statistics_log_mode: StatisticsLogMode,
    #[serde(default)]
    pub statistics_log_level: StatisticsLogLevel,
    /// Record an update report on every update
    #[serde(default)]
    pub update_report: bool,
    /// Skip nodes whose inputs did not change
    #[serde(default = "default_true")]
    pub dirty_tracking: bool,
}

fn default_statistics_logging_rate() -> usize {
    60
}

fn default_true() -> bool {
    true
}

impl Default for LogicEngineConfig {
    fn default() -> Self {
        Self {
            statistics_logging_rate: default_statistics_logging_rate(),
            statistics_log_mode: StatisticsLogMode::default(),
            statistics_log_level: StatisticsLogLevel::default(),
            update_report: false,
            dirty_tracking: default_true(),
        }
    }
}

impl LogicEngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = LogicEngineConfig::from_toml("").unwrap();
        assert_eq!(config, LogicEngineConfig::default());
        assert_eq!(config.statistics_logging_rate, 60);
        assert!(config.dirty_tracking);
        assert!(!config.update_report);
    }

    #[test]
    fn test_enum_values() {
        let config = LogicEngineConfig::from_toml(
            r#"
            statistics_logging_rate = 2
            statistics_log_mode = "detailed"
            statistics_log_level = "warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.statistics_logging_rate, 2);
        assert_eq!(config.statistics_log_mode, StatisticsLogMode::Detailed);
        assert_eq!(config.statistics_log_level, StatisticsLogLevel::Warn);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(LogicEngineConfig::from_toml("statistics_log_mode = \"verbose\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LogicEngineConfig {
            statistics_logging_rate: 0,
            update_report: true,
            dirty_tracking: false,
            ..LogicEngineConfig::default()
        };
        let text = config.to_toml().unwrap();
        assert_eq!(LogicEngineConfig::from_toml(&text).unwrap(), config);
    }
}
