//! Configuration loading and management
//!
//! Handles parsing of `tally.toml` from the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::policy;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// User identity configuration
    #[serde(default)]
    pub user: UserConfig,

    /// Task configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// Habit statistics configuration
    #[serde(default)]
    pub stats: StatsConfig,
}

/// User identity configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Default user when none is given via --user or TALLY_USER
    #[serde(default)]
    pub default: Option<String>,
}

/// Task-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Recognized priorities
    #[serde(default = "default_priorities")]
    pub priorities: Vec<String>,

    /// Priority assigned when none is given or the input is unrecognized
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_priorities() -> Vec<String> {
    vec!["low".to_string(), "medium".to_string(), "high".to_string()]
}

fn default_priority() -> String {
    "medium".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            priorities: default_priorities(),
            default_priority: default_priority(),
        }
    }
}

/// Habit statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Daily completion goal
    #[serde(default = "default_daily_goal")]
    pub daily_goal: i64,

    /// Lookback window for daily counts, in days
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Trailing window for the consistency metric, in days
    #[serde(default = "default_consistency_window")]
    pub consistency_window_days: u32,

    /// Number of segments in the rendered progress bar
    #[serde(default = "default_bar_segments")]
    pub bar_segments: usize,
}

fn default_daily_goal() -> i64 {
    policy::DEFAULT_DAILY_GOAL as i64
}

fn default_lookback_days() -> u32 {
    policy::DEFAULT_LOOKBACK_DAYS
}

fn default_consistency_window() -> u32 {
    policy::DEFAULT_CONSISTENCY_WINDOW_DAYS
}

fn default_bar_segments() -> usize {
    policy::DEFAULT_BAR_SEGMENTS
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            daily_goal: default_daily_goal(),
            lookback_days: default_lookback_days(),
            consistency_window_days: default_consistency_window(),
            bar_segments: default_bar_segments(),
        }
    }
}

/// Name of the config file inside the data directory
pub const CONFIG_FILENAME: &str = "tally.toml";

impl Config {
    /// Load configuration from an explicit path
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_data_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILENAME);
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_else(|err| {
                tracing::warn!("ignoring unreadable {}: {err}", CONFIG_FILENAME);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl TasksConfig {
    /// Validate a requested priority, falling back to the default.
    ///
    /// Unknown priorities are coerced rather than rejected so a record is
    /// never blocked from storage by a cosmetic field.
    pub fn normalize_priority(&self, requested: Option<&str>) -> String {
        let Some(raw) = requested else {
            return self.default_priority.clone();
        };
        let trimmed = raw.trim();
        if let Some(known) = self
            .priorities
            .iter()
            .find(|entry| entry.eq_ignore_ascii_case(trimmed))
        {
            return known.clone();
        }
        tracing::warn!(
            "unrecognized priority '{trimmed}', using '{}'",
            self.default_priority
        );
        self.default_priority.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_stable() {
        let config = Config::default();
        assert_eq!(config.stats.daily_goal, 5);
        assert_eq!(config.stats.lookback_days, 30);
        assert_eq!(config.stats.consistency_window_days, 7);
        assert_eq!(config.stats.bar_segments, 10);
        assert_eq!(config.tasks.default_priority, "medium");
        assert!(config.user.default.is_none());
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        let content = r#"
[user]
default = "alice"

[tasks]
default_priority = "high"

[stats]
daily_goal = 3
consistency_window_days = 14
bar_segments = 20
"#;
        std::fs::write(&path, content).expect("write config");

        let config = Config::load(&path).expect("load");
        assert_eq!(config.user.default.as_deref(), Some("alice"));
        assert_eq!(config.tasks.default_priority, "high");
        assert_eq!(config.stats.daily_goal, 3);
        assert_eq!(config.stats.consistency_window_days, 14);
        assert_eq!(config.stats.bar_segments, 20);
        // untouched field keeps its default
        assert_eq!(config.stats.lookback_days, 30);
    }

    #[test]
    fn normalize_priority_coerces_unknown_values() {
        let tasks = TasksConfig::default();
        assert_eq!(tasks.normalize_priority(Some("HIGH")), "high");
        assert_eq!(tasks.normalize_priority(Some("urgent")), "medium");
        assert_eq!(tasks.normalize_priority(None), "medium");
    }
}
