//! Configuration loading.
//!
//! Handles parsing of `sched.toml`. Every section and field is optional;
//! missing values fall back to the defaults below.
//!
//! ```toml
//! [grid]
//! first_hour = 7
//! visible_hours = 16
//! hour_height = 80.0
//!
//! [schedule]
//! overlap = "allow"     # or "reject"
//! week_start = "Sun"
//!
//! [store]
//! path = "tasks.json"
//!
//! [user]
//! principal = "local"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Weekday;
use schedule_engine::{GridConfig, OverlapPolicy};
use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "sched.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub user: UserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Whether overlapping blocks are accepted
    #[serde(default)]
    pub overlap: OverlapPolicy,

    /// First column of the week view
    #[serde(default = "default_week_start")]
    pub week_start: Weekday,
}

fn default_week_start() -> Weekday {
    Weekday::Sun
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            overlap: OverlapPolicy::default(),
            week_start: default_week_start(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding tasks, blocks and tags
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("tasks.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Owner recorded on tasks created from this machine
    #[serde(default = "default_principal")]
    pub principal: String,
}

fn default_principal() -> String {
    "local".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            principal: default_principal(),
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .grid
            .validate()
            .with_context(|| format!("Invalid [grid] in {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, else `sched.toml` when present, else defaults.
    ///
    /// An explicitly named file must exist.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.grid, GridConfig::default());
        assert_eq!(config.schedule.overlap, OverlapPolicy::Allow);
        assert_eq!(config.schedule.week_start, Weekday::Sun);
        assert_eq!(config.store.path, PathBuf::from("tasks.json"));
        assert_eq!(config.user.principal, "local");
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
            [grid]
            first_hour = 8
            hour_height = 60.0

            [schedule]
            overlap = "reject"
            week_start = "Mon"

            [user]
            principal = "fi"
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.first_hour, 8);
        assert_eq!(config.grid.visible_hours, 16);
        assert_eq!(config.grid.hour_height, 60.0);
        assert_eq!(config.schedule.overlap, OverlapPolicy::Reject);
        assert_eq!(config.schedule.week_start, Weekday::Mon);
        assert_eq!(config.user.principal, "fi");
    }

    #[test]
    fn load_rejects_bad_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sched.toml");
        std::fs::write(&path, "[grid]\nfirst_hour = 20\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("runs past midnight"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::resolve(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
