//! Core configuration.
//!
//! # Responsibility
//! - Load the handful of knobs the core needs from TOML.
//! - Turn them into validated runtime values (calendar policy, windows).
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.

use crate::clock::{CalendarPolicy, DEFAULT_UTC_OFFSET_MINUTES};
use crate::logging::default_log_level;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("calendar offset must be within ±24h, got {0} minutes")]
    InvalidOffset(i32),
    #[error("newly completed window must be at least one day, got {0}")]
    InvalidWindow(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Reference offset for calendar days and week starts.
    pub calendar_utc_offset_minutes: i32,
    /// Trailing window for "newly completed" in weekly stats.
    pub newly_completed_window_days: i64,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            calendar_utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            newly_completed_window_days: 7,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.calendar()?;
        config.newly_completed_window()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn calendar(&self) -> Result<CalendarPolicy, ConfigError> {
        CalendarPolicy::from_offset_minutes(self.calendar_utc_offset_minutes)
            .ok_or(ConfigError::InvalidOffset(self.calendar_utc_offset_minutes))
    }

    pub fn newly_completed_window(&self) -> Result<Duration, ConfigError> {
        if self.newly_completed_window_days < 1 {
            return Err(ConfigError::InvalidWindow(
                self.newly_completed_window_days,
            ));
        }
        Duration::try_days(self.newly_completed_window_days)
            .ok_or(ConfigError::InvalidWindow(self.newly_completed_window_days))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.calendar_utc_offset_minutes, 480);
        assert_eq!(config.newly_completed_window().unwrap().num_days(), 7);
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let config = CoreConfig::from_toml_str("calendar_utc_offset_minutes = -300").unwrap();
        assert_eq!(config.calendar_utc_offset_minutes, -300);
        assert_eq!(config.newly_completed_window_days, 7);
        assert_eq!(
            config.calendar().unwrap().offset().local_minus_utc(),
            -300 * 60
        );
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let err = CoreConfig::from_toml_str("calendar_utc_offset_minutes = 1440").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOffset(1440)));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = CoreConfig::from_toml_str("newly_completed_window_days = 0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow(0)));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        writeln!(file, "newly_completed_window_days = 14").unwrap();
        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.newly_completed_window_days, 14);
    }
}
