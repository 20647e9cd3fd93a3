//! # Tracker Configuration
//!
//! YAML-backed settings for the calendar and leave workflow.
//!
//! ```yaml
//! calendar:
//!   week_start: monday
//!   weekend_days: [Sat, Sun]
//! leave:
//!   revalidation: optimistic
//! logging:
//!   filter: info
//! ```
//!
//! Every section and key is optional; missing values fall back to defaults.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Weekend must consist of exactly two distinct days, got {0:?}")]
    InvalidWeekend(Vec<Weekday>),
}

/// First column of the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    /// Column index of `date` in a week starting on this day
    pub fn column_of(&self, date: NaiveDate) -> u32 {
        match self {
            WeekStart::Monday => date.weekday().num_days_from_monday(),
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        }
    }
}

/// How a failed per-day re-validation fetch is treated at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevalidationPolicy {
    /// The day is still created (unless it is a weekend)
    #[default]
    Optimistic,
    /// The day is skipped with `validation_failed`
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub week_start: WeekStart,
    pub weekend_days: Vec<Weekday>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            weekend_days: vec![Weekday::Sat, Weekday::Sun],
        }
    }
}

impl CalendarConfig {
    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend_days.contains(&date.weekday())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let distinct = match self.weekend_days.as_slice() {
            [first, second] => first != second,
            _ => false,
        };
        if distinct {
            Ok(())
        } else {
            Err(ConfigError::InvalidWeekend(self.weekend_days.clone()))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaveConfig {
    pub revalidation: RevalidationPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub calendar: CalendarConfig,
    pub leave: LeaveConfig,
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load and validate a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TrackerConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.calendar.validate()?;
        info!("Loaded tracker config from {}", path.display());
        Ok(config)
    }

    /// Like [`TrackerConfig::load`] but a missing file yields the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
