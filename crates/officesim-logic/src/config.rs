//! Calendar configuration and validation.
//!
//! The defaults reproduce the game's calendar: an 8:00–17:00 workday,
//! Monday to Friday, 30-minute slots, 30- or 60-minute meetings, and the
//! eight-colour employee palette. Hosts may load overrides from JSON.
//!
//! ```
//! use officesim_logic::config::{validate_config, CalendarConfig};
//!
//! let config = CalendarConfig::default();
//! assert!(validate_config(&config).is_empty());
//! assert_eq!(config.work_minutes(), 540);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{colors, generation, geometry, workday, MS_PER_MINUTE, WEEKDAYS};
use crate::roster::normalize_color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub workday_start_hour: u32,
    pub workday_end_hour: u32,
    /// Days shown per week, starting Monday.
    pub weekdays: usize,
    pub slot_minutes: u32,
    pub max_placement_attempts: u32,
    pub durations_minutes: Vec<u32>,
    pub gutter_percent: f64,
    pub palette: Vec<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            workday_start_hour: workday::START_HOUR,
            workday_end_hour: workday::END_HOUR,
            weekdays: WEEKDAYS,
            slot_minutes: workday::SLOT_MINUTES,
            max_placement_attempts: generation::MAX_PLACEMENT_ATTEMPTS,
            durations_minutes: generation::DURATIONS_MINUTES.to_vec(),
            gutter_percent: geometry::GUTTER_PERCENT,
            palette: colors::PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CalendarConfig {
    /// Length of the workday in minutes.
    pub fn work_minutes(&self) -> i64 {
        (self.workday_end_hour as i64 - self.workday_start_hour as i64) * 60
    }

    pub fn work_ms(&self) -> i64 {
        self.work_minutes() * MS_PER_MINUTE
    }

    pub fn work_hours(&self) -> f64 {
        self.work_minutes() as f64 / 60.0
    }

    pub fn slot_ms(&self) -> i64 {
        self.slot_minutes as i64 * MS_PER_MINUTE
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("workday hours {start}..{end} are not an increasing range within a day")]
    InvalidWorkday { start: u32, end: u32 },
    #[error("weekdays must be between 1 and 7, got {0}")]
    InvalidWeekdays(usize),
    #[error("slot length must be a positive divisor of 60 minutes, got {0}")]
    InvalidSlot(u32),
    #[error("at least one placement attempt is required")]
    NoPlacementAttempts,
    #[error("no meeting durations configured")]
    NoDurations,
    #[error("meeting duration {0} minutes does not fit the workday")]
    DurationOutOfRange(u32),
    #[error("gutter must be in [0, 50) percent, got {0}")]
    InvalidGutter(f64),
    #[error("palette entry {0:?} is not a hex colour")]
    InvalidColor(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &CalendarConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if config.workday_start_hour >= config.workday_end_hour || config.workday_end_hour > 24 {
        errors.push(ConfigError::InvalidWorkday {
            start: config.workday_start_hour,
            end: config.workday_end_hour,
        });
    }
    if !(1..=7).contains(&config.weekdays) {
        errors.push(ConfigError::InvalidWeekdays(config.weekdays));
    }
    if config.slot_minutes == 0 || 60 % config.slot_minutes != 0 {
        errors.push(ConfigError::InvalidSlot(config.slot_minutes));
    }
    if config.max_placement_attempts == 0 {
        errors.push(ConfigError::NoPlacementAttempts);
    }

    if config.durations_minutes.is_empty() {
        errors.push(ConfigError::NoDurations);
    }
    let work = config.work_minutes();
    for &d in &config.durations_minutes {
        if d == 0 || d as i64 > work {
            errors.push(ConfigError::DurationOutOfRange(d));
        }
    }

    if !(0.0..50.0).contains(&config.gutter_percent) {
        errors.push(ConfigError::InvalidGutter(config.gutter_percent));
    }
    for c in &config.palette {
        if normalize_color(c).is_none() {
            errors.push(ConfigError::InvalidColor(c.clone()));
        }
    }

    errors
}
