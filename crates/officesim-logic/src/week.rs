//! Simulated week: start date, day windows, labels, and schedule seeds.
//!
//! The calendar always shows the week *after* the current simulated time:
//! the Monday strictly following it, at UTC midnight. A simulated time
//! that already falls on a Monday therefore plans the next Monday.
//!
//! ```
//! use chrono::NaiveDate;
//! use officesim_logic::week::Week;
//!
//! // Wednesday 2024-01-03 → Monday 2024-01-08
//! let wed = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(15, 0, 0).unwrap();
//! let week = Week::following(wed.and_utc().timestamp_millis()).unwrap();
//! assert_eq!(week.start_date(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
//! ```

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::constants::{MS_PER_DAY, MS_PER_HOUR};

/// A planning week, identified by its Monday at UTC midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Week {
    start_ms: i64,
}

impl Week {
    /// The week starting on `date` (expected to be a Monday).
    pub fn starting(date: NaiveDate) -> Self {
        Self {
            start_ms: date.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis(),
        }
    }

    /// Rebuild from a persisted week start.
    pub fn from_start_ms(start_ms: i64) -> Self {
        Self { start_ms }
    }

    /// The week after the given simulated time. `None` if the timestamp is
    /// outside chrono's range.
    pub fn following(sim_time_ms: i64) -> Option<Self> {
        let now = DateTime::<Utc>::from_timestamp_millis(sim_time_ms)?;
        let from_sunday = now.weekday().num_days_from_sunday();
        let days = match (8 - from_sunday) % 7 {
            0 => 7,
            d => d,
        };
        let monday = now.date_naive().checked_add_days(Days::new(days as u64))?;
        Some(Self::starting(monday))
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn start_date(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.start_ms)
            .map(|d| d.date_naive())
            .unwrap_or_default()
    }

    /// Calendar date of a weekday (0 = Monday).
    pub fn date_of(&self, day_index: usize) -> NaiveDate {
        let start = self.start_date();
        start
            .checked_add_days(Days::new(day_index as u64))
            .unwrap_or(start)
    }

    /// Start of the workday on `day_index`, epoch milliseconds.
    pub fn day_start_ms(&self, day_index: usize, config: &CalendarConfig) -> i64 {
        self.start_ms + day_index as i64 * MS_PER_DAY + config.workday_start_hour as i64 * MS_PER_HOUR
    }

    /// End of the workday on `day_index`, epoch milliseconds.
    pub fn day_end_ms(&self, day_index: usize, config: &CalendarConfig) -> i64 {
        self.day_start_ms(day_index, config) + config.work_ms()
    }

    /// `"Jan 8 - Jan 12"` for a five-day week.
    pub fn label(&self, config: &CalendarConfig) -> String {
        let first = self.start_date();
        let last = self.date_of(config.weekdays.saturating_sub(1));
        format!("{} - {}", first.format("%b %-d"), last.format("%b %-d"))
    }

    /// `"Mon, Jan 8"` for each shown day.
    pub fn day_labels(&self, config: &CalendarConfig) -> Vec<String> {
        (0..config.weekdays)
            .map(|d| self.date_of(d).format("%a, %b %-d").to_string())
            .collect()
    }
}

/// Seed string for a week's schedule: `"{company}-{YYYY-MM-DD}-{roster size}"`.
pub fn schedule_seed(company_id: &str, week: &Week, roster_size: usize) -> String {
    format!("{}-{}-{}", company_id, week.start_date().format("%Y-%m-%d"), roster_size)
}

/// Hour labels down the side of the calendar, `"8 AM"` … `"4 PM"`.
pub fn time_ticks(config: &CalendarConfig) -> Vec<String> {
    (config.workday_start_hour..config.workday_end_hour)
        .map(|h| {
            let suffix = if h < 12 { "AM" } else { "PM" };
            let base = if h % 12 == 0 { 12 } else { h % 12 };
            format!("{base} {suffix}")
        })
        .collect()
}
