//! Focus score: quadratic reward for long stretches of free time.
//!
//! For each weekday the user's meetings are merged into busy intervals and
//! the gaps before, between, and after them (until the end of the workday)
//! are measured. Each gap contributes `hours²`, so one four-hour block is
//! worth more than four one-hour gaps.
//!
//! ```
//! use chrono::NaiveDate;
//! use officesim_logic::config::CalendarConfig;
//! use officesim_logic::focus::compute_focus;
//! use officesim_logic::schedule::Schedule;
//! use officesim_logic::week::Week;
//!
//! let week = Week::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
//! let report = compute_focus(&Schedule::new(), &week, &CalendarConfig::default());
//! // Five empty nine-hour days.
//! assert_eq!(report.score, 405.0);
//! assert_eq!(report.free_hours, 45.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::constants::MS_PER_HOUR;
use crate::schedule::Schedule;
use crate::week::Week;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusReport {
    /// Sum of squared gap hours, rounded to one decimal.
    pub score: f64,
    /// Total free hours, rounded to one decimal.
    pub free_hours: f64,
}

impl FocusReport {
    /// Points the current score is worth when banked.
    pub fn points(&self) -> u64 {
        self.score.round().max(0.0) as u64
    }
}

/// Merge sorted `(start, end)` intervals that overlap or touch.
fn merge_busy(mut blocks: Vec<(i64, i64)>) -> Vec<(i64, i64)> {
    blocks.sort_by_key(|b| b.0);
    let mut merged: Vec<(i64, i64)> = Vec::with_capacity(blocks.len());
    for (start, end) in blocks {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Free gaps in `[day_start, day_end)` around the busy blocks, in ms.
pub fn day_gaps(blocks: Vec<(i64, i64)>, day_start: i64, day_end: i64) -> Vec<i64> {
    let mut gaps = Vec::new();
    let mut cursor = day_start;
    for (start, end) in merge_busy(blocks) {
        if start > cursor {
            gaps.push(start - cursor);
        }
        cursor = cursor.max(end);
    }
    if cursor < day_end {
        gaps.push(day_end - cursor);
    }
    gaps
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Score the user's week.
pub fn compute_focus(schedule: &Schedule, week: &Week, config: &CalendarConfig) -> FocusReport {
    let mut free_hours = 0.0;
    let mut score = 0.0;

    for day in 0..config.weekdays {
        let blocks: Vec<(i64, i64)> = schedule
            .user_meetings()
            .filter(|m| m.day_index == day)
            .map(|m| (m.start, m.end))
            .collect();
        let gaps = day_gaps(blocks, week.day_start_ms(day, config), week.day_end_ms(day, config));
        for gap in gaps {
            let hours = gap as f64 / MS_PER_HOUR as f64;
            free_hours += hours;
            score += hours * hours;
        }
    }

    FocusReport {
        score: round1(score),
        free_hours: round1(free_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::{Attendee, Meeting};
    use chrono::NaiveDate;

    const H: i64 = MS_PER_HOUR;

    fn week() -> Week {
        Week::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn user_meeting(id: &str, day: usize, from_hour: f64, to_hour: f64) -> Meeting {
        let config = CalendarConfig::default();
        let base = week().day_start_ms(day, &config);
        Meeting {
            id: id.into(),
            owner: Attendee::User,
            participants: vec![Attendee::User],
            day_index: day,
            start: base + (from_hour * H as f64) as i64,
            end: base + (to_hour * H as f64) as i64,
        }
    }

    #[test]
    fn test_empty_day_is_full_workday_squared() {
        let gaps = day_gaps(vec![], 0, 9 * H);
        assert_eq!(gaps, vec![9 * H]);
    }

    #[test]
    fn test_full_day_meeting_scores_zero() {
        let config = CalendarConfig::default();
        let mut s = Schedule::new();
        for d in 0..5 {
            s.add(user_meeting(&format!("d{d}"), d, 0.0, 9.0));
        }
        let r = compute_focus(&s, &week(), &config);
        assert_eq!(r.score, 0.0);
        assert_eq!(r.free_hours, 0.0);
    }

    #[test]
    fn test_back_to_back_meetings_fill_day() {
        let gaps = day_gaps(vec![(3 * H, 9 * H), (0, 3 * H)], 0, 9 * H);
        assert!(gaps.is_empty());
    }

    #[test]
    fn test_gaps_around_meetings() {
        let gaps = day_gaps(vec![(H, 2 * H), (4 * H, 5 * H)], 0, 9 * H);
        assert_eq!(gaps, vec![H, 2 * H, 4 * H]);
    }

    #[test]
    fn test_overlapping_meetings_merge() {
        let gaps = day_gaps(vec![(H, 3 * H), (2 * H, 4 * H)], 0, 9 * H);
        assert_eq!(gaps, vec![H, 5 * H]);
    }

    #[test]
    fn test_consolidated_beats_spread() {
        let config = CalendarConfig::default();
        let mut spread = Schedule::new();
        spread.add(user_meeting("a", 0, 2.0, 3.0));
        spread.add(user_meeting("b", 0, 5.0, 6.0));
        let mut packed = Schedule::new();
        packed.add(user_meeting("a", 0, 0.0, 1.0));
        packed.add(user_meeting("b", 0, 1.0, 2.0));
        let spread = compute_focus(&spread, &week(), &config);
        let packed = compute_focus(&packed, &week(), &config);
        assert_eq!(spread.free_hours, packed.free_hours);
        assert!(packed.score > spread.score);
    }

    #[test]
    fn test_only_user_meetings_count() {
        let config = CalendarConfig::default();
        let mut s = Schedule::new();
        let mut team = user_meeting("t", 0, 0.0, 9.0);
        team.owner = Attendee::employee("x");
        team.participants = vec![Attendee::employee("x"), Attendee::User];
        s.add(team);
        let r = compute_focus(&s, &week(), &config);
        assert_eq!(r.score, 405.0);
    }

    #[test]
    fn test_rounding_to_one_decimal() {
        let config = CalendarConfig::default();
        let mut s = Schedule::new();
        // 20 minutes busy on Monday: gaps 8h40m → 75.11.. + 4 * 81.
        s.add(user_meeting("a", 0, 0.0, 1.0 / 3.0));
        let r = compute_focus(&s, &week(), &config);
        let h = 9.0 - 1.0 / 3.0;
        assert_eq!(r.score, ((h * h + 324.0) * 10.0_f64).round() / 10.0);
        assert_eq!(r.free_hours, 44.7);
    }

    #[test]
    fn test_points_round_score() {
        let r = FocusReport { score: 12.5, free_hours: 3.0 };
        assert_eq!(r.points(), 13);
        assert_eq!(FocusReport::default().points(), 0);
    }
}
