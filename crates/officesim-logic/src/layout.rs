//! Day-column layout: vertical block geometry and side-by-side packing.
//!
//! Each day column is laid out independently:
//!
//! - **Vertical**: top and height are proportional to the meeting's offset
//!   and duration within the workday, computed against a virtual 720px
//!   column with a 3px gap above and below each block.
//! - **Horizontal**: meetings are swept in start order (ties by end). Each
//!   takes the lowest column not used by a still-running meeting, and every
//!   running meeting is widened to the highest column count seen while it
//!   runs. Width is `100 / columns − gutter`, left is
//!   `column × 100 / columns + gutter / 2`.
//!
//! In a staggered chain (A overlaps B, B overlaps C, A and C disjoint) the
//! widening only reaches meetings running at the same time, so widths in
//! the chain can differ.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::constants::{colors, geometry, MS_PER_MINUTE};
use crate::meeting::{Attendee, Meeting};
use crate::roster::{fallback_color, Employee};
use crate::schedule::Schedule;
use crate::week::Week;

/// A meeting with its on-screen geometry, all in percent of the day column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualMeeting {
    #[serde(flatten)]
    pub meeting: Meeting,
    pub top: f64,
    pub height: f64,
    pub left: f64,
    pub width: f64,
    /// Zero-based horizontal slot.
    pub column: usize,
    /// Slots the column is divided into for this meeting.
    pub columns: usize,
    pub background: String,
    pub border: String,
    /// Colours of every participant other than the owner.
    pub participant_dots: Vec<String>,
}

/// Top and height of a block, in percent of the day column.
pub fn block_position(start: i64, end: i64, day_start: i64, config: &CalendarConfig) -> (f64, f64) {
    let work_minutes = config.work_minutes().max(1) as f64;
    let start_minutes = (start - day_start) as f64 / MS_PER_MINUTE as f64;
    let duration = (end - start) as f64 / MS_PER_MINUTE as f64;
    let px_per_minute = geometry::DAY_HEIGHT_PX / work_minutes;

    let start_px = start_minutes * px_per_minute + geometry::BLOCK_GAP_PX;
    let mut height_px = (duration * px_per_minute - geometry::BLOCK_GAP_PX * 2.0).max(geometry::MIN_BLOCK_PX);
    if start_px + height_px > geometry::DAY_HEIGHT_PX {
        height_px = (geometry::DAY_HEIGHT_PX - start_px).max(geometry::MIN_BLOCK_PX);
    }

    let top = start_px / geometry::DAY_HEIGHT_PX * 100.0;
    let height = (height_px / geometry::DAY_HEIGHT_PX * 100.0).max(geometry::MIN_BLOCK_PERCENT);
    (top, height)
}

/// Pack one day's meetings into side-by-side columns.
///
/// Returns the meetings sorted by start (then end) with `column`,
/// `columns`, `left`, and `width` filled in.
pub fn layout_day(mut items: Vec<VisualMeeting>, gutter: f64) -> Vec<VisualMeeting> {
    items.sort_by(|a, b| {
        a.meeting
            .start
            .cmp(&b.meeting.start)
            .then(a.meeting.end.cmp(&b.meeting.end))
    });

    let mut active: Vec<usize> = Vec::new();
    let mut column = vec![0usize; items.len()];
    let mut columns = vec![1usize; items.len()];

    for i in 0..items.len() {
        let start = items[i].meeting.start;
        active.retain(|&a| items[a].meeting.end > start);

        let used: HashSet<usize> = active.iter().map(|&a| column[a]).collect();
        let mut slot = 0;
        while used.contains(&slot) {
            slot += 1;
        }
        column[i] = slot;
        active.push(i);

        let now = active.iter().map(|&a| column[a]).max().unwrap_or(0) + 1;
        for &a in &active {
            columns[a] = columns[a].max(now);
        }
    }

    for (i, item) in items.iter_mut().enumerate() {
        let count = columns[i].max(1);
        let col_width = 100.0 / count as f64;
        item.column = column[i];
        item.columns = count;
        item.width = (col_width - gutter).max(geometry::MIN_WIDTH_PERCENT);
        item.left = column[i] as f64 * col_width + gutter / 2.0;
    }
    items
}

/// Calendar colour of an attendee.
pub fn color_for(who: &Attendee, employees: &[Employee], palette: &[String]) -> String {
    match who {
        Attendee::User => colors::USER_DOT.to_string(),
        Attendee::Employee(id) => employees
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.color.clone())
            .unwrap_or_else(|| fallback_color(id, palette)),
    }
}

/// Whether a meeting is shown for the current employee selection.
///
/// Meetings with only the user are always shown; others only when every
/// non-user attendee is selected.
pub fn is_visible(meeting: &Meeting, selected: &HashSet<String>) -> bool {
    meeting
        .attendees()
        .iter()
        .filter_map(|a| match a {
            Attendee::User => None,
            Attendee::Employee(id) => Some(id),
        })
        .all(|id| selected.contains(id))
}

/// Lay out the whole week: one vector of positioned meetings per weekday.
pub fn build_week_layout(
    schedule: &Schedule,
    week: &Week,
    employees: &[Employee],
    selected: &HashSet<String>,
    config: &CalendarConfig,
) -> Vec<Vec<VisualMeeting>> {
    let mut by_day: Vec<Vec<VisualMeeting>> = vec![Vec::new(); config.weekdays];

    for meeting in schedule.meetings() {
        if meeting.day_index >= config.weekdays || !is_visible(meeting, selected) {
            continue;
        }
        let day_start = week.day_start_ms(meeting.day_index, config);
        let (top, height) = block_position(meeting.start, meeting.end, day_start, config);
        let (background, border) = if meeting.is_user_owned() {
            (colors::USER_BACKGROUND.to_string(), colors::USER_BORDER.to_string())
        } else {
            let c = color_for(&meeting.owner, employees, &config.palette);
            (c.clone(), c)
        };
        let participant_dots = meeting
            .participants
            .iter()
            .filter(|p| **p != meeting.owner)
            .map(|p| color_for(p, employees, &config.palette))
            .collect();

        by_day[meeting.day_index].push(VisualMeeting {
            meeting: meeting.clone(),
            top,
            height,
            left: 0.0,
            width: 100.0,
            column: 0,
            columns: 1,
            background,
            border,
            participant_dots,
        });
    }

    by_day
        .into_iter()
        .map(|day| layout_day(day, config.gutter_percent))
        .collect()
}
