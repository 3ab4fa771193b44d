//! Drag-to-reschedule state machine.
//!
//! ```text
//! Idle ──start──▶ Dragging ──over──▶ Previewing ──drop──▶ Idle (committed or rejected)
//!                    ▲                   │
//!                    └──leave / invalid──┘        end (any state) ──▶ Idle
//! ```
//!
//! Only meetings owned by the user can be picked up. While dragging, the
//! pointer's vertical position within a day column (as a fraction of the
//! column height) is converted to minutes, snapped down to the slot grid,
//! and clamped so the whole meeting fits in the workday. The placement is
//! flagged as conflicting when any attendee of the dragged meeting already
//! has another meeting overlapping it that day.
//!
//! A drop commits only a placement that is in bounds and conflict-free;
//! otherwise the gesture is cancelled and the schedule is left untouched.

use serde::{Deserialize, Serialize};

use crate::config::CalendarConfig;
use crate::constants::MS_PER_MINUTE;
use crate::layout::block_position;
use crate::meeting::Meeting;
use crate::schedule::Schedule;
use crate::week::Week;

/// Candidate position for a dragged meeting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub day_index: usize,
    pub start: i64,
    pub end: i64,
    /// Block geometry for the preview, percent of the column.
    pub top: f64,
    pub height: f64,
    pub conflict: bool,
    pub out_of_bounds: bool,
}

impl Placement {
    pub fn is_valid(&self) -> bool {
        !self.conflict && !self.out_of_bounds
    }
}

/// Compute where `meeting` would land if dropped at `y_fraction` of
/// `day_index`'s column.
pub fn compute_placement(
    schedule: &Schedule,
    meeting: &Meeting,
    day_index: usize,
    y_fraction: f64,
    week: &Week,
    config: &CalendarConfig,
) -> Placement {
    let y = if y_fraction.is_finite() { y_fraction.clamp(0.0, 1.0) } else { 0.0 };
    let work_minutes = config.work_minutes();
    let slot = config.slot_minutes.max(1) as i64;

    let minutes = y * work_minutes as f64;
    let duration_ms = meeting.duration_ms().max(slot * MS_PER_MINUTE);
    let duration_minutes = (duration_ms as f64 / MS_PER_MINUTE as f64).round() as i64;
    let max_start_minutes = (work_minutes - duration_minutes).max(0);
    let snapped = ((minutes / slot as f64).floor() as i64 * slot).clamp(0, max_start_minutes);

    let day_start = week.day_start_ms(day_index, config);
    let day_end = day_start + config.work_ms();
    let desired = day_start + snapped * MS_PER_MINUTE;
    let start = desired.max(day_start).min(day_end - duration_ms);
    let end = start + duration_ms;

    let out_of_bounds =
        day_index >= config.weekdays || end > day_end || start >= day_end || start < day_start;
    let conflict = schedule.has_conflict(&meeting.attendees(), day_index, start, end, Some(meeting.id.as_str()));
    let (top, height) = block_position(start, end, day_start, config);

    Placement {
        day_index,
        start,
        end,
        top,
        height,
        conflict,
        out_of_bounds,
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        meeting_id: String,
    },
    Previewing {
        meeting_id: String,
        preview: Placement,
    },
}

/// Why a drop did not move the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropRejection {
    /// The dragged meeting no longer exists or is not the user's.
    UnknownMeeting,
    OutOfBounds,
    Conflict,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// No drag in progress, or the calendar is locked.
    Ignored,
    Rejected(DropRejection),
    Committed(Placement),
}

/// Tracks one drag gesture at a time.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn dragging_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { meeting_id } | DragState::Previewing { meeting_id, .. } => {
                Some(meeting_id)
            }
        }
    }

    pub fn preview(&self) -> Option<&Placement> {
        match &self.state {
            DragState::Previewing { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Pick up a meeting. Returns `false` when the calendar is locked or
    /// the meeting is not the user's.
    pub fn start(&mut self, meeting: &Meeting, locked: bool) -> bool {
        if locked || !meeting.is_user_owned() {
            return false;
        }
        self.state = DragState::Dragging {
            meeting_id: meeting.id.clone(),
        };
        true
    }

    /// Pointer moved over a day column.
    pub fn over(
        &mut self,
        schedule: &Schedule,
        day_index: usize,
        y_fraction: f64,
        week: &Week,
        config: &CalendarConfig,
        locked: bool,
    ) -> Option<&Placement> {
        if locked {
            return None;
        }
        let meeting_id = self.dragging_id()?.to_string();
        let placement = schedule
            .get(&meeting_id)
            .filter(|m| m.is_user_owned())
            .map(|m| compute_placement(schedule, m, day_index, y_fraction, week, config))
            .filter(|p| !p.out_of_bounds);

        self.state = match placement {
            Some(preview) => DragState::Previewing { meeting_id, preview },
            None => DragState::Dragging { meeting_id },
        };
        self.preview()
    }

    /// Pointer left a day column; clears the preview if it was on that day.
    pub fn leave(&mut self, day_index: usize, locked: bool) {
        if locked {
            return;
        }
        if let DragState::Previewing { meeting_id, preview } = &self.state {
            if preview.day_index == day_index {
                self.state = DragState::Dragging {
                    meeting_id: meeting_id.clone(),
                };
            }
        }
    }

    /// Drop on a day column. Commits the move into `schedule` when valid.
    pub fn drop(
        &mut self,
        schedule: &mut Schedule,
        day_index: usize,
        y_fraction: f64,
        week: &Week,
        config: &CalendarConfig,
        locked: bool,
    ) -> DropOutcome {
        if locked {
            return DropOutcome::Ignored;
        }
        let Some(meeting_id) = self.dragging_id().map(str::to_string) else {
            return DropOutcome::Ignored;
        };
        self.state = DragState::Idle;

        let Some(meeting) = schedule.get(&meeting_id).filter(|m| m.is_user_owned()) else {
            return DropOutcome::Rejected(DropRejection::UnknownMeeting);
        };
        let placement = compute_placement(schedule, meeting, day_index, y_fraction, week, config);
        if placement.out_of_bounds {
            log::debug!("Drop of {} rejected: out of bounds", meeting_id);
            return DropOutcome::Rejected(DropRejection::OutOfBounds);
        }
        if placement.conflict {
            log::debug!("Drop of {} rejected: conflicts on day {}", meeting_id, day_index);
            return DropOutcome::Rejected(DropRejection::Conflict);
        }

        schedule.reschedule(&meeting_id, day_index, placement.start, placement.end);
        DropOutcome::Committed(placement)
    }

    /// Gesture ended without a drop.
    pub fn end(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MS_PER_HOUR;
    use crate::meeting::Attendee;
    use chrono::NaiveDate;

    fn week() -> Week {
        Week::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    /// Meeting on `day` from `from` to `to` minutes after the workday starts.
    fn meeting(id: &str, owner: Attendee, others: &[&str], day: usize, from: i64, to: i64) -> Meeting {
        let base = week().day_start_ms(day, &CalendarConfig::default());
        let mut participants = vec![owner.clone()];
        participants.extend(others.iter().map(|&o| Attendee::employee(o)));
        Meeting {
            id: id.into(),
            owner,
            participants,
            day_index: day,
            start: base + from * MS_PER_MINUTE,
            end: base + to * MS_PER_MINUTE,
        }
    }

    fn fraction(minutes: f64) -> f64 {
        minutes / 540.0
    }

    fn schedule() -> Schedule {
        Schedule::from_meetings([
            meeting("mine", Attendee::User, &["x"], 0, 0, 60),
            meeting("team", Attendee::employee("x"), &["y"], 1, 120, 180),
            meeting("other", Attendee::employee("z"), &[], 1, 0, 540),
        ])
    }

    #[test]
    fn test_placement_snaps_down_to_slot() {
        let config = CalendarConfig::default();
        let s = schedule();
        let p = compute_placement(&s, s.get("mine").unwrap(), 2, fraction(95.0), &week(), &config);
        let base = week().day_start_ms(2, &config);
        assert_eq!(p.start, base + 90 * MS_PER_MINUTE);
        assert_eq!(p.end, base + 150 * MS_PER_MINUTE);
        assert!(p.is_valid());
    }

    #[test]
    fn test_placement_clamped_to_fit_workday() {
        let config = CalendarConfig::default();
        let s = schedule();
        let p = compute_placement(&s, s.get("mine").unwrap(), 2, 1.0, &week(), &config);
        assert_eq!(p.end, week().day_end_ms(2, &config));
        assert!(!p.out_of_bounds);
    }

    #[test]
    fn test_placement_handles_bad_pointer() {
        let config = CalendarConfig::default();
        let s = schedule();
        let p = compute_placement(&s, s.get("mine").unwrap(), 2, f64::NAN, &week(), &config);
        assert_eq!(p.start, week().day_start_ms(2, &config));
        let p = compute_placement(&s, s.get("mine").unwrap(), 2, -3.0, &week(), &config);
        assert_eq!(p.start, week().day_start_ms(2, &config));
    }

    #[test]
    fn test_placement_on_missing_day_is_out_of_bounds() {
        let config = CalendarConfig::default();
        let s = schedule();
        let p = compute_placement(&s, s.get("mine").unwrap(), 5, 0.5, &week(), &config);
        assert!(p.out_of_bounds);
    }

    #[test]
    fn test_conflict_through_shared_participant() {
        let config = CalendarConfig::default();
        let s = schedule();
        // "x" is busy on Tuesday 120..180.
        let p = compute_placement(&s, s.get("mine").unwrap(), 1, fraction(150.0), &week(), &config);
        assert!(p.conflict);
        // "z" is busy all Tuesday but is not in "mine".
        let p = compute_placement(&s, s.get("mine").unwrap(), 1, fraction(300.0), &week(), &config);
        assert!(!p.conflict);
    }

    #[test]
    fn test_own_slot_is_not_a_conflict() {
        let config = CalendarConfig::default();
        let s = schedule();
        let p = compute_placement(&s, s.get("mine").unwrap(), 0, 0.0, &week(), &config);
        assert!(!p.conflict);
    }

    #[test]
    fn test_only_user_meetings_draggable() {
        let s = schedule();
        let mut drag = DragController::new();
        assert!(!drag.start(s.get("team").unwrap(), false));
        assert_eq!(drag.state(), &DragState::Idle);
        assert!(!drag.start(s.get("mine").unwrap(), true));
        assert!(drag.start(s.get("mine").unwrap(), false));
        assert_eq!(drag.dragging_id(), Some("mine"));
    }

    #[test]
    fn test_over_then_leave() {
        let config = CalendarConfig::default();
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        assert!(drag.over(&s, 3, 0.5, &week(), &config, false).is_some());
        assert!(matches!(drag.state(), DragState::Previewing { .. }));
        drag.leave(2, false);
        assert!(drag.preview().is_some());
        drag.leave(3, false);
        assert!(drag.preview().is_none());
        assert_eq!(drag.dragging_id(), Some("mine"));
    }

    #[test]
    fn test_over_conflicting_slot_previews_conflict() {
        let config = CalendarConfig::default();
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        let preview = drag.over(&s, 1, fraction(150.0), &week(), &config, false).cloned().unwrap();
        assert!(preview.conflict);
        assert!(!preview.out_of_bounds);
        assert!(matches!(drag.state(), DragState::Previewing { preview: p, .. } if p.conflict));
    }

    #[test]
    fn test_over_out_of_bounds_clears_preview() {
        let config = CalendarConfig::default();
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        assert!(drag.over(&s, 3, 0.5, &week(), &config, false).is_some());
        assert!(drag.over(&s, 5, 0.5, &week(), &config, false).is_none());
        assert_eq!(
            drag.state(),
            &DragState::Dragging {
                meeting_id: "mine".into()
            }
        );
        assert!(drag.preview().is_none());
    }

    #[test]
    fn test_over_ignored_while_locked() {
        let config = CalendarConfig::default();
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        assert!(drag.over(&s, 3, 0.5, &week(), &config, false).is_some());
        let before = drag.state().clone();
        assert!(drag.over(&s, 2, 0.0, &week(), &config, true).is_none());
        assert_eq!(drag.state(), &before);
        drag.leave(3, true);
        assert_eq!(drag.state(), &before);
    }

    #[test]
    fn test_valid_drop_commits() {
        let config = CalendarConfig::default();
        let mut s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        let out = drag.drop(&mut s, 3, fraction(240.0), &week(), &config, false);
        let DropOutcome::Committed(p) = out else {
            panic!("expected commit, got {out:?}");
        };
        let m = s.get("mine").unwrap();
        assert_eq!((m.day_index, m.start, m.end), (3, p.start, p.end));
        assert_eq!(m.duration_ms(), MS_PER_HOUR);
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_conflicting_drop_leaves_schedule_unchanged() {
        let config = CalendarConfig::default();
        let mut s = schedule();
        let before = s.meetings().to_vec();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        let out = drag.drop(&mut s, 1, fraction(150.0), &week(), &config, false);
        assert_eq!(out, DropOutcome::Rejected(DropRejection::Conflict));
        assert_eq!(s.meetings(), before.as_slice());
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_drop_without_drag_is_ignored() {
        let config = CalendarConfig::default();
        let mut s = schedule();
        let mut drag = DragController::new();
        assert_eq!(drag.drop(&mut s, 0, 0.5, &week(), &config, false), DropOutcome::Ignored);
    }

    #[test]
    fn test_locked_drop_is_ignored() {
        let config = CalendarConfig::default();
        let mut s = schedule();
        let before = s.meetings().to_vec();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        assert_eq!(drag.drop(&mut s, 3, 0.5, &week(), &config, true), DropOutcome::Ignored);
        assert_eq!(s.meetings(), before.as_slice());
    }

    #[test]
    fn test_end_cancels() {
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        drag.end();
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn test_vanished_meeting_rejected() {
        let config = CalendarConfig::default();
        let s = schedule();
        let mut drag = DragController::new();
        drag.start(s.get("mine").unwrap(), false);
        // The week was regenerated mid-drag.
        let mut rebuilt = Schedule::new();
        assert_eq!(
            drag.drop(&mut rebuilt, 0, 0.5, &week(), &config, false),
            DropOutcome::Rejected(DropRejection::UnknownMeeting)
        );
        assert_eq!(drag.state(), &DragState::Idle);
    }
}
