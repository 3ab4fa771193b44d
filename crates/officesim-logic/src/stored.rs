//! Persisted schedules.
//!
//! When the player submits a plan, the whole week's meeting list is stored
//! on the company record next to the week it belongs to. Reading it back is
//! lenient: each record is validated on its own and bad records are
//! dropped, since the document may have been written by an older client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::meeting::{Attendee, Meeting};
use crate::week::Week;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoredMeetingError {
    #[error("record is not an object")]
    NotAnObject,
    #[error("missing or non-string id")]
    MissingId,
    #[error("missing or non-string owner")]
    MissingOwner,
    #[error("day index is missing, fractional, or not a weekday")]
    InvalidDay,
    #[error("start/end are missing, non-finite, or not increasing")]
    InvalidTimes,
}

/// A week's schedule as read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSchedule {
    pub week: Week,
    pub meetings: Vec<Meeting>,
}

/// Numbers, or strings holding numbers.
fn as_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Validate one raw meeting record against a week of `weekdays` days.
pub fn normalize_stored_meeting(raw: &Value, weekdays: usize) -> Result<Meeting, StoredMeetingError> {
    let obj = raw.as_object().ok_or(StoredMeetingError::NotAnObject)?;

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(StoredMeetingError::MissingId)?;
    let owner = obj
        .get("owner")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or(StoredMeetingError::MissingOwner)?;
    let participants: Vec<Attendee> = obj
        .get("participants")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).map(Attendee::from).collect())
        .unwrap_or_default();

    let day = as_number(obj.get("dayIndex"))
        .filter(|d| d.fract() == 0.0 && (0.0..weekdays as f64).contains(d))
        .ok_or(StoredMeetingError::InvalidDay)?;
    let start = as_number(obj.get("start")).ok_or(StoredMeetingError::InvalidTimes)?;
    let end = as_number(obj.get("end")).ok_or(StoredMeetingError::InvalidTimes)?;
    if end <= start {
        return Err(StoredMeetingError::InvalidTimes);
    }

    Ok(Meeting {
        id: id.to_string(),
        owner: Attendee::from(owner),
        participants,
        day_index: day as usize,
        start: start as i64,
        end: end as i64,
    })
}

/// Read a stored schedule. Returns `None` when there is no list, no week,
/// or no valid record.
pub fn read_stored_schedule(
    raw: Option<&Value>,
    week_start_ms: Option<i64>,
    weekdays: usize,
) -> Option<StoredSchedule> {
    let list = raw?.as_array()?;
    let week_start_ms = week_start_ms?;
    let meetings: Vec<Meeting> = list
        .iter()
        .filter_map(|r| match normalize_stored_meeting(r, weekdays) {
            Ok(m) => Some(m),
            Err(e) => {
                log::debug!("Skipping stored meeting: {}", e);
                None
            }
        })
        .collect();
    if meetings.is_empty() {
        return None;
    }
    Some(StoredSchedule {
        week: Week::from_start_ms(week_start_ms),
        meetings,
    })
}

/// Serialise meetings into the stored record shape.
pub fn serialize_meetings(meetings: &[Meeting]) -> Value {
    serde_json::to_value(meetings).unwrap_or(Value::Array(Vec::new()))
}
