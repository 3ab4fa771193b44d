//! Meetings and their attendees.
//!
//! A meeting belongs to one day of the simulated week and carries absolute
//! epoch-millisecond bounds. Attendees are either the player or an employee;
//! on the wire the player is the string `"me"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::USER_ID;

/// Someone who can own or attend a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Attendee {
    /// The player.
    User,
    /// A hired employee, by document id.
    Employee(String),
}

impl Attendee {
    pub fn employee(id: impl Into<String>) -> Self {
        Attendee::from(id.into())
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Attendee::User)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Attendee::User => USER_ID,
            Attendee::Employee(id) => id,
        }
    }
}

impl From<String> for Attendee {
    fn from(id: String) -> Self {
        if id == USER_ID {
            Attendee::User
        } else {
            Attendee::Employee(id)
        }
    }
}

impl From<&str> for Attendee {
    fn from(id: &str) -> Self {
        Attendee::from(id.to_string())
    }
}

impl From<Attendee> for String {
    fn from(a: Attendee) -> Self {
        match a {
            Attendee::User => USER_ID.to_string(),
            Attendee::Employee(id) => id,
        }
    }
}

impl fmt::Display for Attendee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub owner: Attendee,
    /// Owner first, no duplicates.
    pub participants: Vec<Attendee>,
    /// 0 = Monday … 4 = Friday.
    pub day_index: usize,
    /// Epoch milliseconds.
    pub start: i64,
    pub end: i64,
}

impl Meeting {
    /// Owner plus participants, de-duplicated, in first-seen order.
    pub fn attendees(&self) -> Vec<Attendee> {
        dedup_party(&self.owner, &self.participants)
    }

    pub fn has_attendee(&self, who: &Attendee) -> bool {
        &self.owner == who || self.participants.contains(who)
    }

    pub fn is_user_owned(&self) -> bool {
        self.owner.is_user()
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Half-open interval overlap: touching meetings do not overlap.
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        intervals_overlap(self.start, self.end, start, end)
    }
}

/// `[a_start, a_end)` and `[b_start, b_end)` share at least one instant.
pub fn intervals_overlap(a_start: i64, a_end: i64, b_start: i64, b_end: i64) -> bool {
    a_start < b_end && b_start < a_end
}

/// Owner followed by the participants, duplicates removed.
pub fn dedup_party(owner: &Attendee, participants: &[Attendee]) -> Vec<Attendee> {
    let mut party = Vec::with_capacity(participants.len() + 1);
    for a in std::iter::once(owner).chain(participants) {
        if !party.contains(a) {
            party.push(a.clone());
        }
    }
    party
}
