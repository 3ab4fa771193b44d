//! Weekly schedule: storage, per-attendee index, and deterministic generation.
//!
//! A [`Schedule`] owns the week's meetings together with an index from each
//! attendee to the meetings they belong to, so conflict checks only look at
//! one person's meetings instead of the whole week.
//!
//! # Generation
//!
//! [`generate_schedule`] fills a week from a seed string and the roster:
//!
//! 1. Per weekday, 3–6 meetings for the user (2–3 with no coworkers), each
//!    with up to three coworkers and a 30- or 60-minute duration.
//! 2. Then 2–4 team meetings among coworkers (1 attempt with none), owned by
//!    the first picked coworker.
//! 3. Each meeting gets up to 24 randomised, slot-aligned placement
//!    attempts. A candidate is rejected if any attendee already has an
//!    overlapping meeting that day. If every attempt fails the meeting is
//!    dropped.
//!
//! The same seed and roster always produce the same meetings.

use std::collections::HashMap;

use crate::config::CalendarConfig;
use crate::constants::{generation, MS_PER_MINUTE};
use crate::meeting::{dedup_party, Attendee, Meeting};
use crate::rng::SeedRng;
use crate::roster::Employee;
use crate::week::Week;

/// The week's meetings plus an attendee → meetings index.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    meetings: Vec<Meeting>,
    /// Positions into `meetings`. Meetings are never removed, so positions
    /// stay valid.
    by_attendee: HashMap<Attendee, Vec<usize>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a schedule (and its index) from a stored meeting list.
    pub fn from_meetings(meetings: impl IntoIterator<Item = Meeting>) -> Self {
        let mut schedule = Self::new();
        for m in meetings {
            schedule.add(m);
        }
        schedule
    }

    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    pub fn into_meetings(self) -> Vec<Meeting> {
        self.meetings
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Meeting> {
        self.meetings.iter().find(|m| m.id == id)
    }

    /// Meetings owned by the user, in insertion order.
    pub fn user_meetings(&self) -> impl Iterator<Item = &Meeting> {
        self.meetings.iter().filter(|m| m.is_user_owned())
    }

    /// Meetings the given attendee belongs to, across all days.
    pub fn meetings_of<'a>(&'a self, who: &Attendee) -> impl Iterator<Item = &'a Meeting> + 'a {
        self.by_attendee
            .get(who)
            .into_iter()
            .flatten()
            .map(move |&i| &self.meetings[i])
    }

    pub fn add(&mut self, meeting: Meeting) {
        let pos = self.meetings.len();
        for a in meeting.attendees() {
            self.by_attendee.entry(a).or_default().push(pos);
        }
        self.meetings.push(meeting);
    }

    /// Whether any of `party` already has a meeting on `day_index`
    /// overlapping `[start, end)`, ignoring the meeting with id `ignore_id`.
    pub fn has_conflict(
        &self,
        party: &[Attendee],
        day_index: usize,
        start: i64,
        end: i64,
        ignore_id: Option<&str>,
    ) -> bool {
        party.iter().any(|who| {
            self.meetings_of(who).any(|m| {
                Some(m.id.as_str()) != ignore_id && m.day_index == day_index && m.overlaps(start, end)
            })
        })
    }

    /// Whether moving meeting `id` to `[start, end)` on `day_index` would
    /// collide with another meeting of any of its attendees.
    ///
    /// Unknown ids report no conflict.
    pub fn move_conflicts(&self, id: &str, day_index: usize, start: i64, end: i64) -> bool {
        match self.get(id) {
            Some(m) => self.has_conflict(&m.attendees(), day_index, start, end, Some(id)),
            None => false,
        }
    }

    /// Move a meeting in place and reindex its attendees.
    ///
    /// No validation happens here; callers check bounds and conflicts
    /// first. Returns `false` if the id is unknown.
    pub fn reschedule(&mut self, id: &str, day_index: usize, start: i64, end: i64) -> bool {
        let Some(pos) = self.meetings.iter().position(|m| m.id == id) else {
            return false;
        };
        for a in self.meetings[pos].attendees() {
            if let Some(list) = self.by_attendee.get_mut(&a) {
                list.retain(|&i| i != pos);
            }
        }
        let meeting = &mut self.meetings[pos];
        meeting.day_index = day_index;
        meeting.start = start;
        meeting.end = end;
        for a in meeting.attendees() {
            self.by_attendee.entry(a).or_default().push(pos);
        }
        true
    }
}

/// Generates a week's schedule from a seed.
pub struct ScheduleGenerator<'a> {
    config: &'a CalendarConfig,
    week: Week,
    employees: &'a [Employee],
    rng: SeedRng,
    schedule: Schedule,
    dropped: usize,
}

impl<'a> ScheduleGenerator<'a> {
    pub fn new(config: &'a CalendarConfig, week: Week, employees: &'a [Employee], seed: &str) -> Self {
        Self {
            config,
            week,
            employees,
            rng: SeedRng::from_seed(seed),
            schedule: Schedule::new(),
            dropped: 0,
        }
    }

    /// Run generation for every configured weekday.
    pub fn generate(mut self) -> GeneratedSchedule {
        let n = self.employees.len();
        let durations = self.config.durations_minutes.clone();
        if durations.is_empty() {
            return GeneratedSchedule {
                schedule: self.schedule,
                dropped: 0,
            };
        }

        for day in 0..self.config.weekdays {
            let user_count = if n > 0 { 3 + self.rng.below(4) } else { 2 + self.rng.below(2) };
            for _ in 0..user_count {
                let coworkers = if n > 0 {
                    1 + self
                        .rng
                        .below(n.min(generation::MAX_COWORKERS_PER_MEETING))
                } else {
                    0
                };
                let mut participants = vec![Attendee::User];
                participants.extend(self.pick_participants(coworkers));
                let duration = durations[self.rng.below(durations.len())];
                self.place(Attendee::User, &participants, day, duration);
            }

            let team_count = if n > 0 { 2 + self.rng.below(3) } else { 1 };
            for j in 0..team_count {
                let size = 1 + self.rng.below(
                    generation::MAX_COWORKERS_PER_MEETING.min(n.saturating_sub(1)),
                );
                let group = self.pick_participants(size);
                let Some(owner) = group.first().cloned() else {
                    continue;
                };
                let duration = durations[(j + day) % durations.len()];
                self.place(owner, &group, day, duration);
            }
        }

        log::debug!(
            "Generated {} meetings ({} dropped) for week {}",
            self.schedule.len(),
            self.dropped,
            self.week.start_date()
        );
        GeneratedSchedule {
            schedule: self.schedule,
            dropped: self.dropped,
        }
    }

    /// Draw up to `count` distinct coworkers in roster order.
    fn pick_participants(&mut self, count: usize) -> Vec<Attendee> {
        let mut pool: Vec<&Employee> = self.employees.iter().collect();
        let mut picked = Vec::with_capacity(count);
        for _ in 0..count {
            if pool.is_empty() {
                break;
            }
            let idx = self.rng.below(pool.len());
            picked.push(Attendee::employee(pool.remove(idx).id.clone()));
        }
        picked
    }

    fn place(&mut self, owner: Attendee, participants: &[Attendee], day: usize, duration_minutes: u32) {
        let work_minutes = self.config.work_minutes();
        let latest_start = work_minutes - duration_minutes as i64;
        if latest_start < 0 {
            self.dropped += 1;
            return;
        }
        let day_start = self.week.day_start_ms(day, self.config);
        let day_end = day_start + self.config.work_ms();
        let slot = self.config.slot_minutes.max(1) as i64;
        let party = dedup_party(&owner, participants);

        for _ in 0..self.config.max_placement_attempts {
            let offset = self.rng.below(latest_start as usize + 1) as i64;
            let aligned = offset / slot * slot;
            let start = day_start + aligned * MS_PER_MINUTE;
            let end = start + duration_minutes as i64 * MS_PER_MINUTE;
            if end > day_end {
                continue;
            }
            if self.schedule.has_conflict(&party, day, start, end, None) {
                continue;
            }
            let suffix = self.rng.below(generation::ID_SUFFIX_RANGE);
            self.schedule.add(Meeting {
                id: format!("{owner}-{day}-{start}-{end}-{suffix}"),
                owner,
                participants: party,
                day_index: day,
                start,
                end,
            });
            return;
        }
        self.dropped += 1;
    }
}

/// Output of [`ScheduleGenerator::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedSchedule {
    pub schedule: Schedule,
    /// Meetings that found no free slot.
    pub dropped: usize,
}

/// Generate the schedule for `week` from `seed` and the sorted roster.
pub fn generate_schedule(seed: &str, week: Week, employees: &[Employee], config: &CalendarConfig) -> Schedule {
    ScheduleGenerator::new(config, week, employees, seed).generate().schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week() -> Week {
        Week::starting(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    fn employees(n: usize) -> Vec<Employee> {
        (0..n)
            .map(|i| Employee {
                id: format!("emp-{i}"),
                name: format!("Employee {i:02}"),
                color: "#118ab2".into(),
            })
            .collect()
    }

    fn meeting(id: &str, owner: Attendee, others: &[&str], day: usize, start: i64, end: i64) -> Meeting {
        let mut participants = vec![owner.clone()];
        participants.extend(others.iter().map(|&o| Attendee::employee(o)));
        Meeting {
            id: id.into(),
            owner,
            participants,
            day_index: day,
            start,
            end,
        }
    }

    fn assert_no_overlaps(schedule: &Schedule) {
        let ms = schedule.meetings();
        for (i, a) in ms.iter().enumerate() {
            for b in &ms[i + 1..] {
                if a.day_index != b.day_index || !a.overlaps(b.start, b.end) {
                    continue;
                }
                let shared = a.attendees().iter().any(|p| b.has_attendee(p));
                assert!(!shared, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    #[test]
    fn test_index_tracks_attendees() {
        let mut s = Schedule::new();
        s.add(meeting("a", Attendee::User, &["x"], 0, 0, 10));
        s.add(meeting("b", Attendee::employee("x"), &["y"], 1, 0, 10));
        assert_eq!(s.meetings_of(&Attendee::employee("x")).count(), 2);
        assert_eq!(s.meetings_of(&Attendee::User).count(), 1);
        assert_eq!(s.meetings_of(&Attendee::employee("nobody")).count(), 0);
    }

    #[test]
    fn test_conflict_requires_shared_attendee_and_day() {
        let mut s = Schedule::new();
        s.add(meeting("a", Attendee::User, &["x"], 0, 0, 100));
        let x = [Attendee::employee("x")];
        let y = [Attendee::employee("y")];
        assert!(s.has_conflict(&x, 0, 50, 150, None));
        assert!(!s.has_conflict(&y, 0, 50, 150, None));
        assert!(!s.has_conflict(&x, 1, 50, 150, None));
        assert!(!s.has_conflict(&x, 0, 100, 150, None));
        assert!(!s.has_conflict(&x, 0, 50, 150, Some("a")));
    }

    #[test]
    fn test_reschedule_moves_and_reindexes() {
        let mut s = Schedule::new();
        s.add(meeting("a", Attendee::User, &["x"], 0, 0, 100));
        s.add(meeting("b", Attendee::User, &[], 0, 200, 300));
        assert!(s.reschedule("a", 2, 400, 500));
        let a = s.get("a").unwrap();
        assert_eq!((a.day_index, a.start, a.end), (2, 400, 500));
        assert!(s.has_conflict(&[Attendee::employee("x")], 2, 450, 460, None));
        assert!(!s.has_conflict(&[Attendee::employee("x")], 0, 0, 100, None));
        assert_eq!(s.meetings_of(&Attendee::User).count(), 2);
        assert!(!s.reschedule("missing", 0, 0, 1));
    }

    #[test]
    fn test_move_conflicts_excludes_self() {
        let mut s = Schedule::new();
        s.add(meeting("a", Attendee::User, &["x"], 0, 0, 100));
        s.add(meeting("b", Attendee::employee("x"), &[], 0, 200, 300));
        assert!(!s.move_conflicts("a", 0, 50, 150));
        assert!(s.move_conflicts("a", 0, 150, 250));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = CalendarConfig::default();
        let staff = employees(3);
        let a = generate_schedule("acme-2024-01-01-3", week(), &staff, &config);
        let b = generate_schedule("acme-2024-01-01-3", week(), &staff, &config);
        assert_eq!(a.meetings(), b.meetings());
        assert!(!a.is_empty());
    }

    #[test]
    fn test_different_seed_different_schedule() {
        let config = CalendarConfig::default();
        let staff = employees(3);
        let a = generate_schedule("acme-2024-01-01-3", week(), &staff, &config);
        let b = generate_schedule("globex-2024-01-01-3", week(), &staff, &config);
        assert_ne!(a.meetings(), b.meetings());
    }

    #[test]
    fn test_generated_meetings_never_overlap_for_shared_attendees() {
        let config = CalendarConfig::default();
        for n in [0, 1, 2, 5, 12] {
            let staff = employees(n);
            let seed = format!("acme-2024-01-01-{n}");
            assert_no_overlaps(&generate_schedule(&seed, week(), &staff, &config));
        }
    }

    #[test]
    fn test_generated_meetings_inside_workday_and_aligned() {
        let config = CalendarConfig::default();
        let s = generate_schedule("align", week(), &employees(4), &config);
        for m in s.meetings() {
            let day_start = week().day_start_ms(m.day_index, &config);
            assert!(m.start >= day_start);
            assert!(m.end <= week().day_end_ms(m.day_index, &config));
            assert_eq!((m.start - day_start) % config.slot_ms(), 0);
            assert!(m.duration_ms() == 30 * MS_PER_MINUTE || m.duration_ms() == 60 * MS_PER_MINUTE);
        }
    }

    #[test]
    fn test_user_only_week() {
        let config = CalendarConfig::default();
        let s = generate_schedule("solo", week(), &[], &config);
        assert!(s.meetings().iter().all(|m| m.is_user_owned()));
        assert!(s.meetings().iter().all(|m| m.participants == vec![Attendee::User]));
        // 2–3 per day, at most.
        assert!(s.len() <= 15);
    }

    #[test]
    fn test_user_meetings_have_coworkers_when_staffed() {
        let config = CalendarConfig::default();
        let s = generate_schedule("staffed", week(), &employees(3), &config);
        for m in s.user_meetings() {
            let coworkers = m.participants.len() - 1;
            assert!((1..=3).contains(&coworkers), "{m:?}");
            assert_eq!(m.participants[0], Attendee::User);
        }
    }

    #[test]
    fn test_team_meetings_owned_by_first_participant() {
        let config = CalendarConfig::default();
        let s = generate_schedule("teams", week(), &employees(5), &config);
        let team: Vec<_> = s.meetings().iter().filter(|m| !m.is_user_owned()).collect();
        assert!(!team.is_empty());
        for m in team {
            assert_eq!(m.participants[0], m.owner);
            assert!(!m.has_attendee(&Attendee::User));
        }
    }

    #[test]
    fn test_ids_encode_owner_day_and_bounds() {
        let config = CalendarConfig::default();
        let s = generate_schedule("ids", week(), &employees(2), &config);
        for m in s.meetings() {
            let prefix = format!("{}-{}-{}-{}-", m.owner, m.day_index, m.start, m.end);
            assert!(m.id.starts_with(&prefix), "{}", m.id);
        }
    }

    #[test]
    fn test_from_meetings_rebuilds_index() {
        let config = CalendarConfig::default();
        let s = generate_schedule("rebuild", week(), &employees(3), &config);
        let rebuilt = Schedule::from_meetings(s.meetings().to_vec());
        for m in s.meetings() {
            assert_eq!(
                rebuilt.move_conflicts(&m.id, m.day_index, m.start, m.end),
                s.move_conflicts(&m.id, m.day_index, m.start, m.end)
            );
            assert!(!rebuilt.move_conflicts(&m.id, m.day_index, m.start, m.end));
        }
    }

    #[test]
    fn test_impossible_duration_is_dropped() {
        let config = CalendarConfig {
            durations_minutes: vec![600],
            ..Default::default()
        };
        let out = ScheduleGenerator::new(&config, week(), &[], "long").generate();
        assert!(out.schedule.is_empty());
        assert!(out.dropped > 0);
    }
}
