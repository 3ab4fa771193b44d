//! Storage abstraction for the calendar view.
//!
//! The view never talks to a database directly. It is handed a
//! [`CalendarStore`] at construction and uses it to watch the company
//! document and the hired roster, to submit plans, and to write back
//! employee colours. [`MemoryStore`] is the in-process implementation used
//! by the tests and the headless harness.

use std::collections::{BTreeMap, HashMap, VecDeque};

use officesim_logic::meeting::Meeting;
use officesim_logic::roster::RosterEntry;
use officesim_logic::stored::serialize_meetings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub type SubscriptionId = u64;

/// Calendar-relevant fields of the company document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanySnapshot {
    /// Simulated clock, epoch milliseconds.
    pub sim_time_ms: Option<i64>,
    /// Raw stored meeting list, validated by the reader.
    pub calendar_schedule: Option<Value>,
    pub calendar_schedule_week_start: Option<i64>,
    /// Week for which a plan was already submitted.
    pub calendar_submitted_week_start: Option<i64>,
    pub focus_points: u64,
}

/// Change notification delivered to a watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Company(CompanySnapshot),
    /// Hired employees only.
    Roster(Vec<RosterEntry>),
}

/// A reschedule plan submitted for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSubmission {
    pub earned_points: u64,
    pub score: f64,
    pub free_hours: f64,
    pub week_start_ms: i64,
    pub schedule: Vec<Meeting>,
}

/// Banked focus point totals before and after a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankedPoints {
    pub previous: u64,
    pub next: u64,
}

impl BankedPoints {
    pub fn added(&self) -> u64 {
        self.next.saturating_sub(self.previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("company {0} not found")]
    CompanyNotFound(String),
    #[error("employee {0} not found")]
    EmployeeNotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait CalendarStore {
    /// Start watching the company document. The current state is
    /// delivered as the first event.
    fn watch_company(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError>;

    /// Start watching the hired roster. The current roster is delivered as
    /// the first event.
    fn watch_roster(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError>;

    /// Stop a watch. Unknown ids are ignored.
    fn unwatch(&mut self, subscription: SubscriptionId);

    /// Drain pending events for one subscription, oldest first.
    fn take_events(&mut self, subscription: SubscriptionId) -> Vec<StoreEvent>;

    /// Bank the plan's points and store its schedule in one transaction.
    fn submit_plan(&mut self, company_id: &str, plan: &PlanSubmission) -> Result<BankedPoints, StoreError>;

    fn save_employee_color(&mut self, company_id: &str, employee_id: &str, color: &str) -> Result<(), StoreError>;
}

impl<S: CalendarStore + ?Sized> CalendarStore for &mut S {
    fn watch_company(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError> {
        (**self).watch_company(company_id)
    }

    fn watch_roster(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError> {
        (**self).watch_roster(company_id)
    }

    fn unwatch(&mut self, subscription: SubscriptionId) {
        (**self).unwatch(subscription)
    }

    fn take_events(&mut self, subscription: SubscriptionId) -> Vec<StoreEvent> {
        (**self).take_events(subscription)
    }

    fn submit_plan(&mut self, company_id: &str, plan: &PlanSubmission) -> Result<BankedPoints, StoreError> {
        (**self).submit_plan(company_id, plan)
    }

    fn save_employee_color(&mut self, company_id: &str, employee_id: &str, color: &str) -> Result<(), StoreError> {
        (**self).save_employee_color(company_id, employee_id, color)
    }
}

/// One employee document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: String,
    pub name: String,
    pub hired: bool,
    pub calendar_color: Option<String>,
}

/// One company document with its employees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub sim_time_ms: Option<i64>,
    pub focus_points: u64,
    pub last_focus_score: Option<f64>,
    pub last_focus_hours: Option<f64>,
    pub last_focus_points_earned: Option<u64>,
    pub calendar_schedule: Option<Vec<Meeting>>,
    pub calendar_schedule_week_start: Option<i64>,
    pub calendar_submitted_week_start: Option<i64>,
    pub employees: Vec<EmployeeRecord>,
}

impl CompanyRecord {
    fn snapshot(&self) -> CompanySnapshot {
        CompanySnapshot {
            sim_time_ms: self.sim_time_ms,
            calendar_schedule: self.calendar_schedule.as_deref().map(serialize_meetings),
            calendar_schedule_week_start: self.calendar_schedule_week_start,
            calendar_submitted_week_start: self.calendar_submitted_week_start,
            focus_points: self.focus_points,
        }
    }

    fn roster(&self) -> Vec<RosterEntry> {
        self.employees
            .iter()
            .filter(|e| e.hired)
            .map(|e| RosterEntry {
                id: e.id.clone(),
                name: e.name.clone(),
                stored_color: e.calendar_color.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchKind {
    Company,
    Roster,
}

#[derive(Debug)]
struct Watch {
    company_id: String,
    kind: WatchKind,
    pending: VecDeque<StoreEvent>,
}

/// In-process [`CalendarStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    companies: BTreeMap<String, CompanyRecord>,
    watches: HashMap<SubscriptionId, Watch>,
    next_subscription: SubscriptionId,
    /// While set, every submission fails with this message.
    fail_submissions: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_companies(companies: BTreeMap<String, CompanyRecord>) -> Self {
        Self {
            companies,
            ..Self::default()
        }
    }

    pub fn companies(&self) -> &BTreeMap<String, CompanyRecord> {
        &self.companies
    }

    pub fn company(&self, company_id: &str) -> Option<&CompanyRecord> {
        self.companies.get(company_id)
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    pub fn insert_company(&mut self, company_id: &str, record: CompanyRecord) {
        self.companies.insert(company_id.to_string(), record);
        self.notify(company_id, WatchKind::Company);
        self.notify(company_id, WatchKind::Roster);
    }

    pub fn set_sim_time(&mut self, company_id: &str, sim_time_ms: i64) -> Result<(), StoreError> {
        self.company_mut(company_id)?.sim_time_ms = Some(sim_time_ms);
        self.notify(company_id, WatchKind::Company);
        Ok(())
    }

    /// Add (or re-hire) an employee.
    pub fn hire(&mut self, company_id: &str, id: &str, name: &str) -> Result<(), StoreError> {
        let company = self.company_mut(company_id)?;
        match company.employees.iter_mut().find(|e| e.id == id) {
            Some(e) => {
                e.hired = true;
                e.name = name.to_string();
            }
            None => company.employees.push(EmployeeRecord {
                id: id.to_string(),
                name: name.to_string(),
                hired: true,
                calendar_color: None,
            }),
        }
        self.notify(company_id, WatchKind::Roster);
        Ok(())
    }

    pub fn fire(&mut self, company_id: &str, id: &str) -> Result<(), StoreError> {
        let employee = self
            .company_mut(company_id)?
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::EmployeeNotFound(id.to_string()))?;
        employee.hired = false;
        self.notify(company_id, WatchKind::Roster);
        Ok(())
    }

    pub fn fail_submissions(&mut self, reason: Option<&str>) {
        self.fail_submissions = reason.map(String::from);
    }

    fn company_mut(&mut self, company_id: &str) -> Result<&mut CompanyRecord, StoreError> {
        self.companies
            .get_mut(company_id)
            .ok_or_else(|| StoreError::CompanyNotFound(company_id.to_string()))
    }

    fn event_for(&self, company_id: &str, kind: WatchKind) -> Option<StoreEvent> {
        let company = self.companies.get(company_id)?;
        Some(match kind {
            WatchKind::Company => StoreEvent::Company(company.snapshot()),
            WatchKind::Roster => StoreEvent::Roster(company.roster()),
        })
    }

    fn notify(&mut self, company_id: &str, kind: WatchKind) {
        let Some(event) = self.event_for(company_id, kind) else {
            return;
        };
        for watch in self.watches.values_mut() {
            if watch.kind == kind && watch.company_id == company_id {
                watch.pending.push_back(event.clone());
            }
        }
    }

    fn watch(&mut self, company_id: &str, kind: WatchKind) -> Result<SubscriptionId, StoreError> {
        let first = self
            .event_for(company_id, kind)
            .ok_or_else(|| StoreError::CompanyNotFound(company_id.to_string()))?;
        self.next_subscription += 1;
        let id = self.next_subscription;
        self.watches.insert(
            id,
            Watch {
                company_id: company_id.to_string(),
                kind,
                pending: VecDeque::from([first]),
            },
        );
        Ok(id)
    }
}

impl CalendarStore for MemoryStore {
    fn watch_company(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError> {
        self.watch(company_id, WatchKind::Company)
    }

    fn watch_roster(&mut self, company_id: &str) -> Result<SubscriptionId, StoreError> {
        self.watch(company_id, WatchKind::Roster)
    }

    fn unwatch(&mut self, subscription: SubscriptionId) {
        self.watches.remove(&subscription);
    }

    fn take_events(&mut self, subscription: SubscriptionId) -> Vec<StoreEvent> {
        self.watches
            .get_mut(&subscription)
            .map(|w| w.pending.drain(..).collect::<Vec<_>>())
            .unwrap_or_default()
    }

    fn submit_plan(&mut self, company_id: &str, plan: &PlanSubmission) -> Result<BankedPoints, StoreError> {
        if let Some(reason) = &self.fail_submissions {
            return Err(StoreError::Unavailable(reason.clone()));
        }
        let company = self.company_mut(company_id)?;
        let previous = company.focus_points;
        let next = previous + plan.earned_points;
        company.focus_points = next;
        company.last_focus_score = Some(plan.score);
        company.last_focus_hours = Some(plan.free_hours);
        company.last_focus_points_earned = Some(plan.earned_points);
        company.calendar_submitted_week_start = Some(plan.week_start_ms);
        company.calendar_schedule_week_start = Some(plan.week_start_ms);
        company.calendar_schedule = Some(plan.schedule.clone());
        self.notify(company_id, WatchKind::Company);
        Ok(BankedPoints { previous, next })
    }

    fn save_employee_color(&mut self, company_id: &str, employee_id: &str, color: &str) -> Result<(), StoreError> {
        let employee = self
            .company_mut(company_id)?
            .employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| StoreError::EmployeeNotFound(employee_id.to_string()))?;
        employee.calendar_color = Some(color.to_string());
        self.notify(company_id, WatchKind::Roster);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut s = MemoryStore::new();
        s.insert_company("acme", CompanyRecord::default());
        s.hire("acme", "e1", "Ada").unwrap();
        s
    }

    fn plan(points: u64) -> PlanSubmission {
        PlanSubmission {
            earned_points: points,
            score: points as f64,
            free_hours: 10.0,
            week_start_ms: 1000,
            schedule: vec![],
        }
    }

    #[test]
    fn test_watch_delivers_current_state_first() {
        let mut s = store();
        let sub = s.watch_roster("acme").unwrap();
        let events = s.take_events(sub);
        assert_eq!(events.len(), 1);
        let StoreEvent::Roster(entries) = &events[0] else {
            panic!("expected roster event");
        };
        assert_eq!(entries[0].id, "e1");
        assert!(s.take_events(sub).is_empty());
    }

    #[test]
    fn test_watch_unknown_company_fails() {
        let mut s = store();
        assert_eq!(
            s.watch_company("nope"),
            Err(StoreError::CompanyNotFound("nope".into()))
        );
    }

    #[test]
    fn test_changes_reach_matching_watchers_only() {
        let mut s = store();
        let company = s.watch_company("acme").unwrap();
        let roster = s.watch_roster("acme").unwrap();
        s.take_events(company);
        s.take_events(roster);

        s.set_sim_time("acme", 42).unwrap();
        assert_eq!(s.take_events(roster).len(), 0);
        let events = s.take_events(company);
        assert!(matches!(&events[..], [StoreEvent::Company(c)] if c.sim_time_ms == Some(42)));
    }

    #[test]
    fn test_fired_employees_leave_roster() {
        let mut s = store();
        s.hire("acme", "e2", "Ben").unwrap();
        s.fire("acme", "e1").unwrap();
        let sub = s.watch_roster("acme").unwrap();
        let StoreEvent::Roster(entries) = &s.take_events(sub)[0] else {
            panic!("expected roster event");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "e2");
    }

    #[test]
    fn test_unwatch_stops_delivery() {
        let mut s = store();
        let sub = s.watch_company("acme").unwrap();
        s.unwatch(sub);
        s.set_sim_time("acme", 1).unwrap();
        assert!(s.take_events(sub).is_empty());
        assert_eq!(s.watch_count(), 0);
    }

    #[test]
    fn test_submissions_accumulate_points() {
        let mut s = store();
        assert_eq!(s.submit_plan("acme", &plan(10)).unwrap(), BankedPoints { previous: 0, next: 10 });
        let banked = s.submit_plan("acme", &plan(5)).unwrap();
        assert_eq!(banked.added(), 5);
        let c = s.company("acme").unwrap();
        assert_eq!(c.focus_points, 15);
        assert_eq!(c.calendar_submitted_week_start, Some(1000));
        assert_eq!(c.last_focus_points_earned, Some(5));
    }

    #[test]
    fn test_failing_store_rejects_submissions() {
        let mut s = store();
        s.fail_submissions(Some("offline"));
        assert!(matches!(s.submit_plan("acme", &plan(1)), Err(StoreError::Unavailable(_))));
        assert_eq!(s.company("acme").unwrap().focus_points, 0);
    }

    #[test]
    fn test_color_write_back() {
        let mut s = store();
        s.save_employee_color("acme", "e1", "#118ab2").unwrap();
        assert_eq!(
            s.company("acme").unwrap().employees[0].calendar_color.as_deref(),
            Some("#118ab2")
        );
        assert!(s.save_employee_color("acme", "ghost", "#000").is_err());
    }
}
