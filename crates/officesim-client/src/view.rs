//! Calendar view-model.
//!
//! [`CalendarView`] owns everything the calendar screen shows: the roster,
//! which coworkers are visible, the week's meetings and their layout, the
//! focus score, and the in-flight drag. Store snapshots are pulled in with
//! [`CalendarView::sync`]; every other method is a user action.

use std::collections::HashSet;

use officesim_logic::config::CalendarConfig;
use officesim_logic::constants::colors;
use officesim_logic::drag::{DragController, DropOutcome, Placement};
use officesim_logic::focus::{compute_focus, FocusReport};
use officesim_logic::layout::{build_week_layout, VisualMeeting};
use officesim_logic::meeting::{Attendee, Meeting};
use officesim_logic::roster::{build_employees, normalize_color, Employee, RosterEntry};
use officesim_logic::schedule::{generate_schedule, Schedule};
use officesim_logic::stored::{read_stored_schedule, StoredSchedule};
use officesim_logic::week::{schedule_seed, time_ticks, Week};
use thiserror::Error;

use crate::store::{CalendarStore, CompanySnapshot, PlanSubmission, StoreError, StoreEvent, SubscriptionId};

/// Coworkers shown by default when nothing is selected yet.
const DEFAULT_VISIBLE_COWORKERS: usize = 3;

pub const MSG_ALREADY_SUBMITTED: &str = "Already submitted for this week.";
pub const MSG_NO_WEEK: &str = "Unable to determine the current week. Please try again.";
pub const MSG_NO_COMPANY: &str = "No company selected.";
pub const MSG_SUBMITTED: &str = "Submitted your reschedule plan for scoring.";
pub const MSG_SUBMIT_FAILED: &str = "Failed to store focus points. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("plan already submitted for this week")]
    Locked,
    #[error("current week is unknown")]
    NoWeek,
    #[error("no company selected")]
    NoCompany,
    #[error("store rejected the plan: {0}")]
    Store(#[from] StoreError),
}

/// User-facing status line. At most one of the two is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub error: String,
}

impl Status {
    fn info(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.error.clear();
    }

    fn fail(&mut self, error: impl Into<String>) {
        self.error = error.into();
        self.message.clear();
    }

    fn clear(&mut self) {
        self.message.clear();
        self.error.clear();
    }
}

pub struct CalendarView<S: CalendarStore> {
    company_id: String,
    config: CalendarConfig,
    store: S,
    company_sub: Option<SubscriptionId>,
    roster_sub: Option<SubscriptionId>,

    employees: Vec<Employee>,
    selected_employees: HashSet<String>,
    sim_time_ms: Option<i64>,
    week: Option<Week>,
    seed_key: String,
    schedule: Schedule,
    layout: Vec<Vec<VisualMeeting>>,
    stored: Option<StoredSchedule>,
    submitted_week_start: Option<i64>,
    locked: bool,

    focus: FocusReport,
    focus_points: u64,
    submitted_score: Option<f64>,
    last_earned_points: Option<u64>,

    selected_meeting: Option<String>,
    drag: DragController,
    status: Status,
}

impl<S: CalendarStore> CalendarView<S> {
    pub fn new(company_id: impl Into<String>, config: CalendarConfig, store: S) -> Self {
        Self {
            company_id: company_id.into(),
            config,
            store,
            company_sub: None,
            roster_sub: None,
            employees: Vec::new(),
            selected_employees: HashSet::new(),
            sim_time_ms: None,
            week: None,
            seed_key: String::new(),
            schedule: Schedule::new(),
            layout: Vec::new(),
            stored: None,
            submitted_week_start: None,
            locked: false,
            focus: FocusReport::default(),
            focus_points: 0,
            submitted_score: None,
            last_earned_points: None,
            selected_meeting: None,
            drag: DragController::new(),
            status: Status::default(),
        }
    }

    // ── Watch lifecycle ─────────────────────────────────────────────────

    /// Subscribe to the company and its roster. A view without a company
    /// stays idle.
    pub fn start_watching(&mut self) -> Result<(), StoreError> {
        self.stop_watching();
        if self.company_id.is_empty() {
            return Ok(());
        }
        self.company_sub = Some(self.store.watch_company(&self.company_id)?);
        match self.store.watch_roster(&self.company_id) {
            Ok(id) => self.roster_sub = Some(id),
            Err(e) => {
                self.stop_watching();
                return Err(e);
            }
        }
        log::info!("Watching calendar for company {}", self.company_id);
        Ok(())
    }

    pub fn stop_watching(&mut self) {
        for sub in [self.company_sub.take(), self.roster_sub.take()].into_iter().flatten() {
            self.store.unwatch(sub);
        }
    }

    pub fn is_watching(&self) -> bool {
        self.company_sub.is_some() || self.roster_sub.is_some()
    }

    /// Apply every pending store event. Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut events = Vec::new();
        if let Some(sub) = self.company_sub {
            events.extend(self.store.take_events(sub));
        }
        if let Some(sub) = self.roster_sub {
            events.extend(self.store.take_events(sub));
        }
        let count = events.len();
        for event in events {
            match event {
                StoreEvent::Company(snapshot) => self.apply_company_snapshot(snapshot),
                StoreEvent::Roster(entries) => self.apply_roster(&entries),
            }
        }
        count
    }

    // ── Snapshots ───────────────────────────────────────────────────────

    pub fn apply_company_snapshot(&mut self, snapshot: CompanySnapshot) {
        if let Some(t) = snapshot.sim_time_ms {
            self.sim_time_ms = Some(t);
        }
        self.stored = read_stored_schedule(
            snapshot.calendar_schedule.as_ref(),
            snapshot.calendar_schedule_week_start,
            self.config.weekdays,
        );
        self.submitted_week_start = snapshot.calendar_submitted_week_start;
        self.update_week_if_needed(false);
        self.focus_points = snapshot.focus_points;
    }

    pub fn apply_roster(&mut self, entries: &[RosterEntry]) {
        let color_seed = if self.company_id.is_empty() {
            colors::DEFAULT_SEED
        } else {
            self.company_id.as_str()
        };
        let employees = build_employees(entries, color_seed, &self.config.palette);
        let changed = employees != self.employees;
        self.employees = employees;
        self.persist_employee_colors(entries);

        let mut selection = std::mem::take(&mut self.selected_employees);
        if selection.is_empty() {
            selection.extend(
                self.employees
                    .iter()
                    .take(DEFAULT_VISIBLE_COWORKERS)
                    .map(|e| e.id.clone()),
            );
        }
        selection.retain(|id| self.employees.iter().any(|e| &e.id == id));
        if selection.is_empty() {
            if let Some(first) = self.employees.first() {
                selection.insert(first.id.clone());
            }
        }
        self.selected_employees = selection;
        log::debug!(
            "Roster: {} employees, {} visible",
            self.employees.len(),
            self.selected_employees.len()
        );
        self.update_week_if_needed(changed);
    }

    fn persist_employee_colors(&mut self, entries: &[RosterEntry]) {
        if self.company_id.is_empty() {
            return;
        }
        for entry in entries {
            let Some(assigned) = self.employees.iter().find(|e| e.id == entry.id).map(|e| e.color.clone()) else {
                continue;
            };
            let stored = entry.stored_color.as_deref().and_then(normalize_color);
            if stored.as_deref() == Some(assigned.as_str()) {
                continue;
            }
            if let Err(e) = self.store.save_employee_color(&self.company_id, &entry.id, &assigned) {
                log::warn!("Failed to store colour for employee {}: {}", entry.id, e);
            }
        }
    }

    // ── Week and schedule ───────────────────────────────────────────────

    fn update_week_if_needed(&mut self, force: bool) {
        let Some(next_week) = self.sim_time_ms.and_then(Week::following) else {
            return;
        };
        let ids: Vec<&str> = self.employees.iter().map(|e| e.id.as_str()).collect();
        let seed_key = format!("{}-{}", next_week.start_ms(), ids.join("|"));
        let week_changed = self.week != Some(next_week);
        let seed_changed = self.seed_key != seed_key;

        if force || week_changed || seed_changed {
            self.week = Some(next_week);
            self.seed_key = seed_key;
            let restored = self
                .stored
                .as_ref()
                .filter(|s| s.week == next_week)
                .map(|s| s.meetings.clone());
            match restored {
                Some(meetings) => {
                    log::info!("Restoring {} stored meetings for week {}", meetings.len(), next_week.start_ms());
                    self.apply_meetings(Schedule::from_meetings(meetings));
                }
                None => self.build_meetings(next_week),
            }
        } else {
            self.recompute();
        }
        self.apply_lock();
    }

    fn build_meetings(&mut self, week: Week) {
        let seed = schedule_seed(&self.company_id, &week, self.employees.len());
        let schedule = generate_schedule(&seed, week, &self.employees, &self.config);
        log::info!("Generated {} meetings from seed {}", schedule.len(), seed);
        self.apply_meetings(schedule);
    }

    fn apply_meetings(&mut self, schedule: Schedule) {
        self.schedule = schedule;
        self.drag.end();
        self.sync_selected_meeting();
        self.recompute();
    }

    fn sync_selected_meeting(&mut self) {
        let current = self.selected_meeting.take();
        self.selected_meeting = self
            .schedule
            .user_meetings()
            .find(|m| Some(&m.id) == current.as_ref())
            .or_else(|| self.schedule.user_meetings().next())
            .map(|m| m.id.clone());
    }

    fn recompute(&mut self) {
        self.recompute_layout();
        self.recompute_focus();
    }

    fn recompute_layout(&mut self) {
        self.layout = match &self.week {
            Some(week) => build_week_layout(
                &self.schedule,
                week,
                &self.employees,
                &self.selected_employees,
                &self.config,
            ),
            None => Vec::new(),
        };
    }

    fn recompute_focus(&mut self) {
        self.focus = match &self.week {
            Some(week) => compute_focus(&self.schedule, week, &self.config),
            None => FocusReport::default(),
        };
    }

    fn apply_lock(&mut self) {
        self.locked = match (self.week, self.submitted_week_start) {
            (Some(week), Some(submitted)) => week.start_ms() == submitted,
            _ => false,
        };
        if self.locked {
            self.drag.end();
        }
    }

    // ── User actions ────────────────────────────────────────────────────

    pub fn toggle_employee(&mut self, id: &str, visible: bool) {
        if visible {
            self.selected_employees.insert(id.to_string());
        } else {
            self.selected_employees.remove(id);
        }
        self.recompute_layout();
    }

    /// Select one of the user's meetings. Coworker meetings are ignored.
    pub fn select_meeting(&mut self, id: &str) {
        if self.schedule.get(id).is_some_and(Meeting::is_user_owned) {
            self.selected_meeting = Some(id.to_string());
            self.status.clear();
        }
    }

    pub fn drag_start(&mut self, meeting_id: &str) -> bool {
        let Some(meeting) = self.schedule.get(meeting_id) else {
            return false;
        };
        self.drag.start(meeting, self.locked)
    }

    pub fn drag_over(&mut self, day_index: usize, y_fraction: f64) -> Option<&Placement> {
        let week = self.week?;
        self.drag
            .over(&self.schedule, day_index, y_fraction, &week, &self.config, self.locked)
    }

    pub fn drag_leave(&mut self, day_index: usize) {
        self.drag.leave(day_index, self.locked);
    }

    pub fn drop_on(&mut self, day_index: usize, y_fraction: f64) -> DropOutcome {
        let Some(week) = self.week else {
            self.drag.end();
            return DropOutcome::Ignored;
        };
        let outcome = self
            .drag
            .drop(&mut self.schedule, day_index, y_fraction, &week, &self.config, self.locked);
        if let DropOutcome::Committed(_) = outcome {
            self.status.clear();
            self.recompute();
        }
        outcome
    }

    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    /// Bank the current plan's focus points and lock the week.
    ///
    /// Returns the number of points actually added.
    pub fn submit_schedule(&mut self) -> Result<u64, SubmitError> {
        if self.locked {
            self.status.info(MSG_ALREADY_SUBMITTED);
            return Err(SubmitError::Locked);
        }
        let Some(week) = self.week else {
            self.status.fail(MSG_NO_WEEK);
            return Err(SubmitError::NoWeek);
        };
        let earned = self.focus.points();
        self.submitted_score = Some(self.focus.score);
        self.last_earned_points = Some(earned);
        if self.company_id.is_empty() {
            self.status.fail(MSG_NO_COMPANY);
            return Err(SubmitError::NoCompany);
        }

        let plan = PlanSubmission {
            earned_points: earned,
            score: self.focus.score,
            free_hours: self.focus.free_hours,
            week_start_ms: week.start_ms(),
            schedule: self.schedule.meetings().to_vec(),
        };
        let banked = match self.store.submit_plan(&self.company_id, &plan) {
            Ok(banked) => banked,
            Err(e) => {
                log::warn!("Failed to store focus points for {}: {}", self.company_id, e);
                self.status.fail(MSG_SUBMIT_FAILED);
                return Err(e.into());
            }
        };

        self.focus_points = banked.next;
        self.stored = Some(StoredSchedule {
            week,
            meetings: plan.schedule,
        });
        let added = banked.added();
        if added > 0 {
            self.status
                .info(format!("Submitted and banked {} focus points.", group_thousands(added)));
            self.last_earned_points = Some(added);
        } else {
            self.status.info(MSG_SUBMITTED);
        }
        self.submitted_week_start = Some(week.start_ms());
        self.apply_lock();
        log::info!(
            "Company {} banked {} focus points for week {} (total {})",
            self.company_id,
            added,
            week.start_ms(),
            banked.next
        );
        Ok(added)
    }

    // ── Read side ───────────────────────────────────────────────────────

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn is_selected(&self, employee_id: &str) -> bool {
        self.selected_employees.contains(employee_id)
    }

    pub fn selected_employees(&self) -> &HashSet<String> {
        &self.selected_employees
    }

    pub fn week(&self) -> Option<Week> {
        self.week
    }

    pub fn week_label(&self) -> String {
        self.week.map(|w| w.label(&self.config)).unwrap_or_default()
    }

    pub fn day_labels(&self) -> Vec<String> {
        self.week.map(|w| w.day_labels(&self.config)).unwrap_or_default()
    }

    pub fn time_ticks(&self) -> Vec<String> {
        time_ticks(&self.config)
    }

    pub fn seed_key(&self) -> &str {
        &self.seed_key
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Positioned meetings, one vector per weekday.
    pub fn layout(&self) -> &[Vec<VisualMeeting>] {
        &self.layout
    }

    pub fn user_meetings(&self) -> impl Iterator<Item = &Meeting> {
        self.schedule.user_meetings()
    }

    pub fn selected_meeting(&self) -> Option<&Meeting> {
        self.selected_meeting.as_deref().and_then(|id| self.schedule.get(id))
    }

    pub fn dragging_id(&self) -> Option<&str> {
        self.drag.dragging_id()
    }

    pub fn drag_preview(&self) -> Option<&Placement> {
        self.drag.preview()
    }

    pub fn focus(&self) -> FocusReport {
        self.focus
    }

    /// Points the current plan would bank.
    pub fn focus_point_estimate(&self) -> u64 {
        self.focus.points()
    }

    pub fn focus_points(&self) -> u64 {
        self.focus_points
    }

    pub fn submitted_score(&self) -> Option<f64> {
        self.submitted_score
    }

    pub fn last_earned_points(&self) -> Option<u64> {
        self.last_earned_points
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn employee_name(&self, who: &Attendee) -> String {
        match who {
            Attendee::User => "You".to_string(),
            Attendee::Employee(id) => self
                .employees
                .iter()
                .find(|e| &e.id == id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "Teammate".to_string()),
        }
    }

    pub fn meeting_title(&self, meeting: &Meeting) -> String {
        let others: Vec<String> = meeting
            .participants
            .iter()
            .filter(|p| !p.is_user())
            .map(|p| self.employee_name(p))
            .collect();
        if others.is_empty() {
            "Solo work block".to_string()
        } else {
            format!("With {}", others.join(", "))
        }
    }
}

impl<S: CalendarStore> Drop for CalendarView<S> {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

/// `12345` → `"12,345"`.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
