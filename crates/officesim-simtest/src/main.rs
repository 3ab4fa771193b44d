//! OfficeSim Headless Calendar Harness
//!
//! Validates schedule generation, layout, drag, focus scoring and the
//! calendar view-model without a database.
//! Everything runs in-process with no DB, networking or rendering.
//!
//! Usage:
//!   cargo run -p officesim-simtest
//!   cargo run -p officesim-simtest -- --verbose --sweep 1000 --seed 7

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

use officesim_client::persistence::{load_store, save_store};
use officesim_client::store::{CompanyRecord, MemoryStore};
use officesim_client::view::{CalendarView, MSG_ALREADY_SUBMITTED};
use officesim_logic::config::{validate_config, CalendarConfig};
use officesim_logic::drag::{DragController, DropOutcome};
use officesim_logic::focus::compute_focus;
use officesim_logic::layout::build_week_layout;
use officesim_logic::roster::{build_employees, Employee, RosterEntry};
use officesim_logic::schedule::{generate_schedule, Schedule};
use officesim_logic::week::{schedule_seed, Week};

/// Wednesday 2024-01-03 12:00 UTC.
const SIM_START_MS: i64 = 1_704_283_200_000;
const WEEK_MS: i64 = 7 * 24 * 3_600_000;

#[derive(Parser)]
#[command(name = "officesim-simtest")]
#[command(about = "Headless validation of the OfficeSim calendar")]
struct Args {
    /// Print every result, not only failures
    #[arg(long, short)]
    verbose: bool,

    /// Seed for the randomized sweeps
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Roster size for the view-model scenario
    #[arg(long, default_value = "5")]
    employees: usize,

    /// Company id for the view-model scenario
    #[arg(long, default_value = "acme")]
    company: String,

    /// Calendar config as JSON (defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of random schedules per sweep
    #[arg(long, default_value = "200")]
    sweep: usize,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== OfficeSim Calendar Harness ===\n");

    let mut results = Vec::new();

    // 1. Config
    let config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(detail) => {
            println!("  ✗ config_load: {}", detail);
            std::process::exit(1);
        }
    };
    results.extend(validate_calendar_config(&config));

    // 2. Determinism
    results.extend(validate_determinism(&config));

    // 3-5. Randomized sweeps
    let mut rng = StdRng::seed_from_u64(args.seed);
    results.extend(validate_schedule_sweep(&config, &mut rng, args.sweep));
    results.extend(validate_layout_sweep(&config, &mut rng, args.sweep));
    results.extend(validate_drag_sweep(&config, &mut rng, args.sweep));

    // 6. Focus score
    results.extend(validate_focus(&config));

    // 7. View-model against the in-memory store
    results.extend(validate_view_model(&config, &args.company, args.employees));

    // 8. Persistence
    results.extend(validate_persistence(&config, &args.company, args.employees));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!("\n=== RESULT: {}/{} passed, {} failed ===", passed, total, failed);

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn load_config(path: Option<&PathBuf>) -> Result<CalendarConfig, String> {
    let Some(path) = path else {
        return Ok(CalendarConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    CalendarConfig::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
}

fn first_week() -> Week {
    Week::from_start_ms(1_704_672_000_000)
}

fn roster(n: usize) -> Vec<RosterEntry> {
    (0..n)
        .map(|i| RosterEntry {
            id: format!("emp-{i}"),
            name: format!("Employee {i:02}"),
            stored_color: None,
        })
        .collect()
}

fn random_company(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..=10);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

fn random_case(config: &CalendarConfig, rng: &mut StdRng) -> (String, Vec<Employee>, Schedule) {
    let company = random_company(rng);
    let n = rng.gen_range(0..12);
    let employees = build_employees(&roster(n), &company, &config.palette);
    let seed = schedule_seed(&company, &first_week(), n);
    let schedule = generate_schedule(&seed, first_week(), &employees, config);
    (seed, employees, schedule)
}

/// First pair of meetings that double-books an attendee, if any.
fn find_double_booking(schedule: &Schedule) -> Option<(String, String)> {
    let ms = schedule.meetings();
    for (i, a) in ms.iter().enumerate() {
        for b in &ms[i + 1..] {
            if a.day_index == b.day_index
                && a.overlaps(b.start, b.end)
                && a.attendees().iter().any(|p| b.has_attendee(p))
            {
                return Some((a.id.clone(), b.id.clone()));
            }
        }
    }
    None
}

// ── 1. Config ───────────────────────────────────────────────────────────

fn validate_calendar_config(config: &CalendarConfig) -> Vec<TestResult> {
    println!("--- Config ---");
    let errors = validate_config(config);
    let detail = if errors.is_empty() {
        format!(
            "{}:00-{}:00, {} days, {} min slots",
            config.workday_start_hour, config.workday_end_hour, config.weekdays, config.slot_minutes
        )
    } else {
        errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    };
    vec![TestResult::new("config_valid", errors.is_empty(), detail)]
}

// ── 2. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(config: &CalendarConfig) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();
    let employees = build_employees(&roster(4), "acme", &config.palette);
    let seed = schedule_seed("acme", &first_week(), employees.len());

    let a = generate_schedule(&seed, first_week(), &employees, config);
    let b = generate_schedule(&seed, first_week(), &employees, config);
    results.push(TestResult::new(
        "determinism_same_seed",
        a.meetings() == b.meetings(),
        format!("{} meetings from {}", a.len(), seed),
    ));

    let other = generate_schedule(&format!("{seed}x"), first_week(), &employees, config);
    results.push(TestResult::new(
        "determinism_seed_sensitive",
        other.meetings() != a.meetings(),
        "different seed, different week",
    ));

    let ids: HashSet<&str> = a.meetings().iter().map(|m| m.id.as_str()).collect();
    results.push(TestResult::new(
        "determinism_unique_ids",
        ids.len() == a.len(),
        format!("{} ids for {} meetings", ids.len(), a.len()),
    ));
    results
}

// ── 3. Schedule sweep ───────────────────────────────────────────────────

fn validate_schedule_sweep(config: &CalendarConfig, rng: &mut StdRng, count: usize) -> Vec<TestResult> {
    println!("--- Schedule Sweep ({count}) ---");
    let mut double_booked = Vec::new();
    let mut out_of_hours = 0usize;
    let mut user_days_empty = 0usize;
    let mut total = 0usize;

    for _ in 0..count {
        let (seed, _, schedule) = random_case(config, rng);
        total += schedule.len();
        if let Some(pair) = find_double_booking(&schedule) {
            double_booked.push((seed.clone(), pair));
        }
        let week = first_week();
        out_of_hours += schedule
            .meetings()
            .iter()
            .filter(|m| m.start < week.day_start_ms(m.day_index, config) || m.end > week.day_end_ms(m.day_index, config))
            .count();
        user_days_empty += (0..config.weekdays)
            .filter(|d| !schedule.user_meetings().any(|m| m.day_index == *d))
            .count();
    }

    vec![
        TestResult::new(
            "sweep_no_double_booking",
            double_booked.is_empty(),
            match double_booked.first() {
                Some((seed, (a, b))) => format!("{seed}: {a} overlaps {b}"),
                None => format!("{total} meetings checked"),
            },
        ),
        TestResult::new(
            "sweep_within_workday",
            out_of_hours == 0,
            format!("{out_of_hours} meetings outside the workday"),
        ),
        TestResult::new(
            "sweep_user_busy_every_day",
            user_days_empty == 0,
            format!("{user_days_empty} weekdays without a user meeting"),
        ),
    ]
}

// ── 4. Layout sweep ─────────────────────────────────────────────────────

fn validate_layout_sweep(config: &CalendarConfig, rng: &mut StdRng, count: usize) -> Vec<TestResult> {
    println!("--- Layout Sweep ({count}) ---");
    let mut shared_columns = 0usize;
    let mut overfull = 0usize;
    let mut max_columns = 0usize;

    for _ in 0..count {
        let (_, employees, schedule) = random_case(config, rng);
        let everyone: HashSet<String> = employees.iter().map(|e| e.id.clone()).collect();
        let layout = build_week_layout(&schedule, &first_week(), &employees, &everyone, config);
        for day in &layout {
            for (i, a) in day.iter().enumerate() {
                max_columns = max_columns.max(a.columns);
                for b in &day[i + 1..] {
                    if a.meeting.overlaps(b.meeting.start, b.meeting.end) && a.column == b.column {
                        shared_columns += 1;
                    }
                }
                let t = a.meeting.start;
                let width: f64 = day
                    .iter()
                    .filter(|v| v.meeting.start <= t && t < v.meeting.end)
                    .map(|v| v.width)
                    .sum();
                if width > 100.0 + 1e-9 {
                    overfull += 1;
                }
            }
        }
    }

    vec![
        TestResult::new(
            "layout_distinct_columns",
            shared_columns == 0,
            format!("{shared_columns} overlapping pairs share a column"),
        ),
        TestResult::new(
            "layout_width_bounded",
            overfull == 0,
            format!("{overfull} instants wider than 100%, max {max_columns} columns"),
        ),
    ]
}

// ── 5. Drag sweep ───────────────────────────────────────────────────────

fn validate_drag_sweep(config: &CalendarConfig, rng: &mut StdRng, count: usize) -> Vec<TestResult> {
    println!("--- Drag Sweep ({count}) ---");
    let (mut committed, mut rejected) = (0usize, 0usize);
    let mut broken = Vec::new();

    for _ in 0..count {
        let (seed, _, mut schedule) = random_case(config, rng);
        let Some(meeting) = schedule.user_meetings().next().cloned() else {
            continue;
        };
        let day = rng.gen_range(0..config.weekdays);
        let y: f64 = rng.gen();
        let before = schedule.meetings().to_vec();

        let mut drag = DragController::new();
        drag.start(&meeting, false);
        match drag.drop(&mut schedule, day, y, &first_week(), config, false) {
            DropOutcome::Committed(_) => {
                committed += 1;
                if find_double_booking(&schedule).is_some() {
                    broken.push(seed);
                }
            }
            _ => {
                rejected += 1;
                if schedule.meetings() != before.as_slice() {
                    broken.push(seed);
                }
            }
        }
    }

    vec![TestResult::new(
        "drag_preserves_invariants",
        broken.is_empty(),
        match broken.first() {
            Some(seed) => format!("broken after drop: {seed}"),
            None => format!("{committed} committed, {rejected} rejected"),
        },
    )]
}

// ── 6. Focus ────────────────────────────────────────────────────────────

fn validate_focus(config: &CalendarConfig) -> Vec<TestResult> {
    println!("--- Focus Score ---");
    let mut results = Vec::new();
    let hours = config.work_hours();
    let days = config.weekdays as f64;

    let empty = compute_focus(&Schedule::new(), &first_week(), config);
    results.push(TestResult::new(
        "focus_empty_week",
        empty.free_hours == hours * days && empty.score == hours * hours * days,
        format!("score {} free {}h", empty.score, empty.free_hours),
    ));

    let employees = build_employees(&roster(6), "acme", &config.palette);
    let busy = generate_schedule("acme-focus", first_week(), &employees, config);
    let report = compute_focus(&busy, &first_week(), config);
    results.push(TestResult::new(
        "focus_busy_week_lower",
        report.score < empty.score && report.free_hours < empty.free_hours,
        format!("score {} free {}h, {} points", report.score, report.free_hours, report.points()),
    ));
    results
}

// ── 7. View-model ───────────────────────────────────────────────────────

fn seeded_store(company: &str, employees: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.insert_company(
        company,
        CompanyRecord {
            sim_time_ms: Some(SIM_START_MS),
            ..CompanyRecord::default()
        },
    );
    for entry in roster(employees) {
        if let Err(e) = store.hire(company, &entry.id, &entry.name) {
            log::warn!("hire failed: {e}");
        }
    }
    store
}

fn validate_view_model(config: &CalendarConfig, company: &str, employees: usize) -> Vec<TestResult> {
    println!("--- View Model ---");
    let mut results = Vec::new();
    let mut store = seeded_store(company, employees);

    {
        let mut view = CalendarView::new(company, config.clone(), &mut store);
        let watched = view.start_watching().is_ok();
        let applied = view.sync();
        results.push(TestResult::new(
            "view_watch_and_sync",
            watched && applied >= 2 && view.week().is_some(),
            format!("{applied} events, week {}", view.week_label()),
        ));

        let expected_visible = employees.min(3);
        results.push(TestResult::new(
            "view_default_selection",
            view.selected_employees().len() == expected_visible,
            format!("{} of {} coworkers visible", view.selected_employees().len(), employees),
        ));

        let estimate = view.focus_point_estimate();
        let added = view.submit_schedule();
        results.push(TestResult::new(
            "view_submit_banks_points",
            added.as_ref().ok() == Some(&estimate) && view.is_locked(),
            format!("{:?} (estimate {estimate}): {}", added.as_ref().ok(), view.status().message),
        ));

        let again = view.submit_schedule();
        results.push(TestResult::new(
            "view_resubmit_refused",
            again.is_err() && view.status().message == MSG_ALREADY_SUBMITTED,
            view.status().message.clone(),
        ));

        let locked_meeting = view.user_meetings().next().map(|m| m.id.clone());
        let drag_refused = locked_meeting.map_or(true, |id| !view.drag_start(&id));
        results.push(TestResult::new("view_locked_no_drag", drag_refused, "drag refused while locked"));
    }

    results.push(TestResult::new(
        "view_unwatch_on_drop",
        store.watch_count() == 0,
        format!("{} watches left", store.watch_count()),
    ));

    let banked = store.company(company).map(|c| c.focus_points).unwrap_or_default();
    if let Err(e) = store.set_sim_time(company, SIM_START_MS + WEEK_MS) {
        log::warn!("advancing sim time failed: {e}");
    }
    let mut view = CalendarView::new(company, config.clone(), &mut store);
    if let Err(e) = view.start_watching() {
        results.push(TestResult::new("view_rewatch", false, e.to_string()));
        return results;
    }
    view.sync();
    results.push(TestResult::new(
        "view_next_week_unlocked",
        !view.is_locked() && view.focus_points() == banked,
        format!("week {}, {} banked", view.week_label(), view.focus_points()),
    ));
    results
}

// ── 8. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(config: &CalendarConfig, company: &str, employees: usize) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut store = seeded_store(company, employees);
    {
        let mut view = CalendarView::new(company, config.clone(), &mut store);
        if let Err(e) = view.start_watching() {
            return vec![TestResult::new("persistence_watch", false, e.to_string())];
        }
        view.sync();
        if let Err(e) = view.submit_schedule() {
            return vec![TestResult::new("persistence_submit", false, e.to_string())];
        }
    }

    let mut buffer = Vec::new();
    if let Err(e) = save_store(&mut buffer, &store) {
        return vec![TestResult::new("persistence_save", false, e.to_string())];
    }
    match load_store(buffer.as_slice()) {
        Ok(mut loaded) => {
            let same = loaded.companies() == store.companies();
            let restored = {
                let mut view = CalendarView::new(company, config.clone(), &mut loaded);
                view.start_watching().map(|_| {
                    view.sync();
                    view.is_locked()
                })
            };
            let restore_result = match restored {
                Ok(locked) => TestResult::new("persistence_restores_lock", locked, "submitted week still locked"),
                Err(e) => TestResult::new("persistence_restores_lock", false, e.to_string()),
            };
            vec![
                TestResult::new("persistence_roundtrip", same, format!("{} bytes", buffer.len())),
                restore_result,
            ]
        }
        Err(e) => vec![TestResult::new("persistence_load", false, e.to_string())],
    }
}
