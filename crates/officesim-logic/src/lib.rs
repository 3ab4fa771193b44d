//! Pure calendar logic for OfficeSim.
//!
//! This crate contains the calendar core of the game independent of any
//! database, UI toolkit, or network client. Functions take plain data and
//! return results, so the same code drives the view-model, the headless
//! harness, and the tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Workday window, durations, palette, and validation |
//! | [`constants`] | Week shape, geometry, and palette constants |
//! | [`drag`] | Drag-to-reschedule state machine with snapping and conflict checks |
//! | [`focus`] | Quadratic free-time focus score |
//! | [`layout`] | Day-column packing and vertical block geometry |
//! | [`meeting`] | Attendees, meetings, and overlap tests |
//! | [`rng`] | String-seeded linear-congruential generator |
//! | [`roster`] | Employees and deterministic colour assignment |
//! | [`schedule`] | Deterministic weekly schedule and per-attendee index |
//! | [`stored`] | Normalisation of persisted schedule records |
//! | [`week`] | Simulated week start, day windows, labels, and seeds |

pub mod config;
pub mod constants;
pub mod drag;
pub mod focus;
pub mod layout;
pub mod meeting;
pub mod rng;
pub mod roster;
pub mod schedule;
pub mod stored;
pub mod week;
