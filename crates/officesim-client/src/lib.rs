//! OfficeSim calendar client
//!
//! Drives `officesim-logic` from store snapshots and user actions.
//!
//! ## Module overview
//!
//! | Module        | Purpose                                                      |
//! |---------------|--------------------------------------------------------------|
//! | `store`       | `CalendarStore` trait, snapshots, in-memory implementation   |
//! | `view`        | Calendar view-model: roster, week, layout, drag, submission  |
//! | `persistence` | Versioned bincode save/load of the in-memory store           |

pub mod persistence;
pub mod store;
pub mod view;

pub use store::{CalendarStore, MemoryStore, StoreError};
pub use view::{CalendarView, SubmitError};
