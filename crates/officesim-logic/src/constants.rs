//! Calendar constants: week shape, block geometry, palette.
//!
//! Plain values with no runtime dependency. The view-model and the
//! headless harness both read these.

/// Serialised identifier of the player in meeting records.
pub const USER_ID: &str = "me";

/// Monday through Friday.
pub const WEEKDAYS: usize = 5;

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 86_400_000;

pub mod workday {
    pub const START_HOUR: u32 = 8;
    pub const END_HOUR: u32 = 17;
    /// Meetings start on these boundaries.
    pub const SLOT_MINUTES: u32 = 30;
}

pub mod generation {
    /// Randomised placement attempts before a meeting is dropped.
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 24;
    pub const DURATIONS_MINUTES: [u32; 2] = [30, 60];
    /// Upper bound (exclusive) of the numeric suffix in meeting ids.
    pub const ID_SUFFIX_RANGE: usize = 1_000_000;
    /// Coworkers invited to a single meeting, at most.
    pub const MAX_COWORKERS_PER_MEETING: usize = 3;
}

/// Block geometry inside a day column. Heights are computed against a
/// virtual pixel column, then expressed as percentages.
pub mod geometry {
    pub const DAY_HEIGHT_PX: f64 = 720.0;
    pub const BLOCK_GAP_PX: f64 = 3.0;
    pub const MIN_BLOCK_PX: f64 = 10.0;
    pub const MIN_BLOCK_PERCENT: f64 = 4.0;
    /// Horizontal gap between side-by-side blocks, in percent.
    pub const GUTTER_PERCENT: f64 = 1.0;
    pub const MIN_WIDTH_PERCENT: f64 = 1.0;
}

pub mod colors {
    pub const PALETTE: [&str; 8] = [
        "#f9c74f", // warm yellow
        "#ef476f", // pink-red
        "#118ab2", // teal-blue
        "#9b5de5", // purple
        "#06d6a0", // mint
        "#ff8fab", // rose
        "#ffd166", // golden orange
        "#5c7aff", // blue
    ];
    pub const FALLBACK: &str = "#c8d6df";
    pub const USER_BACKGROUND: &str = "#fff";
    pub const USER_BORDER: &str = "#d8e2ec";
    pub const USER_DOT: &str = "#ffffff";
    /// Seed used for palette shuffles when no company id is known.
    pub const DEFAULT_SEED: &str = "color-seed";
}
