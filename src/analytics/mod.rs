//! Derived race metrics computed from stored lap, race and driver rows.
//!
//! Each engine is split in two halves:
//! - pure functions over already-fetched records (no I/O, no shared state,
//!   safe to abandon mid-computation)
//! - a thin `async` entry point that takes a [`RecordStore`](crate::store::RecordStore)
//!   by reference, fetches one snapshot of rows, and calls the pure half
//!
//! Engines:
//! - [`laps`]: fastest lap per driver, personal bests, stint segmentation
//! - [`comparison`]: head-to-head statistics between two drivers
//! - [`aggregate`]: circuit and season summaries
//! - [`drivers`]: per-driver statistics and listings

pub mod aggregate;
pub mod comparison;
pub mod drivers;
pub mod laps;
pub mod stats;

use crate::error::{AnalyticsError, Result};
use crate::store::LapScope;

// ---

/// Earliest and latest seasons accepted in filters.
pub const MIN_YEAR: i32 = 1950;
pub const MAX_YEAR: i32 = 2100;

/// Round a time in seconds to the millisecond the timing feed resolves.
pub fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

pub fn check_year(year: i32) -> Result<i32> {
    // ---
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(AnalyticsError::InvalidFilter(format!(
            "year {year} outside {MIN_YEAR}..={MAX_YEAR}"
        )))
    }
}

/// Resolve the optional `race_id` / `year` query pair into a [`LapScope`].
///
/// The two filters are mutually exclusive.
pub fn lap_scope(race_id: Option<i32>, year: Option<i32>) -> Result<LapScope> {
    // ---
    match (race_id, year) {
        (Some(_), Some(_)) => Err(AnalyticsError::InvalidFilter(
            "race_id and year cannot be combined".to_string(),
        )),
        (Some(race_id), None) => Ok(LapScope::Race(race_id)),
        (None, Some(year)) => Ok(LapScope::Season(check_year(year)?)),
        (None, None) => Ok(LapScope::All),
    }
}

/// Normalise a driver code for lookup (`ver` and `VER` are the same driver).
pub fn normalize_code(code: &str) -> Result<String> {
    // ---
    let code = code.trim();
    if code.is_empty() {
        return Err(AnalyticsError::InvalidFilter(
            "driver code must not be empty".to_string(),
        ));
    }
    Ok(code.to_uppercase())
}
