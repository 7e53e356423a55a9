//! Record types for the `race`, `driver` and `lap` tables.
//!
//! Rows are validated at the store boundary (column types and nullability are
//! enforced by `sqlx::FromRow`), so the analytics engines can treat every
//! record as well-formed and only need to ask whether a lap is *valid*.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---

/// A race weekend's Grand Prix session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Race {
    // ---
    pub race_id: i32,
    pub year: i32,
    pub round: i32,
    pub name: String,
    pub circuit: Option<String>,
    pub date: Option<NaiveDate>,
}

/// A driver, identified externally by a unique three-letter code (e.g. `VER`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Driver {
    // ---
    pub driver_id: i32,
    pub code: String,
    pub full_name: String,
    pub number: Option<i32>,
    pub team: Option<String>,
}

/// One lap driven by one driver in one race.
///
/// Times are stored in seconds. Every timing column is nullable because the
/// timing feed leaves gaps (first laps, red flags, retirements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lap {
    // ---
    pub lap_id: i32,
    pub race_id: i32,
    pub driver_id: i32,
    pub lap_number: i32,
    pub lap_time_secs: Option<f64>,
    pub sector1_time_secs: Option<f64>,
    pub sector2_time_secs: Option<f64>,
    pub sector3_time_secs: Option<f64>,
    pub stint: Option<i32>,
    pub compound: Option<String>,
    pub tyre_life: Option<i32>,
    pub fresh_tire: Option<bool>,
    pub pit_in_time_secs: Option<f64>,
    pub pit_out_time_secs: Option<f64>,
    pub pit_stop: bool,
    pub position: Option<i32>,
    pub is_fastest: bool,
    pub is_personal_best: bool,
}

impl Lap {
    // ---
    /// The lap time, if this lap counts for timing analytics.
    ///
    /// A lap is valid iff its time is present and positive and it is not a
    /// pit-stop lap. Every engine goes through this one predicate.
    pub fn valid_time(&self) -> Option<f64> {
        // ---
        if self.pit_stop {
            return None;
        }
        self.lap_time_secs.filter(|t| t.is_finite() && *t > 0.0)
    }

    pub fn is_valid(&self) -> bool {
        self.valid_time().is_some()
    }
}

/// Row counts per table, served by `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct RowCounts {
    pub races: i64,
    pub drivers: i64,
    pub laps: i64,
}

/// Per-season breakdown of stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SeasonCounts {
    pub year: i32,
    pub races: i64,
    pub laps: i64,
    pub drivers: i64,
}


#[cfg(test)]
mod tests {
    // ---
    use super::fixtures::lap;

    #[test]
    fn test_timed_lap_is_valid() {
        // ---
        let l = lap(1, 1, 1, 3, 90.1);
        assert!(l.is_valid());
        assert_eq!(l.valid_time(), Some(90.1));
    }

    #[test]
    fn test_pit_stop_lap_is_invalid() {
        // ---
        let mut l = lap(1, 1, 1, 3, 95.0);
        l.pit_stop = true;
        assert!(!l.is_valid());
    }

    #[test]
    fn test_missing_or_zero_time_is_invalid() {
        // ---
        let mut missing = lap(1, 1, 1, 1, 90.0);
        missing.lap_time_secs = None;
        assert!(!missing.is_valid());

        let zero = lap(2, 1, 1, 2, 0.0);
        assert!(!zero.is_valid());

        let negative = lap(3, 1, 1, 3, -1.0);
        assert!(!negative.is_valid());

        let nan = lap(4, 1, 1, 4, f64::NAN);
        assert!(!nan.is_valid());
    }
}
