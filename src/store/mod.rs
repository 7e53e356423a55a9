//! Read accessor over the race/driver/lap tables.
//!
//! The analytics engines never hold a database handle. Each request passes a
//! [`RecordStore`] into the engine call, which fetches a snapshot of rows and
//! hands them to pure functions. `PgStore` is the production backend; tests
//! use an in-memory store.

use std::future::Future;

use crate::models::{Driver, Lap, Race, RowCounts, SeasonCounts};

mod postgres;

#[cfg(test)]
pub(crate) mod memory;

pub use postgres::{PgStore, StoreError};

// ---

/// Which laps an operation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapScope {
    All,
    Race(i32),
    Season(i32),
}

/// Selects the races an aggregation groups over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceFilter {
    /// Case-insensitive substring of the circuit or the race name.
    Circuit(String),
    /// Exact season year.
    Season(i32),
}

impl RaceFilter {
    // ---
    /// Authoritative match rule. Backends may pre-filter in SQL, but the
    /// aggregator re-checks every race with this.
    pub fn matches(&self, race: &Race) -> bool {
        // ---
        match self {
            RaceFilter::Season(year) => race.year == *year,
            RaceFilter::Circuit(needle) => {
                let needle = needle.to_lowercase();
                race.name.to_lowercase().contains(&needle)
                    || race
                        .circuit
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Abstraction over the stored race records.
///
/// All methods are read-only and return `Send` futures so the trait can be
/// shared across axum handlers on a multi-threaded runtime.
pub trait RecordStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// All races, ordered by year then round.
    fn list_races(&self) -> impl Future<Output = Result<Vec<Race>, Self::Error>> + Send + '_;

    fn get_race(
        &self,
        race_id: i32,
    ) -> impl Future<Output = Result<Option<Race>, Self::Error>> + Send + '_;

    /// Look a driver up by code. Callers pass the code upper-cased.
    fn find_driver<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Future<Output = Result<Option<Driver>, Self::Error>> + Send + 'a;

    /// Drivers with at least one lap in `scope` (every driver for
    /// [`LapScope::All`]), ordered by code.
    fn list_drivers(
        &self,
        scope: LapScope,
    ) -> impl Future<Output = Result<Vec<Driver>, Self::Error>> + Send + '_;

    fn drivers_by_ids<'a>(
        &'a self,
        driver_ids: &'a [i32],
    ) -> impl Future<Output = Result<Vec<Driver>, Self::Error>> + Send + 'a;

    /// Every lap of a race, ordered by driver then lap number.
    fn race_laps(
        &self,
        race_id: i32,
    ) -> impl Future<Output = Result<Vec<Lap>, Self::Error>> + Send + '_;

    /// A driver's laps within `scope`, ordered by race then lap number.
    fn driver_laps(
        &self,
        driver_id: i32,
        scope: LapScope,
    ) -> impl Future<Output = Result<Vec<Lap>, Self::Error>> + Send + '_;

    /// Races selected by `filter`, newest first.
    fn races_matching<'a>(
        &'a self,
        filter: &'a RaceFilter,
    ) -> impl Future<Output = Result<Vec<Race>, Self::Error>> + Send + 'a;

    fn laps_for_races<'a>(
        &'a self,
        race_ids: &'a [i32],
    ) -> impl Future<Output = Result<Vec<Lap>, Self::Error>> + Send + 'a;

    fn row_counts(&self) -> impl Future<Output = Result<RowCounts, Self::Error>> + Send + '_;

    /// Races, laps and distinct drivers per season, ordered by year.
    fn season_breakdown(
        &self,
    ) -> impl Future<Output = Result<Vec<SeasonCounts>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::fixtures::race;

    #[test]
    fn test_circuit_filter_is_case_insensitive_substring() {
        // ---
        let monaco = race(1, 2023, 6, "Monaco Grand Prix", "Monte Carlo");
        assert!(RaceFilter::Circuit("monaco".into()).matches(&monaco));
        assert!(RaceFilter::Circuit("MONTE".into()).matches(&monaco));
        assert!(!RaceFilter::Circuit("Nonexistent".into()).matches(&monaco));
    }

    #[test]
    fn test_circuit_filter_without_circuit_column() {
        // ---
        let mut r = race(1, 2023, 6, "Monaco Grand Prix", "Monte Carlo");
        r.circuit = None;
        assert!(RaceFilter::Circuit("grand prix".into()).matches(&r));
        assert!(!RaceFilter::Circuit("carlo".into()).matches(&r));
    }

    #[test]
    fn test_season_filter_is_exact() {
        // ---
        let r = race(1, 2023, 6, "Monaco Grand Prix", "Monte Carlo");
        assert!(RaceFilter::Season(2023).matches(&r));
        assert!(!RaceFilter::Season(2024).matches(&r));
    }
}
