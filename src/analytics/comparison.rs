//! Head-to-head comparison between two drivers.

use std::collections::BTreeMap;

use serde::Serialize;

use super::stats::{lap_stats, mean, valid_times, LapStats};
use super::{lap_scope, normalize_code, round_ms};
use crate::error::{AnalyticsError, Result};
use crate::models::{Driver, Lap};
use crate::store::RecordStore;

// ---

/// Signed gap on one lap, `driver_1 - driver_2`. Negative means driver 1
/// was quicker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapDelta {
    pub race_id: i32,
    pub lap_number: i32,
    pub driver_1_time: f64,
    pub driver_2_time: f64,
    pub delta: f64,
    /// Absent on an exact tie.
    pub faster_driver: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSummary {
    pub driver: String,
    pub full_name: String,
    pub team: Option<String>,
    /// `None` when the driver has no valid lap under the filter.
    pub stats: Option<LapStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub driver_1: DriverSummary,
    pub driver_2: DriverSummary,
    pub deltas: Vec<LapDelta>,
    pub total_comparable_laps: usize,
    pub mean_delta: Option<f64>,
    pub laps_won_driver_1: usize,
    pub laps_won_driver_2: usize,
}

/// Valid lap times keyed by `(race_id, lap_number)`.
fn keyed_times(laps: &[Lap]) -> BTreeMap<(i32, i32), f64> {
    // ---
    laps.iter()
        .filter_map(|l| l.valid_time().map(|t| ((l.race_id, l.lap_number), t)))
        .collect()
}

/// Deltas on every lap both drivers completed validly, ordered by race then
/// lap number. Laps only ever pair within the same race.
pub fn lap_deltas(laps_1: &[Lap], laps_2: &[Lap]) -> Vec<(i32, i32, f64, f64, f64)> {
    // ---
    let times_2 = keyed_times(laps_2);
    keyed_times(laps_1)
        .into_iter()
        .filter_map(|((race_id, lap_number), t1)| {
            let t2 = *times_2.get(&(race_id, lap_number))?;
            Some((race_id, lap_number, t1, t2, round_ms(t1 - t2)))
        })
        .collect()
}

fn summary(driver: &Driver, laps: &[Lap]) -> DriverSummary {
    // ---
    DriverSummary {
        driver: driver.code.clone(),
        full_name: driver.full_name.clone(),
        team: driver.team.clone(),
        stats: lap_stats(&valid_times(laps)),
    }
}

/// Compare two drivers over the laps already fetched for each of them.
pub fn compare(driver_1: &Driver, laps_1: &[Lap], driver_2: &Driver, laps_2: &[Lap]) -> Comparison {
    // ---
    let deltas: Vec<LapDelta> = lap_deltas(laps_1, laps_2)
        .into_iter()
        .map(|(race_id, lap_number, t1, t2, delta)| {
            let faster_driver = if delta < 0.0 {
                Some(driver_1.code.clone())
            } else if delta > 0.0 {
                Some(driver_2.code.clone())
            } else {
                None
            };
            LapDelta {
                race_id,
                lap_number,
                driver_1_time: t1,
                driver_2_time: t2,
                delta,
                faster_driver,
            }
        })
        .collect();

    let delta_values: Vec<f64> = deltas.iter().map(|d| d.delta).collect();

    Comparison {
        driver_1: summary(driver_1, laps_1),
        driver_2: summary(driver_2, laps_2),
        total_comparable_laps: deltas.len(),
        mean_delta: mean(&delta_values).map(round_ms),
        laps_won_driver_1: delta_values.iter().filter(|d| **d < 0.0).count(),
        laps_won_driver_2: delta_values.iter().filter(|d| **d > 0.0).count(),
        deltas,
    }
}

// --- store-backed entry point

/// Parameters of `/analytics/driver-comparison`.
#[derive(Debug, Clone)]
pub struct ComparisonQuery {
    pub driver_1: String,
    pub driver_2: String,
    pub race_id: Option<i32>,
    pub year: Option<i32>,
}

async fn require_driver<S: RecordStore>(store: &S, code: &str) -> Result<Driver> {
    // ---
    store
        .find_driver(code)
        .await
        .map_err(AnalyticsError::store)?
        .ok_or_else(|| AnalyticsError::NotFound(format!("driver {code}")))
}

pub async fn driver_comparison<S: RecordStore>(store: &S, query: &ComparisonQuery) -> Result<Comparison> {
    // ---
    let code_1 = normalize_code(&query.driver_1)?;
    let code_2 = normalize_code(&query.driver_2)?;
    if code_1 == code_2 {
        return Err(AnalyticsError::InvalidFilter(format!(
            "cannot compare {code_1} with itself"
        )));
    }
    let scope = lap_scope(query.race_id, query.year)?;

    let driver_1 = require_driver(store, &code_1).await?;
    let driver_2 = require_driver(store, &code_2).await?;

    let laps_1 = store
        .driver_laps(driver_1.driver_id, scope)
        .await
        .map_err(AnalyticsError::store)?;
    let laps_2 = store
        .driver_laps(driver_2.driver_id, scope)
        .await
        .map_err(AnalyticsError::store)?;

    Ok(compare(&driver_1, &laps_1, &driver_2, &laps_2))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::fixtures::{driver, lap};
    use crate::store::memory::fixture;

    fn example() -> (Vec<Lap>, Vec<Lap>) {
        // ---
        (
            vec![lap(1, 1, 1, 1, 90.1), lap(2, 1, 1, 2, 89.5)],
            vec![lap(3, 1, 2, 1, 90.0), lap(4, 1, 2, 2, 89.5)],
        )
    }

    #[test]
    fn test_worked_example_deltas() {
        // ---
        let (d1, d2) = example();
        let cmp = compare(&driver(1, "VER"), &d1, &driver(2, "HAM"), &d2);

        assert_eq!(cmp.total_comparable_laps, 2);
        assert_eq!(cmp.deltas[0].lap_number, 1);
        assert_eq!(cmp.deltas[0].delta, 0.1);
        assert_eq!(cmp.deltas[0].faster_driver.as_deref(), Some("HAM"));
        assert_eq!(cmp.deltas[1].delta, 0.0);
        assert_eq!(cmp.deltas[1].faster_driver, None);
        assert_eq!(cmp.laps_won_driver_2, 1);
        assert_eq!(cmp.laps_won_driver_1, 0);
    }

    #[test]
    fn test_deltas_are_antisymmetric() {
        // ---
        let (d1, d2) = example();
        let forward = lap_deltas(&d1, &d2);
        let backward = lap_deltas(&d2, &d1);
        assert_eq!(forward.len(), backward.len());
        for (f, b) in forward.iter().zip(&backward) {
            assert_eq!((f.0, f.1), (b.0, b.1));
            assert_eq!(f.4, -b.4);
        }
    }

    #[test]
    fn test_individual_stats() {
        // ---
        let (d1, d2) = example();
        let cmp = compare(&driver(1, "VER"), &d1, &driver(2, "HAM"), &d2);
        let s1 = cmp.driver_1.stats.unwrap();
        assert_eq!(s1.avg_lap_time, 89.8);
        assert_eq!(s1.fastest_lap, 89.5);
        let s2 = cmp.driver_2.stats.unwrap();
        assert_eq!(s2.avg_lap_time, 89.75);
        assert_eq!(s2.median_lap_time, 89.75);
    }

    #[test]
    fn test_no_overlap_keeps_individual_stats() {
        // ---
        let d1 = vec![lap(1, 1, 1, 1, 90.0)];
        let d2 = vec![lap(2, 2, 2, 1, 91.0)];
        let cmp = compare(&driver(1, "VER"), &d1, &driver(2, "HAM"), &d2);

        assert!(cmp.deltas.is_empty());
        assert_eq!(cmp.mean_delta, None);
        assert!(cmp.driver_1.stats.is_some());
        assert!(cmp.driver_2.stats.is_some());
    }

    #[test]
    fn test_invalid_laps_do_not_pair() {
        // ---
        let d1 = vec![lap(1, 1, 1, 1, 90.0)];
        let mut pit = lap(2, 1, 2, 1, 110.0);
        pit.pit_stop = true;
        assert!(lap_deltas(&d1, &[pit]).is_empty());
    }

    #[tokio::test]
    async fn test_comparison_across_races_pairs_within_race() {
        // ---
        let store = fixture();
        let query = ComparisonQuery {
            driver_1: "ver".into(),
            driver_2: "HAM".into(),
            race_id: None,
            year: None,
        };
        let cmp = driver_comparison(&store, &query).await.unwrap();

        // Monaco laps 1-2 and Bahrain laps 1-2; HAM's Monaco lap 3 is a pit lap.
        assert_eq!(cmp.total_comparable_laps, 4);
        assert_eq!(cmp.driver_1.driver, "VER");
        let bahrain: Vec<f64> = cmp
            .deltas
            .iter()
            .filter(|d| d.race_id == 2)
            .map(|d| d.delta)
            .collect();
        assert_eq!(bahrain, vec![-0.3, -0.4]);
    }

    #[tokio::test]
    async fn test_comparison_with_year_filter() {
        // ---
        let store = fixture();
        let query = ComparisonQuery {
            driver_1: "VER".into(),
            driver_2: "HAM".into(),
            race_id: None,
            year: Some(2024),
        };
        let cmp = driver_comparison(&store, &query).await.unwrap();
        assert_eq!(cmp.total_comparable_laps, 2);
        assert_eq!(cmp.laps_won_driver_1, 2);
    }

    #[tokio::test]
    async fn test_comparison_unknown_driver() {
        // ---
        let store = fixture();
        let query = ComparisonQuery {
            driver_1: "VER".into(),
            driver_2: "ZZZ".into(),
            race_id: None,
            year: None,
        };
        let err = driver_comparison(&store, &query).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_comparison_driver_without_laps() {
        // ---
        let store = fixture();
        let query = ComparisonQuery {
            driver_1: "VER".into(),
            driver_2: "NOR".into(),
            race_id: None,
            year: None,
        };
        let cmp = driver_comparison(&store, &query).await.unwrap();
        assert!(cmp.deltas.is_empty());
        assert!(cmp.driver_1.stats.is_some());
        assert_eq!(cmp.driver_2.stats, None);
    }

    #[tokio::test]
    async fn test_comparison_rejects_conflicting_filters() {
        // ---
        let store = fixture();
        let query = ComparisonQuery {
            driver_1: "VER".into(),
            driver_2: "HAM".into(),
            race_id: Some(1),
            year: Some(2023),
        };
        let err = driver_comparison(&store, &query).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidFilter(_)));
    }
}
