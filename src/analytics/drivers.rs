//! Per-driver statistics.

use serde::Serialize;

use super::stats::{lap_stats, valid_times};
use super::{lap_scope, normalize_code};
use crate::error::{AnalyticsError, Result};
use crate::models::{Driver, Lap};
use crate::store::RecordStore;

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStats {
    pub driver_code: String,
    pub driver_name: String,
    pub team: Option<String>,
    pub total_laps: usize,
    pub fastest_lap: Option<f64>,
    pub average_lap_time: Option<f64>,
    pub best_position: Option<i32>,
    pub worst_position: Option<i32>,
}

/// Statistics over every lap of `driver` in `laps`. `total_laps` counts all
/// laps; the timing figures only use valid ones.
pub fn driver_stats_from(driver: &Driver, laps: &[Lap]) -> DriverStats {
    // ---
    let stats = lap_stats(&valid_times(laps));
    let positions = || laps.iter().filter_map(|l| l.position);

    DriverStats {
        driver_code: driver.code.clone(),
        driver_name: driver.full_name.clone(),
        team: driver.team.clone(),
        total_laps: laps.len(),
        fastest_lap: stats.map(|s| s.fastest_lap),
        average_lap_time: stats.map(|s| s.avg_lap_time),
        best_position: positions().min(),
        worst_position: positions().max(),
    }
}

/// Driver codes, optionally restricted to a race or season.
pub async fn list_driver_codes<S: RecordStore>(
    store: &S,
    race_id: Option<i32>,
    year: Option<i32>,
) -> Result<Vec<String>> {
    // ---
    let scope = lap_scope(race_id, year)?;
    let drivers = store
        .list_drivers(scope)
        .await
        .map_err(AnalyticsError::store)?;
    Ok(drivers.into_iter().map(|d| d.code).collect())
}

/// Fails with `NotFound` when the driver is unknown or has no laps in scope.
pub async fn driver_stats<S: RecordStore>(
    store: &S,
    code: &str,
    race_id: Option<i32>,
    year: Option<i32>,
) -> Result<DriverStats> {
    // ---
    let code = normalize_code(code)?;
    let scope = lap_scope(race_id, year)?;

    let driver = store
        .find_driver(&code)
        .await
        .map_err(AnalyticsError::store)?
        .ok_or_else(|| AnalyticsError::NotFound(format!("driver {code}")))?;

    let laps = store
        .driver_laps(driver.driver_id, scope)
        .await
        .map_err(AnalyticsError::store)?;
    if laps.is_empty() {
        return Err(AnalyticsError::NotFound(format!("laps for driver {code}")));
    }

    Ok(driver_stats_from(&driver, &laps))
}
