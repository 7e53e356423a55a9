//! Per-race lap analytics.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/laps/race/{race_id}/fastest` | fastest lap per driver, ranked |
//! | `GET`  | `/laps/race/{race_id}/stints` | stint segmentation |

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{debug, info};

use super::AppState;
use crate::analytics::laps::{self, DriverStint, RaceFastestLaps};
use crate::error::Result;
use crate::store::RecordStore;

// ---

pub fn router<S: RecordStore + 'static>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/laps/race/{race_id}/fastest", get(fastest::<S>))
        .route("/laps/race/{race_id}/stints", get(stints::<S>))
}

async fn fastest<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Path(race_id): Path<i32>,
) -> Result<Json<RaceFastestLaps>> {
    // ---
    info!("GET /laps/race/{}/fastest", race_id);
    let result = laps::race_fastest_laps(store.as_ref(), race_id).await?;
    debug!(
        "GET /laps/race/{}/fastest - {} drivers ranked",
        race_id,
        result.fastest_laps.len()
    );
    Ok(Json(result))
}

async fn stints<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Path(race_id): Path<i32>,
) -> Result<Json<Vec<DriverStint>>> {
    // ---
    info!("GET /laps/race/{}/stints", race_id);
    let stints = laps::race_stints(store.as_ref(), race_id).await?;
    debug!("GET /laps/race/{}/stints - {} stints", race_id, stints.len());
    Ok(Json(stints))
}
