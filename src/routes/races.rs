//! Race endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/races` | ordered by year, round |
//! | `GET`  | `/races/{race_id}` | 404 if not found |
//! | `GET`  | `/races/{race_id}/laps` | optional `?driver=VER` |

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::AppState;
use crate::analytics::laps::{self, LapRow};
use crate::error::{AnalyticsError, Result};
use crate::models::Race;
use crate::store::RecordStore;

// ---

pub fn router<S: RecordStore + 'static>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/races", get(list::<S>))
        .route("/races/{race_id}", get(get_one::<S>))
        .route("/races/{race_id}/laps", get(race_laps::<S>))
}

async fn list<S: RecordStore>(State((store, _)): State<AppState<S>>) -> Result<Json<Vec<Race>>> {
    // ---
    info!("GET /races");
    let races = store.list_races().await.map_err(AnalyticsError::store)?;
    debug!("GET /races - returning {} races", races.len());
    Ok(Json(races))
}

async fn get_one<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Path(race_id): Path<i32>,
) -> Result<Json<Race>> {
    // ---
    info!("GET /races/{}", race_id);
    let race = laps::require_race(store.as_ref(), race_id).await?;
    Ok(Json(race))
}

#[derive(Debug, Deserialize)]
struct RaceLapsQuery {
    driver: Option<String>,
}

async fn race_laps<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Path(race_id): Path<i32>,
    Query(params): Query<RaceLapsQuery>,
) -> Result<Json<Vec<LapRow>>> {
    // ---
    info!("GET /races/{}/laps - {:?}", race_id, params);
    let rows = laps::race_laps(store.as_ref(), race_id, params.driver.as_deref()).await?;
    debug!("GET /races/{}/laps - returning {} laps", race_id, rows.len());
    Ok(Json(rows))
}
