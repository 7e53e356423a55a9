//! `GET /stats`: stored row counts, overall and per season.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::{AnalyticsError, Result};
use crate::models::{RowCounts, SeasonCounts};
use crate::store::RecordStore;

// ---

#[derive(Debug, Serialize)]
struct StatsResponse {
    totals: RowCounts,
    seasons: Vec<SeasonCounts>,
}

pub fn router<S: RecordStore + 'static>() -> Router<AppState<S>> {
    Router::new().route("/stats", get(handler::<S>))
}

async fn handler<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
) -> Result<Json<StatsResponse>> {
    // ---
    info!("GET /stats");
    let totals = store.row_counts().await.map_err(AnalyticsError::store)?;
    let seasons = store
        .season_breakdown()
        .await
        .map_err(AnalyticsError::store)?;
    Ok(Json(StatsResponse { totals, seasons }))
}
