//! Cross-race analytics endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/analytics/driver-comparison` | `driver_1`, `driver_2`, optional `race_id` or `year` |
//! | `GET`  | `/analytics/circuit-performance` | `circuit`, optional `limit` |
//! | `GET`  | `/analytics/season-summary` | `year` |

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::AppState;
use crate::analytics::aggregate::{self, CircuitPerformance, SeasonSummary};
use crate::analytics::comparison::{self, Comparison, ComparisonQuery};
use crate::error::{AnalyticsError, Result};
use crate::store::RecordStore;

// ---

pub fn router<S: RecordStore + 'static>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/analytics/driver-comparison", get(driver_comparison::<S>))
        .route("/analytics/circuit-performance", get(circuit_performance::<S>))
        .route("/analytics/season-summary", get(season_summary::<S>))
}

#[derive(Debug, Deserialize)]
struct ComparisonParams {
    driver_1: String,
    driver_2: String,
    race_id: Option<i32>,
    year: Option<i32>,
}

async fn driver_comparison<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Query(params): Query<ComparisonParams>,
) -> Result<Json<Comparison>> {
    // ---
    info!("GET /analytics/driver-comparison - {:?}", params);
    let query = ComparisonQuery {
        driver_1: params.driver_1,
        driver_2: params.driver_2,
        race_id: params.race_id,
        year: params.year,
    };
    let result = comparison::driver_comparison(store.as_ref(), &query).await?;
    debug!(
        "GET /analytics/driver-comparison - {} comparable laps",
        result.total_comparable_laps
    );
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct CircuitParams {
    circuit: String,
    limit: Option<u32>,
}

async fn circuit_performance<S: RecordStore>(
    State((store, config)): State<AppState<S>>,
    Query(params): Query<CircuitParams>,
) -> Result<Json<CircuitPerformance>> {
    // ---
    info!("GET /analytics/circuit-performance - {:?}", params);
    let limit = params.limit.unwrap_or(config.circuit_race_limit);
    if limit == 0 || limit > config.circuit_race_limit_max {
        return Err(AnalyticsError::InvalidFilter(format!(
            "limit must be between 1 and {}",
            config.circuit_race_limit_max
        )));
    }

    let result =
        aggregate::circuit_performance(store.as_ref(), &params.circuit, limit as usize).await?;
    debug!(
        "GET /analytics/circuit-performance - {} races in {} groups",
        result.race_count,
        result.groups.len()
    );
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct SeasonParams {
    year: i32,
}

async fn season_summary<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Query(params): Query<SeasonParams>,
) -> Result<Json<SeasonSummary>> {
    // ---
    info!("GET /analytics/season-summary - {:?}", params);
    let result = aggregate::season_summary(store.as_ref(), params.year).await?;
    debug!(
        "GET /analytics/season-summary - {} races",
        result.summary.race_count
    );
    Ok(Json(result))
}
