//! Driver endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/drivers` | optional `?race_id=` or `?year=` |
//! | `GET`  | `/drivers/{code}/stats` | optional `?race_id=` or `?year=` |

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::AppState;
use crate::analytics::drivers::{self, DriverStats};
use crate::error::Result;
use crate::store::RecordStore;

// ---

pub fn router<S: RecordStore + 'static>() -> Router<AppState<S>> {
    // ---
    Router::new()
        .route("/drivers", get(list::<S>))
        .route("/drivers/{code}/stats", get(stats::<S>))
}

/// Mutually exclusive scope filters shared by both endpoints.
#[derive(Debug, Deserialize)]
struct ScopeQuery {
    race_id: Option<i32>,
    year: Option<i32>,
}

async fn list<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Query(params): Query<ScopeQuery>,
) -> Result<Json<Vec<String>>> {
    // ---
    info!("GET /drivers - {:?}", params);
    let codes = drivers::list_driver_codes(store.as_ref(), params.race_id, params.year).await?;
    debug!("GET /drivers - returning {} codes", codes.len());
    Ok(Json(codes))
}

async fn stats<S: RecordStore>(
    State((store, _)): State<AppState<S>>,
    Path(code): Path<String>,
    Query(params): Query<ScopeQuery>,
) -> Result<Json<DriverStats>> {
    // ---
    info!("GET /drivers/{}/stats - {:?}", code, params);
    let stats = drivers::driver_stats(store.as_ref(), &code, params.race_id, params.year).await?;
    Ok(Json(stats))
}
