// src/routes/health.rs
//! API health check endpoints for the RaceIntel backend.
//!
//! This module defines the `/`, `/health` and `/healthz` routes used by
//! container orchestrators (e.g., Docker, Kubernetes) and CI pipelines to
//! verify that the service is running and able to respond to HTTP requests.
//! It is a sibling module in the `routes` directory and follows the Explicit
//! Module Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handler(s) and related types
//! - Exports to the gateway (`mod.rs`): a subrouter containing the routes
//!
//! The gateway merges this subrouter into the top-level API router so that
//! `main.rs` does not need to know about individual endpoints.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the health endpoints.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Handle `GET /`, `GET /health` and `GET /healthz`.
///
/// Returns a static JSON object indicating the API is reachable. This
/// endpoint is deliberately lightweight and does not touch the database.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "raceintel",
    })
}

/// Create a subrouter containing the health routes.
///
/// Generic over the application state so it merges cleanly with the gateway
/// router, whatever record store backs it.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/healthz", get(health))
}
