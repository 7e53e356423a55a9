//! Route gateway (EMBP): each sibling module exports a subrouter and this
//! module merges them, attaches the shared layers and binds the state.
//!
//! `main.rs` only sees [`router`]; it never learns about individual endpoints.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::store::RecordStore;
use crate::Config;

mod analytics;
mod drivers;
mod health;
mod laps;
mod races;
mod stats;

/// State shared by every handler: the injected record store and the config.
pub type AppState<S> = (Arc<S>, Config);

// ---

pub fn router<S>(store: Arc<S>, config: Config) -> Router
where
    S: RecordStore + 'static,
{
    // ---
    let cors = cors_layer(&config.cors_origins);

    Router::new()
        .merge(races::router::<S>())
        .merge(laps::router::<S>())
        .merge(drivers::router::<S>())
        .merge(analytics::router::<S>())
        .merge(stats::router::<S>())
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state((store, config))
}

/// Read-only API: GET from the configured origins, any headers.
fn cors_layer(origins: &[String]) -> CorsLayer {
    // ---
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}
