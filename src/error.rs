//! Error type shared by the analytics engines and the HTTP handlers.
//!
//! Every failure here is a client-input problem (unknown driver, bad filter)
//! except `Store`, which wraps whatever the record store reported. Empty
//! aggregations are values, not errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = AnalyticsError> = std::result::Result<T, E>;

impl AnalyticsError {
    // ---
    /// Wrap a store-side error; usable directly in `map_err`.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }
}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        // ---
        let status = match &self {
            AnalyticsError::NotFound(_) => StatusCode::NOT_FOUND,
            AnalyticsError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::Store(e) => {
                tracing::error!("Record store failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
