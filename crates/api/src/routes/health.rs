//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use homeledger_shared::types::BookId;
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Book served by this process.
    pub book_id: BookId,
    /// Number of accounts in the current chart.
    pub accounts: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        book_id: state.book_id,
        accounts: state.bookkeeper.chart().len(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
