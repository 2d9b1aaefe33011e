//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod amount;
pub mod assets;
pub mod entries;
pub mod health;
pub mod loans;
pub mod reconciliation;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(entries::routes())
        .merge(amount::routes())
        .merge(loans::routes())
        .merge(assets::routes())
        .merge(reconciliation::routes())
}
