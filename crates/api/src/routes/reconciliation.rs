//! Reconciliation routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use homeledger_core::ledger::JournalEntry;
use homeledger_core::reconciliation::{BalanceSnapshot, PendingItem, SnapshotRequest, SplitAllocation};
use homeledger_shared::types::{AccountId, EntryId};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath};

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reconciliation/snapshots", post(submit_snapshot))
        .route("/reconciliation/pending", get(list_pending))
        .route("/reconciliation/{entry_id}/confirm", post(confirm))
        .route("/reconciliation/{entry_id}/split", post(split))
}

/// Request body for confirming a pending entry.
#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    /// Account the whole difference belongs to.
    pub target_account_id: AccountId,
}

/// Request body for splitting a pending entry.
#[derive(Debug, Deserialize)]
pub struct SplitRequest {
    /// Allocations summing to the suspense amount.
    pub splits: Vec<SplitAllocation>,
}

/// Response for listing pending entries.
#[derive(Debug, Serialize)]
pub struct PendingResponse {
    /// Pending entries with their snapshots.
    pub pending: Vec<PendingItem>,
}

/// POST /reconciliation/snapshots
async fn submit_snapshot(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SnapshotRequest>,
) -> ApiResult<(StatusCode, Json<BalanceSnapshot>)> {
    let snapshot = state.bookkeeper.submit_snapshot(state.book_id, &request).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /reconciliation/pending
async fn list_pending(State(state): State<AppState>) -> ApiResult<Json<PendingResponse>> {
    let pending = state.bookkeeper.pending_reconciliations(state.book_id).await?;
    Ok(Json(PendingResponse { pending }))
}

/// POST /reconciliation/{entry_id}/confirm
async fn confirm(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<EntryId>,
    ApiJson(request): ApiJson<ConfirmRequest>,
) -> ApiResult<Json<JournalEntry>> {
    Ok(Json(
        state
            .bookkeeper
            .confirm_reconciliation(entry_id, request.target_account_id)
            .await?,
    ))
}

/// POST /reconciliation/{entry_id}/split
async fn split(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<EntryId>,
    ApiJson(request): ApiJson<SplitRequest>,
) -> ApiResult<Json<JournalEntry>> {
    Ok(Json(state.bookkeeper.split_reconciliation(entry_id, &request.splits).await?))
}
