//! Journal entry routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use homeledger_core::ledger::{ConversionRequest, EntryIntent, JournalEntry, LedgerError};
use homeledger_shared::types::EntryId;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, IdempotencyKey};

/// Creates the entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries", post(create_entry))
        .route("/entries/{entry_id}", get(get_entry).delete(delete_entry))
        .route("/entries/{entry_id}/convert", post(convert_entry))
}

/// POST /entries
///
/// Returns 201 for a new entry and 200 when the idempotency key replays an
/// earlier one. The `Idempotency-Key` header takes precedence over the body.
async fn create_entry(
    State(state): State<AppState>,
    IdempotencyKey(header_key): IdempotencyKey,
    ApiJson(mut intent): ApiJson<EntryIntent>,
) -> ApiResult<impl IntoResponse> {
    if intent.header.book_id != state.book_id {
        return Err(LedgerError::field("book_id", "book is not served here").into());
    }
    if header_key.is_some() {
        intent.header.idempotency_key = header_key;
    }

    let receipt = state.bookkeeper.create_entry(&intent).await?;
    let status = if receipt.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(receipt)))
}

/// GET /entries/{entry_id}
async fn get_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<EntryId>,
) -> ApiResult<Json<JournalEntry>> {
    Ok(Json(state.bookkeeper.entry(entry_id).await?))
}

/// DELETE /entries/{entry_id}
async fn delete_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<EntryId>,
) -> ApiResult<StatusCode> {
    state.bookkeeper.delete_entry(entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /entries/{entry_id}/convert
async fn convert_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<EntryId>,
    ApiJson(request): ApiJson<ConversionRequest>,
) -> ApiResult<Json<JournalEntry>> {
    Ok(Json(state.bookkeeper.convert_entry(entry_id, &request).await?))
}
