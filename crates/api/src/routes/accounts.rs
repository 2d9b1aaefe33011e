//! Account balance route.

use axum::{Json, Router, extract::State, routing::get};
use chrono::{NaiveDate, Utc};
use homeledger_core::ledger::AccountBalance;
use homeledger_shared::types::AccountId;
use serde::Deserialize;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiPath, ApiQuery};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/accounts/{account_id}/balance", get(get_account_balance))
}

/// Query parameters for an account balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Date to get the balance as of (YYYY-MM-DD). Defaults to today.
    pub as_of: Option<NaiveDate>,
}

/// GET /accounts/{account_id}/balance
///
/// Balance of the account and its sub-accounts on its normal side.
async fn get_account_balance(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<AccountId>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> ApiResult<Json<AccountBalance>> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let balance = state
        .bookkeeper
        .account_balance(state.book_id, account_id, as_of)
        .await?;
    Ok(Json(balance))
}
