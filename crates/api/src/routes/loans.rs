//! Loan routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use homeledger_core::loan::{
    Loan, LoanRequest, PortfolioSummary, PrepaymentRequest, RepaymentRequest, RepaymentScheduleItem,
    ScheduleParams,
};
use homeledger_core::{LoanPosting, LoanPreview};
use homeledger_shared::types::LoanId;
use serde::Serialize;

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath};

/// Creates the loan routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(list_loans).post(create_loan))
        .route("/loans/preview", post(preview_loan))
        .route("/loans/{loan_id}", get(get_loan))
        .route("/loans/{loan_id}/schedule", get(get_schedule))
        .route("/loans/{loan_id}/repay", post(repay_loan))
        .route("/loans/{loan_id}/prepay", post(prepay_loan))
}

/// Response for listing loans.
#[derive(Debug, Serialize)]
pub struct LoanListResponse {
    /// Loans of the book.
    pub loans: Vec<Loan>,
    /// Totals across them.
    pub portfolio: PortfolioSummary,
}

/// POST /loans/preview
///
/// Live schedule for a loan form; incomplete input yields an empty schedule.
async fn preview_loan(
    State(state): State<AppState>,
    ApiJson(params): ApiJson<ScheduleParams>,
) -> ApiResult<Json<LoanPreview>> {
    Ok(Json(state.bookkeeper.preview_loan(&params)?))
}

/// POST /loans
async fn create_loan(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoanRequest>,
) -> ApiResult<(StatusCode, Json<LoanPosting>)> {
    let posting = state.bookkeeper.originate_loan(state.book_id, &request).await?;
    Ok((StatusCode::CREATED, Json(posting)))
}

/// GET /loans
async fn list_loans(State(state): State<AppState>) -> ApiResult<Json<LoanListResponse>> {
    let loans = state.bookkeeper.loans(state.book_id).await?;
    let portfolio = state.bookkeeper.loan_portfolio(state.book_id).await?;
    Ok(Json(LoanListResponse { loans, portfolio }))
}

/// GET /loans/{loan_id}
async fn get_loan(State(state): State<AppState>, ApiPath(loan_id): ApiPath<LoanId>) -> ApiResult<Json<Loan>> {
    Ok(Json(state.bookkeeper.loan(loan_id).await?))
}

/// GET /loans/{loan_id}/schedule
async fn get_schedule(
    State(state): State<AppState>,
    ApiPath(loan_id): ApiPath<LoanId>,
) -> ApiResult<Json<Vec<RepaymentScheduleItem>>> {
    Ok(Json(state.bookkeeper.loan_schedule(loan_id).await?))
}

/// POST /loans/{loan_id}/repay
async fn repay_loan(
    State(state): State<AppState>,
    ApiPath(loan_id): ApiPath<LoanId>,
    ApiJson(request): ApiJson<RepaymentRequest>,
) -> ApiResult<Json<LoanPosting>> {
    Ok(Json(state.bookkeeper.repay_loan(loan_id, &request).await?))
}

/// POST /loans/{loan_id}/prepay
async fn prepay_loan(
    State(state): State<AppState>,
    ApiPath(loan_id): ApiPath<LoanId>,
    ApiJson(request): ApiJson<PrepaymentRequest>,
) -> ApiResult<Json<LoanPosting>> {
    Ok(Json(state.bookkeeper.prepay_loan(loan_id, &request).await?))
}
