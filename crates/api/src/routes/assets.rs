//! Fixed asset routes.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use homeledger_core::asset::{
    Accrual, Asset, AssetStatus, AssetSummary, DepreciationRecord, DepreciationScheduleItem, Disposal,
    DisposalRequest, Granularity,
};
use homeledger_shared::types::AssetId;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};

/// Creates the asset routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", get(list_assets))
        .route("/assets/summary", get(get_summary))
        .route("/assets/depreciate", post(run_depreciation))
        .route("/assets/{asset_id}", get(get_asset))
        .route("/assets/{asset_id}/schedule", get(get_schedule))
        .route("/assets/{asset_id}/history", get(get_history))
        .route("/assets/{asset_id}/depreciate", post(accrue_depreciation))
        .route("/assets/{asset_id}/dispose", post(dispose_asset))
}

/// Query parameters for listing assets.
#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    /// Only assets in this status are listed.
    pub status: Option<AssetStatus>,
}

/// Response for listing assets.
#[derive(Debug, Serialize)]
pub struct AssetListResponse {
    /// Matching assets of the book.
    pub assets: Vec<Asset>,
    /// Totals over every asset of the book.
    pub summary: AssetSummary,
}

/// Request body for accruing one asset.
#[derive(Debug, Default, Deserialize)]
pub struct AccrueRequest {
    /// Accrual date. Defaults to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Request body for a depreciation run.
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    /// Only assets with this period length are accrued.
    pub granularity: Granularity,
    /// Accrual date. Defaults to today.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Response for a depreciation run.
#[derive(Debug, Serialize)]
pub struct RunResponse {
    /// Accruals posted by the run.
    pub accruals: Vec<Accrual>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// GET /assets
async fn list_assets(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AssetQuery>,
) -> ApiResult<Json<AssetListResponse>> {
    let assets = state.bookkeeper.assets(state.book_id, query.status).await?;
    let summary = state.bookkeeper.asset_summary(state.book_id).await?;
    Ok(Json(AssetListResponse { assets, summary }))
}

/// GET /assets/summary
async fn get_summary(State(state): State<AppState>) -> ApiResult<Json<AssetSummary>> {
    Ok(Json(state.bookkeeper.asset_summary(state.book_id).await?))
}

/// GET /assets/{asset_id}
async fn get_asset(State(state): State<AppState>, ApiPath(asset_id): ApiPath<AssetId>) -> ApiResult<Json<Asset>> {
    Ok(Json(state.bookkeeper.asset(asset_id).await?))
}

/// GET /assets/{asset_id}/schedule
async fn get_schedule(
    State(state): State<AppState>,
    ApiPath(asset_id): ApiPath<AssetId>,
) -> ApiResult<Json<Vec<DepreciationScheduleItem>>> {
    Ok(Json(state.bookkeeper.asset_schedule(asset_id).await?))
}

/// GET /assets/{asset_id}/history
///
/// Posted accruals, oldest first.
async fn get_history(
    State(state): State<AppState>,
    ApiPath(asset_id): ApiPath<AssetId>,
) -> ApiResult<Json<Vec<DepreciationRecord>>> {
    Ok(Json(state.bookkeeper.depreciation_history(asset_id).await?))
}

/// POST /assets/{asset_id}/depreciate
async fn accrue_depreciation(
    State(state): State<AppState>,
    ApiPath(asset_id): ApiPath<AssetId>,
    ApiJson(request): ApiJson<AccrueRequest>,
) -> ApiResult<Json<Accrual>> {
    let as_of = request.as_of.unwrap_or_else(today);
    Ok(Json(state.bookkeeper.accrue_depreciation(asset_id, as_of).await?))
}

/// POST /assets/depreciate
///
/// Accrues every eligible asset of the book for the period containing `as_of`.
async fn run_depreciation(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RunRequest>,
) -> ApiResult<Json<RunResponse>> {
    let as_of = request.as_of.unwrap_or_else(today);
    let accruals = state
        .bookkeeper
        .run_depreciation(state.book_id, request.granularity, as_of)
        .await?;
    Ok(Json(RunResponse { accruals }))
}

/// POST /assets/{asset_id}/dispose
async fn dispose_asset(
    State(state): State<AppState>,
    ApiPath(asset_id): ApiPath<AssetId>,
    ApiJson(request): ApiJson<DisposalRequest>,
) -> ApiResult<Json<Disposal>> {
    Ok(Json(state.bookkeeper.dispose_asset(asset_id, &request).await?))
}
