//! Amount capture route.

use axum::{Json, Router, routing::post};
use homeledger_core::amount::{AmountInput, Key, KeyOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extractors::ApiJson;

/// Creates the amount routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/amount/evaluate", post(evaluate_amount))
}

/// Request body for evaluating an amount.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    /// Text typed so far.
    #[serde(default)]
    pub expression: String,
    /// Key presses applied to the text in order (`0`-`9`, `.`, `+ - × ÷`, `del`, `ok`).
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Response for an evaluated amount.
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    /// Text after the key presses.
    pub text: String,
    /// Amount the text stands for; absent when it does not evaluate.
    pub value: Option<Decimal>,
    /// True if the last key submitted a plain amount.
    pub submitted: bool,
}

/// POST /amount/evaluate
async fn evaluate_amount(ApiJson(request): ApiJson<EvaluateRequest>) -> ApiResult<Json<EvaluateResponse>> {
    let mut input = AmountInput::from_text(request.expression);
    let mut submitted = false;

    for name in &request.keys {
        let key = Key::parse(name)
            .ok_or_else(|| ApiError::bad_request("INVALID_KEY", format!("Unknown key: {name}")))?;
        submitted = input.press(key) == KeyOutcome::Submit;
    }

    Ok(Json(EvaluateResponse {
        value: input.value(),
        text: input.text().to_string(),
        submitted,
    }))
}
