//! Error responses.
//!
//! Every failure renders as `{"error": CODE, "message": text}` with the
//! matching status; validation failures also list the offending fields.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use homeledger_core::ledger::{FieldError, LedgerError};
use homeledger_shared::AppError;
use serde::Serialize;
use tracing::{debug, error};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Vec<FieldError>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl ApiError {
    /// A 400 response.
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Status code of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code of the response.
    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let fields = match &err {
            LedgerError::Validation(fields) => fields.clone(),
            _ => Vec::new(),
        };
        Self {
            status,
            code: err.error_code(),
            message: err.to_string(),
            fields,
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code: err.error_code(),
            message: err.to_string(),
            fields: Vec::new(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request("INVALID_REQUEST", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request("INVALID_PATH", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request("INVALID_QUERY", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.code, message = %self.message, "request failed");
        } else {
            debug!(code = self.code, message = %self.message, "request rejected");
        }

        let body = ErrorBody {
            error: self.code,
            message: self.message,
            fields: self.fields,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeledger_shared::types::LoanId;

    #[test]
    fn test_ledger_error_mapping() {
        let err = ApiError::from(LedgerError::field("amount", "must be positive"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(err.fields.len(), 1);

        let err = ApiError::from(LedgerError::LoanNotFound(LoanId::new()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(LedgerError::ConcurrencyConflict("loan".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CONCURRENCY_CONFLICT");
    }

    #[test]
    fn test_app_error_mapping() {
        let err = ApiError::from(AppError::Config("missing ledger".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
