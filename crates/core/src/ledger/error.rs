//! Ledger error types for validation, state, and concurrency errors.
//!
//! One taxonomy serves the whole engine: the entry builder, conversion,
//! loans, assets, reconciliation, and the persistence contract all return
//! [`LedgerError`].

use std::fmt;

use homeledger_shared::types::{AccountId, AssetId, EntryId, LoanId, Money};
use serde::Serialize;
use thiserror::Error;

use super::entry::EntryKind;

/// A single invalid or missing input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Name of the offending field as it appears on the wire.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// One or more input fields are missing or invalid.
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Computed lines do not balance. Always an engine bug.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Money,
        /// Total credit amount.
        credit: Money,
    },

    /// The requested entry type transition is not allowed.
    #[error("Cannot convert {from} entry to {to}")]
    InvalidConversion {
        /// Current entry type.
        from: EntryKind,
        /// Requested entry type.
        to: EntryKind,
    },

    /// Split allocations do not sum to the suspense amount.
    #[error("Split total {actual} does not match suspense amount {expected}")]
    SplitAmountMismatch {
        /// Amount on the suspense line.
        expected: Money,
        /// Sum of the allocations.
        actual: Money,
    },

    // ========== State Errors ==========
    /// The loan is already paid off.
    #[error("Loan {0} is already paid off")]
    LoanPaidOff(LoanId),

    /// The asset has been disposed.
    #[error("Asset {0} has been disposed")]
    AssetDisposed(AssetId),

    /// The asset cannot accrue further depreciation.
    #[error("Asset {0} is fully depreciated or not depreciable")]
    DepreciationComplete(AssetId),

    /// Depreciation for this period was already posted.
    #[error("Asset {asset_id} already accrued depreciation for {period}")]
    DuplicateAccrual {
        /// The asset.
        asset_id: AssetId,
        /// Period label (`YYYY-MM` or `YYYY-MM-DD`).
        period: String,
    },

    /// The entry is not a pending reconciliation entry.
    #[error("Entry {0} is not pending reconciliation")]
    NotPending(EntryId),

    // ========== Not Found Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Loan not found.
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),

    /// Asset not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(AssetId),

    // ========== Concurrency Errors ==========
    /// Stale read detected while committing; retry with fresh state.
    #[error("Concurrent modification detected, please retry: {0}")]
    ConcurrencyConflict(String),

    // ========== Persistence Errors ==========
    /// The persistence service failed.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl LedgerError {
    /// Builds a validation error for a single field.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::InvalidConversion { .. } => "INVALID_CONVERSION",
            Self::SplitAmountMismatch { .. } => "SPLIT_AMOUNT_MISMATCH",
            Self::LoanPaidOff(_) => "LOAN_PAID_OFF",
            Self::AssetDisposed(_) => "ASSET_DISPOSED",
            Self::DepreciationComplete(_) => "DEPRECIATION_COMPLETE",
            Self::DuplicateAccrual { .. } => "DUPLICATE_ACCRUAL",
            Self::NotPending(_) => "NOT_PENDING",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::LoanNotFound(_) => "LOAN_NOT_FOUND",
            Self::AssetNotFound(_) => "ASSET_NOT_FOUND",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation and state errors
            Self::Validation(_)
            | Self::InvalidConversion { .. }
            | Self::SplitAmountMismatch { .. }
            | Self::LoanPaidOff(_)
            | Self::AssetDisposed(_)
            | Self::DepreciationComplete(_)
            | Self::DuplicateAccrual { .. }
            | Self::NotPending(_) => 400,

            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::EntryNotFound(_)
            | Self::LoanNotFound(_)
            | Self::AssetNotFound(_) => 404,

            // 409 Conflict - concurrency errors
            Self::ConcurrencyConflict(_) => 409,

            // 500 Internal Server Error
            Self::Unbalanced { .. } | Self::Persistence(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }

    /// Returns true if this error signals an engine bug rather than bad input.
    #[must_use]
    pub fn is_correctness_alarm(&self) -> bool {
        matches!(self, Self::Unbalanced { .. })
    }
}
