//! Simple intents accepted by the entry builder.
//!
//! One variant per entry type, each carrying only the fields that type
//! needs. The common header (book, date, free text, idempotency key) is
//! flattened next to the `entry_type` tag on the wire:
//!
//! ```json
//! { "entry_type": "expense", "book_id": "…", "entry_date": "2025-03-01",
//!   "amount": "50.00", "category_account_id": "…", "payment_account_id": "…" }
//! ```

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::entry::{EntryKind, JournalLine};
use crate::asset::{DepreciationMethod, Granularity};
use crate::loan::RepaymentMethod;

/// Fields shared by every intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Book to post into.
    pub book_id: BookId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Free text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Client-generated key making retried creates idempotent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl EntryHeader {
    /// Creates a header with no free text.
    #[must_use]
    pub fn new(book_id: BookId, entry_date: NaiveDate) -> Self {
        Self {
            book_id,
            entry_date,
            description: None,
            note: None,
            idempotency_key: None,
        }
    }
}

/// Optional loan terms creating a companion loan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Loan display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_name: Option<String>,
    /// Annual rate in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Decimal>,
    /// Term in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_months: Option<u32>,
    /// Defaults to equal installment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repayment_method: Option<RepaymentMethod>,
    /// Defaults to the entry date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl LoanTerms {
    /// Returns true if no loan term is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loan_name.is_none()
            && self.annual_rate.is_none()
            && self.total_months.is_none()
            && self.repayment_method.is_none()
            && self.start_date.is_none()
    }
}

/// Asset fields required when purchasing into a depreciable account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationTerms {
    /// Asset display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    /// Useful life in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub useful_life_months: Option<u32>,
    /// Residual value in percent of cost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_rate: Option<Decimal>,
    /// Depreciation method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_method: Option<DepreciationMethod>,
    /// Period length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depreciation_granularity: Option<Granularity>,
}

/// Per-type fields of an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entry_type", rename_all = "snake_case")]
pub enum IntentKind {
    /// Debit category, credit payment.
    Expense {
        /// Amount spent.
        amount: Money,
        /// Expense category.
        category_account_id: AccountId,
        /// Asset or liability paid from.
        payment_account_id: AccountId,
    },
    /// Debit payment, credit category.
    Income {
        /// Amount received.
        amount: Money,
        /// Income category.
        category_account_id: AccountId,
        /// Asset or liability received into.
        payment_account_id: AccountId,
    },
    /// Debit `to`, credit `from`.
    Transfer {
        /// Amount moved.
        amount: Money,
        /// Source asset account.
        from_account_id: AccountId,
        /// Destination asset account.
        to_account_id: AccountId,
    },
    /// Debit asset; credit payment for the self-paid part and the liability
    /// for the financed part.
    AssetPurchase {
        /// Full purchase cost.
        amount: Money,
        /// Asset account.
        asset_account_id: AccountId,
        /// Paid from; not needed when the loan covers the whole amount.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment_account_id: Option<AccountId>,
        /// Liability financing part of the purchase.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra_liability_account_id: Option<AccountId>,
        /// Financed amount.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra_liability_amount: Option<Money>,
        /// Asset fields for depreciable accounts.
        #[serde(flatten)]
        depreciation: DepreciationTerms,
        /// Companion loan terms for the financed part.
        #[serde(flatten)]
        loan: LoanTerms,
    },
    /// Debit payment, credit liability.
    Borrow {
        /// Amount borrowed.
        amount: Money,
        /// Account receiving the funds.
        payment_account_id: AccountId,
        /// Liability account.
        liability_account_id: AccountId,
        /// Companion loan terms.
        #[serde(flatten)]
        loan: LoanTerms,
    },
    /// Debit liability (principal) and interest, credit payment.
    Repay {
        /// Principal repaid.
        #[serde(default)]
        principal: Money,
        /// Interest paid.
        #[serde(default)]
        interest: Money,
        /// Liability account.
        liability_account_id: AccountId,
        /// Account paid from.
        payment_account_id: AccountId,
        /// Interest expense category; interest debits the liability when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interest_account_id: Option<AccountId>,
    },
    /// Explicit balanced lines.
    Manual {
        /// The lines.
        lines: Vec<JournalLine>,
    },
}

impl IntentKind {
    /// Entry type produced by this intent.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Expense { .. } => EntryKind::Expense,
            Self::Income { .. } => EntryKind::Income,
            Self::Transfer { .. } => EntryKind::Transfer,
            Self::AssetPurchase { .. } => EntryKind::AssetPurchase,
            Self::Borrow { .. } => EntryKind::Borrow,
            Self::Repay { .. } => EntryKind::Repay,
            Self::Manual { .. } => EntryKind::Manual,
        }
    }
}

/// A complete entry creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryIntent {
    /// Common fields.
    #[serde(flatten)]
    pub header: EntryHeader,
    /// Per-type fields.
    #[serde(flatten)]
    pub kind: IntentKind,
}

impl EntryIntent {
    /// Creates an intent.
    #[must_use]
    pub fn new(header: EntryHeader, kind: IntentKind) -> Self {
        Self { header, kind }
    }
}
