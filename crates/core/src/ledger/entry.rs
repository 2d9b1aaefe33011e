//! Journal entry domain types.

use std::fmt;

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, EntryId, Money};
use serde::{Deserialize, Serialize};

/// Side of a journal line, or the normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Debit (increases assets/expenses, decreases liabilities/equity/income).
    Debit,
    /// Credit (decreases assets/expenses, increases liabilities/equity/income).
    Credit,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    /// Parses a side from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }

    /// Balance change of a line for an account whose normal side is `self`.
    ///
    /// Debit-normal: `debit - credit`. Credit-normal: `credit - debit`.
    #[must_use]
    pub fn balance_change(self, debit: Money, credit: Money) -> Money {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged category of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Spending from a payment account on an expense category.
    Expense,
    /// Receiving income into a payment account.
    Income,
    /// Moving money between two asset accounts.
    Transfer,
    /// Buying an asset, optionally partly financed.
    AssetPurchase,
    /// Taking a loan.
    Borrow,
    /// Repaying a loan.
    Repay,
    /// Free-form balanced lines.
    Manual,
    /// System adjustment from a balance snapshot.
    Reconciliation,
    /// System depreciation accrual.
    Depreciation,
    /// System asset disposal.
    AssetDispose,
}

impl EntryKind {
    /// Every entry kind.
    pub const ALL: [Self; 10] = [
        Self::Expense,
        Self::Income,
        Self::Transfer,
        Self::AssetPurchase,
        Self::Borrow,
        Self::Repay,
        Self::Manual,
        Self::Reconciliation,
        Self::Depreciation,
        Self::AssetDispose,
    ];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
            Self::AssetPurchase => "asset_purchase",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::Manual => "manual",
            Self::Reconciliation => "reconciliation",
            Self::Depreciation => "depreciation",
            Self::AssetDispose => "asset_dispose",
        }
    }

    /// Parses an entry kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Returns true if an entry may be converted into this kind.
    ///
    /// Only the six simple intents can be rebuilt from two account roles.
    #[must_use]
    pub const fn is_conversion_target(self) -> bool {
        matches!(
            self,
            Self::Expense
                | Self::Income
                | Self::Transfer
                | Self::AssetPurchase
                | Self::Borrow
                | Self::Repay
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Entered by a user.
    Manual,
    /// Generated by the engine (reconciliation, depreciation, loan origination).
    System,
}

/// Classification state of a reconciliation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    /// Suspense line awaits classification.
    Pending,
    /// Classified through confirm or split (terminal).
    Resolved,
}

/// A single line of a journal entry.
///
/// Exactly one of `debit` / `credit` is nonzero in this engine's usage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// The account affected by this line.
    pub account_id: AccountId,
    /// Debit amount (zero for credit lines).
    #[serde(default)]
    pub debit: Money,
    /// Credit amount (zero for debit lines).
    #[serde(default)]
    pub credit: Money,
    /// Optional description for this line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: None,
        }
    }

    /// Creates a line of the given side.
    #[must_use]
    pub fn on_side(side: Side, account_id: AccountId, amount: Money) -> Self {
        match side {
            Side::Debit => Self::debit(account_id, amount),
            Side::Credit => Self::credit(account_id, amount),
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The side carrying the amount.
    #[must_use]
    pub fn side(&self) -> Side {
        if self.debit.is_zero() && !self.credit.is_zero() {
            Side::Credit
        } else {
            Side::Debit
        }
    }

    /// The nonzero amount of the line.
    #[must_use]
    pub fn amount(&self) -> Money {
        match self.side() {
            Side::Debit => self.debit,
            Side::Credit => self.credit,
        }
    }
}

/// A balanced journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Book the entry belongs to.
    pub book_id: BookId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Entry type.
    pub entry_type: EntryKind,
    /// Free text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Free text note.
    #[serde(default)]
    pub note: Option<String>,
    /// Who produced the entry.
    pub source: EntrySource,
    /// Journal lines.
    pub lines: Vec<JournalLine>,
    /// Set on reconciliation entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation_status: Option<ReconciliationStatus>,
}

impl JournalEntry {
    /// Creates an engine-generated entry.
    #[must_use]
    pub fn system(
        book_id: BookId,
        entry_date: NaiveDate,
        entry_type: EntryKind,
        description: impl Into<String>,
        lines: Vec<JournalLine>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            book_id,
            entry_date,
            entry_type,
            description: Some(description.into()),
            note: None,
            source: EntrySource::System,
            lines,
            reconciliation_status: None,
        }
    }

    /// Sum of debit amounts.
    #[must_use]
    pub fn total_debit(&self) -> Money {
        self.lines.iter().map(|line| line.debit).sum()
    }

    /// Sum of credit amounts.
    #[must_use]
    pub fn total_credit(&self) -> Money {
        self.lines.iter().map(|line| line.credit).sum()
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit() == self.total_credit()
    }

    /// Returns true if this is a reconciliation entry awaiting classification.
    #[must_use]
    pub fn is_pending_reconciliation(&self) -> bool {
        self.reconciliation_status == Some(ReconciliationStatus::Pending)
    }

    /// Returns true if any line posts to `account_id`.
    #[must_use]
    pub fn touches(&self, account_id: AccountId) -> bool {
        self.lines.iter().any(|line| line.account_id == account_id)
    }
}
