//! Fixed asset domain types.

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, AssetId, BookId, EntryId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::JournalEntry;

/// Depreciation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    /// Equal amounts each period.
    StraightLine,
    /// Never depreciates.
    None,
}

/// Length of one depreciation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One period per month.
    Monthly,
    /// One period per day, with 30-day months.
    Daily,
}

impl Granularity {
    /// Period label for a date: `YYYY-MM` (monthly) or `YYYY-MM-DD` (daily).
    #[must_use]
    pub fn period_label(self, date: NaiveDate) -> String {
        match self {
            Self::Monthly => date.format("%Y-%m").to_string(),
            Self::Daily => date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Asset lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// In service.
    Active,
    /// Disposed (terminal, immutable).
    Disposed,
}

/// A depreciable fixed asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier.
    pub id: AssetId,
    /// Book the asset belongs to.
    pub book_id: BookId,
    /// Display name.
    pub name: String,
    /// Fixed-asset account carrying the cost.
    pub account_id: AccountId,
    /// Purchase cost.
    pub original_cost: Money,
    /// Residual value in percent of cost.
    pub residual_rate: Decimal,
    /// Useful life in months.
    pub useful_life_months: u32,
    /// Depreciation method.
    pub depreciation_method: DepreciationMethod,
    /// Period length.
    pub depreciation_granularity: Granularity,
    /// Purchase date.
    pub purchase_date: NaiveDate,
    /// Depreciation posted so far.
    pub accumulated_depreciation: Money,
    /// Number of accruals posted.
    pub periods_accrued: u32,
    /// Label of the last accrued period.
    pub last_accrued_period: Option<String>,
    /// Lifecycle status.
    pub status: AssetStatus,
}

impl Asset {
    /// Original cost minus accumulated depreciation.
    #[must_use]
    pub fn net_book_value(&self) -> Money {
        self.original_cost - self.accumulated_depreciation
    }

    /// Returns true once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.status == AssetStatus::Disposed
    }
}

/// Input for registering an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequest {
    /// Display name.
    pub name: String,
    /// Fixed-asset account.
    pub account_id: AccountId,
    /// Purchase cost.
    pub original_cost: Money,
    /// Residual value in percent of cost.
    pub residual_rate: Decimal,
    /// Useful life in months.
    pub useful_life_months: u32,
    /// Depreciation method.
    pub depreciation_method: DepreciationMethod,
    /// Period length.
    pub depreciation_granularity: Granularity,
    /// Purchase date.
    pub purchase_date: NaiveDate,
}

/// One period of a projected depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationScheduleItem {
    /// Period number, starting at 1.
    pub period: u32,
    /// Depreciation for the period.
    pub amount: Money,
    /// Accumulated depreciation after the period.
    pub accumulated: Money,
    /// Net book value after the period.
    pub net_book_value: Money,
}

/// A posted accrual, as recorded in an asset's depreciation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationRecord {
    /// Period label of the accrual.
    pub period: String,
    /// Amount accrued.
    pub amount: Money,
    /// Accumulated depreciation after the accrual.
    pub accumulated: Money,
    /// Net book value after the accrual.
    pub net_book_value: Money,
    /// The depreciation entry.
    pub entry_id: EntryId,
    /// Posting date of the entry.
    pub posted_on: NaiveDate,
}

impl DepreciationRecord {
    /// Record of an accrual from the updated asset and its entry.
    #[must_use]
    pub fn from_accrual(updated: &Asset, entry: &JournalEntry) -> Self {
        Self {
            period: updated.last_accrued_period.clone().unwrap_or_default(),
            amount: entry.total_debit(),
            accumulated: updated.accumulated_depreciation,
            net_book_value: updated.net_book_value(),
            entry_id: entry.id,
            posted_on: entry.entry_date,
        }
    }
}

/// Aggregate view over a book's assets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSummary {
    /// Number of assets.
    pub asset_count: usize,
    /// Assets not yet disposed.
    pub active_count: usize,
    /// Sum of purchase costs.
    pub total_original_cost: Money,
    /// Sum of accumulated depreciation.
    pub total_accumulated_depreciation: Money,
    /// Sum of net book values.
    pub total_net_book_value: Money,
}

/// Input for disposing an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisposalRequest {
    /// Amount received for the asset.
    pub disposal_income: Money,
    /// Posting date.
    pub disposal_date: NaiveDate,
    /// Account receiving the gain or bearing the loss.
    pub income_account_id: AccountId,
    /// Account receiving the proceeds; required when income is positive.
    #[serde(default)]
    pub proceeds_account_id: Option<AccountId>,
}

/// Result of an accrual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accrual {
    /// The asset after the accrual.
    pub asset: Asset,
    /// The depreciation entry.
    pub entry: JournalEntry,
    /// Amount accrued.
    pub amount: Money,
}

/// Result of a disposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposal {
    /// The disposed asset.
    pub asset: Asset,
    /// The closing entry.
    pub entry: JournalEntry,
    /// Disposal income minus net book value (negative for a loss).
    pub gain_loss: Money,
}
