//! Reconciliation domain types.

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, EntryId, Money, SnapshotId};
use serde::{Deserialize, Serialize};

use crate::ledger::JournalEntry;

/// Outcome of comparing an external balance with the books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// No difference; no entry was created (terminal).
    Balanced,
    /// An adjustment awaits classification.
    Pending,
    /// The adjustment was classified (terminal).
    Resolved,
}

/// A user-reported external balance and how it compared with the books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Unique identifier.
    pub id: SnapshotId,
    /// Book the snapshot belongs to.
    pub book_id: BookId,
    /// Account reconciled.
    pub account_id: AccountId,
    /// Balance date.
    pub snapshot_date: NaiveDate,
    /// Balance reported outside the books.
    pub external_balance: Money,
    /// Book balance at `snapshot_date` on the account's normal side.
    pub book_balance: Money,
    /// `external_balance - book_balance`.
    pub difference: Money,
    /// Status.
    pub status: SnapshotStatus,
    /// Adjustment entry, when one was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation_entry_id: Option<EntryId>,
}

/// Snapshot submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRequest {
    /// Account to reconcile.
    pub account_id: AccountId,
    /// Reported balance.
    pub external_balance: Money,
    /// Defaults to today.
    #[serde(default)]
    pub snapshot_date: Option<NaiveDate>,
}

/// One part of a split classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAllocation {
    /// Account receiving the part.
    pub account_id: AccountId,
    /// Amount of the part.
    pub amount: Money,
    /// Line description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Holding accounts for unclassified differences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspenseAccounts {
    /// Receives suspense credits (book balance was too low on a debit-normal account).
    pub unclassified_income: AccountId,
    /// Receives suspense debits.
    pub unclassified_expense: AccountId,
}

impl SuspenseAccounts {
    /// Returns true if `account_id` is a suspense account.
    #[must_use]
    pub fn contains(&self, account_id: AccountId) -> bool {
        account_id == self.unclassified_income || account_id == self.unclassified_expense
    }
}

/// A pending reconciliation entry with its snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    /// The pending entry.
    pub entry: JournalEntry,
    /// The snapshot that produced it.
    pub snapshot: Option<BalanceSnapshot>,
}
