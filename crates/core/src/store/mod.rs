//! Persistence contract.
//!
//! The engine never touches storage directly. Every multi-record write is a
//! single trait call so an implementation can commit it atomically, and the
//! read-modify-write paths (repayments, accruals, reconciliation) carry the
//! state they read so a stale commit is refused with `ConcurrencyConflict`.

mod memory;

pub use memory::InMemoryStore;

use std::future::Future;

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, AssetId, BookId, EntryId, LoanId, Money};

use crate::asset::{Asset, DepreciationRecord};
use crate::ledger::{JournalEntry, JournalLine, LedgerError};
use crate::loan::Loan;
use crate::reconciliation::{BalanceSnapshot, PendingItem};

/// Result of inserting an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The entry was stored.
    Created(JournalEntry),
    /// The idempotency key was already used; this is the stored entry.
    Replayed(JournalEntry),
}

impl InsertOutcome {
    /// The stored entry.
    #[must_use]
    pub fn entry(&self) -> &JournalEntry {
        match self {
            Self::Created(entry) | Self::Replayed(entry) => entry,
        }
    }

    /// Consumes the outcome, returning the stored entry.
    #[must_use]
    pub fn into_entry(self) -> JournalEntry {
        match self {
            Self::Created(entry) | Self::Replayed(entry) => entry,
        }
    }

    /// Returns true if nothing new was written.
    #[must_use]
    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

/// Lines posted to a set of accounts, read together with the ledger version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountActivity {
    /// Lines of entries dated on or before the cut-off.
    pub lines: Vec<JournalLine>,
    /// Version of the book's ledger at the time of the read.
    pub version: u64,
}

/// Loan state a repayment was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanVersion {
    /// Periods repaid when read.
    pub repaid_months: u32,
    /// Remaining principal when read.
    pub remaining_principal: Money,
}

impl From<&Loan> for LoanVersion {
    fn from(loan: &Loan) -> Self {
        Self {
            repaid_months: loan.repaid_months,
            remaining_principal: loan.remaining_principal,
        }
    }
}

/// Repository trait for ledger persistence.
///
/// Every entry write bumps the owning book's ledger version.
pub trait LedgerStore: Send + Sync {
    // ========== Entries ==========

    /// Stores an entry with its companion loan and asset.
    ///
    /// A repeated idempotency key for the same book returns the entry
    /// stored under it and writes nothing.
    fn insert_entry(
        &self,
        entry: JournalEntry,
        loan: Option<Loan>,
        asset: Option<Asset>,
        idempotency_key: Option<String>,
    ) -> impl Future<Output = Result<InsertOutcome, LedgerError>> + Send;

    /// Finds an entry by ID.
    fn entry(&self, id: EntryId) -> impl Future<Output = Result<Option<JournalEntry>, LedgerError>> + Send;

    /// Replaces an entry if it still equals `original`.
    ///
    /// `EntryNotFound` if missing, `ConcurrencyConflict` if it changed.
    fn replace_entry(
        &self,
        original: &JournalEntry,
        replacement: JournalEntry,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Deletes an entry. Returns false if it did not exist.
    fn delete_entry(&self, id: EntryId) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    /// Entries of a book ordered by date, then insertion.
    fn entries(&self, book_id: BookId) -> impl Future<Output = Result<Vec<JournalEntry>, LedgerError>> + Send;

    /// Lines posted to `accounts` on or before `as_of`, with the ledger version.
    fn account_activity(
        &self,
        book_id: BookId,
        accounts: &[AccountId],
        as_of: NaiveDate,
    ) -> impl Future<Output = Result<AccountActivity, LedgerError>> + Send;

    // ========== Reconciliation ==========

    /// Stores a snapshot and its adjustment entry if the ledger version is
    /// still `expected_version`.
    fn commit_snapshot(
        &self,
        snapshot: BalanceSnapshot,
        entry: Option<JournalEntry>,
        expected_version: u64,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Snapshot linked to a reconciliation entry.
    fn snapshot_for_entry(
        &self,
        entry_id: EntryId,
    ) -> impl Future<Output = Result<Option<BalanceSnapshot>, LedgerError>> + Send;

    /// Pending reconciliation entries of a book with their snapshots.
    fn pending_reconciliations(
        &self,
        book_id: BookId,
    ) -> impl Future<Output = Result<Vec<PendingItem>, LedgerError>> + Send;

    /// Stores a classified reconciliation entry and its resolved snapshot.
    ///
    /// Fails with `NotPending` if the stored entry was resolved meanwhile.
    fn resolve_reconciliation(
        &self,
        entry: JournalEntry,
        snapshot: Option<BalanceSnapshot>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    // ========== Loans ==========

    /// Stores a new loan, with its borrow entry if any.
    fn insert_loan(
        &self,
        loan: Loan,
        entry: Option<JournalEntry>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Finds a loan by ID.
    fn loan(&self, id: LoanId) -> impl Future<Output = Result<Option<Loan>, LedgerError>> + Send;

    /// Loans of a book.
    fn loans(&self, book_id: BookId) -> impl Future<Output = Result<Vec<Loan>, LedgerError>> + Send;

    /// Stores a repayment if the loan still matches `expected`.
    fn commit_repayment(
        &self,
        expected: LoanVersion,
        updated: Loan,
        entry: JournalEntry,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    // ========== Assets ==========

    /// Finds an asset by ID.
    fn asset(&self, id: AssetId) -> impl Future<Output = Result<Option<Asset>, LedgerError>> + Send;

    /// Assets of a book.
    fn assets(&self, book_id: BookId) -> impl Future<Output = Result<Vec<Asset>, LedgerError>> + Send;

    /// Stores an accrual if the asset has still accrued `expected_periods`,
    /// appending it to the asset's depreciation history.
    fn commit_accrual(
        &self,
        expected_periods: u32,
        updated: Asset,
        entry: JournalEntry,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Posted accruals of an asset, oldest first.
    fn depreciation_history(
        &self,
        asset_id: AssetId,
    ) -> impl Future<Output = Result<Vec<DepreciationRecord>, LedgerError>> + Send;

    /// Stores a disposal if the asset is still active and has still
    /// accrued `expected_periods`.
    fn commit_disposal(
        &self,
        expected_periods: u32,
        updated: Asset,
        entry: JournalEntry,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}
