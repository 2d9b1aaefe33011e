//! Reconciliation engine.
//!
//! ```text
//! snapshot ──difference == 0──▶ balanced
//!     │
//!     └──difference != 0──▶ pending ──confirm / split──▶ resolved
//! ```

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, Money, SnapshotId};
use tracing::warn;

use super::types::{BalanceSnapshot, SnapshotStatus, SplitAllocation, SuspenseAccounts};
use crate::ledger::{
    Account, ChartOfAccounts, EntryKind, JournalEntry, JournalLine, LedgerError,
    ReconciliationStatus, Side, Violations, ensure_balanced,
};

/// Reconciliation service.
pub struct ReconciliationService;

impl ReconciliationService {
    /// Compares an external balance with the book balance.
    ///
    /// A nonzero difference produces a pending reconciliation entry: one
    /// line moves the account's normal-side balance by the difference, the
    /// other goes to a suspense account.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the account is itself a suspense account, and
    /// `Unbalanced` if the adjustment does not balance (an engine bug).
    pub fn assess(
        book_id: BookId,
        account: &Account,
        external_balance: Money,
        book_balance: Money,
        snapshot_date: NaiveDate,
        suspense: &SuspenseAccounts,
    ) -> Result<(BalanceSnapshot, Option<JournalEntry>), LedgerError> {
        if suspense.contains(account.id) {
            return Err(LedgerError::field("account_id", "suspense accounts cannot be reconciled"));
        }
        let difference = external_balance - book_balance;
        let mut snapshot = BalanceSnapshot {
            id: SnapshotId::new(),
            book_id,
            account_id: account.id,
            snapshot_date,
            external_balance,
            book_balance,
            difference,
            status: SnapshotStatus::Balanced,
            reconciliation_entry_id: None,
        };
        if difference.is_zero() {
            return Ok((snapshot, None));
        }

        let account_side = if difference.is_positive() {
            account.normal_side
        } else {
            account.normal_side.opposite()
        };
        let suspense_side = account_side.opposite();
        let suspense_account = match suspense_side {
            Side::Credit => suspense.unclassified_income,
            Side::Debit => suspense.unclassified_expense,
        };

        let amount = difference.abs();
        let lines = vec![
            JournalLine::on_side(account_side, account.id, amount),
            JournalLine::on_side(suspense_side, suspense_account, amount),
        ];
        ensure_balanced(&lines)?;

        let mut entry = JournalEntry::system(
            book_id,
            snapshot_date,
            EntryKind::Reconciliation,
            format!("Balance adjustment {} {difference}", account.code),
            lines,
        );
        entry.reconciliation_status = Some(ReconciliationStatus::Pending);

        snapshot.status = SnapshotStatus::Pending;
        snapshot.reconciliation_entry_id = Some(entry.id);
        Ok((snapshot, Some(entry)))
    }

    /// Index of the suspense line of a reconciliation entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no line posts to a suspense account.
    pub fn suspense_line(entry: &JournalEntry, suspense: &SuspenseAccounts) -> Result<usize, LedgerError> {
        entry
            .lines
            .iter()
            .position(|line| suspense.contains(line.account_id))
            .ok_or_else(|| LedgerError::field("entry", "reconciliation entry has no suspense line"))
    }

    /// Moves the suspense amount to `target_account_id`.
    ///
    /// # Errors
    ///
    /// Returns `NotPending` unless the entry is pending, `Validation` or
    /// `AccountNotFound` for a bad target.
    pub fn confirm(
        entry: &JournalEntry,
        target_account_id: AccountId,
        chart: &ChartOfAccounts,
        suspense: &SuspenseAccounts,
    ) -> Result<JournalEntry, LedgerError> {
        Self::require_pending(entry)?;
        chart.postable("target_account_id", target_account_id)?;
        let index = Self::suspense_line(entry, suspense)?;

        let mut resolved = entry.clone();
        resolved.lines[index].account_id = target_account_id;
        resolved.reconciliation_status = Some(ReconciliationStatus::Resolved);
        Ok(resolved)
    }

    /// Replaces the suspense line with several classified lines.
    ///
    /// The new lines keep the suspense line's side and position, and must
    /// sum exactly to its amount.
    ///
    /// # Errors
    ///
    /// Returns `NotPending` unless pending, `Validation` for empty or
    /// non-positive allocations or bad accounts, and `SplitAmountMismatch`
    /// if the allocations do not sum to the suspense amount.
    pub fn split(
        entry: &JournalEntry,
        allocations: &[SplitAllocation],
        chart: &ChartOfAccounts,
        suspense: &SuspenseAccounts,
    ) -> Result<JournalEntry, LedgerError> {
        Self::require_pending(entry)?;
        let index = Self::suspense_line(entry, suspense)?;
        let suspense_line = &entry.lines[index];

        let mut v = Violations::new();
        v.check(!allocations.is_empty(), "splits", "at least one allocation is required");
        for (i, allocation) in allocations.iter().enumerate() {
            v.check(
                allocation.amount.is_positive(),
                &format!("splits[{i}].amount"),
                "must be positive",
            );
            v.absorb(chart.postable(&format!("splits[{i}].account_id"), allocation.account_id))?;
        }
        v.finish()?;

        let expected = suspense_line.amount();
        let actual = allocations
            .iter()
            .try_fold(Money::ZERO, |total, a| total.checked_add(a.amount))
            .ok_or_else(|| LedgerError::field("splits", "allocations total is out of range"))?;
        if actual != expected {
            warn!(
                entry_id = %entry.id,
                expected = %expected,
                actual = %actual,
                "rejected reconciliation split"
            );
            return Err(LedgerError::SplitAmountMismatch { expected, actual });
        }

        let side = suspense_line.side();
        let replacement = allocations.iter().map(|allocation| {
            let line = JournalLine::on_side(side, allocation.account_id, allocation.amount);
            match &allocation.description {
                Some(description) => line.with_description(description.clone()),
                None => line,
            }
        });

        let mut lines = entry.lines[..index].to_vec();
        lines.extend(replacement);
        lines.extend_from_slice(&entry.lines[index + 1..]);
        ensure_balanced(&lines)?;

        let mut resolved = entry.clone();
        resolved.lines = lines;
        resolved.reconciliation_status = Some(ReconciliationStatus::Resolved);
        Ok(resolved)
    }

    /// Marks a snapshot resolved.
    #[must_use]
    pub fn resolve_snapshot(snapshot: &BalanceSnapshot) -> BalanceSnapshot {
        BalanceSnapshot {
            status: SnapshotStatus::Resolved,
            ..snapshot.clone()
        }
    }

    fn require_pending(entry: &JournalEntry) -> Result<(), LedgerError> {
        if entry.is_pending_reconciliation() {
            Ok(())
        } else {
            warn!(entry_id = %entry.id, "reconciliation entry is not pending");
            Err(LedgerError::NotPending(entry.id))
        }
    }
}
