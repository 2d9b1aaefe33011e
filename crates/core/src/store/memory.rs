//! In-memory ledger store.
//!
//! All state lives behind one lock, so every trait call is atomic.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, AssetId, BookId, EntryId, LoanId, SnapshotId};
use tokio::sync::RwLock;

use super::{AccountActivity, InsertOutcome, LedgerStore, LoanVersion};
use crate::asset::{Asset, DepreciationRecord};
use crate::ledger::{JournalEntry, LedgerError};
use crate::loan::Loan;
use crate::reconciliation::{BalanceSnapshot, PendingItem};

#[derive(Debug)]
struct StoredEntry {
    seq: u64,
    entry: JournalEntry,
}

#[derive(Debug, Default)]
struct State {
    seq: u64,
    entries: HashMap<EntryId, StoredEntry>,
    idempotency: HashMap<(BookId, String), EntryId>,
    versions: HashMap<BookId, u64>,
    loans: HashMap<LoanId, Loan>,
    assets: HashMap<AssetId, Asset>,
    history: HashMap<AssetId, Vec<DepreciationRecord>>,
    snapshots: HashMap<SnapshotId, BalanceSnapshot>,
}

impl State {
    fn version(&self, book_id: BookId) -> u64 {
        self.versions.get(&book_id).copied().unwrap_or_default()
    }

    fn bump(&mut self, book_id: BookId) {
        *self.versions.entry(book_id).or_default() += 1;
    }

    fn push_entry(&mut self, entry: JournalEntry) -> Result<(), LedgerError> {
        if self.entries.contains_key(&entry.id) {
            return Err(LedgerError::Persistence(format!("entry {} already exists", entry.id)));
        }
        self.seq += 1;
        self.bump(entry.book_id);
        self.entries.insert(entry.id, StoredEntry { seq: self.seq, entry });
        Ok(())
    }

    fn overwrite_entry(&mut self, entry: JournalEntry) -> Result<(), LedgerError> {
        let stored = self
            .entries
            .get_mut(&entry.id)
            .ok_or(LedgerError::EntryNotFound(entry.id))?;
        let book_id = entry.book_id;
        stored.entry = entry;
        self.bump(book_id);
        Ok(())
    }

    fn book_entries(&self, book_id: BookId) -> Vec<&StoredEntry> {
        let mut entries: Vec<&StoredEntry> = self
            .entries
            .values()
            .filter(|stored| stored.entry.book_id == book_id)
            .collect();
        entries.sort_by_key(|stored| (stored.entry.entry_date, stored.seq));
        entries
    }

    fn snapshot_for(&self, entry_id: EntryId) -> Option<&BalanceSnapshot> {
        self.snapshots
            .values()
            .find(|snapshot| snapshot.reconciliation_entry_id == Some(entry_id))
    }
}

/// Store keeping everything in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current ledger version of a book.
    pub async fn version(&self, book_id: BookId) -> u64 {
        self.state.read().await.version(book_id)
    }
}

impl LedgerStore for InMemoryStore {
    async fn insert_entry(
        &self,
        entry: JournalEntry,
        loan: Option<Loan>,
        asset: Option<Asset>,
        idempotency_key: Option<String>,
    ) -> Result<InsertOutcome, LedgerError> {
        let mut state = self.state.write().await;

        let key = idempotency_key.map(|key| (entry.book_id, key));
        if let Some(key) = &key
            && let Some(stored) = state.idempotency.get(key).and_then(|id| state.entries.get(id))
        {
            return Ok(InsertOutcome::Replayed(stored.entry.clone()));
        }

        state.push_entry(entry.clone())?;
        if let Some(key) = key {
            state.idempotency.insert(key, entry.id);
        }
        if let Some(loan) = loan {
            state.loans.insert(loan.id, loan);
        }
        if let Some(asset) = asset {
            state.assets.insert(asset.id, asset);
        }
        Ok(InsertOutcome::Created(entry))
    }

    async fn entry(&self, id: EntryId) -> Result<Option<JournalEntry>, LedgerError> {
        Ok(self.state.read().await.entries.get(&id).map(|stored| stored.entry.clone()))
    }

    async fn replace_entry(&self, original: &JournalEntry, replacement: JournalEntry) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let stored = state
            .entries
            .get(&replacement.id)
            .ok_or(LedgerError::EntryNotFound(replacement.id))?;
        if stored.entry != *original {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "entry {} changed since it was read",
                replacement.id
            )));
        }
        state.overwrite_entry(replacement)
    }

    async fn delete_entry(&self, id: EntryId) -> Result<bool, LedgerError> {
        let mut state = self.state.write().await;
        let Some(stored) = state.entries.remove(&id) else {
            return Ok(false);
        };
        state.idempotency.retain(|_, entry_id| *entry_id != id);
        state.bump(stored.entry.book_id);
        Ok(true)
    }

    async fn entries(&self, book_id: BookId) -> Result<Vec<JournalEntry>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .book_entries(book_id)
            .into_iter()
            .map(|stored| stored.entry.clone())
            .collect())
    }

    async fn account_activity(
        &self,
        book_id: BookId,
        accounts: &[AccountId],
        as_of: NaiveDate,
    ) -> Result<AccountActivity, LedgerError> {
        let wanted: HashSet<AccountId> = accounts.iter().copied().collect();
        let state = self.state.read().await;
        let lines = state
            .book_entries(book_id)
            .into_iter()
            .filter(|stored| stored.entry.entry_date <= as_of)
            .flat_map(|stored| stored.entry.lines.iter())
            .filter(|line| wanted.contains(&line.account_id))
            .cloned()
            .collect();
        Ok(AccountActivity {
            lines,
            version: state.version(book_id),
        })
    }

    async fn commit_snapshot(
        &self,
        snapshot: BalanceSnapshot,
        entry: Option<JournalEntry>,
        expected_version: u64,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let current = state.version(snapshot.book_id);
        if current != expected_version {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "ledger of book {} moved from version {expected_version} to {current}",
                snapshot.book_id
            )));
        }
        if let Some(entry) = entry {
            state.push_entry(entry)?;
        }
        state.snapshots.insert(snapshot.id, snapshot);
        Ok(())
    }

    async fn snapshot_for_entry(&self, entry_id: EntryId) -> Result<Option<BalanceSnapshot>, LedgerError> {
        Ok(self.state.read().await.snapshot_for(entry_id).cloned())
    }

    async fn pending_reconciliations(&self, book_id: BookId) -> Result<Vec<PendingItem>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .book_entries(book_id)
            .into_iter()
            .filter(|stored| stored.entry.is_pending_reconciliation())
            .map(|stored| PendingItem {
                entry: stored.entry.clone(),
                snapshot: state.snapshot_for(stored.entry.id).cloned(),
            })
            .collect())
    }

    async fn resolve_reconciliation(
        &self,
        entry: JournalEntry,
        snapshot: Option<BalanceSnapshot>,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let still_pending = state
            .entries
            .get(&entry.id)
            .ok_or(LedgerError::EntryNotFound(entry.id))?
            .entry
            .is_pending_reconciliation();
        if !still_pending {
            return Err(LedgerError::NotPending(entry.id));
        }
        state.overwrite_entry(entry)?;
        if let Some(snapshot) = snapshot {
            state.snapshots.insert(snapshot.id, snapshot);
        }
        Ok(())
    }

    async fn insert_loan(&self, loan: Loan, entry: Option<JournalEntry>) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        if let Some(entry) = entry {
            state.push_entry(entry)?;
        }
        state.loans.insert(loan.id, loan);
        Ok(())
    }

    async fn loan(&self, id: LoanId) -> Result<Option<Loan>, LedgerError> {
        Ok(self.state.read().await.loans.get(&id).cloned())
    }

    async fn loans(&self, book_id: BookId) -> Result<Vec<Loan>, LedgerError> {
        let state = self.state.read().await;
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|loan| loan.book_id == book_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| (a.start_date, &a.name).cmp(&(b.start_date, &b.name)));
        Ok(loans)
    }

    async fn commit_repayment(
        &self,
        expected: LoanVersion,
        updated: Loan,
        entry: JournalEntry,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let current = state
            .loans
            .get(&updated.id)
            .ok_or(LedgerError::LoanNotFound(updated.id))?;
        if LoanVersion::from(current) != expected {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "loan {} changed since it was read",
                updated.id
            )));
        }
        state.push_entry(entry)?;
        state.loans.insert(updated.id, updated);
        Ok(())
    }

    async fn asset(&self, id: AssetId) -> Result<Option<Asset>, LedgerError> {
        Ok(self.state.read().await.assets.get(&id).cloned())
    }

    async fn assets(&self, book_id: BookId) -> Result<Vec<Asset>, LedgerError> {
        let state = self.state.read().await;
        let mut assets: Vec<Asset> = state
            .assets
            .values()
            .filter(|asset| asset.book_id == book_id)
            .cloned()
            .collect();
        assets.sort_by(|a, b| (a.purchase_date, &a.name).cmp(&(b.purchase_date, &b.name)));
        Ok(assets)
    }

    async fn commit_accrual(
        &self,
        expected_periods: u32,
        updated: Asset,
        entry: JournalEntry,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let current = state
            .assets
            .get(&updated.id)
            .ok_or(LedgerError::AssetNotFound(updated.id))?;
        if current.is_disposed() {
            return Err(LedgerError::AssetDisposed(updated.id));
        }
        if current.periods_accrued != expected_periods {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "asset {} accrued since it was read",
                updated.id
            )));
        }
        let record = DepreciationRecord::from_accrual(&updated, &entry);
        state.push_entry(entry)?;
        state.history.entry(updated.id).or_default().push(record);
        state.assets.insert(updated.id, updated);
        Ok(())
    }

    async fn depreciation_history(&self, asset_id: AssetId) -> Result<Vec<DepreciationRecord>, LedgerError> {
        Ok(self
            .state
            .read()
            .await
            .history
            .get(&asset_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn commit_disposal(
        &self,
        expected_periods: u32,
        updated: Asset,
        entry: JournalEntry,
    ) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let current = state
            .assets
            .get(&updated.id)
            .ok_or(LedgerError::AssetNotFound(updated.id))?;
        if current.is_disposed() {
            return Err(LedgerError::AssetDisposed(updated.id));
        }
        if current.periods_accrued != expected_periods {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "asset {} accrued since it was read",
                updated.id
            )));
        }
        state.push_entry(entry)?;
        state.assets.insert(updated.id, updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{EntryKind, JournalLine, ReconciliationStatus};
    use crate::reconciliation::SnapshotStatus;
    use homeledger_shared::types::Money;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn entry(book_id: BookId, day: u32, debit: AccountId, credit: AccountId, cents: i64) -> JournalEntry {
        JournalEntry::system(
            book_id,
            date(day),
            EntryKind::Manual,
            "test",
            vec![
                JournalLine::debit(debit, Money::from_cents(cents)),
                JournalLine::credit(credit, Money::from_cents(cents)),
            ],
        )
    }

    #[tokio::test]
    async fn test_idempotent_insert_replays() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());

        let first = entry(book, 1, a, b, 100);
        let outcome = store
            .insert_entry(first.clone(), None, None, Some("k-1".into()))
            .await
            .unwrap();
        assert!(!outcome.is_replay());

        let retry = entry(book, 1, a, b, 100);
        let outcome = store
            .insert_entry(retry, None, None, Some("k-1".into()))
            .await
            .unwrap();
        assert!(outcome.is_replay());
        assert_eq!(outcome.entry().id, first.id);
        assert_eq!(store.entries(book).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_key_in_other_book_is_independent() {
        let store = InMemoryStore::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        for _ in 0..2 {
            let outcome = store
                .insert_entry(entry(BookId::new(), 1, a, b, 100), None, None, Some("k".into()))
                .await
                .unwrap();
            assert!(!outcome.is_replay());
        }
    }

    #[tokio::test]
    async fn test_account_activity_respects_cut_off() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (cash, food, salary) = (AccountId::new(), AccountId::new(), AccountId::new());
        store.insert_entry(entry(book, 1, cash, salary, 10_000), None, None, None).await.unwrap();
        store.insert_entry(entry(book, 5, food, cash, 2_500), None, None, None).await.unwrap();

        let activity = store.account_activity(book, &[cash], date(3)).await.unwrap();
        assert_eq!(activity.lines.len(), 1);
        assert_eq!(activity.version, 2);

        let activity = store.account_activity(book, &[cash], date(31)).await.unwrap();
        assert_eq!(activity.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_entries_ordered_by_date() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        let late = entry(book, 9, a, b, 1);
        let early = entry(book, 2, a, b, 1);
        store.insert_entry(late.clone(), None, None, None).await.unwrap();
        store.insert_entry(early.clone(), None, None, None).await.unwrap();

        let ids: Vec<EntryId> = store.entries(book).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn test_snapshot_commit_requires_current_version() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        let snapshot = BalanceSnapshot {
            id: SnapshotId::new(),
            book_id: book,
            account_id: a,
            snapshot_date: date(1),
            external_balance: Money::ZERO,
            book_balance: Money::ZERO,
            difference: Money::ZERO,
            status: SnapshotStatus::Balanced,
            reconciliation_entry_id: None,
        };

        let version = store.version(book).await;
        store.insert_entry(entry(book, 1, a, b, 1), None, None, None).await.unwrap();
        let result = store.commit_snapshot(snapshot.clone(), None, version).await;
        assert!(matches!(result, Err(LedgerError::ConcurrencyConflict(_))));

        let version = store.version(book).await;
        store.commit_snapshot(snapshot, None, version).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_twice_is_rejected() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        let mut pending = entry(book, 1, a, b, 500);
        pending.entry_type = EntryKind::Reconciliation;
        pending.reconciliation_status = Some(ReconciliationStatus::Pending);
        store.insert_entry(pending.clone(), None, None, None).await.unwrap();
        assert_eq!(store.pending_reconciliations(book).await.unwrap().len(), 1);

        let mut resolved = pending.clone();
        resolved.reconciliation_status = Some(ReconciliationStatus::Resolved);
        store.resolve_reconciliation(resolved.clone(), None).await.unwrap();
        assert!(store.pending_reconciliations(book).await.unwrap().is_empty());
        assert_eq!(
            store.resolve_reconciliation(resolved, None).await,
            Err(LedgerError::NotPending(pending.id))
        );
    }

    #[tokio::test]
    async fn test_delete_frees_idempotency_key() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        let first = entry(book, 1, a, b, 1);
        store.insert_entry(first.clone(), None, None, Some("k".into())).await.unwrap();
        assert!(store.delete_entry(first.id).await.unwrap());
        assert!(!store.delete_entry(first.id).await.unwrap());

        let outcome = store
            .insert_entry(entry(book, 1, a, b, 1), None, None, Some("k".into()))
            .await
            .unwrap();
        assert!(!outcome.is_replay());
    }

    #[tokio::test]
    async fn test_replace_missing_entry() {
        let store = InMemoryStore::new();
        let missing = entry(BookId::new(), 1, AccountId::new(), AccountId::new(), 1);
        assert_eq!(
            store.replace_entry(&missing, missing.clone()).await,
            Err(LedgerError::EntryNotFound(missing.id))
        );
    }

    #[tokio::test]
    async fn test_replace_requires_unchanged_entry() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b, c) = (AccountId::new(), AccountId::new(), AccountId::new());
        let original = entry(book, 1, a, b, 100);
        store.insert_entry(original.clone(), None, None, None).await.unwrap();

        let mut first = original.clone();
        first.lines[0].account_id = c;
        store.replace_entry(&original, first.clone()).await.unwrap();

        let mut second = original.clone();
        second.entry_type = EntryKind::Transfer;
        assert!(matches!(
            store.replace_entry(&original, second).await,
            Err(LedgerError::ConcurrencyConflict(_))
        ));
        assert_eq!(store.entry(original.id).await.unwrap(), Some(first));
    }

    fn asset(book_id: BookId, account_id: AccountId) -> Asset {
        Asset {
            id: AssetId::new(),
            book_id,
            name: "Laptop".into(),
            account_id,
            original_cost: Money::from_cents(120_000),
            residual_rate: rust_decimal::Decimal::ZERO,
            useful_life_months: 12,
            depreciation_method: crate::asset::DepreciationMethod::StraightLine,
            depreciation_granularity: crate::asset::Granularity::Monthly,
            purchase_date: date(1),
            accumulated_depreciation: Money::ZERO,
            periods_accrued: 0,
            last_accrued_period: None,
            status: crate::asset::AssetStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_disposal_rejected_after_concurrent_accrual() {
        let store = InMemoryStore::new();
        let book = BookId::new();
        let (a, b) = (AccountId::new(), AccountId::new());
        let read = asset(book, a);
        store
            .insert_entry(entry(book, 1, a, b, 120_000), None, Some(read.clone()), None)
            .await
            .unwrap();

        let accrued = Asset {
            accumulated_depreciation: Money::from_cents(10_000),
            periods_accrued: 1,
            last_accrued_period: Some("2025-03".into()),
            ..read.clone()
        };
        store
            .commit_accrual(0, accrued.clone(), entry(book, 31, b, a, 10_000))
            .await
            .unwrap();

        let disposed = Asset {
            status: crate::asset::AssetStatus::Disposed,
            ..read.clone()
        };
        assert!(matches!(
            store
                .commit_disposal(read.periods_accrued, disposed, entry(book, 31, b, a, 120_000))
                .await,
            Err(LedgerError::ConcurrencyConflict(_))
        ));
        assert_eq!(store.asset(read.id).await.unwrap(), Some(accrued.clone()));

        let history = store.depreciation_history(read.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].period, "2025-03");
        assert_eq!(history[0].amount, Money::from_cents(10_000));
        assert_eq!(history[0].net_book_value, Money::from_cents(110_000));
        assert_eq!(history[0].posted_on, date(31));
    }
}
