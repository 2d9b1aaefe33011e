//! The `Bookkeeper`: the engine's single entry point.
//!
//! Reads one chart snapshot per operation from the account directory, runs
//! the pure services, and commits their output through the [`LedgerStore`].

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use homeledger_shared::config::LedgerConfig;
use homeledger_shared::types::{AccountId, AssetId, BookId, EntryId, LoanId};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::asset::{
    Accrual, Asset, AssetService, AssetStatus, AssetSummary, DepreciationAccounts,
    DepreciationCalculator, DepreciationMethod, DepreciationRecord, DepreciationScheduleItem,
    Disposal, DisposalRequest, Granularity,
};
use crate::ledger::{
    AccountBalance, AccountDirectory, ChartOfAccounts, ConversionRequest, ConversionRules,
    ConversionService, EntryBuilder, EntryIntent, EntrySource, JournalEntry, LedgerError,
};
use crate::loan::{
    AmortizationCalculator, Loan, LoanRequest, LoanService, LoanSummary, PortfolioSummary,
    PrepaymentRequest, RepaymentRequest, RepaymentScheduleItem, ScheduleParams,
};
use crate::reconciliation::{
    BalanceSnapshot, PendingItem, ReconciliationService, SnapshotRequest, SplitAllocation,
    SuspenseAccounts,
};
use crate::store::{LedgerStore, LoanVersion};

/// Engine settings read from `[ledger]`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Suspense accounts for reconciliation differences.
    pub suspense: SuspenseAccounts,
    /// Accounts depreciation posts to.
    pub depreciation: DepreciationAccounts,
    /// Conversion allow-list.
    pub conversions: ConversionRules,
    /// Attempts a snapshot makes against a moving ledger.
    pub reconciliation_max_retries: u32,
}

impl EngineSettings {
    /// Reads settings from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for unknown entry types in the allow-list.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        Ok(Self {
            suspense: SuspenseAccounts {
                unclassified_income: config.suspense.unclassified_income,
                unclassified_expense: config.suspense.unclassified_expense,
            },
            depreciation: DepreciationAccounts {
                expense: config.depreciation.expense,
                accumulated: config.depreciation.accumulated,
            },
            conversions: ConversionRules::from_config(&config.conversions)?,
            reconciliation_max_retries: config.reconciliation_max_retries,
        })
    }
}

/// A created (or replayed) entry with its companion records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReceipt {
    /// The stored entry.
    pub entry: JournalEntry,
    /// Loan originated with the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan: Option<Loan>,
    /// Asset registered with the entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<Asset>,
    /// True if the idempotency key had been used before and nothing was written.
    pub replayed: bool,
}

/// Live loan preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanPreview {
    /// Totals.
    pub summary: LoanSummary,
    /// Period-by-period projection.
    pub schedule: Vec<RepaymentScheduleItem>,
}

/// A loan together with the entry that changed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoanPosting {
    /// Loan after the change.
    pub loan: Loan,
    /// Posted entry; absent for an origination without a deposit account.
    pub entry: Option<JournalEntry>,
}

/// Engine facade over the account directory and the ledger store.
pub struct Bookkeeper<S: LedgerStore> {
    directory: Arc<dyn AccountDirectory>,
    store: Arc<S>,
    settings: EngineSettings,
}

impl<S: LedgerStore> Bookkeeper<S> {
    /// Creates a bookkeeper.
    #[must_use]
    pub fn new(directory: Arc<dyn AccountDirectory>, store: Arc<S>, settings: EngineSettings) -> Self {
        Self {
            directory,
            store,
            settings,
        }
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// The current chart snapshot.
    #[must_use]
    pub fn chart(&self) -> Arc<ChartOfAccounts> {
        self.directory.snapshot()
    }

    // ========== Balances ==========

    /// Balance of an account and its sub-accounts as of a date.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account.
    pub async fn account_balance(
        &self,
        book_id: BookId,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<AccountBalance, LedgerError> {
        let chart = self.directory.snapshot();
        let (balance, _) = self.balance_with_version(&chart, book_id, account_id, as_of).await?;
        Ok(balance)
    }

    async fn balance_with_version(
        &self,
        chart: &ChartOfAccounts,
        book_id: BookId,
        account_id: AccountId,
        as_of: NaiveDate,
    ) -> Result<(AccountBalance, u64), LedgerError> {
        let account = chart.require(account_id)?;
        let accounts = chart.subtree(account_id);
        let activity = self.store.account_activity(book_id, &accounts, as_of).await?;
        let balance = AccountBalance::from_lines(account.id, account.normal_side, &activity.lines);
        Ok((balance, activity.version))
    }

    // ========== Entries ==========

    /// Builds and stores an entry with its companion loan and asset.
    ///
    /// # Errors
    ///
    /// Returns any builder error; nothing is stored on failure.
    pub async fn create_entry(&self, intent: &EntryIntent) -> Result<EntryReceipt, LedgerError> {
        let chart = self.directory.snapshot();
        let built = EntryBuilder::build(intent, &chart).map_err(Self::alarm)?;

        let book_id = intent.header.book_id;
        let loan = built
            .loan
            .as_ref()
            .map(|request| LoanService::open(request, book_id))
            .transpose()?;
        let asset = built.asset.as_ref().map(|request| AssetService::register(request, book_id));

        let outcome = self
            .store
            .insert_entry(
                built.entry,
                loan.clone(),
                asset.clone(),
                intent.header.idempotency_key.clone(),
            )
            .await?;

        if outcome.is_replay() {
            info!(entry_id = %outcome.entry().id, "replayed entry creation");
            return Ok(EntryReceipt {
                entry: outcome.into_entry(),
                loan: None,
                asset: None,
                replayed: true,
            });
        }

        let entry = outcome.into_entry();
        info!(
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            amount = %entry.total_debit(),
            loan_id = ?loan.as_ref().map(|l| l.id),
            asset_id = ?asset.as_ref().map(|a| a.id),
            "created entry"
        );
        Ok(EntryReceipt {
            entry,
            loan,
            asset,
            replayed: false,
        })
    }

    /// Finds an entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if missing.
    pub async fn entry(&self, id: EntryId) -> Result<JournalEntry, LedgerError> {
        self.store.entry(id).await?.ok_or(LedgerError::EntryNotFound(id))
    }

    /// Deletes a user entry.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if missing and `Validation` for
    /// system-generated entries, which back loan, asset and snapshot state.
    pub async fn delete_entry(&self, id: EntryId) -> Result<(), LedgerError> {
        let entry = self.entry(id).await?;
        if entry.source == EntrySource::System {
            warn!(entry_id = %id, entry_type = %entry.entry_type, "rejected deletion of system entry");
            return Err(LedgerError::field("entry_id", "system-generated entries cannot be deleted"));
        }
        if !self.store.delete_entry(id).await? {
            return Err(LedgerError::EntryNotFound(id));
        }
        info!(entry_id = %id, "deleted entry");
        Ok(())
    }

    /// Converts a user entry into another entry type.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` for a transition outside the allow-list
    /// or a system-generated entry, `ConcurrencyConflict` if the entry
    /// changed since it was read, and any builder error for the rebuilt
    /// lines. The stored entry is unchanged on failure.
    pub async fn convert_entry(
        &self,
        id: EntryId,
        request: &ConversionRequest,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = self.entry(id).await?;
        if entry.source == EntrySource::System {
            warn!(entry_id = %id, entry_type = %entry.entry_type, "rejected conversion of system entry");
            return Err(LedgerError::InvalidConversion {
                from: entry.entry_type,
                to: request.target_type,
            });
        }

        let chart = self.directory.snapshot();
        let converted = ConversionService::convert(&entry, request, &self.settings.conversions, &chart)
            .map_err(Self::alarm)?;
        self.store.replace_entry(&entry, converted.clone()).await?;

        info!(
            entry_id = %id,
            from = %entry.entry_type,
            to = %converted.entry_type,
            "converted entry"
        );
        Ok(converted)
    }

    // ========== Loans ==========

    /// Schedule and totals for a possibly incomplete loan form.
    ///
    /// # Errors
    ///
    /// Returns `Validation` only for a negative rate.
    pub fn preview_loan(&self, params: &ScheduleParams) -> Result<LoanPreview, LedgerError> {
        let (schedule, summary) = AmortizationCalculator::preview(params)?;
        Ok(LoanPreview { summary, schedule })
    }

    /// Originates a loan, posting a borrow entry when a deposit account is given.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `AccountNotFound` on bad input.
    pub async fn originate_loan(&self, book_id: BookId, request: &LoanRequest) -> Result<LoanPosting, LedgerError> {
        let chart = self.directory.snapshot();
        let (loan, entry) = LoanService::originate(request, book_id, &chart).map_err(Self::alarm)?;
        self.store.insert_loan(loan.clone(), entry.clone()).await?;

        info!(
            loan_id = %loan.id,
            principal = %loan.principal,
            monthly_payment = %loan.monthly_payment,
            entry_id = ?entry.as_ref().map(|e| e.id),
            "originated loan"
        );
        Ok(LoanPosting { loan, entry })
    }

    /// Finds a loan.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound` if missing.
    pub async fn loan(&self, id: LoanId) -> Result<Loan, LedgerError> {
        self.store.loan(id).await?.ok_or(LedgerError::LoanNotFound(id))
    }

    /// Loans of a book.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn loans(&self, book_id: BookId) -> Result<Vec<Loan>, LedgerError> {
        self.store.loans(book_id).await
    }

    /// Regenerated schedule of a loan with repaid periods marked.
    ///
    /// # Errors
    ///
    /// Returns `LoanNotFound` if missing.
    pub async fn loan_schedule(&self, id: LoanId) -> Result<Vec<RepaymentScheduleItem>, LedgerError> {
        LoanService::schedule_for(&self.loan(id).await?)
    }

    /// Records the next scheduled repayment.
    ///
    /// # Errors
    ///
    /// Returns `LoanPaidOff` on a paid-off loan and `ConcurrencyConflict`
    /// if the loan changed since it was read.
    pub async fn repay_loan(&self, id: LoanId, request: &RepaymentRequest) -> Result<LoanPosting, LedgerError> {
        let loan = self.loan(id).await?;
        let chart = self.directory.snapshot();
        let (updated, entry) = LoanService::next_repayment(&loan, request, &chart).map_err(Self::alarm)?;
        self.commit_loan(&loan, updated, entry, "recorded loan repayment").await
    }

    /// Records a principal-only prepayment.
    ///
    /// # Errors
    ///
    /// Returns `LoanPaidOff`, `Validation` for an out-of-range amount, and
    /// `ConcurrencyConflict` if the loan changed since it was read.
    pub async fn prepay_loan(&self, id: LoanId, request: &PrepaymentRequest) -> Result<LoanPosting, LedgerError> {
        let loan = self.loan(id).await?;
        let chart = self.directory.snapshot();
        let (updated, entry) = LoanService::prepayment(&loan, request, &chart).map_err(Self::alarm)?;
        self.commit_loan(&loan, updated, entry, "recorded loan prepayment").await
    }

    async fn commit_loan(
        &self,
        read: &Loan,
        updated: Loan,
        entry: JournalEntry,
        message: &'static str,
    ) -> Result<LoanPosting, LedgerError> {
        let result = self
            .store
            .commit_repayment(LoanVersion::from(read), updated.clone(), entry.clone())
            .await;
        if let Err(err) = result {
            if err.is_retryable() {
                warn!(loan_id = %read.id, error = %err, "loan repayment lost a race");
            }
            return Err(err);
        }
        info!(
            loan_id = %updated.id,
            entry_id = %entry.id,
            repaid_months = updated.repaid_months,
            remaining_principal = %updated.remaining_principal,
            status = ?updated.status,
            "{message}"
        );
        Ok(LoanPosting {
            loan: updated,
            entry: Some(entry),
        })
    }

    /// Totals over a book's loans.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn loan_portfolio(&self, book_id: BookId) -> Result<PortfolioSummary, LedgerError> {
        Ok(LoanService::portfolio(&self.store.loans(book_id).await?))
    }

    // ========== Assets ==========

    /// Finds an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetNotFound` if missing.
    pub async fn asset(&self, id: AssetId) -> Result<Asset, LedgerError> {
        self.store.asset(id).await?.ok_or(LedgerError::AssetNotFound(id))
    }

    /// Assets of a book, optionally only those with `status`.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn assets(&self, book_id: BookId, status: Option<AssetStatus>) -> Result<Vec<Asset>, LedgerError> {
        let mut assets = self.store.assets(book_id).await?;
        if let Some(status) = status {
            assets.retain(|asset| asset.status == status);
        }
        Ok(assets)
    }

    /// Totals over every asset of a book.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn asset_summary(&self, book_id: BookId) -> Result<AssetSummary, LedgerError> {
        Ok(AssetService::summary(&self.store.assets(book_id).await?))
    }

    /// Posted accruals of an asset, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AssetNotFound` if missing.
    pub async fn depreciation_history(&self, id: AssetId) -> Result<Vec<DepreciationRecord>, LedgerError> {
        self.asset(id).await?;
        self.store.depreciation_history(id).await
    }

    /// Projected depreciation schedule of an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetNotFound` if missing.
    pub async fn asset_schedule(&self, id: AssetId) -> Result<Vec<DepreciationScheduleItem>, LedgerError> {
        Ok(DepreciationCalculator::schedule(&self.asset(id).await?))
    }

    /// Accrues depreciation of one asset for the period containing `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `AssetDisposed`, `DepreciationComplete`, `DuplicateAccrual`,
    /// or `ConcurrencyConflict` if another accrual landed first.
    pub async fn accrue_depreciation(&self, id: AssetId, as_of: NaiveDate) -> Result<Accrual, LedgerError> {
        let asset = self.asset(id).await?;
        self.accrue(&asset, as_of).await
    }

    async fn accrue(&self, asset: &Asset, as_of: NaiveDate) -> Result<Accrual, LedgerError> {
        let accrual = AssetService::accrue(asset, as_of, &self.settings.depreciation).map_err(Self::alarm)?;
        self.store
            .commit_accrual(asset.periods_accrued, accrual.asset.clone(), accrual.entry.clone())
            .await?;
        info!(
            asset_id = %asset.id,
            entry_id = %accrual.entry.id,
            amount = %accrual.amount,
            accumulated = %accrual.asset.accumulated_depreciation,
            period = accrual.asset.last_accrued_period.as_deref().unwrap_or_default(),
            "accrued depreciation"
        );
        Ok(accrual)
    }

    /// Accrues every active straight-line asset of a book with the given
    /// granularity, skipping assets that are complete, already accrued for
    /// the period, or purchased after `as_of`.
    ///
    /// # Errors
    ///
    /// Stops at the first error that is not one of the skips above.
    pub async fn run_depreciation(
        &self,
        book_id: BookId,
        granularity: Granularity,
        as_of: NaiveDate,
    ) -> Result<Vec<Accrual>, LedgerError> {
        let assets = self.store.assets(book_id).await?;
        let mut accruals = Vec::new();
        for asset in assets.iter().filter(|asset| {
            !asset.is_disposed()
                && asset.depreciation_method == DepreciationMethod::StraightLine
                && asset.depreciation_granularity == granularity
                && asset.purchase_date <= as_of
        }) {
            match self.accrue(asset, as_of).await {
                Ok(accrual) => accruals.push(accrual),
                Err(LedgerError::DepreciationComplete(_) | LedgerError::DuplicateAccrual { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        info!(book_id = %book_id, as_of = %as_of, posted = accruals.len(), "ran depreciation");
        Ok(accruals)
    }

    /// Disposes an asset.
    ///
    /// # Errors
    ///
    /// Returns `AssetDisposed` if already disposed, `Validation` for bad
    /// input, and `ConcurrencyConflict` if an accrual landed first.
    pub async fn dispose_asset(&self, id: AssetId, request: &DisposalRequest) -> Result<Disposal, LedgerError> {
        let asset = self.asset(id).await?;
        let chart = self.directory.snapshot();
        let disposal =
            AssetService::dispose(&asset, request, &self.settings.depreciation, &chart).map_err(Self::alarm)?;
        self.store
            .commit_disposal(asset.periods_accrued, disposal.asset.clone(), disposal.entry.clone())
            .await?;
        info!(
            asset_id = %id,
            entry_id = %disposal.entry.id,
            gain_loss = %disposal.gain_loss,
            "disposed asset"
        );
        Ok(disposal)
    }

    // ========== Reconciliation ==========

    /// Compares an external balance with the books.
    ///
    /// The book balance and the ledger version are read together; the
    /// snapshot commits only if the version is unchanged, otherwise the
    /// balance is re-read.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown account and
    /// `ConcurrencyConflict` once every attempt has lost a race.
    pub async fn submit_snapshot(
        &self,
        book_id: BookId,
        request: &SnapshotRequest,
    ) -> Result<BalanceSnapshot, LedgerError> {
        let chart = self.directory.snapshot();
        let account = chart.postable("account_id", request.account_id)?;
        let date = request.snapshot_date.unwrap_or_else(|| Utc::now().date_naive());
        let attempts = self.settings.reconciliation_max_retries.max(1);

        for attempt in 1..=attempts {
            let (balance, version) = self
                .balance_with_version(&chart, book_id, request.account_id, date)
                .await?;
            let (snapshot, entry) = ReconciliationService::assess(
                book_id,
                account,
                request.external_balance,
                balance.balance,
                date,
                &self.settings.suspense,
            )
            .map_err(Self::alarm)?;

            match self.store.commit_snapshot(snapshot.clone(), entry, version).await {
                Ok(()) => {
                    info!(
                        snapshot_id = %snapshot.id,
                        account_id = %snapshot.account_id,
                        difference = %snapshot.difference,
                        status = ?snapshot.status,
                        entry_id = ?snapshot.reconciliation_entry_id,
                        "recorded balance snapshot"
                    );
                    return Ok(snapshot);
                }
                Err(err) if err.is_retryable() => {
                    warn!(account_id = %request.account_id, attempt, "ledger moved during snapshot, re-reading");
                }
                Err(err) => return Err(err),
            }
        }

        Err(LedgerError::ConcurrencyConflict(format!(
            "ledger kept changing after {attempts} snapshot attempts"
        )))
    }

    /// Pending reconciliation entries of a book.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the store fails.
    pub async fn pending_reconciliations(&self, book_id: BookId) -> Result<Vec<PendingItem>, LedgerError> {
        self.store.pending_reconciliations(book_id).await
    }

    /// Classifies a pending entry's suspense amount to one account.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `NotPending`, or `Validation` for a bad target.
    pub async fn confirm_reconciliation(
        &self,
        entry_id: EntryId,
        target_account_id: AccountId,
    ) -> Result<JournalEntry, LedgerError> {
        let entry = self.entry(entry_id).await?;
        let chart = self.directory.snapshot();
        let resolved = ReconciliationService::confirm(&entry, target_account_id, &chart, &self.settings.suspense)?;
        self.resolve(resolved, "confirmed reconciliation").await
    }

    /// Splits a pending entry's suspense amount across several accounts.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound`, `NotPending`, `Validation`, or
    /// `SplitAmountMismatch`; the entry is unchanged on failure.
    pub async fn split_reconciliation(
        &self,
        entry_id: EntryId,
        allocations: &[SplitAllocation],
    ) -> Result<JournalEntry, LedgerError> {
        let entry = self.entry(entry_id).await?;
        let chart = self.directory.snapshot();
        let resolved = ReconciliationService::split(&entry, allocations, &chart, &self.settings.suspense)
            .map_err(Self::alarm)?;
        self.resolve(resolved, "split reconciliation").await
    }

    async fn resolve(&self, resolved: JournalEntry, message: &'static str) -> Result<JournalEntry, LedgerError> {
        let snapshot = self
            .store
            .snapshot_for_entry(resolved.id)
            .await?
            .map(|snapshot| ReconciliationService::resolve_snapshot(&snapshot));
        self.store
            .resolve_reconciliation(resolved.clone(), snapshot)
            .await?;
        info!(entry_id = %resolved.id, lines = resolved.lines.len(), "{message}");
        Ok(resolved)
    }

    /// Logs correctness alarms before handing the error back.
    fn alarm(err: LedgerError) -> LedgerError {
        if err.is_correctness_alarm() {
            error!(error = %err, "correctness alarm: unbalanced entry");
        }
        err
    }
}
