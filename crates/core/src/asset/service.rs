//! Asset lifecycle: registration, accrual, disposal.

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, AssetId, BookId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::depreciation::DepreciationCalculator;
use super::types::{
    Accrual, Asset, AssetRequest, AssetStatus, AssetSummary, DepreciationMethod, Disposal,
    DisposalRequest,
};
use crate::ledger::{
    AccountType, ChartOfAccounts, EntryKind, JournalEntry, JournalLine, LedgerError, Violations,
    ensure_balanced,
};
use crate::loan::MAX_TOTAL_MONTHS;

/// Accounts that depreciation entries post to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepreciationAccounts {
    /// Depreciation expense (debited on accrual).
    pub expense: AccountId,
    /// Accumulated depreciation contra-asset (credited on accrual).
    pub accumulated: AccountId,
}

/// Asset service.
pub struct AssetService;

impl AssetService {
    /// Validates a registration request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` listing every bad field, or `AccountNotFound`.
    pub fn validate_request(request: &AssetRequest, chart: &ChartOfAccounts) -> Result<(), LedgerError> {
        let mut v = Violations::new();
        v.check(!request.name.trim().is_empty(), "asset_name", "must not be blank");
        v.check(request.original_cost.is_positive(), "amount", "must be positive");
        v.check(
            request.residual_rate >= Decimal::ZERO && request.residual_rate <= Decimal::ONE_HUNDRED,
            "residual_rate",
            "must be between 0 and 100",
        );
        v.check(request.useful_life_months > 0, "useful_life_months", "must be positive");
        v.check(
            request.useful_life_months <= MAX_TOTAL_MONTHS,
            "useful_life_months",
            "must not exceed 1200",
        );
        if v.is_empty() && request.depreciation_method == DepreciationMethod::StraightLine {
            let base = DepreciationCalculator::depreciable_base(request.original_cost, request.residual_rate);
            let periods = DepreciationCalculator::total_periods(
                request.useful_life_months,
                request.depreciation_granularity,
            );
            v.check(
                base.is_zero() || base.div_trunc(i64::from(periods)).is_positive(),
                "useful_life_months",
                "leaves less than one cent of depreciation per period",
            );
        }
        if let Some(account) = v.absorb(chart.postable("asset_account_id", request.account_id))?
            && account.account_type != AccountType::Asset
        {
            v.push("asset_account_id", format!("account {} is not an asset", account.code));
        }
        v.finish()
    }

    /// Creates the asset record for a validated request.
    #[must_use]
    pub fn register(request: &AssetRequest, book_id: BookId) -> Asset {
        Asset {
            id: AssetId::new(),
            book_id,
            name: request.name.trim().to_string(),
            account_id: request.account_id,
            original_cost: request.original_cost,
            residual_rate: request.residual_rate,
            useful_life_months: request.useful_life_months,
            depreciation_method: request.depreciation_method,
            depreciation_granularity: request.depreciation_granularity,
            purchase_date: request.purchase_date,
            accumulated_depreciation: Money::ZERO,
            periods_accrued: 0,
            last_accrued_period: None,
            status: AssetStatus::Active,
        }
    }

    /// Accrues depreciation for the period containing `as_of`.
    ///
    /// # Errors
    ///
    /// - `AssetDisposed` once disposed
    /// - `DepreciationComplete` for method `none` or a fully depreciated asset
    /// - `DuplicateAccrual` if the period is not later than the last accrued one
    /// - `Validation` if `as_of` precedes the purchase date
    pub fn accrue(
        asset: &Asset,
        as_of: NaiveDate,
        accounts: &DepreciationAccounts,
    ) -> Result<Accrual, LedgerError> {
        if asset.is_disposed() {
            return Err(LedgerError::AssetDisposed(asset.id));
        }
        let base = DepreciationCalculator::base_of(asset);
        if asset.depreciation_method == DepreciationMethod::None
            || asset.accumulated_depreciation >= base
        {
            return Err(LedgerError::DepreciationComplete(asset.id));
        }

        let period = asset.depreciation_granularity.period_label(as_of);
        if asset
            .last_accrued_period
            .as_deref()
            .is_some_and(|last| period.as_str() <= last)
        {
            return Err(LedgerError::DuplicateAccrual {
                asset_id: asset.id,
                period,
            });
        }
        if as_of < asset.purchase_date {
            return Err(LedgerError::field("as_of", "must not precede the purchase date"));
        }

        let amount = DepreciationCalculator::amount_for_period(
            asset,
            asset.periods_accrued + 1,
            asset.accumulated_depreciation,
        );
        if !amount.is_positive() {
            return Err(LedgerError::DepreciationComplete(asset.id));
        }

        let lines = vec![
            JournalLine::debit(accounts.expense, amount),
            JournalLine::credit(accounts.accumulated, amount),
        ];
        ensure_balanced(&lines)?;
        let entry = JournalEntry::system(
            asset.book_id,
            as_of,
            EntryKind::Depreciation,
            format!("Depreciation {} {period}", asset.name),
            lines,
        );

        let mut updated = asset.clone();
        updated.accumulated_depreciation += amount;
        updated.periods_accrued += 1;
        updated.last_accrued_period = Some(period);

        debug!(asset_id = %asset.id, amount = %amount, "computed depreciation accrual");
        Ok(Accrual {
            asset: updated,
            entry,
            amount,
        })
    }

    /// Disposes an asset and closes it out of the books.
    ///
    /// Lines: debit proceeds (income), debit accumulated depreciation,
    /// credit the asset at cost, gain credited or loss debited to the
    /// income account.
    ///
    /// # Errors
    ///
    /// Returns `AssetDisposed` if already disposed, `Validation` for bad
    /// amounts or accounts.
    pub fn dispose(
        asset: &Asset,
        request: &DisposalRequest,
        accounts: &DepreciationAccounts,
        chart: &ChartOfAccounts,
    ) -> Result<Disposal, LedgerError> {
        if asset.is_disposed() {
            return Err(LedgerError::AssetDisposed(asset.id));
        }

        let income = request.disposal_income;
        let mut v = Violations::new();
        v.check(!income.is_negative(), "disposal_income", "must not be negative");
        if let Some(account) = v.absorb(chart.postable("income_account_id", request.income_account_id))?
            && !matches!(account.account_type, AccountType::Income | AccountType::Expense)
        {
            v.push(
                "income_account_id",
                format!("account {} is not an income or expense account", account.code),
            );
        }
        let proceeds = if income.is_positive() {
            match request.proceeds_account_id {
                Some(id) => {
                    if let Some(account) = v.absorb(chart.postable("proceeds_account_id", id))?
                        && account.account_type != AccountType::Asset
                    {
                        v.push("proceeds_account_id", format!("account {} is not an asset", account.code));
                    }
                    Some(id)
                }
                None => {
                    v.push("proceeds_account_id", "is required when disposal_income is positive");
                    None
                }
            }
        } else {
            None
        };
        v.finish()?;

        let gain_loss = income - asset.net_book_value();
        let mut lines = Vec::with_capacity(4);
        if let Some(proceeds) = proceeds {
            lines.push(JournalLine::debit(proceeds, income));
        }
        if asset.accumulated_depreciation.is_positive() {
            lines.push(JournalLine::debit(accounts.accumulated, asset.accumulated_depreciation));
        }
        lines.push(JournalLine::credit(asset.account_id, asset.original_cost));
        if gain_loss.is_positive() {
            lines.push(JournalLine::credit(request.income_account_id, gain_loss));
        } else if gain_loss.is_negative() {
            lines.push(JournalLine::debit(request.income_account_id, gain_loss.abs()));
        }
        ensure_balanced(&lines)?;

        let entry = JournalEntry::system(
            asset.book_id,
            request.disposal_date,
            EntryKind::AssetDispose,
            format!("Disposal of {}", asset.name),
            lines,
        );

        let mut updated = asset.clone();
        updated.status = AssetStatus::Disposed;

        Ok(Disposal {
            asset: updated,
            entry,
            gain_loss,
        })
    }

    /// Aggregates a book's assets.
    #[must_use]
    pub fn summary(assets: &[Asset]) -> AssetSummary {
        assets.iter().fold(AssetSummary::default(), |mut acc, asset| {
            acc.asset_count += 1;
            if !asset.is_disposed() {
                acc.active_count += 1;
            }
            acc.total_original_cost += asset.original_cost;
            acc.total_accumulated_depreciation += asset.accumulated_depreciation;
            acc.total_net_book_value += asset.net_book_value();
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Granularity;
    use crate::ledger::Account;
    use rust_decimal_macros::dec;

    struct Fixture {
        chart: ChartOfAccounts,
        accounts: DepreciationAccounts,
        vehicles: AccountId,
        bank: AccountId,
        other_income: AccountId,
    }

    fn fixture() -> Fixture {
        let vehicles = Account::new("1501", "Vehicles", AccountType::Asset);
        let bank = Account::new("1001-02", "Bank", AccountType::Asset);
        let other_income = Account::new("4099", "Other income", AccountType::Income);
        let expense = Account::new("5014", "Depreciation", AccountType::Expense);
        let mut accumulated = Account::new("1502", "Accumulated depreciation", AccountType::Asset);
        accumulated.normal_side = crate::ledger::Side::Credit;
        Fixture {
            vehicles: vehicles.id,
            bank: bank.id,
            other_income: other_income.id,
            accounts: DepreciationAccounts {
                expense: expense.id,
                accumulated: accumulated.id,
            },
            chart: ChartOfAccounts::new([vehicles, bank, other_income, expense, accumulated]),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(f: &Fixture) -> AssetRequest {
        AssetRequest {
            name: "Car".into(),
            account_id: f.vehicles,
            original_cost: "3600.00".parse().unwrap(),
            residual_rate: Decimal::ZERO,
            useful_life_months: 36,
            depreciation_method: DepreciationMethod::StraightLine,
            depreciation_granularity: Granularity::Monthly,
            purchase_date: date(2025, 1, 1),
        }
    }

    #[test]
    fn test_validate_request_fields() {
        let f = fixture();
        let mut req = request(&f);
        req.name = "  ".into();
        req.residual_rate = dec!(-1);
        req.useful_life_months = 0;
        req.account_id = f.other_income;
        match AssetService::validate_request(&req, &f.chart) {
            Err(LedgerError::Validation(fields)) => {
                let names: Vec<_> = fields.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(
                    names,
                    vec!["asset_name", "residual_rate", "useful_life_months", "asset_account_id"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_sub_cent_period_amount_rejected() {
        let f = fixture();
        let mut req = request(&f);
        req.original_cost = "1.00".parse().unwrap();
        req.useful_life_months = 12;
        req.depreciation_granularity = Granularity::Daily;
        match AssetService::validate_request(&req, &f.chart) {
            Err(LedgerError::Validation(fields)) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "useful_life_months");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // One cent per day over 360 days is the smallest accepted daily asset.
        req.original_cost = "3.60".parse().unwrap();
        assert_eq!(AssetService::validate_request(&req, &f.chart), Ok(()));

        // Method `none` never posts, so any cost is accepted.
        req.original_cost = "1.00".parse().unwrap();
        req.depreciation_method = DepreciationMethod::None;
        assert_eq!(AssetService::validate_request(&req, &f.chart), Ok(()));
    }

    #[test]
    fn test_full_life_lands_on_residual() {
        let f = fixture();
        let mut asset = AssetService::register(&request(&f), BookId::new());
        let mut month = date(2025, 1, 31);
        for _ in 0..36 {
            let accrual = AssetService::accrue(&asset, month, &f.accounts).unwrap();
            assert_eq!(accrual.amount, "100.00".parse().unwrap());
            assert_eq!(
                accrual.entry.lines,
                vec![
                    JournalLine::debit(f.accounts.expense, accrual.amount),
                    JournalLine::credit(f.accounts.accumulated, accrual.amount),
                ]
            );
            asset = accrual.asset;
            month = month.checked_add_months(chrono::Months::new(1)).unwrap();
        }
        assert_eq!(asset.net_book_value(), Money::ZERO);
        assert_eq!(asset.periods_accrued, 36);
        assert_eq!(
            AssetService::accrue(&asset, month, &f.accounts),
            Err(LedgerError::DepreciationComplete(asset.id))
        );
    }

    #[test]
    fn test_same_period_twice_is_duplicate() {
        let f = fixture();
        let asset = AssetService::register(&request(&f), BookId::new());
        let accrual = AssetService::accrue(&asset, date(2025, 3, 5), &f.accounts).unwrap();
        assert_eq!(accrual.asset.last_accrued_period.as_deref(), Some("2025-03"));
        assert_eq!(
            AssetService::accrue(&accrual.asset, date(2025, 3, 28), &f.accounts),
            Err(LedgerError::DuplicateAccrual {
                asset_id: asset.id,
                period: "2025-03".into(),
            })
        );
        assert!(matches!(
            AssetService::accrue(&accrual.asset, date(2025, 2, 28), &f.accounts),
            Err(LedgerError::DuplicateAccrual { .. })
        ));
    }

    #[test]
    fn test_accrual_before_purchase_rejected() {
        let f = fixture();
        let asset = AssetService::register(&request(&f), BookId::new());
        assert!(matches!(
            AssetService::accrue(&asset, date(2024, 12, 31), &f.accounts),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_dispose_with_gain() {
        let f = fixture();
        let mut asset = AssetService::register(&request(&f), BookId::new());
        asset.accumulated_depreciation = "1200.00".parse().unwrap();
        let disposal = AssetService::dispose(
            &asset,
            &DisposalRequest {
                disposal_income: "2500.00".parse().unwrap(),
                disposal_date: date(2026, 1, 1),
                income_account_id: f.other_income,
                proceeds_account_id: Some(f.bank),
            },
            &f.accounts,
            &f.chart,
        )
        .unwrap();

        assert_eq!(disposal.gain_loss, "100.00".parse().unwrap());
        assert_eq!(disposal.entry.entry_type, EntryKind::AssetDispose);
        assert_eq!(
            disposal.entry.lines,
            vec![
                JournalLine::debit(f.bank, "2500.00".parse().unwrap()),
                JournalLine::debit(f.accounts.accumulated, "1200.00".parse().unwrap()),
                JournalLine::credit(f.vehicles, "3600.00".parse().unwrap()),
                JournalLine::credit(f.other_income, "100.00".parse().unwrap()),
            ]
        );
        assert!(disposal.asset.is_disposed());
        assert_eq!(
            AssetService::accrue(&disposal.asset, date(2026, 2, 1), &f.accounts),
            Err(LedgerError::AssetDisposed(asset.id))
        );
    }

    #[test]
    fn test_dispose_scrapped_with_loss() {
        let f = fixture();
        let asset = AssetService::register(&request(&f), BookId::new());
        let disposal = AssetService::dispose(
            &asset,
            &DisposalRequest {
                disposal_income: Money::ZERO,
                disposal_date: date(2025, 6, 1),
                income_account_id: f.other_income,
                proceeds_account_id: None,
            },
            &f.accounts,
            &f.chart,
        )
        .unwrap();
        assert_eq!(disposal.gain_loss, "-3600.00".parse().unwrap());
        assert_eq!(
            disposal.entry.lines,
            vec![
                JournalLine::credit(f.vehicles, "3600.00".parse().unwrap()),
                JournalLine::debit(f.other_income, "3600.00".parse().unwrap()),
            ]
        );
    }

    #[test]
    fn test_summary_over_active_and_disposed() {
        let f = fixture();
        let mut car = AssetService::register(&request(&f), BookId::new());
        car.accumulated_depreciation = "600.00".parse().unwrap();
        let mut bike = AssetService::register(&request(&f), BookId::new());
        bike.original_cost = "400.00".parse().unwrap();
        bike.status = AssetStatus::Disposed;

        let summary = AssetService::summary(&[car, bike]);
        assert_eq!(summary.asset_count, 2);
        assert_eq!(summary.active_count, 1);
        assert_eq!(summary.total_original_cost, "4000.00".parse().unwrap());
        assert_eq!(summary.total_accumulated_depreciation, "600.00".parse().unwrap());
        assert_eq!(summary.total_net_book_value, "3400.00".parse().unwrap());
        assert_eq!(AssetService::summary(&[]), AssetSummary::default());
    }

    #[test]
    fn test_dispose_requires_proceeds_account_for_income() {
        let f = fixture();
        let asset = AssetService::register(&request(&f), BookId::new());
        let result = AssetService::dispose(
            &asset,
            &DisposalRequest {
                disposal_income: "10.00".parse().unwrap(),
                disposal_date: date(2025, 6, 1),
                income_account_id: f.other_income,
                proceeds_account_id: None,
            },
            &f.accounts,
            &f.chart,
        );
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }
}
