//! Property-based tests for depreciation.
//!
//! Feature: homeledger-engine, Property 4: Depreciation Never Passes the Residual Value

use chrono::{Months, NaiveDate};
use homeledger_shared::types::{AccountId, BookId, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::depreciation::DepreciationCalculator;
use super::service::{AssetService, DepreciationAccounts};
use super::types::{AssetRequest, DepreciationMethod, Granularity};

fn cost_strategy() -> impl Strategy<Value = Money> {
    // 1,000.00 to 1,000,000.00: at least one cent per daily period
    (100_000i64..100_000_000i64).prop_map(Money::from_cents)
}

fn residual_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=5000i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn request(cost: Money, rate: Decimal, months: u32, granularity: Granularity) -> AssetRequest {
    AssetRequest {
        name: "Asset".into(),
        account_id: AccountId::new(),
        original_cost: cost,
        residual_rate: rate,
        useful_life_months: months,
        depreciation_method: DepreciationMethod::StraightLine,
        depreciation_granularity: granularity,
        purchase_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 4.1: Monthly amounts sum to the depreciable base.
    ///
    /// *For any* cost, residual rate and useful life, Σ period amounts over
    /// the useful life SHALL equal the depreciable base exactly.
    #[test]
    fn prop_schedule_sums_to_base(
        cost in cost_strategy(),
        rate in residual_strategy(),
        months in 1u32..=240,
    ) {
        let asset = AssetService::register(&request(cost, rate, months, Granularity::Monthly), BookId::new());
        let schedule = DepreciationCalculator::schedule(&asset);
        let total: Money = schedule.iter().map(|i| i.amount).sum();
        prop_assert_eq!(schedule.len(), months as usize);
        prop_assert_eq!(total, DepreciationCalculator::base_of(&asset));
    }

    /// Property 4.2: Accrual never pushes net book value below residual.
    ///
    /// Accruing past the end of the useful life SHALL stop at the residual
    /// value with `DepreciationComplete`.
    #[test]
    fn prop_accrual_respects_residual(
        cost in cost_strategy(),
        rate in residual_strategy(),
        months in 1u32..=24,
        extra in 0u32..6,
    ) {
        let accounts = DepreciationAccounts { expense: AccountId::new(), accumulated: AccountId::new() };
        let mut asset = AssetService::register(&request(cost, rate, months, Granularity::Monthly), BookId::new());
        let residual = DepreciationCalculator::residual_value(cost, rate);
        let start = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();

        for offset in 0..months + extra {
            let as_of = start.checked_add_months(Months::new(offset)).unwrap();
            match AssetService::accrue(&asset, as_of, &accounts) {
                Ok(accrual) => {
                    prop_assert!(accrual.entry.is_balanced());
                    asset = accrual.asset;
                }
                Err(err) => {
                    prop_assert!(offset >= months || DepreciationCalculator::base_of(&asset).is_zero(), "{}", err);
                }
            }
            prop_assert!(asset.net_book_value() >= residual);
        }
        prop_assert_eq!(asset.net_book_value(), residual);
    }

    /// Property 4.3: Daily amounts sum to the base as well.
    #[test]
    fn prop_daily_schedule_sums_to_base(
        cost in cost_strategy(),
        rate in residual_strategy(),
        months in 1u32..=12,
    ) {
        let asset = AssetService::register(&request(cost, rate, months, Granularity::Daily), BookId::new());
        let schedule = DepreciationCalculator::schedule(&asset);
        let total: Money = schedule.iter().map(|i| i.amount).sum();
        prop_assert_eq!(schedule.len(), (months * 30) as usize);
        prop_assert_eq!(total, DepreciationCalculator::base_of(&asset));
    }
}
