//! Property-based tests for the amortization calculator.
//!
//! Feature: homeledger-engine, Property 3: Schedules Reconcile to the Principal

use chrono::NaiveDate;
use homeledger_shared::types::Money;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::amortization::{AmortizationCalculator, ScheduleParams};
use super::types::RepaymentMethod;

fn principal_strategy() -> impl Strategy<Value = Money> {
    // 1.00 to 10,000,000.00
    (100i64..1_000_000_000i64).prop_map(Money::from_cents)
}

fn rate_strategy() -> impl Strategy<Value = Decimal> {
    // 0.00% to 24.00%, two decimals
    (0i64..=2400i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn method_strategy() -> impl Strategy<Value = RepaymentMethod> {
    prop_oneof![
        Just(RepaymentMethod::EqualInstallment),
        Just(RepaymentMethod::EqualPrincipal)
    ]
}

fn params(principal: Money, annual_rate: Decimal, total_months: u32, method: RepaymentMethod) -> ScheduleParams {
    ScheduleParams {
        principal,
        annual_rate,
        total_months,
        repayment_method: method,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 3.1: Principal components sum to the principal.
    ///
    /// *For any* principal, rate, term and method, Σ principal_component
    /// SHALL equal the principal and the last remaining balance SHALL be 0.
    #[test]
    fn prop_principal_components_sum_exactly(
        principal in principal_strategy(),
        rate in rate_strategy(),
        months in 1u32..=360,
        method in method_strategy(),
    ) {
        let items = AmortizationCalculator::schedule(&params(principal, rate, months, method)).unwrap();
        prop_assert_eq!(items.len(), months as usize);

        let sum: Money = items.iter().map(|i| i.principal_component).sum();
        prop_assert_eq!(sum, principal);
        prop_assert_eq!(items.last().unwrap().remaining_balance, Money::ZERO);

        for item in &items {
            prop_assert!(!item.principal_component.is_negative());
            prop_assert!(!item.interest_component.is_negative());
            prop_assert_eq!(item.payment, item.principal_component + item.interest_component);
        }
    }

    /// Property 3.2: Remaining balance never increases.
    #[test]
    fn prop_remaining_balance_monotonic(
        principal in principal_strategy(),
        rate in rate_strategy(),
        months in 1u32..=240,
        method in method_strategy(),
    ) {
        let items = AmortizationCalculator::schedule(&params(principal, rate, months, method)).unwrap();
        prop_assert!(items[0].remaining_balance <= principal);
        for pair in items.windows(2) {
            prop_assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
        }
    }

    /// Property 3.3: Equal principal keeps the principal constant and
    /// interest non-increasing.
    ///
    /// Every period but the last repays the same principal; the last takes
    /// the remainder.
    #[test]
    fn prop_equal_principal_shape(
        principal in principal_strategy(),
        rate in rate_strategy(),
        months in 2u32..=240,
    ) {
        let items = AmortizationCalculator::schedule(
            &params(principal, rate, months, RepaymentMethod::EqualPrincipal),
        ).unwrap();
        let constant = items[0].principal_component;
        for item in &items[..items.len() - 1] {
            prop_assert_eq!(item.principal_component, constant);
        }
        for pair in items.windows(2) {
            prop_assert!(pair[1].interest_component <= pair[0].interest_component);
        }
    }

    /// Property 3.4: Preview and authoritative schedule are identical.
    #[test]
    fn prop_preview_matches_schedule(
        principal in principal_strategy(),
        rate in rate_strategy(),
        months in 1u32..=120,
        method in method_strategy(),
    ) {
        let p = params(principal, rate, months, method);
        let (preview, summary) = AmortizationCalculator::preview(&p).unwrap();
        prop_assert_eq!(&preview, &AmortizationCalculator::schedule(&p).unwrap());
        prop_assert_eq!(summary.total_repayment, principal + summary.total_interest);
    }
}
