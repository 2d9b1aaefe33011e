//! Property-based tests for reconciliation and split resolution.
//!
//! Feature: homeledger-engine, Property 5: Reconciliation Adjustments

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, Money};
use proptest::prelude::*;

use super::service::ReconciliationService;
use super::types::{SnapshotStatus, SplitAllocation, SuspenseAccounts};
use crate::ledger::{Account, AccountBalance, AccountType, ChartOfAccounts, LedgerError};

struct Fixture {
    chart: ChartOfAccounts,
    account: Account,
    targets: Vec<AccountId>,
    suspense: SuspenseAccounts,
}

fn fixture(account_type: AccountType) -> Fixture {
    let account = Account::new("1001", "Reconciled", account_type);
    let targets: Vec<Account> = (0..4)
        .map(|i| Account::new(format!("50{i:02}"), "Target", AccountType::Expense))
        .collect();
    let income = Account::new("4099", "Unclassified income", AccountType::Income);
    let expense = Account::new("5099", "Unclassified expense", AccountType::Expense);
    let suspense = SuspenseAccounts {
        unclassified_income: income.id,
        unclassified_expense: expense.id,
    };
    let target_ids = targets.iter().map(|a| a.id).collect();
    let mut all = targets;
    all.extend([account.clone(), income, expense]);
    Fixture {
        chart: ChartOfAccounts::new(all),
        account,
        targets: target_ids,
        suspense,
    }
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop_oneof![Just(AccountType::Asset), Just(AccountType::Liability)]
}

fn balance_strategy() -> impl Strategy<Value = Money> {
    (-100_000_000i64..100_000_000i64).prop_map(Money::from_cents)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 5.1: The adjustment closes the difference exactly.
    ///
    /// *For any* external and book balance, difference SHALL equal
    /// external - book; a zero difference SHALL create no entry; otherwise
    /// the entry SHALL balance and move the account's normal-side balance
    /// by exactly the difference.
    #[test]
    fn prop_adjustment_closes_difference(
        account_type in account_type_strategy(),
        external in balance_strategy(),
        book in balance_strategy(),
    ) {
        let f = fixture(account_type);
        let (snapshot, entry) = ReconciliationService::assess(
            BookId::new(), &f.account, external, book, date(), &f.suspense,
        ).unwrap();

        prop_assert_eq!(snapshot.difference, external - book);
        match entry {
            None => {
                prop_assert!(snapshot.difference.is_zero());
                prop_assert_eq!(snapshot.status, SnapshotStatus::Balanced);
            }
            Some(entry) => {
                prop_assert_eq!(snapshot.status, SnapshotStatus::Pending);
                prop_assert!(entry.is_balanced());
                prop_assert_eq!(entry.lines.len(), 2);
                let moved = AccountBalance::from_lines(
                    f.account.id,
                    f.account.normal_side,
                    entry.lines.iter().filter(|l| l.account_id == f.account.id),
                );
                prop_assert_eq!(book + moved.balance, external);
            }
        }
    }

    /// Property 5.2: Split resolution succeeds exactly when the parts sum
    /// to the suspense amount.
    #[test]
    fn prop_split_sum_must_match(
        shortfall in 1i64..10_000_000i64,
        parts in proptest::collection::vec(1i64..5_000_000i64, 1..4),
    ) {
        let f = fixture(AccountType::Asset);
        let book = Money::from_cents(20_000_000);
        let (_, entry) = ReconciliationService::assess(
            BookId::new(), &f.account, book - Money::from_cents(shortfall), book, date(), &f.suspense,
        ).unwrap();
        let entry = entry.unwrap();

        let allocations: Vec<SplitAllocation> = parts
            .iter()
            .enumerate()
            .map(|(i, cents)| SplitAllocation {
                account_id: f.targets[i],
                amount: Money::from_cents(*cents),
                description: None,
            })
            .collect();
        let total: i64 = parts.iter().sum();

        let result = ReconciliationService::split(&entry, &allocations, &f.chart, &f.suspense);
        if total == shortfall {
            let resolved = result.unwrap();
            prop_assert!(resolved.is_balanced());
            prop_assert_eq!(resolved.lines.len(), 1 + parts.len());
        } else {
            prop_assert_eq!(
                result,
                Err(LedgerError::SplitAmountMismatch {
                    expected: Money::from_cents(shortfall),
                    actual: Money::from_cents(total),
                })
            );
        }
    }

    /// Property 5.3: Splitting the suspense amount evenly always resolves.
    #[test]
    fn prop_even_split_resolves(shortfall in 4i64..10_000_000i64, n in 1usize..=4) {
        let f = fixture(AccountType::Asset);
        let book = Money::from_cents(20_000_000);
        let (_, entry) = ReconciliationService::assess(
            BookId::new(), &f.account, book + Money::from_cents(shortfall), book, date(), &f.suspense,
        ).unwrap();
        let entry = entry.unwrap();

        let allocations: Vec<SplitAllocation> = Money::from_cents(shortfall)
            .split_even(n)
            .into_iter()
            .enumerate()
            .map(|(i, amount)| SplitAllocation { account_id: f.targets[i], amount, description: None })
            .collect();
        let resolved = ReconciliationService::split(&entry, &allocations, &f.chart, &f.suspense);
        prop_assert!(resolved.is_ok(), "{:?}", resolved);
        prop_assert!(resolved.unwrap().is_balanced());
    }
}
