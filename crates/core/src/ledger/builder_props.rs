//! Property-based tests for the entry builder.
//!
//! Feature: homeledger-engine, Property 1: Built Entries Balance

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, Money};
use proptest::prelude::*;
use uuid::Uuid;

use super::account::{Account, AccountType, ChartOfAccounts};
use super::builder::EntryBuilder;
use super::error::LedgerError;
use super::intent::{DepreciationTerms, EntryHeader, EntryIntent, IntentKind, LoanTerms};

struct Accounts {
    chart: ChartOfAccounts,
    cash: AccountId,
    bank: AccountId,
    card: AccountId,
    food: AccountId,
    interest: AccountId,
    salary: AccountId,
    furniture: AccountId,
}

/// Account with a fixed id, so strategies and charts agree across cases.
fn account(n: u128, code: &str, account_type: AccountType) -> Account {
    let mut account = Account::new(code, code, account_type);
    account.id = AccountId::from_uuid(Uuid::from_u128(n));
    account
}

fn accounts() -> Accounts {
    let cash = account(1, "1001", AccountType::Asset);
    let bank = account(2, "1002", AccountType::Asset);
    let card = account(3, "2001", AccountType::Liability);
    let food = account(4, "5001", AccountType::Expense);
    let interest = account(5, "5013", AccountType::Expense);
    let salary = account(6, "4001", AccountType::Income);
    let furniture = account(7, "1601", AccountType::Asset);
    Accounts {
        cash: cash.id,
        bank: bank.id,
        card: card.id,
        food: food.id,
        interest: interest.id,
        salary: salary.id,
        furniture: furniture.id,
        chart: ChartOfAccounts::new([cash, bank, card, food, interest, salary, furniture]),
    }
}

/// Strategy to generate a valid positive amount (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64).prop_map(Money::from_cents)
}

/// Strategy to generate a non-negative amount.
fn non_negative_amount() -> impl Strategy<Value = Money> {
    (0i64..100_000_000i64).prop_map(Money::from_cents)
}

fn simple_intent(a: &Accounts) -> impl Strategy<Value = IntentKind> {
    let (cash, bank, card, food, interest, salary, furniture) =
        (a.cash, a.bank, a.card, a.food, a.interest, a.salary, a.furniture);
    prop_oneof![
        (positive_amount(), any::<bool>()).prop_map(move |(amount, on_card)| IntentKind::Expense {
            amount,
            category_account_id: food,
            payment_account_id: if on_card { card } else { cash },
        }),
        positive_amount().prop_map(move |amount| IntentKind::Income {
            amount,
            category_account_id: salary,
            payment_account_id: bank,
        }),
        positive_amount().prop_map(move |amount| IntentKind::Transfer {
            amount,
            from_account_id: bank,
            to_account_id: cash,
        }),
        positive_amount().prop_map(move |amount| IntentKind::Borrow {
            amount,
            payment_account_id: bank,
            liability_account_id: card,
            loan: LoanTerms::default(),
        }),
        (non_negative_amount(), non_negative_amount(), any::<bool>())
            .prop_filter("something must be repaid", |(p, i, _)| p.is_positive() || i.is_positive())
            .prop_map(move |(principal, interest_paid, categorised)| IntentKind::Repay {
                principal,
                interest: interest_paid,
                liability_account_id: card,
                payment_account_id: bank,
                interest_account_id: categorised.then_some(interest),
            }),
        (positive_amount(), 0u32..=100).prop_map(move |(amount, financed_pct)| {
            let financed = Money::from_cents(amount.cents() * i64::from(financed_pct) / 100);
            IntentKind::AssetPurchase {
                amount,
                asset_account_id: furniture,
                payment_account_id: Some(bank),
                extra_liability_account_id: financed.is_positive().then_some(card),
                extra_liability_amount: financed.is_positive().then_some(financed),
                depreciation: DepreciationTerms::default(),
                loan: LoanTerms::default(),
            }
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 1.1: Every valid simple intent builds a balanced entry.
    ///
    /// *For any* valid expense, income, transfer, borrow, repay or asset
    /// purchase intent, total debit SHALL equal total credit exactly.
    #[test]
    fn prop_simple_intents_balance(kind in simple_intent(&accounts())) {
        let a = accounts();
        let intent = EntryIntent::new(
            EntryHeader::new(BookId::new(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            kind,
        );
        let built = EntryBuilder::build(&intent, &a.chart);
        prop_assert!(built.is_ok(), "build failed: {:?}", built);
        let entry = built.unwrap().entry;
        prop_assert!(entry.is_balanced());
        prop_assert!(entry.total_debit().is_positive());
        for line in &entry.lines {
            prop_assert!(line.debit.is_zero() != line.credit.is_zero());
        }
    }

    /// Property 1.2: Non-positive amounts are rejected as validation errors.
    #[test]
    fn prop_non_positive_amount_rejected(cents in -100_000_000i64..=0) {
        let a = accounts();
        let kind = IntentKind::Expense {
            amount: Money::from_cents(cents),
            category_account_id: a.food,
            payment_account_id: a.cash,
        };
        let result = EntryBuilder::derive_lines(&kind, &a.chart);
        prop_assert!(matches!(result, Err(LedgerError::Validation(_))));
    }
}
