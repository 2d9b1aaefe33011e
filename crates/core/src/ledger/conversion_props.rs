//! Property-based tests for entry conversion.
//!
//! Feature: homeledger-engine, Property 2: Conversion Keeps Entries Balanced

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, EntryId, Money};
use proptest::prelude::*;
use uuid::Uuid;

use super::account::{Account, AccountType, ChartOfAccounts};
use super::conversion::{ConversionRequest, ConversionRules, ConversionService};
use super::entry::{EntryKind, EntrySource, JournalEntry, JournalLine};
use super::error::LedgerError;

fn account(n: u128, code: &str, account_type: AccountType) -> Account {
    let mut account = Account::new(code, code, account_type);
    account.id = AccountId::from_uuid(Uuid::from_u128(n));
    account
}

const WALLET: u128 = 1;
const FOOD: u128 = 2;
const FURNITURE: u128 = 3;

fn chart() -> ChartOfAccounts {
    ChartOfAccounts::new([
        account(WALLET, "1001", AccountType::Asset),
        account(FOOD, "5001", AccountType::Expense),
        account(FURNITURE, "1601", AccountType::Asset),
    ])
}

fn id(n: u128) -> AccountId {
    AccountId::from_uuid(Uuid::from_u128(n))
}

fn rules() -> ConversionRules {
    ConversionRules::new([
        (EntryKind::Expense, EntryKind::AssetPurchase),
        (EntryKind::AssetPurchase, EntryKind::Expense),
    ])
}

fn expense(cents: i64) -> JournalEntry {
    JournalEntry {
        id: EntryId::new(),
        book_id: BookId::new(),
        entry_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        entry_type: EntryKind::Expense,
        description: None,
        note: None,
        source: EntrySource::Manual,
        lines: vec![
            JournalLine::debit(id(FOOD), Money::from_cents(cents)),
            JournalLine::credit(id(WALLET), Money::from_cents(cents)),
        ],
        reconciliation_status: None,
    }
}

fn target_strategy() -> impl Strategy<Value = EntryKind> {
    proptest::sample::select(EntryKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property 2.1: Round trip expense -> asset_purchase -> expense.
    ///
    /// *For any* amount, both conversions SHALL succeed, every intermediate
    /// entry SHALL balance, and the carried amount SHALL be preserved.
    #[test]
    fn prop_round_trip_stays_balanced(cents in 1i64..100_000_000i64) {
        let chart = chart();
        let rules = rules();
        let original = expense(cents);

        let purchase = ConversionService::convert(
            &original,
            &ConversionRequest {
                target_type: EntryKind::AssetPurchase,
                category_account_id: Some(id(FURNITURE)),
                payment_account_id: None,
            },
            &rules,
            &chart,
        );
        prop_assert!(purchase.is_ok(), "{:?}", purchase);
        let purchase = purchase.unwrap();
        prop_assert!(purchase.is_balanced());
        prop_assert_eq!(purchase.total_debit(), Money::from_cents(cents));

        let back = ConversionService::convert(
            &purchase,
            &ConversionRequest {
                target_type: EntryKind::Expense,
                category_account_id: Some(id(FOOD)),
                payment_account_id: None,
            },
            &rules,
            &chart,
        );
        prop_assert!(back.is_ok(), "{:?}", back);
        let back = back.unwrap();
        prop_assert!(back.is_balanced());
        prop_assert_eq!(back.lines, original.lines);
        prop_assert_eq!(back.id, original.id);
    }

    /// Property 2.2: Transitions outside the allow-list fail without a new entry.
    #[test]
    fn prop_unlisted_targets_rejected(target in target_strategy(), cents in 1i64..1_000_000i64) {
        prop_assume!(target != EntryKind::AssetPurchase);
        let result = ConversionService::convert(
            &expense(cents),
            &ConversionRequest {
                target_type: target,
                category_account_id: None,
                payment_account_id: None,
            },
            &rules(),
            &chart(),
        );
        prop_assert_eq!(
            result,
            Err(LedgerError::InvalidConversion { from: EntryKind::Expense, to: target })
        );
    }
}
