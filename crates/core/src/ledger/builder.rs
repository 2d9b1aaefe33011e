//! Entry builder: simple intents to balanced journal lines.
//!
//! | entry type | lines |
//! |---|---|
//! | expense | debit category, credit payment |
//! | income | debit payment, credit category |
//! | transfer | debit to, credit from |
//! | asset purchase | debit asset (full cost), credit payment (self-paid), credit liability (financed) |
//! | borrow | debit payment, credit liability |
//! | repay | debit liability (principal), debit interest category or liability (interest), credit payment |

use homeledger_shared::types::{AccountId, EntryId, Money};
use tracing::debug;

use super::account::{AccountType, ChartOfAccounts};
use super::entry::{EntrySource, JournalEntry, JournalLine};
use super::error::LedgerError;
use super::intent::{DepreciationTerms, EntryHeader, EntryIntent, IntentKind, LoanTerms};
use super::validation::{Violations, ensure_balanced, validate_manual_lines};
use crate::asset::{AssetRequest, AssetService};
use crate::loan::{LoanRequest, LoanService};

/// Accounts that money can be paid from or received into.
const PAYMENT_TYPES: &[AccountType] = &[AccountType::Asset, AccountType::Liability];

/// A built entry plus the companion records it requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltEntry {
    /// The balanced entry.
    pub entry: JournalEntry,
    /// Loan to originate alongside the entry.
    pub loan: Option<LoanRequest>,
    /// Asset to register alongside the entry.
    pub asset: Option<AssetRequest>,
}

/// Entry builder.
///
/// Stateless: every call works against the chart snapshot it is given.
pub struct EntryBuilder;

impl EntryBuilder {
    /// Builds a balanced entry from an intent.
    ///
    /// # Errors
    ///
    /// Returns `Validation` listing the invalid fields, `AccountNotFound`
    /// for unknown accounts, and `Unbalanced` if the derived lines do not
    /// balance (an engine bug).
    pub fn build(intent: &EntryIntent, chart: &ChartOfAccounts) -> Result<BuiltEntry, LedgerError> {
        let lines = Self::derive_lines(&intent.kind, chart)?;
        let loan = Self::companion_loan(intent, chart)?;
        let asset = Self::companion_asset(intent, chart)?;
        ensure_balanced(&lines)?;

        let header = &intent.header;
        let entry = JournalEntry {
            id: EntryId::new(),
            book_id: header.book_id,
            entry_date: header.entry_date,
            entry_type: intent.kind.kind(),
            description: header.description.clone(),
            note: header.note.clone(),
            source: EntrySource::Manual,
            lines,
            reconciliation_status: None,
        };

        debug!(
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            lines = entry.lines.len(),
            companion_loan = loan.is_some(),
            companion_asset = asset.is_some(),
            "built journal entry"
        );

        Ok(BuiltEntry { entry, loan, asset })
    }

    /// Builds an engine-generated entry (loan origination, repayments).
    ///
    /// Companion requests are not produced.
    ///
    /// # Errors
    ///
    /// Same as [`EntryBuilder::derive_lines`], plus `Unbalanced`.
    pub fn build_system(
        header: &EntryHeader,
        kind: &IntentKind,
        chart: &ChartOfAccounts,
    ) -> Result<JournalEntry, LedgerError> {
        let lines = Self::derive_lines(kind, chart)?;
        ensure_balanced(&lines)?;
        let mut entry = JournalEntry::system(header.book_id, header.entry_date, kind.kind(), "", lines);
        entry.description.clone_from(&header.description);
        entry.note.clone_from(&header.note);
        Ok(entry)
    }

    /// Derives the journal lines of an intent, without companion checks.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `AccountNotFound` on bad input.
    pub fn derive_lines(
        kind: &IntentKind,
        chart: &ChartOfAccounts,
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let mut v = Violations::new();

        let lines = match kind {
            IntentKind::Expense {
                amount,
                category_account_id,
                payment_account_id,
            } => {
                check_positive(&mut v, "amount", *amount);
                role(&mut v, chart, "category_account_id", *category_account_id, &[AccountType::Expense])?;
                role(&mut v, chart, "payment_account_id", *payment_account_id, PAYMENT_TYPES)?;
                vec![
                    JournalLine::debit(*category_account_id, *amount),
                    JournalLine::credit(*payment_account_id, *amount),
                ]
            }
            IntentKind::Income {
                amount,
                category_account_id,
                payment_account_id,
            } => {
                check_positive(&mut v, "amount", *amount);
                role(&mut v, chart, "category_account_id", *category_account_id, &[AccountType::Income])?;
                role(&mut v, chart, "payment_account_id", *payment_account_id, PAYMENT_TYPES)?;
                vec![
                    JournalLine::debit(*payment_account_id, *amount),
                    JournalLine::credit(*category_account_id, *amount),
                ]
            }
            IntentKind::Transfer {
                amount,
                from_account_id,
                to_account_id,
            } => {
                check_positive(&mut v, "amount", *amount);
                role(&mut v, chart, "from_account_id", *from_account_id, &[AccountType::Asset])?;
                role(&mut v, chart, "to_account_id", *to_account_id, &[AccountType::Asset])?;
                v.check(
                    from_account_id != to_account_id,
                    "to_account_id",
                    "must differ from from_account_id",
                );
                vec![
                    JournalLine::debit(*to_account_id, *amount),
                    JournalLine::credit(*from_account_id, *amount),
                ]
            }
            IntentKind::AssetPurchase {
                amount,
                asset_account_id,
                payment_account_id,
                extra_liability_account_id,
                extra_liability_amount,
                ..
            } => {
                check_positive(&mut v, "amount", *amount);
                role(&mut v, chart, "asset_account_id", *asset_account_id, &[AccountType::Asset])?;

                let financed = match (extra_liability_account_id, extra_liability_amount) {
                    (Some(liability), Some(loan_amount)) => {
                        role(&mut v, chart, "extra_liability_account_id", *liability, &[AccountType::Liability])?;
                        check_positive(&mut v, "extra_liability_amount", *loan_amount);
                        v.check(
                            *loan_amount <= *amount,
                            "extra_liability_amount",
                            "must not exceed amount",
                        );
                        Some((*liability, *loan_amount))
                    }
                    (None, None) => None,
                    (None, Some(_)) => {
                        v.push("extra_liability_account_id", "is required with extra_liability_amount");
                        None
                    }
                    (Some(_), None) => {
                        v.push("extra_liability_amount", "is required with extra_liability_account_id");
                        None
                    }
                };

                let loan_amount = financed.map_or(Money::ZERO, |(_, loan)| loan);
                let self_paid = *amount - loan_amount;
                let payment = if self_paid.is_positive() {
                    match payment_account_id {
                        Some(id) => {
                            role(&mut v, chart, "payment_account_id", *id, PAYMENT_TYPES)?;
                            Some(*id)
                        }
                        None => {
                            v.push("payment_account_id", "is required for the self-paid part");
                            None
                        }
                    }
                } else {
                    None
                };

                let mut lines = vec![JournalLine::debit(*asset_account_id, *amount)];
                if let Some(payment) = payment {
                    lines.push(JournalLine::credit(payment, self_paid));
                }
                if let Some((liability, loan_amount)) = financed
                    && loan_amount.is_positive()
                {
                    lines.push(JournalLine::credit(liability, loan_amount));
                }
                lines
            }
            IntentKind::Borrow {
                amount,
                payment_account_id,
                liability_account_id,
                ..
            } => {
                check_positive(&mut v, "amount", *amount);
                role(&mut v, chart, "payment_account_id", *payment_account_id, PAYMENT_TYPES)?;
                role(&mut v, chart, "liability_account_id", *liability_account_id, &[AccountType::Liability])?;
                vec![
                    JournalLine::debit(*payment_account_id, *amount),
                    JournalLine::credit(*liability_account_id, *amount),
                ]
            }
            IntentKind::Repay {
                principal,
                interest,
                liability_account_id,
                payment_account_id,
                interest_account_id,
            } => {
                v.check(!principal.is_negative(), "principal", "must not be negative");
                v.check(!interest.is_negative(), "interest", "must not be negative");
                v.check(
                    principal.is_positive() || interest.is_positive(),
                    "principal",
                    "principal or interest must be positive",
                );
                role(&mut v, chart, "liability_account_id", *liability_account_id, &[AccountType::Liability])?;
                role(&mut v, chart, "payment_account_id", *payment_account_id, PAYMENT_TYPES)?;
                if let Some(interest_account) = interest_account_id {
                    role(&mut v, chart, "interest_account_id", *interest_account, &[AccountType::Expense])?;
                }

                let mut lines = Vec::with_capacity(3);
                if principal.is_positive() {
                    lines.push(JournalLine::debit(*liability_account_id, *principal));
                }
                if interest.is_positive() {
                    let target = interest_account_id.unwrap_or(*liability_account_id);
                    lines.push(JournalLine::debit(target, *interest));
                }
                lines.push(JournalLine::credit(*payment_account_id, *principal + *interest));
                lines
            }
            IntentKind::Manual { lines } => {
                v.absorb(validate_manual_lines(lines))?;
                for (index, line) in lines.iter().enumerate() {
                    v.absorb(chart.postable(&format!("lines[{index}].account_id"), line.account_id))?;
                }
                lines.clone()
            }
        };

        v.finish()?;
        Ok(lines)
    }

    fn companion_loan(
        intent: &EntryIntent,
        chart: &ChartOfAccounts,
    ) -> Result<Option<LoanRequest>, LedgerError> {
        let entry_date = intent.header.entry_date;
        match &intent.kind {
            IntentKind::Borrow {
                amount,
                liability_account_id,
                loan,
                ..
            } => loan_request(loan, *amount, *liability_account_id, entry_date, chart),
            IntentKind::AssetPurchase {
                extra_liability_account_id: Some(liability),
                extra_liability_amount: Some(loan_amount),
                loan,
                ..
            } => loan_request(loan, *loan_amount, *liability, entry_date, chart),
            IntentKind::AssetPurchase { loan, .. } if !loan.is_empty() => Err(LedgerError::field(
                "loan_name",
                "loan terms require extra_liability_account_id and extra_liability_amount",
            )),
            _ => Ok(None),
        }
    }

    fn companion_asset(
        intent: &EntryIntent,
        chart: &ChartOfAccounts,
    ) -> Result<Option<AssetRequest>, LedgerError> {
        let IntentKind::AssetPurchase {
            amount,
            asset_account_id,
            depreciation,
            ..
        } = &intent.kind
        else {
            return Ok(None);
        };
        let account = chart.require(*asset_account_id)?;
        if !account.depreciable {
            return Ok(None);
        }

        let DepreciationTerms {
            asset_name,
            useful_life_months,
            residual_rate,
            depreciation_method,
            depreciation_granularity,
        } = depreciation;

        let mut v = Violations::new();
        v.check(asset_name.is_some(), "asset_name", "is required for depreciable accounts");
        v.check(
            useful_life_months.is_some(),
            "useful_life_months",
            "is required for depreciable accounts",
        );
        v.check(residual_rate.is_some(), "residual_rate", "is required for depreciable accounts");
        v.check(
            depreciation_method.is_some(),
            "depreciation_method",
            "is required for depreciable accounts",
        );
        v.check(
            depreciation_granularity.is_some(),
            "depreciation_granularity",
            "is required for depreciable accounts",
        );

        let (Some(name), Some(life), Some(rate), Some(method), Some(granularity)) = (
            asset_name,
            useful_life_months,
            residual_rate,
            depreciation_method,
            depreciation_granularity,
        ) else {
            v.finish()?;
            return Ok(None);
        };

        let request = AssetRequest {
            name: name.clone(),
            account_id: *asset_account_id,
            original_cost: *amount,
            residual_rate: *rate,
            useful_life_months: *life,
            depreciation_method: *method,
            depreciation_granularity: *granularity,
            purchase_date: intent.header.entry_date,
        };
        AssetService::validate_request(&request, chart)?;
        Ok(Some(request))
    }
}

fn loan_request(
    terms: &LoanTerms,
    principal: Money,
    account_id: AccountId,
    entry_date: chrono::NaiveDate,
    chart: &ChartOfAccounts,
) -> Result<Option<LoanRequest>, LedgerError> {
    if terms.is_empty() {
        return Ok(None);
    }

    let mut v = Violations::new();
    v.check(terms.loan_name.is_some(), "loan_name", "is required with loan terms");
    v.check(terms.annual_rate.is_some(), "annual_rate", "is required with loan terms");
    v.check(terms.total_months.is_some(), "total_months", "is required with loan terms");

    let (Some(name), Some(annual_rate), Some(total_months)) =
        (&terms.loan_name, terms.annual_rate, terms.total_months)
    else {
        v.finish()?;
        return Ok(None);
    };

    let request = LoanRequest {
        name: name.clone(),
        account_id,
        principal,
        annual_rate,
        total_months,
        repayment_method: terms.repayment_method.unwrap_or_default(),
        start_date: terms.start_date.unwrap_or(entry_date),
        deposit_account_id: None,
    };
    LoanService::validate_request(&request, chart)?;
    Ok(Some(request))
}

fn check_positive(v: &mut Violations, field: &str, amount: Money) {
    v.check(amount.is_positive(), field, "must be positive");
}

/// Checks that `id` is postable and of one of the `allowed` types.
fn role(
    v: &mut Violations,
    chart: &ChartOfAccounts,
    field: &str,
    id: AccountId,
    allowed: &[AccountType],
) -> Result<(), LedgerError> {
    let Some(account) = v.absorb(chart.postable(field, id))? else {
        return Ok(());
    };
    if !allowed.contains(&account.account_type) {
        let expected = allowed
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        v.push(
            field,
            format!(
                "account {} is {}, expected {expected}",
                account.code,
                account.account_type.as_str()
            ),
        );
    }
    Ok(())
}
