//! Entry type conversion.
//!
//! Transitions come from a configured allow-list; the lines of a converted
//! entry are rebuilt from scratch by the entry builder, never patched.

use std::collections::{BTreeMap, BTreeSet};

use homeledger_shared::types::{AccountId, Money};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::account::ChartOfAccounts;
use super::builder::EntryBuilder;
use super::entry::{EntryKind, JournalEntry, Side};
use super::error::{FieldError, LedgerError};
use super::intent::{DepreciationTerms, IntentKind, LoanTerms};
use super::validation::ensure_balanced;

/// Allowed entry type transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionRules {
    allowed: BTreeMap<EntryKind, BTreeSet<EntryKind>>,
}

impl ConversionRules {
    /// Builds rules from `(from, to)` pairs.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (EntryKind, EntryKind)>) -> Self {
        let mut allowed: BTreeMap<EntryKind, BTreeSet<EntryKind>> = BTreeMap::new();
        for (from, to) in pairs {
            allowed.entry(from).or_default().insert(to);
        }
        Self { allowed }
    }

    /// Builds rules from the `[ledger.conversions]` table.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming every unknown entry type.
    pub fn from_config(table: &BTreeMap<String, Vec<String>>) -> Result<Self, LedgerError> {
        let mut errors = Vec::new();
        let mut pairs = Vec::new();

        for (from, targets) in table {
            let Some(source) = EntryKind::parse(from) else {
                errors.push(FieldError::new(
                    format!("conversions.{from}"),
                    "unknown entry type",
                ));
                continue;
            };
            for target in targets {
                match EntryKind::parse(target) {
                    Some(kind) => pairs.push((source, kind)),
                    None => errors.push(FieldError::new(
                        format!("conversions.{from}"),
                        format!("unknown target entry type '{target}'"),
                    )),
                }
            }
        }

        if errors.is_empty() {
            Ok(Self::new(pairs))
        } else {
            Err(LedgerError::Validation(errors))
        }
    }

    /// Returns true if `from` may be converted into `to`.
    ///
    /// Targets that cannot be rebuilt from two account roles are never
    /// allowed, whatever the configuration says.
    #[must_use]
    pub fn is_allowed(&self, from: EntryKind, to: EntryKind) -> bool {
        to.is_conversion_target()
            && self
                .allowed
                .get(&from)
                .is_some_and(|targets| targets.contains(&to))
    }

    /// Entry types `from` may be converted into.
    #[must_use]
    pub fn allowed_targets(&self, from: EntryKind) -> Vec<EntryKind> {
        self.allowed
            .get(&from)
            .map(|targets| {
                targets
                    .iter()
                    .copied()
                    .filter(|to| to.is_conversion_target())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A conversion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Entry type to convert into.
    pub target_type: EntryKind,
    /// Overrides the category role; the original account is reused when absent.
    #[serde(default)]
    pub category_account_id: Option<AccountId>,
    /// Overrides the payment role; the original account is reused when absent.
    #[serde(default)]
    pub payment_account_id: Option<AccountId>,
}

/// Account roles and amount read back from an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryRoles {
    /// First debit line's account.
    pub category: AccountId,
    /// First credit line's account.
    pub payment: AccountId,
    /// Total debit of the entry.
    pub amount: Money,
}

/// Entry conversion service.
pub struct ConversionService;

impl ConversionService {
    /// Converts an entry into another type.
    ///
    /// Returns the converted entry; the input is left untouched, so a
    /// caller persisting the result replaces type and lines together.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` if the transition is not allowed, the
    /// entry is a pending reconciliation, or the entry would move into or
    /// out of a depreciable asset account (those purchases own an asset
    /// register), and any builder error for the rebuilt lines.
    pub fn convert(
        entry: &JournalEntry,
        request: &ConversionRequest,
        rules: &ConversionRules,
        chart: &ChartOfAccounts,
    ) -> Result<JournalEntry, LedgerError> {
        let from = entry.entry_type;
        let to = request.target_type;

        if entry.is_pending_reconciliation() || !rules.is_allowed(from, to) {
            warn!(
                entry_id = %entry.id,
                from = %from,
                to = %to,
                pending = entry.is_pending_reconciliation(),
                "rejected entry conversion"
            );
            return Err(LedgerError::InvalidConversion { from, to });
        }

        let roles = Self::roles(entry)?;
        let category = request.category_account_id.unwrap_or(roles.category);
        let payment = request.payment_account_id.unwrap_or(roles.payment);
        let depreciable = |id: AccountId| chart.get(id).is_some_and(|account| account.depreciable);
        if (from == EntryKind::AssetPurchase && depreciable(roles.category))
            || (to == EntryKind::AssetPurchase && depreciable(category))
        {
            warn!(
                entry_id = %entry.id,
                from = %from,
                to = %to,
                "rejected conversion touching a registered asset"
            );
            return Err(LedgerError::InvalidConversion { from, to });
        }

        let kind = Self::target_intent(to, category, payment, roles.amount);

        let lines = EntryBuilder::derive_lines(&kind, chart)?;
        ensure_balanced(&lines)?;

        debug!(entry_id = %entry.id, from = %from, to = %to, "converted entry");

        Ok(JournalEntry {
            entry_type: to,
            lines,
            reconciliation_status: None,
            ..entry.clone()
        })
    }

    /// Reads the account roles and carried amount of an entry.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the entry lacks a debit or a credit line.
    pub fn roles(entry: &JournalEntry) -> Result<EntryRoles, LedgerError> {
        let first_on = |side: Side| {
            entry
                .lines
                .iter()
                .find(|line| line.side() == side && line.amount().is_positive())
                .map(|line| line.account_id)
        };

        match (first_on(Side::Debit), first_on(Side::Credit)) {
            (Some(category), Some(payment)) => Ok(EntryRoles {
                category,
                payment,
                amount: entry.total_debit(),
            }),
            _ => Err(LedgerError::field(
                "lines",
                "entry needs a debit and a credit line to be converted",
            )),
        }
    }

    fn target_intent(
        target: EntryKind,
        category: AccountId,
        payment: AccountId,
        amount: Money,
    ) -> IntentKind {
        match target {
            EntryKind::Income => IntentKind::Income {
                amount,
                category_account_id: category,
                payment_account_id: payment,
            },
            EntryKind::Transfer => IntentKind::Transfer {
                amount,
                from_account_id: payment,
                to_account_id: category,
            },
            EntryKind::AssetPurchase => IntentKind::AssetPurchase {
                amount,
                asset_account_id: category,
                payment_account_id: Some(payment),
                extra_liability_account_id: None,
                extra_liability_amount: None,
                depreciation: DepreciationTerms::default(),
                loan: LoanTerms::default(),
            },
            EntryKind::Borrow => IntentKind::Borrow {
                amount,
                payment_account_id: category,
                liability_account_id: payment,
                loan: LoanTerms::default(),
            },
            EntryKind::Repay => IntentKind::Repay {
                principal: amount,
                interest: Money::ZERO,
                liability_account_id: category,
                payment_account_id: payment,
                interest_account_id: None,
            },
            // Only conversion targets reach here; every other kind is
            // filtered by `ConversionRules::is_allowed`.
            _ => IntentKind::Expense {
                amount,
                category_account_id: category,
                payment_account_id: payment,
            },
        }
    }
}
