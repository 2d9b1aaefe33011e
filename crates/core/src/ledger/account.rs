//! Chart of accounts as seen by the engine.
//!
//! The account tree is owned by an external directory; the engine only reads
//! immutable snapshots of it. One snapshot is used for the whole of one entry
//! construction so every line is built against the same normal sides.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use homeledger_shared::config::AccountSeed;
use homeledger_shared::types::AccountId;
use serde::{Deserialize, Serialize};

use super::entry::Side;
use super::error::{FieldError, LedgerError};

/// Account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things owned.
    Asset,
    /// Things owed.
    Liability,
    /// Net worth.
    Equity,
    /// Income categories.
    Income,
    /// Expense categories.
    Expense,
}

impl AccountType {
    /// Normal balance side implied by the type.
    #[must_use]
    pub const fn default_normal_side(self) -> Side {
        match self {
            Self::Asset | Self::Expense => Side::Debit,
            Self::Liability | Self::Equity | Self::Income => Side::Credit,
        }
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses an account type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// An account of the chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account identifier.
    pub id: AccountId,
    /// Human code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Side on which the balance increases.
    pub normal_side: Side,
    /// Parent account, if any.
    pub parent_id: Option<AccountId>,
    /// Only leaves may be posted to.
    pub is_leaf: bool,
    /// Inactive accounts reject postings.
    pub is_active: bool,
    /// Fixed-asset class whose purchases create depreciable assets.
    pub depreciable: bool,
}

impl Account {
    /// Creates an active leaf account with the type's normal side.
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: AccountId::new(),
            code: code.into(),
            name: name.into(),
            account_type,
            normal_side: account_type.default_normal_side(),
            parent_id: None,
            is_leaf: true,
            is_active: true,
            depreciable: false,
        }
    }
}

/// Immutable snapshot of the chart of accounts.
#[derive(Debug, Clone, Default)]
pub struct ChartOfAccounts {
    accounts: HashMap<AccountId, Account>,
}

impl ChartOfAccounts {
    /// Builds a chart, deriving `is_leaf` from the parent links.
    #[must_use]
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        let mut accounts: HashMap<AccountId, Account> =
            accounts.into_iter().map(|a| (a.id, a)).collect();
        let parents: Vec<AccountId> = accounts.values().filter_map(|a| a.parent_id).collect();
        for account in accounts.values_mut() {
            account.is_leaf = true;
        }
        for parent in parents {
            if let Some(account) = accounts.get_mut(&parent) {
                account.is_leaf = false;
            }
        }
        Self { accounts }
    }

    /// Builds a chart from configuration seeds.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unknown type or side, or a dangling parent.
    pub fn from_seeds(seeds: &[AccountSeed]) -> Result<Self, LedgerError> {
        let mut errors = Vec::new();
        let mut accounts = Vec::with_capacity(seeds.len());

        for seed in seeds {
            let field = format!("chart.{}", seed.code);
            let Some(account_type) = AccountType::parse(&seed.account_type) else {
                errors.push(FieldError::new(field, format!("unknown type '{}'", seed.account_type)));
                continue;
            };
            let normal_side = match seed.normal_side.as_deref() {
                None => account_type.default_normal_side(),
                Some(raw) => {
                    if let Some(side) = Side::parse(raw) {
                        side
                    } else {
                        errors.push(FieldError::new(field, format!("unknown normal side '{raw}'")));
                        continue;
                    }
                }
            };
            accounts.push(Account {
                id: seed.id,
                code: seed.code.clone(),
                name: seed.name.clone(),
                account_type,
                normal_side,
                parent_id: seed.parent,
                is_leaf: true,
                is_active: seed.active,
                depreciable: seed.depreciable,
            });
        }

        for account in &accounts {
            if let Some(parent) = account.parent_id
                && !accounts.iter().any(|a| a.id == parent)
            {
                errors.push(FieldError::new(
                    format!("chart.{}", account.code),
                    format!("parent {parent} is not in the chart"),
                ));
            }
        }

        if errors.is_empty() {
            Ok(Self::new(accounts))
        } else {
            Err(LedgerError::Validation(errors))
        }
    }

    /// Looks up an account.
    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Looks up an account that must exist.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown.
    pub fn require(&self, id: AccountId) -> Result<&Account, LedgerError> {
        self.get(id).ok_or(LedgerError::AccountNotFound(id))
    }

    /// Looks up an account that lines may be posted to.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if unknown, `Validation` on `field` if the
    /// account is inactive or has children.
    pub fn postable(&self, field: &str, id: AccountId) -> Result<&Account, LedgerError> {
        let account = self.require(id)?;
        if !account.is_active {
            return Err(LedgerError::field(field, format!("account {} is inactive", account.code)));
        }
        if !account.is_leaf {
            return Err(LedgerError::field(
                field,
                format!("account {} has sub-accounts and cannot be posted to", account.code),
            ));
        }
        Ok(account)
    }

    /// The account and all of its descendants.
    #[must_use]
    pub fn subtree(&self, root: AccountId) -> Vec<AccountId> {
        let mut out = vec![root];
        let mut cursor = 0;
        while cursor < out.len() {
            let current = out[cursor];
            out.extend(
                self.accounts
                    .values()
                    .filter(|a| a.parent_id == Some(current))
                    .map(|a| a.id),
            );
            cursor += 1;
        }
        out
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

/// Source of chart snapshots.
pub trait AccountDirectory: Send + Sync {
    /// Returns the current chart.
    fn snapshot(&self) -> Arc<ChartOfAccounts>;
}

/// Directory holding one replaceable chart in memory.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    chart: RwLock<Arc<ChartOfAccounts>>,
}

impl StaticDirectory {
    /// Creates a directory serving `chart`.
    #[must_use]
    pub fn new(chart: ChartOfAccounts) -> Self {
        Self {
            chart: RwLock::new(Arc::new(chart)),
        }
    }

    /// Swaps in a new chart; snapshots already handed out are unaffected.
    pub fn replace(&self, chart: ChartOfAccounts) {
        *self.chart.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(chart);
    }
}

impl AccountDirectory for StaticDirectory {
    fn snapshot(&self) -> Arc<ChartOfAccounts> {
        Arc::clone(&self.chart.read().unwrap_or_else(PoisonError::into_inner))
    }
}
