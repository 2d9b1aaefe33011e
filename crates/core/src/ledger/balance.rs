//! Account balance calculations.
//!
//! Debit-normal accounts: `balance += debit - credit`.
//! Credit-normal accounts: `balance += credit - debit`.

use homeledger_shared::types::{AccountId, Money};
use serde::{Deserialize, Serialize};

use super::entry::{JournalLine, Side};

/// Account balance at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Side the balance is expressed on.
    pub normal_side: Side,
    /// Total debit amount.
    pub debit_total: Money,
    /// Total credit amount.
    pub credit_total: Money,
    /// Net balance on the normal side.
    pub balance: Money,
}

impl AccountBalance {
    /// Creates a zero balance.
    #[must_use]
    pub fn new(account_id: AccountId, normal_side: Side) -> Self {
        Self {
            account_id,
            normal_side,
            debit_total: Money::ZERO,
            credit_total: Money::ZERO,
            balance: Money::ZERO,
        }
    }

    /// Folds a set of lines into a balance.
    #[must_use]
    pub fn from_lines<'a>(
        account_id: AccountId,
        normal_side: Side,
        lines: impl IntoIterator<Item = &'a JournalLine>,
    ) -> Self {
        let mut balance = Self::new(account_id, normal_side);
        for line in lines {
            balance.apply(line);
        }
        balance
    }

    /// Applies one line.
    pub fn apply(&mut self, line: &JournalLine) {
        self.debit_total += line.debit;
        self.credit_total += line.credit;
        self.balance = self
            .normal_side
            .balance_change(self.debit_total, self.credit_total);
    }
}
