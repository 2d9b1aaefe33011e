//! Loan domain types.

use chrono::NaiveDate;
use homeledger_shared::types::{AccountId, BookId, LoanId, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a loan is repaid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    /// Constant total payment each period.
    #[default]
    EqualInstallment,
    /// Constant principal each period, declining payment.
    EqualPrincipal,
}

impl RepaymentMethod {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EqualInstallment => "equal_installment",
            Self::EqualPrincipal => "equal_principal",
        }
    }
}

/// Loan lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Repayments outstanding.
    Active,
    /// Remaining principal is zero (terminal).
    PaidOff,
}

/// A loan contract funding a liability account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier.
    pub id: LoanId,
    /// Book the loan belongs to.
    pub book_id: BookId,
    /// Display name.
    pub name: String,
    /// Liability account carrying the debt.
    pub account_id: AccountId,
    /// Original principal.
    pub principal: Money,
    /// Annual rate in percent (`4.9` means 4.9% p.a.).
    pub annual_rate: Decimal,
    /// Term in months.
    pub total_months: u32,
    /// Repayment method.
    pub repayment_method: RepaymentMethod,
    /// Date of the first payment period.
    pub start_date: NaiveDate,
    /// Scheduled periods already repaid.
    pub repaid_months: u32,
    /// Principal still owed.
    pub remaining_principal: Money,
    /// Constant payment, or the first (largest) payment for equal principal.
    pub monthly_payment: Money,
    /// Interest over the full schedule.
    pub total_interest: Money,
    /// Interest posted by repayments so far.
    pub interest_paid: Money,
    /// Lifecycle status.
    pub status: LoanStatus,
}

impl Loan {
    /// Returns true once the loan is paid off.
    #[must_use]
    pub fn is_paid_off(&self) -> bool {
        self.status == LoanStatus::PaidOff
    }

    /// Principal repaid so far.
    #[must_use]
    pub fn principal_repaid(&self) -> Money {
        self.principal - self.remaining_principal
    }
}

/// Input for originating a loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Display name.
    pub name: String,
    /// Liability account.
    pub account_id: AccountId,
    /// Principal borrowed.
    pub principal: Money,
    /// Annual rate in percent.
    pub annual_rate: Decimal,
    /// Term in months.
    pub total_months: u32,
    /// Repayment method.
    #[serde(default)]
    pub repayment_method: RepaymentMethod,
    /// Date of the first payment period.
    pub start_date: NaiveDate,
    /// Asset account receiving the funds; produces a borrow entry when set.
    #[serde(default)]
    pub deposit_account_id: Option<AccountId>,
}

/// One period of a repayment schedule. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentScheduleItem {
    /// Period number, starting at 1.
    pub period: u32,
    /// Due date.
    pub payment_date: NaiveDate,
    /// Total payment for the period.
    pub payment: Money,
    /// Principal part of the payment.
    pub principal_component: Money,
    /// Interest part of the payment.
    pub interest_component: Money,
    /// Principal owed after the payment.
    pub remaining_balance: Money,
    /// Whether the period has been repaid.
    pub is_paid: bool,
}

/// Totals of a schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    /// Constant payment, or the first payment for equal principal.
    pub monthly_payment: Money,
    /// Sum of all interest components.
    pub total_interest: Money,
    /// Principal plus total interest.
    pub total_repayment: Money,
}

/// Input for recording the next scheduled repayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentRequest {
    /// Account the payment is made from.
    pub payment_account_id: AccountId,
    /// Expense category for interest; the liability itself when absent.
    #[serde(default)]
    pub interest_account_id: Option<AccountId>,
    /// Posting date.
    pub repay_date: NaiveDate,
}

/// Input for a principal-only prepayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepaymentRequest {
    /// Principal repaid.
    pub amount: Money,
    /// Account the payment is made from.
    pub payment_account_id: AccountId,
    /// Posting date.
    pub prepay_date: NaiveDate,
}

/// Aggregate view over a book's loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of loans.
    pub loan_count: usize,
    /// Loans not yet paid off.
    pub active_count: usize,
    /// Sum of original principals.
    pub total_principal: Money,
    /// Sum of remaining principals.
    pub total_remaining: Money,
    /// Principal repaid across all loans.
    pub total_repaid: Money,
    /// Scheduled interest across all loans.
    pub total_interest: Money,
    /// Interest posted by repayments across all loans.
    pub total_interest_paid: Money,
}
