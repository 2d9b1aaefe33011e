//! Amortization calculator.
//!
//! Money stays in cents. Interest and installment amounts are truncated to
//! the cent, and the final period always takes the exact remaining
//! principal, so the principal components sum to the loan principal.
//!
//! Previews and authoritative schedules go through [`AmortizationCalculator::simulate`];
//! they differ only in how degenerate input is treated.

use chrono::{Months, NaiveDate};
use homeledger_shared::types::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{LoanSummary, RepaymentMethod, RepaymentScheduleItem};
use crate::ledger::{LedgerError, Violations};

/// Longest accepted term (100 years).
pub const MAX_TOTAL_MONTHS: u32 = 1200;

/// Inputs of a repayment schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Principal borrowed.
    pub principal: Money,
    /// Annual rate in percent (`4.8` means 4.8% p.a.).
    pub annual_rate: Decimal,
    /// Term in months.
    pub total_months: u32,
    /// Repayment method.
    #[serde(default)]
    pub repayment_method: RepaymentMethod,
    /// Date of the first period.
    pub start_date: NaiveDate,
}

/// Amortization calculator.
pub struct AmortizationCalculator;

impl AmortizationCalculator {
    /// Monthly rate as a fraction: `annual_rate / 1200`.
    #[must_use]
    pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
        annual_rate / Decimal::from(1200)
    }

    /// Validates inputs for an authoritative schedule.
    ///
    /// # Errors
    ///
    /// Returns `Validation` listing every out-of-range field.
    pub fn validate(params: &ScheduleParams) -> Result<(), LedgerError> {
        let mut v = Violations::new();
        v.check(params.principal.is_positive(), "principal", "must be positive");
        v.check(
            params.annual_rate >= Decimal::ZERO && params.annual_rate <= Decimal::ONE_HUNDRED,
            "annual_rate",
            "must be between 0 and 100",
        );
        v.check(params.total_months > 0, "total_months", "must be positive");
        v.check(
            params.total_months <= MAX_TOTAL_MONTHS,
            "total_months",
            "must not exceed 1200",
        );
        v.finish()
    }

    /// Full repayment schedule for a loan being created or repaid.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for out-of-range inputs or a schedule whose
    /// numbers cannot be represented.
    pub fn schedule(params: &ScheduleParams) -> Result<Vec<RepaymentScheduleItem>, LedgerError> {
        Self::validate(params)?;
        Self::simulate(params)
    }

    /// Schedule and summary for a possibly incomplete form.
    ///
    /// A zero term or non-positive principal yields an empty schedule and a
    /// zero summary instead of an error.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a negative rate, and for inputs that are
    /// complete but out of range.
    pub fn preview(
        params: &ScheduleParams,
    ) -> Result<(Vec<RepaymentScheduleItem>, LoanSummary), LedgerError> {
        if params.annual_rate.is_sign_negative() && !params.annual_rate.is_zero() {
            return Err(LedgerError::field("annual_rate", "must not be negative"));
        }
        if params.total_months == 0 || !params.principal.is_positive() {
            return Ok((Vec::new(), LoanSummary::default()));
        }
        let items = Self::schedule(params)?;
        let summary = Self::summarize(params, &items);
        Ok((items, summary))
    }

    /// Summary totals of a simulated schedule.
    ///
    /// Equal installment uses the closed form `payment * n - principal`;
    /// equal principal sums the simulated interest of every period.
    #[must_use]
    pub fn summarize(params: &ScheduleParams, items: &[RepaymentScheduleItem]) -> LoanSummary {
        let Some(first) = items.first() else {
            return LoanSummary::default();
        };

        let total_interest = match params.repayment_method {
            RepaymentMethod::EqualInstallment => {
                let periods = i64::try_from(items.len()).unwrap_or(i64::MAX);
                let total_paid = first.payment.cents().saturating_mul(periods);
                Money::from_cents(total_paid) - params.principal
            }
            RepaymentMethod::EqualPrincipal => items.iter().map(|item| item.interest_component).sum(),
        };

        LoanSummary {
            monthly_payment: first.payment,
            total_interest,
            total_repayment: params.principal + total_interest,
        }
    }

    /// Constant equal-installment payment, truncated to the cent.
    ///
    /// `P * r * (1+r)^n / ((1+r)^n - 1)`, or `P / n` at a zero rate.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the annuity factor cannot be represented.
    pub fn installment(principal: Money, monthly_rate: Decimal, months: u32) -> Result<Money, LedgerError> {
        if months == 0 {
            return Ok(Money::ZERO);
        }
        if monthly_rate.is_zero() {
            return Ok(principal.div_trunc(i64::from(months)));
        }

        let overflow = || LedgerError::field("total_months", "rate and term are too large to compute");
        let base = Decimal::ONE + monthly_rate;
        // Past 10^24 the annuity factor `growth / (growth - 1)` is 1 to well
        // below a cent of any representable principal.
        let saturation = Decimal::from_i128_with_scale(10_i128.pow(24), 0);
        let mut growth = Decimal::ONE;
        for _ in 0..months {
            growth = growth.checked_mul(base).ok_or_else(overflow)?;
            if growth > saturation {
                break;
            }
        }

        let annuity = growth
            .checked_div(growth - Decimal::ONE)
            .ok_or_else(overflow)?;
        let factor = monthly_rate.checked_mul(annuity).ok_or_else(overflow)?;
        Ok(principal.mul_rate_trunc(factor))
    }

    /// Simulates every period. Shared by previews and authoritative schedules.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the installment cannot be computed or a
    /// payment date falls outside the calendar.
    pub fn simulate(params: &ScheduleParams) -> Result<Vec<RepaymentScheduleItem>, LedgerError> {
        let n = params.total_months;
        let rate = Self::monthly_rate(params.annual_rate);

        let installment = match params.repayment_method {
            RepaymentMethod::EqualInstallment => Self::installment(params.principal, rate, n)?,
            RepaymentMethod::EqualPrincipal => Money::ZERO,
        };
        let constant_principal = params.principal.div_trunc(i64::from(n));

        let mut items = Vec::with_capacity(n as usize);
        let mut remaining = params.principal;

        for period in 1..=n {
            let interest = remaining.mul_rate_trunc(rate);
            let principal_component = if period == n {
                remaining
            } else {
                let formula = match params.repayment_method {
                    RepaymentMethod::EqualInstallment => installment - interest,
                    RepaymentMethod::EqualPrincipal => constant_principal,
                };
                formula.min(remaining).max(Money::ZERO)
            };
            remaining -= principal_component;

            let payment_date = params
                .start_date
                .checked_add_months(Months::new(period - 1))
                .ok_or_else(|| LedgerError::field("start_date", "schedule runs past the calendar"))?;

            items.push(RepaymentScheduleItem {
                period,
                payment_date,
                payment: principal_component + interest,
                principal_component,
                interest_component: interest,
                remaining_balance: remaining,
                is_paid: false,
            });
        }

        Ok(items)
    }
}
