//! Loans and amortization schedules.

pub mod amortization;
pub mod service;
pub mod types;

#[cfg(test)]
mod amortization_props;

pub use amortization::{AmortizationCalculator, MAX_TOTAL_MONTHS, ScheduleParams};
pub use service::LoanService;
pub use types::{
    Loan, LoanRequest, LoanStatus, LoanSummary, PortfolioSummary, PrepaymentRequest,
    RepaymentMethod, RepaymentRequest, RepaymentScheduleItem,
};
