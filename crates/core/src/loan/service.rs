//! Loan lifecycle: origination, repayment, prepayment.
//!
//! Functions here are pure: they take the loan as read and return the
//! updated loan with the entry to post. The caller commits both with a
//! compare-and-swap on the state it read.

use homeledger_shared::types::{BookId, LoanId, Money};

use super::amortization::{AmortizationCalculator, ScheduleParams};
use super::types::{
    Loan, LoanRequest, LoanStatus, PortfolioSummary, PrepaymentRequest, RepaymentRequest,
    RepaymentScheduleItem,
};
use crate::ledger::{
    AccountType, ChartOfAccounts, EntryBuilder, EntryHeader, IntentKind, JournalEntry, LedgerError,
    LoanTerms, Violations,
};

/// Loan service.
pub struct LoanService;

impl LoanService {
    /// Validates an origination request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` listing every bad field, or `AccountNotFound`.
    pub fn validate_request(request: &LoanRequest, chart: &ChartOfAccounts) -> Result<(), LedgerError> {
        let mut v = Violations::new();
        v.check(!request.name.trim().is_empty(), "name", "must not be blank");
        v.absorb(AmortizationCalculator::validate(&Self::request_params(request)))?;

        if let Some(account) = v.absorb(chart.postable("account_id", request.account_id))?
            && account.account_type != AccountType::Liability
        {
            v.push("account_id", format!("account {} is not a liability", account.code));
        }
        if let Some(deposit) = request.deposit_account_id
            && let Some(account) = v.absorb(chart.postable("deposit_account_id", deposit))?
            && account.account_type != AccountType::Asset
        {
            v.push("deposit_account_id", format!("account {} is not an asset", account.code));
        }

        v.finish()
    }

    /// Schedule inputs of a request.
    #[must_use]
    pub fn request_params(request: &LoanRequest) -> ScheduleParams {
        ScheduleParams {
            principal: request.principal,
            annual_rate: request.annual_rate,
            total_months: request.total_months,
            repayment_method: request.repayment_method,
            start_date: request.start_date,
        }
    }

    /// Schedule inputs of an existing loan.
    #[must_use]
    pub fn loan_params(loan: &Loan) -> ScheduleParams {
        ScheduleParams {
            principal: loan.principal,
            annual_rate: loan.annual_rate,
            total_months: loan.total_months,
            repayment_method: loan.repayment_method,
            start_date: loan.start_date,
        }
    }

    /// Creates the loan record for a validated request.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the schedule cannot be computed.
    pub fn open(request: &LoanRequest, book_id: BookId) -> Result<Loan, LedgerError> {
        let params = Self::request_params(request);
        let items = AmortizationCalculator::schedule(&params)?;
        let summary = AmortizationCalculator::summarize(&params, &items);

        Ok(Loan {
            id: LoanId::new(),
            book_id,
            name: request.name.trim().to_string(),
            account_id: request.account_id,
            principal: request.principal,
            annual_rate: request.annual_rate,
            total_months: request.total_months,
            repayment_method: request.repayment_method,
            start_date: request.start_date,
            repaid_months: 0,
            remaining_principal: request.principal,
            monthly_payment: summary.monthly_payment,
            total_interest: summary.total_interest,
            interest_paid: Money::ZERO,
            status: LoanStatus::Active,
        })
    }

    /// Originates a loan, with a borrow entry when a deposit account is given.
    ///
    /// # Errors
    ///
    /// Returns `Validation` or `AccountNotFound` on bad input.
    pub fn originate(
        request: &LoanRequest,
        book_id: BookId,
        chart: &ChartOfAccounts,
    ) -> Result<(Loan, Option<JournalEntry>), LedgerError> {
        Self::validate_request(request, chart)?;
        let loan = Self::open(request, book_id)?;

        let entry = match request.deposit_account_id {
            Some(deposit) => {
                let mut header = EntryHeader::new(book_id, request.start_date);
                header.description = Some(format!("Loan {}", loan.name));
                let kind = IntentKind::Borrow {
                    amount: loan.principal,
                    payment_account_id: deposit,
                    liability_account_id: loan.account_id,
                    loan: LoanTerms::default(),
                };
                Some(EntryBuilder::build_system(&header, &kind, chart)?)
            }
            None => None,
        };

        Ok((loan, entry))
    }

    /// Regenerates the schedule of a loan, marking repaid periods.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the stored terms are out of range.
    pub fn schedule_for(loan: &Loan) -> Result<Vec<RepaymentScheduleItem>, LedgerError> {
        let mut items = AmortizationCalculator::schedule(&Self::loan_params(loan))?;
        for item in &mut items {
            item.is_paid = item.period <= loan.repaid_months;
        }
        Ok(items)
    }

    /// Records the next unpaid scheduled period.
    ///
    /// # Errors
    ///
    /// Returns `LoanPaidOff` on a paid-off loan, `Validation` for bad
    /// accounts.
    pub fn next_repayment(
        loan: &Loan,
        request: &RepaymentRequest,
        chart: &ChartOfAccounts,
    ) -> Result<(Loan, JournalEntry), LedgerError> {
        if loan.is_paid_off() || !loan.remaining_principal.is_positive() {
            return Err(LedgerError::LoanPaidOff(loan.id));
        }
        let items = Self::schedule_for(loan)?;
        // Periods whose principal and interest both truncate to zero are
        // passed over; the final period always carries the remainder.
        let (item, principal, interest) = items
            .iter()
            .skip(loan.repaid_months as usize)
            .map(|item| {
                let principal = if item.period >= loan.total_months {
                    loan.remaining_principal
                } else {
                    item.principal_component.min(loan.remaining_principal)
                };
                (item, principal, item.interest_component)
            })
            .find(|(_, principal, interest)| principal.is_positive() || interest.is_positive())
            .ok_or(LedgerError::LoanPaidOff(loan.id))?;

        let mut header = EntryHeader::new(loan.book_id, request.repay_date);
        header.description = Some(format!(
            "Loan {} repayment {}/{}",
            loan.name, item.period, loan.total_months
        ));
        let kind = IntentKind::Repay {
            principal,
            interest,
            liability_account_id: loan.account_id,
            payment_account_id: request.payment_account_id,
            interest_account_id: request.interest_account_id,
        };
        let entry = EntryBuilder::build_system(&header, &kind, chart)?;

        let mut updated = Self::apply_principal(loan, principal);
        updated.repaid_months = item.period;
        updated.interest_paid += interest;
        Ok((updated, entry))
    }

    /// Records a principal-only prepayment.
    ///
    /// # Errors
    ///
    /// Returns `LoanPaidOff` on a paid-off loan, `Validation` if the amount
    /// is not within `(0, remaining_principal]` or an account is bad.
    pub fn prepayment(
        loan: &Loan,
        request: &PrepaymentRequest,
        chart: &ChartOfAccounts,
    ) -> Result<(Loan, JournalEntry), LedgerError> {
        if loan.is_paid_off() {
            return Err(LedgerError::LoanPaidOff(loan.id));
        }
        let mut v = Violations::new();
        v.check(request.amount.is_positive(), "amount", "must be positive");
        v.check(
            request.amount <= loan.remaining_principal,
            "amount",
            "must not exceed the remaining principal",
        );
        v.finish()?;

        let mut header = EntryHeader::new(loan.book_id, request.prepay_date);
        header.description = Some(format!("Loan {} prepayment", loan.name));
        let kind = IntentKind::Repay {
            principal: request.amount,
            interest: Money::ZERO,
            liability_account_id: loan.account_id,
            payment_account_id: request.payment_account_id,
            interest_account_id: None,
        };
        let entry = EntryBuilder::build_system(&header, &kind, chart)?;

        Ok((Self::apply_principal(loan, request.amount), entry))
    }

    /// Aggregates a book's loans.
    #[must_use]
    pub fn portfolio(loans: &[Loan]) -> PortfolioSummary {
        loans.iter().fold(PortfolioSummary::default(), |mut acc, loan| {
            acc.loan_count += 1;
            if !loan.is_paid_off() {
                acc.active_count += 1;
            }
            acc.total_principal += loan.principal;
            acc.total_remaining += loan.remaining_principal;
            acc.total_repaid += loan.principal_repaid();
            acc.total_interest += loan.total_interest;
            acc.total_interest_paid += loan.interest_paid;
            acc
        })
    }

    fn apply_principal(loan: &Loan, principal: Money) -> Loan {
        let mut updated = loan.clone();
        updated.remaining_principal -= principal;
        if updated.remaining_principal.is_zero() {
            updated.status = LoanStatus::PaidOff;
        }
        updated
    }
}
