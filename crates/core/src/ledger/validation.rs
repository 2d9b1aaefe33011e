//! Business rule validation for journal lines.

use homeledger_shared::types::Money;
use tracing::error;

use super::entry::JournalLine;
use super::error::{FieldError, LedgerError};

/// Accumulates field errors so one response can name every bad field.
#[derive(Debug, Default)]
pub struct Violations {
    fields: Vec<FieldError>,
}

impl Violations {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a violation.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.push(FieldError::new(field, message));
    }

    /// Records a violation unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.push(field, message);
        }
    }

    /// Records the field errors of a validation error; other errors pass through.
    ///
    /// # Errors
    ///
    /// Returns any non-validation error unchanged.
    pub fn absorb<T>(&mut self, result: Result<T, LedgerError>) -> Result<Option<T>, LedgerError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(LedgerError::Validation(fields)) => {
                self.fields.extend(fields);
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts into `Ok(())` or a `Validation` error.
    ///
    /// # Errors
    ///
    /// Returns `Validation` listing every recorded field.
    pub fn finish(self) -> Result<(), LedgerError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Validation(self.fields))
        }
    }
}

/// Checks the double-entry invariant on engine-derived lines.
///
/// A failure here is an engine bug: it is logged as a correctness alarm
/// and nothing may be persisted.
///
/// # Errors
///
/// Returns `Unbalanced` if debits and credits differ.
pub fn ensure_balanced(lines: &[JournalLine]) -> Result<(), LedgerError> {
    let debit: Money = lines.iter().map(|line| line.debit).sum();
    let credit: Money = lines.iter().map(|line| line.credit).sum();
    if debit == credit {
        return Ok(());
    }
    let err = LedgerError::Unbalanced { debit, credit };
    error!(
        debit = %debit,
        credit = %credit,
        lines = lines.len(),
        "correctness alarm: derived journal lines do not balance"
    );
    Err(err)
}

/// Validates user-supplied lines (manual entries).
///
/// # Errors
///
/// Returns `Validation` if there are fewer than two lines, a line is not
/// exactly one positive side, or the lines do not balance.
pub fn validate_manual_lines(lines: &[JournalLine]) -> Result<(), LedgerError> {
    let mut violations = Violations::new();
    violations.check(lines.len() >= 2, "lines", "at least two lines are required");

    for (index, line) in lines.iter().enumerate() {
        let one_sided = (line.debit.is_positive() && line.credit.is_zero())
            || (line.credit.is_positive() && line.debit.is_zero());
        violations.check(
            one_sided,
            &format!("lines[{index}]"),
            "exactly one of debit or credit must be positive",
        );
    }

    if violations.is_empty() {
        let debit: Money = lines.iter().map(|line| line.debit).sum();
        let credit: Money = lines.iter().map(|line| line.credit).sum();
        if debit != credit {
            violations.push("lines", format!("debits {debit} do not equal credits {credit}"));
        }
    }

    violations.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeledger_shared::types::AccountId;

    #[test]
    fn test_ensure_balanced() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert!(
            ensure_balanced(&[
                JournalLine::debit(a, Money::from_cents(100)),
                JournalLine::credit(b, Money::from_cents(100)),
            ])
            .is_ok()
        );
        assert_eq!(
            ensure_balanced(&[
                JournalLine::debit(a, Money::from_cents(100)),
                JournalLine::credit(b, Money::from_cents(99)),
            ]),
            Err(LedgerError::Unbalanced {
                debit: Money::from_cents(100),
                credit: Money::from_cents(99),
            })
        );
    }

    #[test]
    fn test_manual_lines_require_two() {
        let result = validate_manual_lines(&[JournalLine::debit(AccountId::new(), Money::from_cents(1))]);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_manual_lines_reject_two_sided_line() {
        let a = AccountId::new();
        let mut line = JournalLine::debit(a, Money::from_cents(100));
        line.credit = Money::from_cents(100);
        let result = validate_manual_lines(&[line, JournalLine::credit(a, Money::from_cents(100))]);
        match result {
            Err(LedgerError::Validation(fields)) => assert_eq!(fields[0].field, "lines[0]"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_manual_lines_reject_imbalance_as_validation() {
        let a = AccountId::new();
        let result = validate_manual_lines(&[
            JournalLine::debit(a, Money::from_cents(100)),
            JournalLine::credit(a, Money::from_cents(90)),
        ]);
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    #[test]
    fn test_violations_absorb() {
        let mut violations = Violations::new();
        let absorbed: Option<()> = violations
            .absorb(Err(LedgerError::field("amount", "must be positive")))
            .unwrap();
        assert!(absorbed.is_none());
        assert!(
            violations
                .absorb::<()>(Err(LedgerError::Persistence("down".into())))
                .is_err()
        );
        assert!(violations.finish().is_err());
    }
}
