//! Amount entry: keypad state and expression evaluation.

pub mod expression;
pub mod keypad;

pub use expression::{Operator, evaluate, has_operator};
pub use keypad::{AmountInput, Key, KeyOutcome, MAX_FRACTION_DIGITS, MAX_INTEGER_DIGITS};
