//! Keypad state for amount capture.
//!
//! ```text
//! [ 1 ] [ 2 ] [ 3 ] [ + ]
//! [ 4 ] [ 5 ] [ 6 ] [ - ]
//! [ 7 ] [ 8 ] [ 9 ] [ × ]
//! [ . ] [ 0 ] [ ← ] [ ✓ ]
//! ```

use rust_decimal::Decimal;

use super::expression::{Operator, evaluate, has_operator};

/// Most integer digits in one number.
pub const MAX_INTEGER_DIGITS: usize = 12;

/// Most fractional digits in one number.
pub const MAX_FRACTION_DIGITS: usize = 2;

/// A keypad key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `0`..=`9`.
    Digit(u8),
    /// `.`
    Dot,
    /// An operator key.
    Operator(Operator),
    /// `←`
    Backspace,
    /// `✓` / `=`
    Ok,
}

impl Key {
    /// Parses a key name: a digit, `.`, an operator symbol, `del` or `ok`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "del" | "backspace" => Some(Self::Backspace),
            "ok" | "=" => Some(Self::Ok),
            "." => Some(Self::Dot),
            _ => {
                let mut chars = s.chars();
                let c = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                if let Some(digit) = c.to_digit(10) {
                    u8::try_from(digit).ok().map(Self::Digit)
                } else {
                    Operator::from_char(c).map(Self::Operator)
                }
            }
        }
    }
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The text changed.
    Edited,
    /// The key was not allowed here; the text is unchanged.
    Ignored,
    /// `ok` evaluated the expression into its result.
    Evaluated,
    /// `ok` on a plain number: the amount is ready to submit.
    Submit,
}

/// Text typed on the keypad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountInput {
    text: String,
}

impl AmountInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Current text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Amount the text stands for, evaluating an expression if needed.
    #[must_use]
    pub fn value(&self) -> Option<Decimal> {
        evaluate(&self.text)
    }

    /// Applies one key press.
    pub fn press(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Backspace => {
                if self.text.pop().is_some() {
                    KeyOutcome::Edited
                } else {
                    KeyOutcome::Ignored
                }
            }
            Key::Ok => self.ok(),
            Key::Operator(op) => self.operator(op),
            Key::Dot => self.dot(),
            Key::Digit(digit) => self.digit(digit),
        }
    }

    fn ok(&mut self) -> KeyOutcome {
        if !has_operator(&self.text) {
            return KeyOutcome::Submit;
        }
        match evaluate(&self.text) {
            Some(value) => {
                self.text = value.normalize().to_string();
                KeyOutcome::Evaluated
            }
            None => KeyOutcome::Ignored,
        }
    }

    fn operator(&mut self, op: Operator) -> KeyOutcome {
        let Some(last) = self.text.chars().last() else {
            return KeyOutcome::Ignored;
        };
        if last == '.' || Operator::from_char(last).is_some() {
            self.text.pop();
        }
        self.text.push(op.symbol());
        KeyOutcome::Edited
    }

    fn dot(&mut self) -> KeyOutcome {
        let segment = self.last_segment();
        if segment.contains('.') {
            return KeyOutcome::Ignored;
        }
        if segment.is_empty() {
            self.text.push_str("0.");
        } else {
            self.text.push('.');
        }
        KeyOutcome::Edited
    }

    fn digit(&mut self, digit: u8) -> KeyOutcome {
        if digit > 9 {
            return KeyOutcome::Ignored;
        }
        let segment = self.last_segment();
        let full = match segment.split_once('.') {
            Some((_, fraction)) => fraction.len() >= MAX_FRACTION_DIGITS,
            None => segment.trim_start_matches('0').len() >= MAX_INTEGER_DIGITS,
        };
        if full {
            return KeyOutcome::Ignored;
        }
        self.text.push(char::from(b'0' + digit));
        KeyOutcome::Edited
    }

    /// The number being typed: everything after the last operator.
    fn last_segment(&self) -> &str {
        self.text
            .rsplit(|c| Operator::from_char(c).is_some())
            .next()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(keys: &[&str]) -> (AmountInput, Vec<KeyOutcome>) {
        let mut input = AmountInput::new();
        let outcomes = keys
            .iter()
            .map(|k| input.press(Key::parse(k).unwrap()))
            .collect();
        (input, outcomes)
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(Key::parse("7"), Some(Key::Digit(7)));
        assert_eq!(Key::parse("×"), Some(Key::Operator(Operator::Multiply)));
        assert_eq!(Key::parse("del"), Some(Key::Backspace));
        assert_eq!(Key::parse("ok"), Some(Key::Ok));
        assert_eq!(Key::parse("12"), None);
        assert_eq!(Key::parse("x"), None);
    }

    #[test]
    fn test_operator_on_empty_is_ignored() {
        let (input, outcomes) = typed(&["+"]);
        assert_eq!(input.text(), "");
        assert_eq!(outcomes, vec![KeyOutcome::Ignored]);
    }

    #[test]
    fn test_operator_replaces_trailing_operator_or_dot() {
        let (input, _) = typed(&["5", "+", "×"]);
        assert_eq!(input.text(), "5×");
        let (input, _) = typed(&["5", ".", "-"]);
        assert_eq!(input.text(), "5-");
    }

    #[test]
    fn test_dot_rules() {
        let (input, _) = typed(&["."]);
        assert_eq!(input.text(), "0.");
        let (input, outcomes) = typed(&["1", ".", "5", "."]);
        assert_eq!(input.text(), "1.5");
        assert_eq!(outcomes[3], KeyOutcome::Ignored);
        let (input, _) = typed(&["1", ".", "5", "+", "."]);
        assert_eq!(input.text(), "1.5+0.");
    }

    #[test]
    fn test_digit_limits() {
        let (input, outcomes) = typed(&["1", ".", "2", "3", "4"]);
        assert_eq!(input.text(), "1.23");
        assert_eq!(outcomes[4], KeyOutcome::Ignored);

        let mut input = AmountInput::from_text("123456789012");
        assert_eq!(input.press(Key::Digit(3)), KeyOutcome::Ignored);
        let mut input = AmountInput::from_text("000012345678901");
        assert_eq!(input.press(Key::Digit(2)), KeyOutcome::Edited);
        assert_eq!(input.press(Key::Digit(3)), KeyOutcome::Ignored);
    }

    #[test]
    fn test_backspace() {
        let (input, outcomes) = typed(&["1", "2", "del", "del", "del"]);
        assert_eq!(input.text(), "");
        assert_eq!(outcomes[4], KeyOutcome::Ignored);
    }

    #[test]
    fn test_ok_evaluates_expression() {
        let (input, outcomes) = typed(&["1", "2", ".", "5", "+", "3", "ok"]);
        assert_eq!(input.text(), "15.5");
        assert_eq!(outcomes[6], KeyOutcome::Evaluated);
    }

    #[test]
    fn test_ok_submits_plain_number() {
        let (input, outcomes) = typed(&["4", "2", "ok"]);
        assert_eq!(input.text(), "42");
        assert_eq!(outcomes[2], KeyOutcome::Submit);
        assert_eq!(input.value(), Some(Decimal::from(42)));
    }

    #[test]
    fn test_ok_keeps_text_on_division_by_zero() {
        let mut input = AmountInput::from_text("5÷0");
        assert_eq!(input.press(Key::Ok), KeyOutcome::Ignored);
        assert_eq!(input.text(), "5÷0");
    }
}
