//! Arithmetic expressions typed on the amount keypad.
//!
//! Grammar: `number (op number)* op?` where `op` is one of `+ - × ÷`
//! (ASCII `*` and `/` are accepted too). Multiplication and division are
//! collapsed first, then addition and subtraction are folded left to right.

use rust_decimal::{Decimal, RoundingStrategy};

use homeledger_shared::types::money::MINOR_UNIT_SCALE;

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `×`
    Multiply,
    /// `÷`
    Divide,
}

impl Operator {
    /// Keypad symbol.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Subtract => '-',
            Self::Multiply => '×',
            Self::Divide => '÷',
        }
    }

    /// Parses a keypad or ASCII symbol.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Subtract),
            '×' | '*' => Some(Self::Multiply),
            '÷' | '/' => Some(Self::Divide),
            _ => None,
        }
    }

    const fn binds_tighter(self) -> bool {
        matches!(self, Self::Multiply | Self::Divide)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Number(Decimal),
    Op(Operator),
}

/// Returns true if `expr` contains an operator.
#[must_use]
pub fn has_operator(expr: &str) -> bool {
    expr.chars().any(|c| Operator::from_char(c).is_some())
}

/// Evaluates an expression.
///
/// Returns `None` for empty or malformed input and for division by zero.
/// One trailing operator is ignored. The result is the absolute value
/// rounded half away from zero to two decimals.
#[must_use]
pub fn evaluate(expr: &str) -> Option<Decimal> {
    let mut tokens = tokenize(expr)?;
    if matches!(tokens.last(), Some(Token::Op(_))) {
        tokens.pop();
    }

    // Pass 1: collapse × and ÷ into a sum of signed terms.
    let mut iter = tokens.into_iter();
    let Some(Token::Number(first)) = iter.next() else {
        return None;
    };
    let mut terms: Vec<(Operator, Decimal)> = vec![(Operator::Add, first)];
    while let Some(token) = iter.next() {
        let (Token::Op(op), Some(Token::Number(rhs))) = (token, iter.next()) else {
            return None;
        };
        if op.binds_tighter() {
            let (_, lhs) = terms.last_mut()?;
            *lhs = match op {
                Operator::Multiply => lhs.checked_mul(rhs)?,
                _ => lhs.checked_div(rhs)?,
            };
        } else {
            terms.push((op, rhs));
        }
    }

    // Pass 2: fold + and -.
    let total = terms.into_iter().try_fold(Decimal::ZERO, |acc, (op, value)| match op {
        Operator::Subtract => acc.checked_sub(value),
        _ => acc.checked_add(value),
    })?;

    Some(
        total
            .abs()
            .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero),
    )
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut number = String::new();

    let flush = |number: &mut String, tokens: &mut Vec<Token>| -> Option<()> {
        if !number.is_empty() {
            tokens.push(Token::Number(number.trim_end_matches('.').parse().ok()?));
            number.clear();
        }
        Some(())
    };

    for c in expr.chars().filter(|c| !c.is_whitespace()) {
        if c.is_ascii_digit() {
            number.push(c);
        } else if c == '.' {
            if number.is_empty() || number.contains('.') {
                return None;
            }
            number.push(c);
        } else if let Some(op) = Operator::from_char(c) {
            if number.is_empty() {
                return None;
            }
            flush(&mut number, &mut tokens)?;
            tokens.push(Token::Op(op));
        } else {
            return None;
        }
    }
    flush(&mut number, &mut tokens)?;

    if tokens.is_empty() { None } else { Some(tokens) }
}
