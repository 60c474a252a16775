use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::eval::EvalError;

//
// ─── OPERATOR ──────────────────────────────────────────────────────────────────
//

/// One of the four arithmetic operators a question can contain.
///
/// `Div` is part of the vocabulary (the evaluator and the persisted format
/// both understand it) even though the generator never draws it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// Returns the display symbol for this operator.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "x",
            Operator::Div => "÷",
        }
    }

    /// Parses an operator from its display symbol.
    ///
    /// # Errors
    ///
    /// Returns `EvalError::UnknownOperator` for any symbol outside
    /// `+`, `-`, `x`, `÷`.
    pub fn from_symbol(symbol: &str) -> Result<Self, EvalError> {
        match symbol {
            "+" => Ok(Operator::Add),
            "-" => Ok(Operator::Sub),
            "x" => Ok(Operator::Mul),
            "÷" => Ok(Operator::Div),
            other => Err(EvalError::UnknownOperator(other.to_string())),
        }
    }

    /// Applies this operator to two operands.
    ///
    /// Division is plain `f64` division: dividing by zero yields an infinity
    /// or NaN rather than an error.
    #[must_use]
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Operator::Add => lhs + rhs,
            Operator::Sub => lhs - rhs,
            Operator::Mul => lhs * rhs,
            Operator::Div => lhs / rhs,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl TryFrom<String> for Operator {
    type Error = EvalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_symbol(&value)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.symbol().to_string()
    }
}

//
// ─── TOKEN ─────────────────────────────────────────────────────────────────────
//

/// One element of a question's expression: an operand or an operator.
///
/// Serialized untagged so a persisted expression reads as a flat JSON array
/// of numbers and symbol strings, e.g. `[3, "+", 4]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Number(f64),
    Operator(Operator),
}

impl Token {
    /// Returns true when this token is a numeric operand.
    #[must_use]
    pub fn is_operand(&self) -> bool {
        matches!(self, Token::Number(_))
    }
}

impl From<Operator> for Token {
    fn from(op: Operator) -> Self {
        Token::Operator(op)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral operands render without a trailing ".0", matching the
            // prompt text users see.
            Token::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{}", *n as i64)
            }
            Token::Number(n) => write!(f, "{n}"),
            Token::Operator(op) => write!(f, "{op}"),
        }
    }
}

impl FromStr for Token {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = s.parse::<f64>() {
            return Ok(Token::Number(value));
        }
        Operator::from_symbol(s).map(Token::Operator)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
