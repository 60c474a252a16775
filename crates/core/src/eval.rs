use thiserror::Error;

use crate::model::{Operator, Token};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while evaluating or parsing an expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The token sequence contained no operand at all.
    #[error("expression is empty")]
    EmptyExpression,

    /// An operator symbol outside `+`, `-`, `x`, `÷` was encountered.
    #[error("unknown operator symbol: {0}")]
    UnknownOperator(String),

    /// An operand followed another operand with no operator in between.
    #[error("operand encountered with no pending operator")]
    MissingOperator,
}

//
// ─── SEQUENTIAL EVALUATION ─────────────────────────────────────────────────────
//

/// Reduces a token sequence to a single value, strictly left to right.
///
/// This is sequential evaluation, not mathematical operator precedence:
/// `2 + 3 x 4` is `(2 + 3) x 4 = 20`, never `14`. The first operand
/// initializes the running result; each operator token becomes the pending
/// operator; each later operand combines with the running result via the
/// pending operator.
///
/// Division uses plain `f64` semantics, so dividing by zero yields an
/// infinity or NaN rather than an error.
///
/// # Errors
///
/// Returns `EvalError::EmptyExpression` if no operand is ever seen, and
/// `EvalError::MissingOperator` if an operand follows another operand
/// without an operator in between.
pub fn evaluate(tokens: &[Token]) -> Result<f64, EvalError> {
    let mut result: Option<f64> = None;
    let mut pending: Option<Operator> = None;

    for token in tokens {
        match token {
            Token::Number(value) => match result {
                None => result = Some(*value),
                Some(acc) => {
                    let op = pending.ok_or(EvalError::MissingOperator)?;
                    result = Some(op.apply(acc, *value));
                }
            },
            Token::Operator(op) => pending = Some(*op),
        }
    }

    result.ok_or(EvalError::EmptyExpression)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Token;
    use std::str::FromStr;

    fn tokens(symbols: &[&str]) -> Vec<Token> {
        symbols
            .iter()
            .map(|s| Token::from_str(s).unwrap())
            .collect()
    }

    #[test]
    fn single_operand_is_its_own_result() {
        assert_eq!(evaluate(&tokens(&["7"])).unwrap(), 7.0);
    }

    #[test]
    fn evaluation_is_sequential_not_precedence_based() {
        // 2 + 3 x 4 reduces left to right: (2 + 3) x 4 = 20.
        let result = evaluate(&tokens(&["2", "+", "3", "x", "4"])).unwrap();
        assert_eq!(result, 20.0);
        assert_ne!(result, 14.0);
    }

    #[test]
    fn all_four_operators_apply() {
        assert_eq!(evaluate(&tokens(&["9", "-", "4"])).unwrap(), 5.0);
        assert_eq!(evaluate(&tokens(&["9", "+", "4"])).unwrap(), 13.0);
        assert_eq!(evaluate(&tokens(&["9", "x", "4"])).unwrap(), 36.0);
        assert_eq!(evaluate(&tokens(&["9", "÷", "4"])).unwrap(), 2.25);
    }

    #[test]
    fn empty_sequence_fails() {
        let err = evaluate(&[]).unwrap_err();
        assert_eq!(err, EvalError::EmptyExpression);
    }

    #[test]
    fn operator_only_sequence_fails_as_empty() {
        let err = evaluate(&tokens(&["+", "x"])).unwrap_err();
        assert_eq!(err, EvalError::EmptyExpression);
    }

    #[test]
    fn adjacent_operands_fail() {
        let seq = vec![Token::Number(2.0), Token::Number(3.0)];
        let err = evaluate(&seq).unwrap_err();
        assert_eq!(err, EvalError::MissingOperator);
    }

    #[test]
    fn foreign_symbols_never_reach_the_evaluator() {
        let err = Token::from_str("%").unwrap_err();
        assert_eq!(err, EvalError::UnknownOperator("%".to_string()));
    }

    #[test]
    fn division_by_zero_keeps_ieee_semantics() {
        let result = evaluate(&tokens(&["5", "÷", "0"])).unwrap();
        assert!(result.is_infinite());

        let result = evaluate(&tokens(&["0", "÷", "0"])).unwrap();
        assert!(result.is_nan());
    }

    #[test]
    fn trailing_operator_is_ignored() {
        // Matches the sequential reduction: the pending operator is simply
        // never applied when no operand follows it.
        assert_eq!(evaluate(&tokens(&["3", "+"])).unwrap(), 3.0);
    }
}
