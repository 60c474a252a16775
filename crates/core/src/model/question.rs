use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::eval::{EvalError, evaluate};
use crate::model::Token;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors that can occur while building a question.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuestionError {
    /// Tokens must strictly alternate operand/operator, starting and ending
    /// on an operand.
    #[error("expression tokens must alternate operand and operator")]
    Malformed,

    #[error(transparent)]
    Eval(#[from] EvalError),
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One arithmetic question in a quiz.
///
/// The token sequence, prompt text, and expected answer are fixed at
/// construction. Only the user's answer and, at grading time, the
/// correctness flag ever change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    tokens: Vec<Token>,
    prompt: String,
    expected_answer: f64,
    answer: Option<f64>,
    is_correct: Option<bool>,
}

impl Question {
    /// Builds a question from a token sequence, rendering the prompt and
    /// computing the expected answer once via the sequential evaluator.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::Malformed` if the tokens do not alternate
    /// operand/operator with operands at both ends, and propagates evaluator
    /// failures as `QuestionError::Eval`.
    pub fn new(tokens: Vec<Token>) -> Result<Self, QuestionError> {
        let alternates = !tokens.is_empty()
            && tokens
                .iter()
                .enumerate()
                .all(|(i, t)| t.is_operand() == (i % 2 == 0))
            && tokens.len() % 2 == 1;
        if !alternates {
            // An empty sequence reports as the evaluator's empty error so
            // callers see the original taxonomy.
            if tokens.is_empty() {
                return Err(QuestionError::Eval(EvalError::EmptyExpression));
            }
            return Err(QuestionError::Malformed);
        }

        let expected_answer = evaluate(&tokens)?;
        let prompt = tokens
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            tokens,
            prompt,
            expected_answer,
            answer: None,
            is_correct: None,
        })
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn expected_answer(&self) -> f64 {
        self.expected_answer
    }

    #[must_use]
    pub fn answer(&self) -> Option<f64> {
        self.answer
    }

    /// Correctness flag, present only once the question has been graded.
    #[must_use]
    pub fn is_correct(&self) -> Option<bool> {
        self.is_correct
    }

    /// Attach or replace the user's answer.
    pub fn set_answer(&mut self, answer: f64) {
        self.answer = Some(answer);
    }

    /// Remove the user's answer, returning the question to unanswered.
    pub fn clear_answer(&mut self) {
        self.answer = None;
    }

    /// Grades the question against the expected answer and records the flag.
    ///
    /// An unanswered question grades incorrect. Comparison is numeric, so an
    /// answer entered as `"7.0"` and parsed to `7.0` matches an expected `7`.
    pub fn grade(&mut self) -> bool {
        let correct = self.answer == Some(self.expected_answer);
        self.is_correct = Some(correct);
        correct
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
