use rand::Rng;

use macer_core::model::{Operator, Question, QuestionError, Token};

use crate::error::GeneratorError;

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Difficulty configuration for question generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorSettings {
    operator_count: usize,
    max_digit: u32,
    batch_size: usize,
}

impl GeneratorSettings {
    pub const DEFAULT_OPERATOR_COUNT: usize = 1;
    pub const DEFAULT_MAX_DIGIT: u32 = 10;
    pub const DEFAULT_BATCH_SIZE: usize = 20;

    /// Validates a settings triple.
    ///
    /// An `operator_count` of zero is allowed and yields single-operand
    /// questions.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidMaxDigit` if `max_digit` is zero and
    /// `GeneratorError::InvalidBatchSize` if `batch_size` is zero.
    pub fn new(
        operator_count: usize,
        max_digit: u32,
        batch_size: usize,
    ) -> Result<Self, GeneratorError> {
        if max_digit == 0 {
            return Err(GeneratorError::InvalidMaxDigit);
        }
        if batch_size == 0 {
            return Err(GeneratorError::InvalidBatchSize);
        }
        Ok(Self {
            operator_count,
            max_digit,
            batch_size,
        })
    }

    #[must_use]
    pub fn operator_count(&self) -> usize {
        self.operator_count
    }

    #[must_use]
    pub fn max_digit(&self) -> u32 {
        self.max_digit
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            operator_count: Self::DEFAULT_OPERATOR_COUNT,
            max_digit: Self::DEFAULT_MAX_DIGIT,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }
}

//
// ─── GENERATOR ─────────────────────────────────────────────────────────────────
//

/// Produces random arithmetic questions for a quiz batch.
///
/// Only `+`, `-` and `x` are ever drawn; `÷` stays in the operator
/// vocabulary but out of the selection set, matching the behavior this
/// engine replicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionGenerator {
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    #[must_use]
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    #[must_use]
    pub fn settings(&self) -> GeneratorSettings {
        self.settings
    }

    /// Generates one question using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Propagates `QuestionError` if the drawn tokens fail validation; this
    /// aborts only the question being built.
    pub fn generate(&self) -> Result<Question, QuestionError> {
        self.generate_with(&mut rand::rng())
    }

    /// Generates one question from the provided RNG.
    ///
    /// The first operand is uniform in `[1, max_digit]`. Each operation
    /// draws an operator uniformly from `{+, -, x}` and then an operand:
    /// uniform in `[0, max_digit)` for the first operation, and uniform in
    /// `[0, min(max_digit, previous drawn operand))` afterwards. The bound
    /// follows the previous *drawn* operand, not the running result, and an
    /// empty range yields `0` — both quirks are kept on purpose, so a drawn
    /// zero pins every later operand to zero.
    ///
    /// # Errors
    ///
    /// Propagates `QuestionError` if the drawn tokens fail validation.
    pub fn generate_with(&self, rng: &mut impl Rng) -> Result<Question, QuestionError> {
        let max_digit = self.settings.max_digit;
        let mut tokens = Vec::with_capacity(2 * self.settings.operator_count + 1);

        tokens.push(Token::Number(f64::from(
            rng.random_range(0..max_digit) + 1,
        )));

        let mut last_drawn: Option<u32> = None;
        for _ in 0..self.settings.operator_count {
            let op = match rng.random_range(0..3u32) {
                0 => Operator::Add,
                1 => Operator::Sub,
                _ => Operator::Mul,
            };

            let operand = match last_drawn {
                None => rng.random_range(0..max_digit),
                Some(prev) => {
                    let bound = prev.min(max_digit);
                    if bound == 0 {
                        0
                    } else {
                        rng.random_range(0..bound)
                    }
                }
            };

            tokens.push(Token::Operator(op));
            tokens.push(Token::Number(f64::from(operand)));
            last_drawn = Some(operand);
        }

        Question::new(tokens)
    }

    /// Generates a full batch of `batch_size` questions.
    ///
    /// # Errors
    ///
    /// Propagates the first `QuestionError`; questions generated before the
    /// failure are discarded.
    pub fn generate_batch(&self) -> Result<Vec<Question>, QuestionError> {
        self.generate_batch_with(&mut rand::rng())
    }

    /// Generates a full batch of `batch_size` questions from the given RNG.
    ///
    /// # Errors
    ///
    /// Propagates the first `QuestionError`.
    pub fn generate_batch_with(&self, rng: &mut impl Rng) -> Result<Vec<Question>, QuestionError> {
        (0..self.settings.batch_size)
            .map(|_| self.generate_with(rng))
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
