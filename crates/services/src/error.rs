//! Shared error types for the services crate.

use thiserror::Error;

use macer_core::model::{QuestionError, SessionError};
use storage::repository::StorageError;

/// Errors emitted while validating generator settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("max_digit must be at least 1")]
    InvalidMaxDigit,

    #[error("batch_size must be at least 1")]
    InvalidBatchSize,
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
