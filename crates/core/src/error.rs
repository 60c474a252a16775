use thiserror::Error;

use crate::eval::EvalError;
use crate::model::{QuestionError, SessionError};

/// Umbrella error for the core crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Eval(#[from] EvalError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Session(#[from] SessionError),
}
