#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod quiz_service;

pub use macer_core::Clock;

pub use error::{GeneratorError, QuizError};
pub use generator::{GeneratorSettings, QuestionGenerator};
pub use quiz_service::{QuizService, SessionReport};
