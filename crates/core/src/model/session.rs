use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("session already finalized")]
    Finalized,

    #[error("ended_at is before started_at")]
    InvalidTimeRange,

    #[error("no question at index {0}")]
    QuestionIndex(usize),
}

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// One timed batch of questions, from creation to finalization.
///
/// A session is "in progress" until `finalize` stamps the end timestamp,
/// which happens exactly once. Questions mutate only to attach the user's
/// answer and, at finalization, the correctness flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSession {
    started_at: DateTime<Utc>,
    questions: Vec<Question>,
    ended_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Creates an in-progress session over the given questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(started_at: DateTime<Utc>, questions: Vec<Question>) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            started_at,
            questions,
            ended_at: None,
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Number of questions graded correct so far.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.is_correct() == Some(true))
            .count()
    }

    /// Attach the user's answer to the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finalized` once the session has ended, and
    /// `SessionError::QuestionIndex` for an out-of-range index.
    pub fn set_answer(&mut self, index: usize, answer: f64) -> Result<(), SessionError> {
        let question = self.question_mut(index)?;
        question.set_answer(answer);
        Ok(())
    }

    /// Clear the user's answer on the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finalized` once the session has ended, and
    /// `SessionError::QuestionIndex` for an out-of-range index.
    pub fn clear_answer(&mut self, index: usize) -> Result<(), SessionError> {
        let question = self.question_mut(index)?;
        question.clear_answer();
        Ok(())
    }

    /// Grades every question and stamps the end timestamp.
    ///
    /// Returns the number of correct answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Finalized` if called twice, and
    /// `SessionError::InvalidTimeRange` if `ended_at` precedes the start.
    pub fn finalize(&mut self, ended_at: DateTime<Utc>) -> Result<usize, SessionError> {
        if self.is_finalized() {
            return Err(SessionError::Finalized);
        }
        if ended_at < self.started_at {
            return Err(SessionError::InvalidTimeRange);
        }

        let mut correct = 0;
        for question in &mut self.questions {
            if question.grade() {
                correct += 1;
            }
        }
        self.ended_at = Some(ended_at);
        Ok(correct)
    }

    fn question_mut(&mut self, index: usize) -> Result<&mut Question, SessionError> {
        if self.is_finalized() {
            return Err(SessionError::Finalized);
        }
        self.questions
            .get_mut(index)
            .ok_or(SessionError::QuestionIndex(index))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
