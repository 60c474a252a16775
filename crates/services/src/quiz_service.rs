use std::fmt;
use std::sync::Arc;

use macer_core::Clock;
use macer_core::model::QuizSession;
use storage::repository::{SessionRecord, SessionRepository};

use crate::error::QuizError;
use crate::generator::QuestionGenerator;

//
// ─── SESSION REPORT ────────────────────────────────────────────────────────────
//

/// Summary returned after submitting a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub correct: usize,
    pub total: usize,
    pub key: String,
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Solved: {} are correct from {}",
            self.correct, self.total
        )
    }
}

//
// ─── QUIZ SERVICE ──────────────────────────────────────────────────────────────
//

/// Orchestrates the quiz workflow: start a batch, record answers, and submit.
///
/// Submission grades every question, finalizes the session exactly once,
/// persists the full record, and returns the summary. A prior in-progress
/// session is simply dropped by the caller when a new batch starts; only
/// finalized sessions ever reach storage.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    generator: QuestionGenerator,
    sessions: Arc<dyn SessionRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        generator: QuestionGenerator,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            clock,
            generator,
            sessions,
        }
    }

    #[must_use]
    pub fn generator(&self) -> &QuestionGenerator {
        &self.generator
    }

    /// Starts a fresh session with a newly generated batch.
    ///
    /// # Errors
    ///
    /// Propagates question-generation failures via `QuizError::Question`.
    pub fn start_session(&self) -> Result<QuizSession, QuizError> {
        let questions = self.generator.generate_batch()?;
        let session = QuizSession::new(self.clock.now(), questions)?;
        Ok(session)
    }

    /// Records the user's answer for one question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` for a finalized session or an
    /// out-of-range index.
    pub fn enter_answer(
        &self,
        session: &mut QuizSession,
        index: usize,
        answer: f64,
    ) -> Result<(), QuizError> {
        session.set_answer(index, answer)?;
        Ok(())
    }

    /// Blanks the user's answer for one question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` for a finalized session or an
    /// out-of-range index.
    pub fn clear_answer(&self, session: &mut QuizSession, index: usize) -> Result<(), QuizError> {
        session.clear_answer(index)?;
        Ok(())
    }

    /// Grades, finalizes, and persists the session, returning the summary.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` if the session was already submitted and
    /// `QuizError::Storage` if persistence fails.
    pub async fn submit(&self, session: &mut QuizSession) -> Result<SessionReport, QuizError> {
        let correct = session.finalize(self.clock.now())?;
        let record = SessionRecord::from_session(session)?;
        self.sessions.append_session(&record).await?;

        Ok(SessionReport {
            correct,
            total: session.total(),
            key: record.key,
        })
    }

    /// Lists keys of previously persisted sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the listing query fails.
    pub async fn history(&self, limit: u32) -> Result<Vec<String>, QuizError> {
        Ok(self.sessions.list_keys(limit).await?)
    }
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("clock", &self.clock)
            .field("generator", &self.generator)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GeneratorSettings;
    use macer_core::model::SessionError;
    use macer_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, SessionRepository};

    fn build_service(repo: &InMemoryRepository) -> QuizService {
        QuizService::new(
            fixed_clock(),
            QuestionGenerator::new(GeneratorSettings::default()),
            Arc::new(repo.clone()),
        )
    }

    #[test]
    fn start_session_produces_the_default_batch() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let session = service.start_session().unwrap();

        assert_eq!(session.total(), GeneratorSettings::DEFAULT_BATCH_SIZE);
        assert!(!session.is_finalized());
    }

    #[tokio::test]
    async fn submit_reports_and_persists() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let mut session = service.start_session().unwrap();

        // Answer half the questions correctly, leave the rest blank.
        let half = session.total() / 2;
        for index in 0..half {
            let expected = session.questions()[index].expected_answer();
            service.enter_answer(&mut session, index, expected).unwrap();
        }

        let report = service.submit(&mut session).await.unwrap();
        assert_eq!(report.correct, half);
        assert_eq!(report.total, session.total());

        let record = repo.get_session(&report.key).await.unwrap();
        let stored = record.into_session().unwrap();
        assert_eq!(stored.correct_count(), half);
    }

    #[tokio::test]
    async fn submit_is_rejected_twice() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let mut session = service.start_session().unwrap();

        service.submit(&mut session).await.unwrap();
        let err = service.submit(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            QuizError::Session(SessionError::Finalized)
        ));
    }

    #[tokio::test]
    async fn answers_can_be_cleared_before_submit() {
        let repo = InMemoryRepository::new();
        let service = build_service(&repo);
        let mut session = service.start_session().unwrap();

        let expected = session.questions()[0].expected_answer();
        service.enter_answer(&mut session, 0, expected).unwrap();
        service.clear_answer(&mut session, 0).unwrap();

        let report = service.submit(&mut session).await.unwrap();
        assert_eq!(report.correct, 0);
    }

    #[test]
    fn report_renders_the_summary_line() {
        let report = SessionReport {
            correct: 20,
            total: 20,
            key: "QUIZ2023-11-14T22:13:20.000Z".into(),
        };
        assert_eq!(report.to_string(), "Solved: 20 are correct from 20");
    }
}
