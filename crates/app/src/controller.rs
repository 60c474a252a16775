use std::fmt;

use chrono::Utc;
use macer_core::model::QuizSession;
use macer_core::time::format_elapsed;
use services::{QuizError, QuizService, SessionReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
pub enum ControllerError {
    NoSession,
    Quiz(QuizError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::NoSession => write!(f, "no session in progress"),
            ControllerError::Quiz(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<QuizError> for ControllerError {
    fn from(e: QuizError) -> Self {
        ControllerError::Quiz(e)
    }
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Owns the view state of the running quiz: the current session and the
/// one-second elapsed-time ticker.
///
/// The ticker publishes `HH:MM:SS` text through a watch channel once per
/// second; subscribers observe state changes instead of polling the session.
/// Starting a new batch or dropping the controller aborts the ticker.
pub struct QuizController {
    service: QuizService,
    session: Option<QuizSession>,
    ticker: Option<JoinHandle<()>>,
    elapsed_tx: watch::Sender<String>,
    // Held so ticker sends succeed even before anyone subscribes.
    elapsed_rx: watch::Receiver<String>,
}

impl QuizController {
    #[must_use]
    pub fn new(service: QuizService) -> Self {
        let (elapsed_tx, elapsed_rx) = watch::channel("00:00:00".to_string());
        Self {
            service,
            session: None,
            ticker: None,
            elapsed_tx,
            elapsed_rx,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    /// Subscribe to the elapsed-time display text.
    #[must_use]
    pub fn elapsed(&self) -> watch::Receiver<String> {
        self.elapsed_rx.clone()
    }

    #[must_use]
    pub fn ticker_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Starts a fresh batch, discarding any in-progress session and
    /// restarting the elapsed ticker from the new start timestamp.
    ///
    /// # Errors
    ///
    /// Propagates generation failures; the previous session is already gone
    /// by then, matching the regenerate semantics of the original.
    pub fn new_batch(&mut self) -> Result<&QuizSession, ControllerError> {
        self.stop_ticker();
        self.session = None;

        let session = self.service.start_session()?;
        let started_at = session.started_at();

        let tx = self.elapsed_tx.clone();
        tx.send_replace("00:00:00".to_string());
        self.ticker = Some(tokio::spawn(async move {
            let mut tick = interval(Duration::from_secs(1));
            // The first tick fires immediately; skip it so the display
            // changes on whole seconds.
            tick.tick().await;
            loop {
                tick.tick().await;
                if tx.send(format_elapsed(started_at, Utc::now())).is_err() {
                    break;
                }
            }
        }));

        Ok(&*self.session.insert(session))
    }

    /// Records an answer on the current session.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::NoSession` when no batch is in progress.
    pub fn enter_answer(&mut self, index: usize, answer: f64) -> Result<(), ControllerError> {
        let session = self.session.as_mut().ok_or(ControllerError::NoSession)?;
        self.service.enter_answer(session, index, answer)?;
        Ok(())
    }

    /// Blanks an answer on the current session.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::NoSession` when no batch is in progress.
    pub fn clear_answer(&mut self, index: usize) -> Result<(), ControllerError> {
        let session = self.session.as_mut().ok_or(ControllerError::NoSession)?;
        self.service.clear_answer(session, index)?;
        Ok(())
    }

    /// Submits the current session: stops the ticker, grades, persists, and
    /// keeps the finalized session in view for incorrect-answer display.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::NoSession` when no batch is in progress,
    /// and propagates grading/persistence failures.
    pub async fn submit(&mut self) -> Result<SessionReport, ControllerError> {
        let session = self.session.as_mut().ok_or(ControllerError::NoSession)?;
        let report = self.service.submit(session).await?;
        self.stop_ticker();
        Ok(report)
    }

    /// Tears down the display timer.
    pub fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for QuizController {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use macer_core::Clock;
    use macer_core::time::fixed_now;
    use services::{GeneratorSettings, QuestionGenerator};
    use std::sync::Arc;
    use storage::repository::{InMemoryRepository, SessionRepository};

    fn build_controller(repo: &InMemoryRepository) -> QuizController {
        let service = QuizService::new(
            Clock::fixed(fixed_now()),
            QuestionGenerator::new(GeneratorSettings::new(1, 10, 4).unwrap()),
            Arc::new(repo.clone()),
        );
        QuizController::new(service)
    }

    #[tokio::test]
    async fn new_batch_replaces_session_and_restarts_ticker() {
        let repo = InMemoryRepository::new();
        let mut controller = build_controller(&repo);
        assert!(controller.session().is_none());
        assert!(!controller.ticker_running());

        controller.new_batch().unwrap();
        let first_prompts: Vec<String> = controller
            .session()
            .unwrap()
            .questions()
            .iter()
            .map(|q| q.prompt().to_string())
            .collect();
        assert_eq!(first_prompts.len(), 4);
        assert!(controller.ticker_running());

        controller.enter_answer(0, 3.0).unwrap();
        controller.new_batch().unwrap();
        // The fresh batch has no answers carried over.
        assert!(
            controller
                .session()
                .unwrap()
                .questions()
                .iter()
                .all(|q| q.answer().is_none())
        );
        assert!(controller.ticker_running());
    }

    #[tokio::test]
    async fn submit_stops_ticker_and_persists() {
        let repo = InMemoryRepository::new();
        let mut controller = build_controller(&repo);
        controller.new_batch().unwrap();

        let expected = controller.session().unwrap().questions()[0].expected_answer();
        controller.enter_answer(0, expected).unwrap();

        let report = controller.submit().await.unwrap();
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 4);
        assert!(!controller.ticker_running());
        assert!(controller.session().unwrap().is_finalized());

        let record = repo.get_session(&report.key).await.unwrap();
        assert_eq!(record.into_session().unwrap().correct_count(), 1);
    }

    #[tokio::test]
    async fn answering_without_a_batch_fails() {
        let repo = InMemoryRepository::new();
        let mut controller = build_controller(&repo);

        let err = controller.enter_answer(0, 1.0).unwrap_err();
        assert!(matches!(err, ControllerError::NoSession));
        let err = controller.submit().await.unwrap_err();
        assert!(matches!(err, ControllerError::NoSession));
    }

    #[tokio::test]
    async fn elapsed_display_starts_at_zero() {
        let repo = InMemoryRepository::new();
        let mut controller = build_controller(&repo);
        controller.new_batch().unwrap();

        let elapsed = controller.elapsed();
        assert_eq!(*elapsed.borrow(), "00:00:00");
    }
}
