use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use macer_core::model::QuizSession;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key prefix for persisted sessions, shared by every backend.
pub const KEY_PREFIX: &str = "QUIZ";

/// Builds the storage key for a session started at the given instant.
///
/// The timestamp renders as RFC 3339 with millisecond precision and a `Z`
/// suffix, so keys stay byte-compatible with the original
/// `"QUIZ" + Date.toISOString()` scheme.
#[must_use]
pub fn session_key(started_at: DateTime<Utc>) -> String {
    format!(
        "{KEY_PREFIX}{}",
        started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Persisted shape for one finalized quiz session.
///
/// The payload is the full session serialized as JSON (tokens, prompts,
/// expected and user answers, correctness flags), so repositories never need
/// to understand the domain model beyond its timestamps.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub key: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub payload: String,
}

impl SessionRecord {
    /// Serializes a finalized session into its persisted record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the session has not been
    /// finalized or cannot be encoded.
    pub fn from_session(session: &QuizSession) -> Result<Self, StorageError> {
        let ended_at = session
            .ended_at()
            .ok_or_else(|| StorageError::Serialization("session is not finalized".into()))?;
        let payload = serde_json::to_string(session)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Self {
            key: session_key(session.started_at()),
            started_at: session.started_at(),
            ended_at,
            payload,
        })
    }

    /// Decodes the record back into a domain session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the payload is not a valid
    /// session document.
    pub fn into_session(self) -> Result<QuizSession, StorageError> {
        serde_json::from_str(&self.payload).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Repository contract for finalized quiz sessions.
///
/// Sessions are write-once: a second append under the same key is a
/// conflict. Reads exist for history views and tests.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a finalized session record under its key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the key already exists, or other
    /// storage errors.
    async fn append_session(&self, record: &SessionRecord) -> Result<(), StorageError>;

    /// Fetch a session record by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_session(&self, key: &str) -> Result<SessionRecord, StorageError>;

    /// List session keys, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the listing query fails.
    async fn list_keys(&self, limit: u32) -> Result<Vec<String>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn append_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&record.key) {
            return Err(StorageError::Conflict);
        }
        guard.insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn get_session(&self, key: &str) -> Result<SessionRecord, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(key).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_keys(&self, limit: u32) -> Result<Vec<String>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<&SessionRecord> = guard.values().collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records
            .into_iter()
            .take(limit as usize)
            .map(|r| r.key.clone())
            .collect())
    }
}

/// Aggregates the session repository behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo);
        Self { sessions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use macer_core::model::{Operator, Question, Token};
    use macer_core::time::fixed_now;

    fn finalized_session(offset_secs: i64) -> QuizSession {
        let question = Question::new(vec![
            Token::Number(3.0),
            Token::Operator(Operator::Add),
            Token::Number(4.0),
        ])
        .unwrap();
        let started = fixed_now() + Duration::seconds(offset_secs);
        let mut session = QuizSession::new(started, vec![question]).unwrap();
        session.set_answer(0, 7.0).unwrap();
        session.finalize(started + Duration::seconds(30)).unwrap();
        session
    }

    #[test]
    fn keys_match_the_original_scheme() {
        let key = session_key(fixed_now());
        assert_eq!(key, "QUIZ2023-11-14T22:13:20.000Z");
    }

    #[test]
    fn record_requires_a_finalized_session() {
        let question = Question::new(vec![
            Token::Number(1.0),
            Token::Operator(Operator::Add),
            Token::Number(1.0),
        ])
        .unwrap();
        let session = QuizSession::new(fixed_now(), vec![question]).unwrap();
        let err = SessionRecord::from_session(&session).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[test]
    fn record_round_trips_the_session() {
        let session = finalized_session(0);
        let record = SessionRecord::from_session(&session).unwrap();
        assert_eq!(record.key, session_key(session.started_at()));

        let back = record.into_session().unwrap();
        assert_eq!(back, session);
    }

    #[tokio::test]
    async fn append_is_write_once() {
        let repo = InMemoryRepository::new();
        let record = SessionRecord::from_session(&finalized_session(0)).unwrap();

        repo.append_session(&record).await.unwrap();
        let err = repo.append_session(&record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let fetched = repo.get_session(&record.key).await.unwrap();
        assert_eq!(fetched.payload, record.payload);
    }

    #[tokio::test]
    async fn keys_list_newest_first() {
        let repo = InMemoryRepository::new();
        let first = SessionRecord::from_session(&finalized_session(0)).unwrap();
        let second = SessionRecord::from_session(&finalized_session(60)).unwrap();
        repo.append_session(&first).await.unwrap();
        repo.append_session(&second).await.unwrap();

        let keys = repo.list_keys(10).await.unwrap();
        assert_eq!(keys, vec![second.key.clone(), first.key.clone()]);

        let keys = repo.list_keys(1).await.unwrap();
        assert_eq!(keys, vec![second.key]);
    }
}
