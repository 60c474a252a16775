use chrono::Duration;
use macer_core::model::{Operator, Question, QuizSession, Token};
use macer_core::time::fixed_now;
use storage::repository::{SessionRecord, SessionRepository, StorageError, session_key};
use storage::sqlite::SqliteRepository;

fn finalized_session(offset_secs: i64) -> QuizSession {
    let question = Question::new(vec![
        Token::Number(2.0),
        Token::Operator(Operator::Add),
        Token::Number(3.0),
        Token::Operator(Operator::Mul),
        Token::Number(4.0),
    ])
    .unwrap();
    let started = fixed_now() + Duration::seconds(offset_secs);
    let mut session = QuizSession::new(started, vec![question]).unwrap();
    session.set_answer(0, 20.0).unwrap();
    session.finalize(started + Duration::seconds(75)).unwrap();
    session
}

#[tokio::test]
async fn sqlite_round_trips_a_finalized_session() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let session = finalized_session(0);
    let record = SessionRecord::from_session(&session).unwrap();
    repo.append_session(&record).await.unwrap();

    let fetched = repo.get_session(&record.key).await.unwrap();
    assert_eq!(fetched.started_at, session.started_at());
    assert_eq!(fetched.ended_at, session.ended_at().unwrap());

    let back = fetched.into_session().unwrap();
    assert_eq!(back, session);
    assert_eq!(back.correct_count(), 1);
}

#[tokio::test]
async fn sqlite_rejects_duplicate_keys() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_conflict?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let record = SessionRecord::from_session(&finalized_session(0)).unwrap();
    repo.append_session(&record).await.unwrap();

    let err = repo.append_session(&record).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));
}

#[tokio::test]
async fn sqlite_lists_keys_newest_first() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_listing?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let older = finalized_session(0);
    let newer = finalized_session(120);
    for session in [&older, &newer] {
        let record = SessionRecord::from_session(session).unwrap();
        repo.append_session(&record).await.unwrap();
    }

    let keys = repo.list_keys(10).await.unwrap();
    assert_eq!(
        keys,
        vec![
            session_key(newer.started_at()),
            session_key(older.started_at()),
        ]
    );

    let err = repo.get_session("QUIZmissing").await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    let migrate_again = repo.migrate().await;
    assert!(migrate_again.is_ok());
}
