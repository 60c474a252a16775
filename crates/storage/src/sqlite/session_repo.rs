use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{SessionRecord, SessionRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn map_record_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StorageError> {
    Ok(SessionRecord {
        key: row.try_get("key").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        ended_at: row.try_get("ended_at").map_err(ser)?,
        payload: row.try_get("payload").map_err(ser)?,
    })
}

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn append_session(&self, record: &SessionRecord) -> Result<(), StorageError> {
        let result = sqlx::query(
            r"
                INSERT INTO quiz_sessions (key, started_at, ended_at, payload)
                VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(&record.key)
        .bind(record.started_at)
        .bind(record.ended_at)
        .bind(&record.payload)
        .execute(self.pool())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_database_error()
                    .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
                {
                    return Err(StorageError::Conflict);
                }
                Err(StorageError::Connection(e.to_string()))
            }
        }
    }

    async fn get_session(&self, key: &str) -> Result<SessionRecord, StorageError> {
        let row = sqlx::query(
            r"
                SELECT key, started_at, ended_at, payload
                FROM quiz_sessions
                WHERE key = ?1
            ",
        )
        .bind(key)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_record_row(&row)
    }

    async fn list_keys(&self, limit: u32) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT key
                FROM quiz_sessions
                ORDER BY started_at DESC
                LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(row.try_get("key").map_err(ser)?);
        }

        Ok(out)
    }
}
