//! SQLite-backed question store.
//!
//! Uniqueness is enforced by the table's primary key; the batch insert runs
//! `INSERT OR IGNORE` inside one transaction, so the call is all-or-nothing
//! and the newly-inserted count reflects exactly what was committed. The
//! connection sits behind an async mutex, serializing writers.

use crate::error::HarvestError;
use crate::model::TriviaRecord;
use crate::store::{collapse_batch, QuestionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS questions (
    id         INTEGER PRIMARY KEY,
    question   TEXT NOT NULL,
    answer     TEXT NOT NULL,
    created_at TEXT NOT NULL
);
";

/// Durable store keyed by record id.
pub struct SqliteQuestionStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteQuestionStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HarvestError> {
        let conn = Connection::open(path).map_err(store_err)?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory database. Used by tests and the ephemeral
    /// backend; contents are lost when the store is dropped.
    pub fn open_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, HarvestError> {
        conn.execute_batch(SCHEMA).map_err(store_err)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fetch a stored record by id, if present.
    pub async fn get(&self, id: i64) -> Result<Option<TriviaRecord>, HarvestError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare_cached("SELECT id, question, answer, created_at FROM questions WHERE id = ?1")
            .map_err(store_err)?;

        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(store_err)?;

        match rows.next() {
            Some(row) => {
                let (id, question, answer, created_at) = row.map_err(store_err)?;
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| {
                        HarvestError::StoreUnavailable(format!("corrupt timestamp for id {id}: {e}"))
                    })?
                    .with_timezone(&Utc);
                Ok(Some(TriviaRecord {
                    id,
                    question,
                    answer,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl QuestionStore for SqliteQuestionStore {
    async fn insert_unique(&self, batch: &[TriviaRecord]) -> Result<usize, HarvestError> {
        let candidates = collapse_batch(batch);
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(store_err)?;

        let mut inserted = 0usize;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR IGNORE INTO questions (id, question, answer, created_at) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(store_err)?;

            for record in candidates {
                inserted += stmt
                    .execute(params![
                        record.id,
                        record.question,
                        record.answer,
                        record.created_at.to_rfc3339(),
                    ])
                    .map_err(store_err)?;
            }
        }

        tx.commit().map_err(store_err)?;

        tracing::debug!(
            "SQLite store: {} of {} batch record(s) newly inserted",
            inserted,
            batch.len()
        );
        Ok(inserted)
    }

    async fn len(&self) -> Result<usize, HarvestError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM questions", [], |row| row.get(0))
            .map_err(store_err)?;
        Ok(count as usize)
    }
}

fn store_err(e: rusqlite::Error) -> HarvestError {
    HarvestError::StoreUnavailable(e.to_string())
}
