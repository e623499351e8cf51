//! Rhetor Storage Layer
//!
//! Implements the `AttemptStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One `attempts` row per analysis attempt, inserted once, never updated
//! - Findings kept as a JSON array column so a row is written in one INSERT
//! - Latency stored in nanoseconds so reads equal writes field for field
//!
//! # Examples
//!
//! ```
//! use rhetor_store::SqliteStore;
//!
//! let store = SqliteStore::in_memory().unwrap();
//! // Store is now ready to record attempts
//! ```

#![warn(missing_docs)]

mod codec;

use rhetor_domain::traits::{AttemptQuery, AttemptStore, StatusFilter};
use rhetor_domain::{AnalysisAttempt, AttemptId, AttemptStatus};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored row could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// An attempt with this id was already recorded
    #[error("Attempt already recorded: {0}")]
    Duplicate(AttemptId),

    /// Connection lock poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

const SELECT_COLUMNS: &str = "SELECT id, text, requested_at, completed_at, status, failure_stage, \
     failure_detail, findings, retry_count, latency_ns, model, raw_reply FROM attempts";

/// SQLite-based implementation of AttemptStore
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so one store can be shared (for
/// example in an `Arc`) by concurrent analyses. Each attempt is a single
/// INSERT, so readers never see half an attempt.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rhetor_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("attempts.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(include_str!("schema.sql"))?;
        info!("Attempt store opened at {}", path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Total number of recorded attempts
    pub fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM attempts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl AttemptStore for SqliteStore {
    type Error = StoreError;

    fn record(&self, attempt: &AnalysisAttempt) -> Result<AttemptId, Self::Error> {
        let id_bytes = codec::id_to_bytes(attempt.id);
        let findings = codec::encode_findings(&attempt.findings);
        let (status, stage, detail) = match &attempt.status {
            AttemptStatus::Success => ("success", None, None),
            AttemptStatus::Failed(reason) => {
                ("failed", Some(reason.stage.as_str()), Some(reason.detail.as_str()))
            }
        };

        let conn = self.lock()?;

        // The lock is held across check and insert, so this cannot race
        let exists: bool = conn
            .query_row("SELECT 1 FROM attempts WHERE id = ?1", params![&id_bytes], |_| Ok(true))
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Duplicate(attempt.id));
        }

        conn.execute(
            "INSERT INTO attempts (id, text, requested_at, completed_at, status, failure_stage,
                 failure_detail, findings, retry_count, latency_ns, model, raw_reply)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                &id_bytes,
                &attempt.request.text,
                attempt.request.requested_at as i64,
                attempt.completed_at as i64,
                status,
                stage,
                detail,
                &findings,
                attempt.retry_count as i64,
                codec::latency_to_nanos(attempt.latency),
                &attempt.model,
                &attempt.raw_reply,
            ],
        )?;

        debug!(id = %attempt.id, status, "Recorded attempt");
        Ok(attempt.id)
    }

    fn get(&self, id: AttemptId) -> Result<Option<AnalysisAttempt>, Self::Error> {
        let id_bytes = codec::id_to_bytes(id);
        let conn = self.lock()?;

        let row = conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![&id_bytes],
                codec::read_row,
            )
            .optional()?;

        row.map(codec::decode_row).transpose()
    }

    fn list(&self, query: &AttemptQuery) -> Result<Vec<AnalysisAttempt>, Self::Error> {
        let mut sql = format!("{} WHERE 1=1", SELECT_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        match query.status {
            Some(StatusFilter::Success) => sql.push_str(" AND status = 'success'"),
            Some(StatusFilter::Failed) => sql.push_str(" AND status = 'failed'"),
            None => {}
        }

        if let Some(since) = query.since {
            sql.push_str(" AND requested_at >= ?");
            params.push(Box::new(since as i64));
        }

        if let Some(until) = query.until {
            sql.push_str(" AND requested_at <= ?");
            params.push(Box::new(until as i64));
        }

        sql.push_str(" ORDER BY requested_at DESC, id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(&param_refs[..], codec::read_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(codec::decode_row).collect()
    }
}
