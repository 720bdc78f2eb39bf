//! Translation history
//!
//! Append-only log of completed translations per identity. Entries are never
//! updated or deleted by the application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::Database;

/// Number of entries shown on the history screen
pub const DEFAULT_HISTORY_LIMIT: usize = 5;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("History worker failed: {0}")]
    Worker(String),
}

/// A persisted translation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub identity: String,
    pub image_url: String,
    pub translated_text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

/// Fields supplied when appending a record; the store generates the id
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub identity: String,
    pub image_url: String,
    pub translated_text: String,
    pub timestamp_ms: i64,
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a record and return its generated identifier
    async fn append(&self, entry: NewHistoryEntry) -> Result<String, HistoryError>;

    /// Up to `limit` most recent entries for `identity`, newest first
    async fn recent(&self, identity: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError>;
}

/// SQLite-backed history store
pub struct SqliteHistoryStore {
    db: Arc<Database>,
}

impl SqliteHistoryStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn insert(db: &Database, entry: &NewHistoryEntry) -> Result<String, HistoryError> {
    let id = uuid::Uuid::new_v4().to_string();
    db.connection().execute(
        "INSERT INTO translation_history (id, user_id, image_url, translated_text, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            id,
            entry.identity,
            entry.image_url,
            entry.translated_text,
            entry.timestamp_ms,
        ],
    )?;
    Ok(id)
}

fn query_recent(db: &Database, identity: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
    let conn = db.connection();
    let mut stmt = conn.prepare(
        "SELECT id, user_id, image_url, translated_text, timestamp
         FROM translation_history WHERE user_id = ?1
         ORDER BY timestamp DESC, rowid DESC LIMIT ?2",
    )?;
    let entries = stmt
        .query_map(rusqlite::params![identity, limit as i64], |row| {
            Ok(HistoryEntry {
                id: row.get(0)?,
                identity: row.get(1)?,
                image_url: row.get(2)?,
                translated_text: row.get(3)?,
                timestamp_ms: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(&self, entry: NewHistoryEntry) -> Result<String, HistoryError> {
        let db = self.db.clone();
        let id = tokio::task::spawn_blocking(move || insert(&db, &entry))
            .await
            .map_err(|e| HistoryError::Worker(e.to_string()))??;
        debug!("History saved with id {}", id);
        Ok(id)
    }

    async fn recent(&self, identity: &str, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let db = self.db.clone();
        let identity = identity.to_string();
        tokio::task::spawn_blocking(move || query_recent(&db, &identity, limit))
            .await
            .map_err(|e| HistoryError::Worker(e.to_string()))?
    }
}
