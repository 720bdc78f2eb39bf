//! SQLite database for persistent storage

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        uid           TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_salt TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at    INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS translation_history (
        id              TEXT PRIMARY KEY,
        user_id         TEXT NOT NULL,
        image_url       TEXT NOT NULL,
        translated_text TEXT NOT NULL,
        timestamp       INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS translation_history_user
        ON translation_history(user_id, timestamp);
    CREATE TABLE IF NOT EXISTS user_logs (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        activity  TEXT NOT NULL,
        details   TEXT NOT NULL,
        timestamp INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS language_selections (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id           TEXT NOT NULL,
        selected_language TEXT NOT NULL,
        timestamp         INTEGER NOT NULL
    );
"#;

/// Database connection wrapper
///
/// `rusqlite::Connection` is not `Sync`, so the connection sits behind a
/// mutex and the stores share the database through an `Arc`.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        debug!("Database ready at {:?}", path);
        Ok(db)
    }

    /// Open a private in-memory database
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        let db = Self { conn: Mutex::new(conn) };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(SCHEMA)
            .context("Failed to create database schema")?;
        Ok(())
    }

    /// Lock the connection for a short synchronous operation
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_schema_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.init_schema().is_ok());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history.db");

        let db = Database::open(&path).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM translation_history", [], |row| row.get(0))
            .unwrap();

        assert_eq!(count, 0);
        assert!(path.exists());
    }
}
