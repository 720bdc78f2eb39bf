//! Email/password accounts and the signed-in session
//!
//! The account uid is the identity history records are filed under.

use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::storage::{now_millis, ActivityLog, Database};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("An account already exists for {0}")]
    EmailTaken(String),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),
    #[error("Account storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Session file error: {0}")]
    Session(#[from] std::io::Error),
    #[error("Corrupt session file: {0}")]
    CorruptSession(#[from] serde_json::Error),
}

const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub uid: String,
    pub email: String,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Account registration and sign-in against the local database
pub struct Authenticator {
    db: Arc<Database>,
    activity: ActivityLog,
}

impl Authenticator {
    pub fn new(db: Arc<Database>, activity: ActivityLog) -> Self {
        Self { db, activity }
    }

    /// Create an account and return its session
    pub fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_ascii_lowercase();
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail(email));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword(MIN_PASSWORD_LEN));
        }

        let uid = uuid::Uuid::new_v4().simple().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let inserted = self.db.connection().execute(
            "INSERT OR IGNORE INTO users (uid, email, password_salt, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![uid, email, salt, hash_password(&salt, password), now_millis()],
        )?;
        if inserted == 0 {
            return Err(AuthError::EmailTaken(email));
        }

        info!("Registered account {}", email);
        self.activity.log_user_activity("register", &format!("User registered with email: {}", email));
        Ok(Session { uid, email })
    }

    /// Check credentials and return the session
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim().to_ascii_lowercase();
        let row: Option<(String, String, String)> = self
            .db
            .connection()
            .query_row(
                "SELECT uid, password_salt, password_hash FROM users WHERE email = ?1",
                [&email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((uid, salt, hash)) if hash_password(&salt, password) == hash => {
                self.activity.log_user_activity("login", &format!("User logged in with email: {}", email));
                Ok(Session { uid, email })
            }
            _ => {
                warn!("Login failed for {}", email);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Persists the current session between invocations
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join("session.json") }
    }

    pub fn current(&self) -> Result<Option<Session>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, session: &Session) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn authenticator() -> (Authenticator, ActivityLog) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let activity = ActivityLog::new(db.clone());
        (Authenticator::new(db, activity.clone()), activity)
    }

    #[test]
    fn test_register_then_sign_in() {
        let (auth, activity) = authenticator();
        let registered = auth.register("Reader@Example.com", "hunter22").unwrap();

        let session = auth.sign_in("reader@example.com", "hunter22").unwrap();
        assert_eq!(session, registered);
        assert_eq!(session.email, "reader@example.com");
        assert_eq!(activity.recent_activities(1)[0].0, "login");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (auth, _) = authenticator();
        auth.register("a@b.c", "correct-horse").unwrap();

        assert!(matches!(auth.sign_in("a@b.c", "wrong-horse"), Err(AuthError::InvalidCredentials)));
        assert!(matches!(auth.sign_in("nobody@b.c", "correct-horse"), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (auth, _) = authenticator();
        auth.register("a@b.c", "password1").unwrap();
        assert!(matches!(auth.register("A@B.C", "password2"), Err(AuthError::EmailTaken(_))));
    }

    #[test]
    fn test_register_validation() {
        let (auth, _) = authenticator();
        assert!(matches!(auth.register("not-an-email", "password1"), Err(AuthError::InvalidEmail(_))));
        assert!(matches!(auth.register("a@b.c", "123"), Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_session_store_lifecycle() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.current().unwrap().is_none());

        let session = Session { uid: "u1".to_string(), email: "a@b.c".to_string() };
        store.save(&session).unwrap();
        assert_eq!(store.current().unwrap(), Some(session));

        store.clear().unwrap();
        assert!(store.current().unwrap().is_none());
    }
}
