//! User activity and language selection logs
//!
//! Writes are fire-and-forget: a failed insert is logged and dropped.

use std::sync::Arc;
use tracing::{debug, warn};

use super::{now_millis, Database};

/// Activity logger backed by the shared database
#[derive(Clone)]
pub struct ActivityLog {
    db: Arc<Database>,
}

impl ActivityLog {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Record a user activity such as `login` or `image_upload`
    pub fn log_user_activity(&self, activity: &str, details: &str) {
        let result = self.db.connection().execute(
            "INSERT INTO user_logs (activity, details, timestamp) VALUES (?1, ?2, ?3)",
            rusqlite::params![activity, details, now_millis()],
        );
        match result {
            Ok(_) => debug!("Logged activity '{}'", activity),
            Err(e) => warn!("Error logging activity '{}': {}", activity, e),
        }
    }

    /// Record the target language a user picked
    pub fn log_selected_language(&self, user_id: &str, language: &str) {
        let result = self.db.connection().execute(
            "INSERT INTO language_selections (user_id, selected_language, timestamp)
             VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, language, now_millis()],
        );
        match result {
            Ok(_) => debug!("Logged language selection '{}' for {}", language, user_id),
            Err(e) => warn!("Error logging language selection: {}", e),
        }
    }

    /// [`log_user_activity`](Self::log_user_activity) on the blocking pool, for async callers
    pub async fn record_user_activity(&self, activity: &'static str, details: String) {
        let log = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || log.log_user_activity(activity, &details)).await {
            warn!("Activity logger task failed: {}", e);
        }
    }

    /// [`log_selected_language`](Self::log_selected_language) on the blocking pool
    pub async fn record_selected_language(&self, user_id: String, language: String) {
        let log = self.clone();
        if let Err(e) = tokio::task::spawn_blocking(move || log.log_selected_language(&user_id, &language)).await {
            warn!("Language selection logger task failed: {}", e);
        }
    }

    /// Most recent activities, newest first, as `(activity, details)`
    #[cfg(test)]
    pub fn recent_activities(&self, limit: usize) -> Vec<(String, String)> {
        let conn = self.db.connection();
        let rows = conn
            .prepare("SELECT activity, details FROM user_logs ORDER BY id DESC LIMIT ?1")
            .and_then(|mut stmt| {
                stmt.query_map([limit as i64], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()
            });
        rows.unwrap_or_else(|e| {
            warn!("Failed to read activity log: {}", e);
            Vec::new()
        })
    }
}
