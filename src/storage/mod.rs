//! Storage Layer
//!
//! Handles persistence of accounts, translation history, activity logs and
//! uploaded images using SQLite and the local data directory.

pub mod activity;
pub mod database;
pub mod history;
pub mod uploads;

pub use activity::ActivityLog;
pub use database::Database;
pub use history::{HistoryEntry, HistoryStore, NewHistoryEntry, SqliteHistoryStore};
pub use uploads::{ImageUploader, LocalUploader, UploadError};

use anyhow::Result;
use std::path::PathBuf;

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "phototranslate", "PhotoTranslate")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Current time as milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
