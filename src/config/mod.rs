//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::{AnnotationStyle, OcrBackend};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Text recognition settings
    pub recognition: RecognitionSettings,
    /// Translation settings
    pub translation: TranslationSettings,
    /// Annotation drawing settings
    pub annotation: AnnotationSettings,
    /// Storage locations
    pub storage: StorageSettings,
    /// History screen settings
    pub history: HistorySettings,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Language the recognizer and translator read from
    pub source_language: String,
    /// Target used when `--target` is omitted
    pub default_target: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            source_language: "ko".to_string(),
            default_target: None,
        }
    }
}

/// Recognition-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Recognition backend
    pub backend: OcrBackend,
    /// OCR service URL (http backend)
    pub endpoint: String,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Http,
            endpoint: "http://localhost:8866/ocr".to_string(),
        }
    }
}

/// Translation-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    /// LibreTranslate-compatible base URL
    pub endpoint: String,
    /// Optional API key sent with each request
    pub api_key: Option<String>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5000".to_string(),
            api_key: None,
        }
    }
}

/// Annotation-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    /// Rectangle outline color (RGBA)
    pub stroke_color: [u8; 4],
    /// Rectangle outline width in pixels
    pub stroke_width: u32,
    /// Label color (RGBA)
    pub label_color: [u8; 4],
    /// Label height in pixels
    pub label_size: f32,
    /// Font used for labels; overrides the downloaded font
    pub font_path: Option<PathBuf>,
    /// Download the default label font when no font path is set
    pub download_font: bool,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            stroke_color: [255, 0, 0, 255],
            stroke_width: 8,
            label_color: [0, 0, 255, 255],
            label_size: 40.0,
            font_path: None,
            download_font: true,
        }
    }
}

impl AnnotationSettings {
    pub fn style(&self) -> AnnotationStyle {
        AnnotationStyle {
            stroke_color: image::Rgba(self.stroke_color),
            stroke_width: self.stroke_width,
            label_color: image::Rgba(self.label_color),
            label_size: self.label_size,
        }
    }
}

/// Storage locations; unset paths live in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// SQLite database file
    pub database_path: Option<PathBuf>,
    /// Root directory for uploaded images
    pub uploads_dir: Option<PathBuf>,
}

/// History screen settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Number of entries to show
    pub limit: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            limit: crate::storage::history::DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
