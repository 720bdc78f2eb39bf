//! Application Coordinator
//!
//! Builds every service from the configuration and wires them together
//! explicitly. Pipeline runs are spawned on the tokio runtime and report
//! back over a channel.

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{Authenticator, Session, SessionStore};
use crate::capture::ImagePicker;
use crate::config::AppConfig;
use crate::pipeline::{PipelineReport, PipelineRequest, TranslationPipeline};
use crate::shared::PipelineEvent;
use crate::storage::{self, ActivityLog, Database, HistoryEntry, HistoryStore, LocalUploader, SqliteHistoryStore};
use crate::translation::{HttpTranslator, LanguageCode, TranslationService, Translator, TranslatorRegistry};
use crate::vision::{
    Annotator, AssetManager, AssetType, HttpRecognizer, OcrBackend, SidecarRecognizer, TextRecognizer,
};

/// A run that has been started
pub struct RunHandle {
    pub run_id: Uuid,
    pub task: JoinHandle<PipelineReport>,
}

/// Main application coordinator
pub struct PhotoTranslateApp {
    config: AppConfig,
    activity: ActivityLog,
    auth: Authenticator,
    sessions: SessionStore,
    history: Arc<dyn HistoryStore>,
    pipeline: Arc<TranslationPipeline>,
    /// Progress events from every run
    pub events: Receiver<PipelineEvent>,
}

impl PhotoTranslateApp {
    /// Build the application using the platform data directory
    pub async fn new(config: AppConfig) -> Result<Self> {
        let data_dir = storage::get_data_dir()?;
        Self::with_data_dir(config, data_dir).await
    }

    /// Build the application with storage rooted at `data_dir` unless the
    /// configuration names explicit locations
    pub async fn with_data_dir(config: AppConfig, data_dir: PathBuf) -> Result<Self> {
        let db_path = config
            .storage
            .database_path
            .clone()
            .unwrap_or_else(|| data_dir.join("photo_translate.db"));
        let db = Arc::new(
            Database::open(&db_path).with_context(|| format!("Failed to open database {:?}", db_path))?,
        );
        let activity = ActivityLog::new(db.clone());

        let uploads_dir = config.storage.uploads_dir.clone().unwrap_or_else(|| data_dir.clone());
        let uploader = Arc::new(LocalUploader::new(uploads_dir).with_activity_log(activity.clone()));

        let source: LanguageCode = config
            .general
            .source_language
            .parse()
            .context("Invalid source language in configuration")?;

        let recognizer: Arc<dyn TextRecognizer> = match config.recognition.backend {
            OcrBackend::Http => Arc::new(HttpRecognizer::new(
                config.recognition.endpoint.clone(),
                source.as_str(),
            )),
            OcrBackend::Sidecar => Arc::new(SidecarRecognizer::new(source.as_str())),
        };

        let endpoint = config.translation.endpoint.clone();
        let api_key = config.translation.api_key.clone();
        let registry = TranslatorRegistry::new(Box::new(move |pair| {
            Arc::new(HttpTranslator::new(endpoint.clone(), api_key.clone(), pair.clone())) as Arc<dyn Translator>
        }));
        let translation = Arc::new(TranslationService::new(source, registry));

        let annotator = Arc::new(Self::build_annotator(&config, &data_dir).await);
        let history: Arc<dyn HistoryStore> = Arc::new(SqliteHistoryStore::new(db.clone()));

        let (tx, events) = unbounded();
        let pipeline = TranslationPipeline::new(uploader, recognizer, translation.clone(), annotator, history.clone())
            .with_events(tx);

        info!("Application ready (source {}, database {:?})", translation.source(), db_path);

        Ok(Self {
            auth: Authenticator::new(db, activity.clone()),
            sessions: SessionStore::new(&data_dir),
            activity,
            history,
            pipeline: Arc::new(pipeline),
            events,
            config,
        })
    }

    /// Annotator with the configured font, the downloaded default, or none
    async fn build_annotator(config: &AppConfig, data_dir: &std::path::Path) -> Annotator {
        let settings = &config.annotation;
        let font_path = match &settings.font_path {
            Some(path) => Some(path.clone()),
            None if settings.download_font => {
                let assets = match AssetManager::with_dir(data_dir.join("assets")) {
                    Ok(assets) => assets,
                    Err(e) => {
                        warn!("Asset directory unavailable: {}", e);
                        return Annotator::new(settings.style(), None);
                    }
                };
                match assets.ensure(AssetType::LabelFont).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!("Could not obtain {}: {}", AssetType::LabelFont.display_name(), e);
                        None
                    }
                }
            }
            None => None,
        };

        let font = font_path.and_then(|path| match Annotator::load_font(&path) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!("Failed to load label font {:?}: {}", path, e);
                None
            }
        });
        Annotator::new(settings.style(), font)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn register(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.register(email, password)?;
        self.sessions.save(&session)?;
        Ok(session)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.sign_in(email, password)?;
        self.sessions.save(&session)?;
        Ok(session)
    }

    pub fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.sessions.current()? {
            self.activity.log_user_activity("logout", &format!("User logged out: {}", session.email));
        }
        self.sessions.clear()?;
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.sessions.current()?)
    }

    /// Record the chosen target language for `session`
    pub async fn select_language(&self, session: &Session, language: &LanguageCode) {
        self.activity
            .record_selected_language(session.uid.clone(), language.as_str().to_string())
            .await;
    }

    /// Pick an image on the calling thread, then run the pipeline in the background
    pub fn start_translation(&self, session: &Session, picker: &dyn ImagePicker, target: LanguageCode) -> RunHandle {
        let request = PipelineRequest::new(session.uid.clone(), picker.pick(), target);
        let run_id = request.run_id;
        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move { pipeline.run(request).await });
        RunHandle { run_id, task }
    }

    /// Most recent history for `session`, newest first
    pub async fn history(&self, session: &Session) -> Result<Vec<HistoryEntry>> {
        let entries = self
            .history
            .recent(&session.uid, self.config.history.limit)
            .await
            .context("Error getting history")?;
        Ok(entries)
    }
}
