//! Presentation state a screen binds to

use chrono::{Local, TimeZone};
use std::sync::Arc;
use uuid::Uuid;

use crate::pipeline::PipelineState;
use crate::shared::PipelineEvent;
use crate::storage::HistoryEntry;
use crate::vision::AnnotatedImage;

/// Characters of translated text shown per history row
pub const HISTORY_PREVIEW_CHARS: usize = 50;

/// State of the translate screen
///
/// Only events from the most recent run are applied, so a slow run
/// finishing late cannot overwrite the result of a newer one.
#[derive(Debug, Clone, Default)]
pub struct ScreenState {
    /// Run whose events are currently displayed
    pub active_run: Option<Uuid>,
    /// Last state reported by the active run
    pub pipeline_state: Option<PipelineState>,
    /// Spinner visibility
    pub is_loading: bool,
    pub recognized_text: String,
    pub translated_text: String,
    /// Annotated image for the zoom view
    pub annotated: Option<Arc<AnnotatedImage>>,
    pub last_error: Option<String>,
    /// History entry written by the finished run
    pub history_id: Option<String>,
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start displaying a new run, clearing the previous result
    pub fn begin_run(&mut self, run_id: Uuid) {
        *self = Self {
            active_run: Some(run_id),
            pipeline_state: Some(PipelineState::Picking),
            is_loading: true,
            ..Self::default()
        };
    }

    /// Apply one event; returns false if it belonged to a superseded run
    pub fn apply(&mut self, event: &PipelineEvent) -> bool {
        if self.active_run != Some(event.run_id()) {
            tracing::debug!("Ignoring event from stale run {}", event.run_id());
            return false;
        }

        match event {
            PipelineEvent::StateChanged { state, .. } => {
                self.pipeline_state = Some(*state);
                if *state == PipelineState::Idle || state.is_terminal() {
                    self.is_loading = false;
                }
            }
            PipelineEvent::Recognized { text, .. } => self.recognized_text = text.clone(),
            PipelineEvent::Translated { text, .. } => self.translated_text = text.clone(),
            PipelineEvent::Annotated { image, .. } => self.annotated = Some(image.clone()),
            PipelineEvent::Failed { message, .. } => self.last_error = Some(message.clone()),
            PipelineEvent::Finished { history_id, .. } => {
                self.history_id = history_id.clone();
                self.is_loading = false;
            }
        }
        true
    }
}

/// One row of the history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItemView {
    pub image_url: String,
    pub preview: String,
    pub timestamp: String,
}

impl HistoryItemView {
    pub fn from_entry(entry: &HistoryEntry) -> Self {
        Self {
            image_url: entry.image_url.clone(),
            preview: preview_text(&entry.translated_text),
            timestamp: format_timestamp(entry.timestamp_ms),
        }
    }
}

/// First 50 characters followed by "..."
pub fn preview_text(text: &str) -> String {
    let mut preview: String = text.chars().take(HISTORY_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Milliseconds since the epoch as local `yyyy-MM-dd HH:mm:ss`
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}
