//! Recognition/translation orchestration
//!
//! One run is a strictly ordered chain: upload, normalize and recognize,
//! translate, annotate, persist. Failures are caught at each step boundary
//! and turned into a report; nothing here panics into the caller.

pub mod state;

pub use state::{PipelineState, StateTracker};

use crossbeam_channel::Sender;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::ImageResource;
use crate::shared::PipelineEvent;
use crate::storage::{now_millis, HistoryStore, ImageUploader, NewHistoryEntry, UploadError};
use crate::translation::{LanguageCode, TranslationOutcome, TranslationService};
use crate::vision::{load_upright, AnnotatedImage, Annotator, RecognitionOutcome, TextRecognizer};

#[derive(Error, Debug)]
pub enum PipelineFailure {
    #[error("Upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("Could not read image: {0}")]
    Image(String),
    #[error("Text recognition failed: {0}")]
    Recognition(String),
    #[error("Annotation failed: {0}")]
    Annotation(String),
}

impl PipelineFailure {
    /// Whether the user is told about this failure. Unreadable images and
    /// recognizer errors look exactly like a photo without text.
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, PipelineFailure::Image(_) | PipelineFailure::Recognition(_))
    }
}

/// Input for one run. `resource` is whatever the picker returned.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub run_id: Uuid,
    pub identity: String,
    pub resource: Option<ImageResource>,
    pub target: LanguageCode,
}

impl PipelineRequest {
    pub fn new(identity: impl Into<String>, resource: Option<ImageResource>, target: LanguageCode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            identity: identity.into(),
            resource,
            target,
        }
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct PipelineReport {
    pub run_id: Uuid,
    /// Final state: `Idle` (cancelled), `Done` or `Failed`
    pub state: PipelineState,
    pub transitions: Vec<PipelineState>,
    pub failure: Option<PipelineFailure>,
    pub image_url: Option<String>,
    pub recognition: Option<RecognitionOutcome>,
    pub translation: Option<TranslationOutcome>,
    pub annotated: Option<Arc<AnnotatedImage>>,
    pub history_id: Option<String>,
}

impl PipelineReport {
    pub fn is_cancelled(&self) -> bool {
        self.state == PipelineState::Idle
    }

    /// `Err` only for failures the user is told about
    pub fn into_result(self) -> Result<(), PipelineFailure> {
        match self.failure {
            Some(failure) if failure.is_surfaced() => Err(failure),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
impl PipelineReport {
    /// Recognized text as shown to the user
    pub fn recognized_text(&self) -> &str {
        self.recognition
            .as_ref()
            .map(|r| r.display_text())
            .unwrap_or("")
    }

    /// Translated text as shown to the user
    pub fn translated_text(&self) -> &str {
        self.translation
            .as_ref()
            .map(|t| t.display_text())
            .unwrap_or("")
    }
}

/// Bookkeeping for a single run
struct RunContext {
    tracker: StateTracker,
    events: Option<Sender<PipelineEvent>>,
    report: PipelineReport,
}

impl RunContext {
    fn new(run_id: Uuid, events: Option<Sender<PipelineEvent>>) -> Self {
        let tracker = StateTracker::new(PipelineState::Idle);
        Self {
            report: PipelineReport {
                run_id,
                state: tracker.current(),
                transitions: Vec::new(),
                failure: None,
                image_url: None,
                recognition: None,
                translation: None,
                annotated: None,
                history_id: None,
            },
            tracker,
            events,
        }
    }

    fn run_id(&self) -> Uuid {
        self.report.run_id
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is watching any more
            let _ = tx.send(event);
        }
    }

    fn advance(&mut self, state: PipelineState) {
        if self.tracker.advance(state) {
            debug!("Run {} -> {}", self.run_id(), state);
            self.emit(PipelineEvent::StateChanged { run_id: self.run_id(), state });
        }
    }

    fn set_recognition(&mut self, outcome: RecognitionOutcome) {
        self.emit(PipelineEvent::Recognized {
            run_id: self.run_id(),
            text: outcome.display_text().to_string(),
        });
        self.report.recognition = Some(outcome);
    }

    fn set_translation(&mut self, outcome: TranslationOutcome) {
        self.emit(PipelineEvent::Translated {
            run_id: self.run_id(),
            text: outcome.display_text().to_string(),
        });
        self.report.translation = Some(outcome);
    }

    fn set_annotated(&mut self, image: Arc<AnnotatedImage>) {
        self.emit(PipelineEvent::Annotated { run_id: self.run_id(), image: image.clone() });
        self.report.annotated = Some(image);
    }

    fn fail(mut self, failure: PipelineFailure) -> PipelineReport {
        if failure.is_surfaced() {
            error!("Run {} failed: {}", self.run_id(), failure);
            self.emit(PipelineEvent::Failed { run_id: self.run_id(), message: failure.to_string() });
        } else {
            warn!("Run {} found no text: {}", self.run_id(), failure);
        }
        self.report.failure = Some(failure);
        self.advance(PipelineState::Failed);
        self.finish()
    }

    fn finish(mut self) -> PipelineReport {
        self.emit(PipelineEvent::Finished {
            run_id: self.run_id(),
            history_id: self.report.history_id.clone(),
        });
        self.report.state = self.tracker.current();
        self.report.transitions = self.tracker.visited().to_vec();
        self.report
    }
}

/// The services one run needs, injected explicitly
pub struct TranslationPipeline {
    uploader: Arc<dyn ImageUploader>,
    recognizer: Arc<dyn TextRecognizer>,
    translation: Arc<TranslationService>,
    annotator: Arc<Annotator>,
    history: Arc<dyn HistoryStore>,
    events: Option<Sender<PipelineEvent>>,
}

impl TranslationPipeline {
    pub fn new(
        uploader: Arc<dyn ImageUploader>,
        recognizer: Arc<dyn TextRecognizer>,
        translation: Arc<TranslationService>,
        annotator: Arc<Annotator>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            uploader,
            recognizer,
            translation,
            annotator,
            history,
            events: None,
        }
    }

    /// Send progress events for every run to `events`
    pub fn with_events(mut self, events: Sender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Execute one run to completion
    pub async fn run(&self, request: PipelineRequest) -> PipelineReport {
        let mut run = RunContext::new(request.run_id, self.events.clone());
        run.advance(PipelineState::Picking);

        let Some(resource) = request.resource else {
            info!("Image selection cancelled");
            run.advance(PipelineState::Idle);
            return run.finish();
        };

        // Upload
        run.advance(PipelineState::Uploading);
        let image_url = match self.uploader.upload(&resource).await {
            Ok(url) => url,
            Err(e) => return run.fail(PipelineFailure::Upload(e)),
        };
        run.report.image_url = Some(image_url.clone());

        // Normalize + recognize
        run.advance(PipelineState::Recognizing);
        let path = resource.path().to_path_buf();
        let upright = match tokio::task::spawn_blocking(move || load_upright(&path)).await {
            Ok(Ok(image)) => image,
            Ok(Err(e)) => {
                run.set_recognition(RecognitionOutcome::Failed(e.to_string()));
                return run.fail(PipelineFailure::Image(format!("{:#}", e)));
            }
            Err(e) => {
                run.set_recognition(RecognitionOutcome::Failed(e.to_string()));
                return run.fail(PipelineFailure::Image(e.to_string()));
            }
        };

        debug!("Recognizing {} text in {}", self.recognizer.language(), resource.uri());
        let recognition = match self.recognizer.recognize(resource.path(), &upright).await {
            Ok(result) => RecognitionOutcome::from_result(result),
            Err(e) => {
                warn!("Text recognition failed: {}", e);
                run.set_recognition(RecognitionOutcome::Failed(e.to_string()));
                return run.fail(PipelineFailure::Recognition(e.to_string()));
            }
        };
        run.set_recognition(recognition.clone());

        // Translate
        run.advance(PipelineState::Translating);
        let source_text = recognition.result().map(|r| r.text.as_str()).unwrap_or("");
        let translation = self.translation.translate(source_text, &request.target).await;
        run.set_translation(translation.clone());

        // Annotate
        run.advance(PipelineState::Annotating);
        let annotator = self.annotator.clone();
        let result = recognition.result().cloned().unwrap_or_default();
        let annotated = tokio::task::spawn_blocking(move || annotator.annotate(&upright.to_rgba8(), &result)).await;
        match annotated {
            Ok(annotated) => run.set_annotated(Arc::new(annotated)),
            Err(e) => return run.fail(PipelineFailure::Annotation(e.to_string())),
        }

        // Persist only when both upload and translation produced something
        match translation.text() {
            Some(text) if !image_url.is_empty() => {
                let entry = NewHistoryEntry {
                    identity: request.identity.clone(),
                    image_url,
                    translated_text: text.to_string(),
                    timestamp_ms: now_millis(),
                };
                match self.history.append(entry).await {
                    Ok(id) => run.report.history_id = Some(id),
                    Err(e) => warn!("Error saving history: {}", e),
                }
            }
            _ => debug!("No translation to persist for run {}", run.run_id()),
        }

        run.advance(PipelineState::Done);
        info!("Run {} done {:.1?} after pick", run.run_id(), resource.picked_at.elapsed());
        run.finish()
    }
}
