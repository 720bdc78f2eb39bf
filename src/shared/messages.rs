//! Message types for communication between pipeline runs and the screen

use std::sync::Arc;
use uuid::Uuid;

use crate::pipeline::PipelineState;
use crate::vision::AnnotatedImage;

/// Messages sent from a pipeline run to whoever renders it
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The run moved to a new state
    StateChanged { run_id: Uuid, state: PipelineState },
    /// Text to show in the recognized-text area
    Recognized { run_id: Uuid, text: String },
    /// Text to show in the translated-text area
    Translated { run_id: Uuid, text: String },
    /// Annotated image for display and the zoom view
    Annotated { run_id: Uuid, image: Arc<AnnotatedImage> },
    /// The run failed; `message` is suitable for display
    Failed { run_id: Uuid, message: String },
    /// The run finished, successfully or not
    Finished { run_id: Uuid, history_id: Option<String> },
}

impl PipelineEvent {
    /// Run this event belongs to
    pub fn run_id(&self) -> Uuid {
        match self {
            PipelineEvent::StateChanged { run_id, .. }
            | PipelineEvent::Recognized { run_id, .. }
            | PipelineEvent::Translated { run_id, .. }
            | PipelineEvent::Annotated { run_id, .. }
            | PipelineEvent::Failed { run_id, .. }
            | PipelineEvent::Finished { run_id, .. } => *run_id,
        }
    }
}
