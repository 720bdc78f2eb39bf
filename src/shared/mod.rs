//! Presentation state and messaging between pipeline runs and a screen
//!
//! Runs report progress as `PipelineEvent`s over a channel; the screen
//! folds them into a `ScreenState` owned by the UI side.

pub mod messages;
pub mod state;
pub mod view;

pub use messages::PipelineEvent;
pub use state::{HistoryItemView, ScreenState};
pub use view::ViewTransform;
