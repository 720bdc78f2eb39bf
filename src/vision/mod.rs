//! Vision Layer
//!
//! Orientation correction, text recognition and annotation of picked images.
//! Supports two recognition backends:
//! - HTTP OCR service (recommended)
//! - Sidecar JSON files next to the image (offline)

pub mod annotate;
pub mod models;
pub mod ocr;
pub mod orientation;

pub use annotate::{AnnotatedImage, AnnotationStyle, Annotator};
pub use models::{AssetManager, AssetType};
pub use ocr::{HttpRecognizer, SidecarRecognizer, TextRecognizer};
pub use orientation::load_upright;

use serde::{Deserialize, Serialize};

/// Message shown when nothing usable came back from recognition
pub const NO_TEXT_MESSAGE: &str = "Failed to recognize text.";

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Remote OCR service reached over HTTP
    #[default]
    Http,
    /// `<image>.ocr.json` files produced ahead of time
    Sidecar,
}

/// Axis-aligned rectangle in upright-image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// One recognized span of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub bounds: Option<BoundingBox>,
}

/// Output of a recognizer: whole-document text plus blocks in reading order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
}

impl RecognitionResult {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.blocks.iter().all(|b| b.text.trim().is_empty())
    }

    /// Number of blocks that carry a bounding box
    pub fn located_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.bounds.is_some()).count()
    }
}

/// What a recognition step produced, kept distinct for the caller
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Recognized(RecognitionResult),
    NoText,
    Failed(String),
}

impl RecognitionOutcome {
    pub fn from_result(result: RecognitionResult) -> Self {
        if result.is_empty() {
            RecognitionOutcome::NoText
        } else {
            RecognitionOutcome::Recognized(result)
        }
    }

    pub fn result(&self) -> Option<&RecognitionResult> {
        match self {
            RecognitionOutcome::Recognized(result) => Some(result),
            _ => None,
        }
    }

    /// Text shown to the user. "No text" and failure look the same.
    pub fn display_text(&self) -> &str {
        match self {
            RecognitionOutcome::Recognized(result) => &result.text,
            RecognitionOutcome::NoText | RecognitionOutcome::Failed(_) => NO_TEXT_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_result_json_schema() {
        let json = r#"{
            "text": "안녕\n세상",
            "blocks": [
                { "text": "안녕", "bounds": { "left": 10, "top": 10, "right": 100, "bottom": 40 } },
                { "text": "세상", "bounds": null },
                { "text": "!" }
            ]
        }"#;
        let result: RecognitionResult = serde_json::from_str(json).unwrap();

        assert_eq!(result.blocks.len(), 3);
        assert_eq!(result.located_blocks(), 1);
        assert_eq!(result.blocks[0].bounds, Some(BoundingBox::new(10, 10, 100, 40)));
        assert_eq!(result.blocks[0].bounds.unwrap().width(), 90);
        assert_eq!(result.blocks[0].bounds.unwrap().height(), 30);
    }

    #[test]
    fn test_extreme_bounds_saturate() {
        let full = BoundingBox::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(full.width(), i32::MAX);
        assert_eq!(full.height(), i32::MAX);

        let inverted = BoundingBox::new(i32::MAX, 0, i32::MIN, 10);
        assert_eq!(inverted.width(), i32::MIN);
    }

    #[test]
    fn test_outcome_display_collapses_failure_and_empty() {
        let empty = RecognitionOutcome::from_result(RecognitionResult::default());
        assert_eq!(empty, RecognitionOutcome::NoText);
        assert_eq!(empty.display_text(), NO_TEXT_MESSAGE);

        let failed = RecognitionOutcome::Failed("timeout".to_string());
        assert_eq!(failed.display_text(), empty.display_text());
        assert!(failed.result().is_none());
    }

    #[test]
    fn test_outcome_display_recognized_text() {
        let outcome = RecognitionOutcome::from_result(RecognitionResult {
            text: "안녕".to_string(),
            blocks: vec![],
        });
        assert_eq!(outcome.display_text(), "안녕");
    }
}
