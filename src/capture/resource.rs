//! Image resource references returned by a picker

use std::path::{Path, PathBuf};
use std::time::Instant;

/// A reference to an image the user selected
///
/// The app only holds the reference for one processing pass; the pixels
/// are read on demand by the normalizer and the uploader.
#[derive(Debug, Clone)]
pub struct ImageResource {
    /// Location of the image file
    path: PathBuf,
    /// When the picker returned the resource
    pub picked_at: Instant,
}

impl ImageResource {
    /// Create a new resource reference
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            picked_at: Instant::now(),
        }
    }

    /// Filesystem location of the image
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URI form of the reference, used in log messages
    pub fn uri(&self) -> String {
        format!("file://{}", self.path.display())
    }

    /// Final path segment, used to name the uploaded copy
    pub fn last_path_segment(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}
