//! Image Acquisition Layer
//!
//! The picker is an external collaborator: it hands back a reference to an
//! image or nothing when the user cancels. No payload validation happens here.

pub mod resource;

pub use resource::ImageResource;

use std::path::PathBuf;
use tracing::debug;

/// Source of user-selected images
pub trait ImagePicker: Send + Sync {
    /// Ask the user for an image; `None` means the selection was cancelled
    fn pick(&self) -> Option<ImageResource>;
}

/// Picker backed by a path given on the command line
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    path: Option<PathBuf>,
}

impl PathPicker {
    /// Create a picker that yields `path`, or cancels when it is `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ImagePicker for PathPicker {
    fn pick(&self) -> Option<ImageResource> {
        let picked = self.path.clone().map(ImageResource::new);
        debug!("Picker returned {:?}", picked.as_ref().map(|r| r.path().to_path_buf()));
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_picker_cancel() {
        assert!(PathPicker::new(None).pick().is_none());
    }

    #[test]
    fn test_path_picker_returns_resource() {
        let picker = PathPicker::new(Some(PathBuf::from("shot.png")));
        let resource = picker.pick().unwrap();
        assert_eq!(resource.last_path_segment().as_deref(), Some("shot.png"));
    }
}
