//! Image upload
//!
//! The uploaded copy's URL is what the history records point at.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info};

use super::ActivityLog;
use crate::capture::ImageResource;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Image has no file name: {0}")]
    NoFileName(String),
    #[error("Upload I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Upload task was not successful: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload the image and return a URL for the stored copy
    async fn upload(&self, resource: &ImageResource) -> Result<String, UploadError>;
}

/// `<uuid>-<name>` for a stored copy
fn stored_name(name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4().simple(), name)
}

/// Uploader that stores copies under `<root>/images/`
pub struct LocalUploader {
    images_dir: PathBuf,
    activity: Option<ActivityLog>,
}

impl LocalUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: root.into().join("images"),
            activity: None,
        }
    }

    /// Record an `image_upload` activity after each successful upload
    pub fn with_activity_log(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    async fn store(&self, resource: &ImageResource) -> Result<String, UploadError> {
        let name = resource
            .last_path_segment()
            .ok_or_else(|| UploadError::NoFileName(resource.uri()))?;

        // Every upload gets its own copy, so a source inside the images
        // directory is never its own target and older URLs stay valid
        tokio::fs::create_dir_all(&self.images_dir).await?;
        let target = self.images_dir.join(stored_name(&name));
        tokio::fs::copy(resource.path(), &target).await?;

        let absolute = tokio::fs::canonicalize(&target).await?;
        let url = reqwest::Url::from_file_path(&absolute)
            .map_err(|_| UploadError::Rejected(format!("not an absolute path: {:?}", absolute)))?;
        Ok(url.to_string())
    }
}

#[async_trait]
impl ImageUploader for LocalUploader {
    async fn upload(&self, resource: &ImageResource) -> Result<String, UploadError> {
        match self.store(resource).await {
            Ok(url) => {
                info!("Image uploaded: {}", url);
                if let Some(activity) = &self.activity {
                    activity
                        .record_user_activity("image_upload", format!("Image uploaded: {}", url))
                        .await;
                }
                Ok(url)
            }
            Err(e) => {
                error!("Image upload failed for {}: {}", resource.uri(), e);
                Err(e)
            }
        }
    }
}
