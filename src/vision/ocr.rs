//! Text recognition backends
//!
//! Recognizers receive the upright image, so returned rectangles are already
//! in upright-image coordinates.

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::RecognitionResult;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Failed to encode image for recognition: {0}")]
    Encode(#[from] image::ImageError),
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("OCR service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Sidecar file {path:?} unreadable: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed recognition result: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Recognition worker failed: {0}")]
    Worker(String),
}

#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Source language the recognizer is configured for
    fn language(&self) -> &str;

    /// Recognize text in an upright image located at `source`
    async fn recognize(
        &self,
        source: &Path,
        upright: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError>;
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, RecognitionError> {
    let mut png_bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;
    Ok(png_bytes)
}

/// Recognizer that posts the upright PNG to an OCR endpoint
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl TextRecognizer for HttpRecognizer {
    fn language(&self) -> &str {
        &self.language
    }

    async fn recognize(
        &self,
        source: &Path,
        upright: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        let image = upright.clone();
        let body = tokio::task::spawn_blocking(move || encode_png(&image))
            .await
            .map_err(|e| RecognitionError::Worker(e.to_string()))??;

        debug!("Posting {} bytes from {:?} to {}", body.len(), source, self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("lang", self.language.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RecognitionError::Status(response.status()));
        }

        let result: RecognitionResult = response.json().await?;
        info!("Recognized {} text blocks ({} located)", result.blocks.len(), result.located_blocks());
        Ok(result)
    }
}

/// Recognizer that reads `<image file name>.ocr.json` from the image's directory
pub struct SidecarRecognizer {
    language: String,
}

impl SidecarRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into() }
    }

    /// Location of the sidecar file for an image
    pub fn sidecar_path(source: &Path) -> PathBuf {
        let mut name = source.file_name().unwrap_or_default().to_os_string();
        name.push(".ocr.json");
        source.with_file_name(name)
    }
}

#[async_trait]
impl TextRecognizer for SidecarRecognizer {
    fn language(&self) -> &str {
        &self.language
    }

    async fn recognize(
        &self,
        source: &Path,
        _upright: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        let path = Self::sidecar_path(source);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| RecognitionError::Sidecar { path: path.clone(), source })?;
        let result: RecognitionResult = serde_json::from_str(&content)?;
        debug!("Loaded {} blocks from {:?}", result.blocks.len(), path);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{local_client, ScriptedServer};
    use tempfile::tempdir;

    fn recognizer_for(server: &ScriptedServer) -> HttpRecognizer {
        HttpRecognizer {
            client: local_client(),
            endpoint: format!("{}/ocr", server.base_url),
            language: "ko".to_string(),
        }
    }

    #[tokio::test]
    async fn test_http_recognize_posts_png_with_language() {
        let server = ScriptedServer::start(vec![(
            200,
            r#"{"text":"안녕","blocks":[{"text":"안녕","bounds":{"left":1,"top":2,"right":3,"bottom":4}},{"text":"x"}]}"#,
        )])
        .await;
        let recognizer = recognizer_for(&server);

        let result = recognizer
            .recognize(Path::new("menu.jpg"), &DynamicImage::new_rgba8(4, 3))
            .await
            .unwrap();

        assert_eq!(result.text, "안녕");
        assert_eq!(result.located_blocks(), 1);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].request_line().starts_with("POST /ocr?lang=ko "));
        assert_eq!(requests[0].header("content-type"), Some("image/png"));
        assert!(requests[0].body.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_http_recognize_error_status() {
        let server = ScriptedServer::start(vec![(503, "{}")]).await;
        let recognizer = recognizer_for(&server);

        let result = recognizer
            .recognize(Path::new("menu.jpg"), &DynamicImage::new_rgba8(2, 2))
            .await;
        assert!(matches!(
            result,
            Err(RecognitionError::Status(status)) if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_http_recognize_malformed_body() {
        let server = ScriptedServer::start(vec![(200, r#"{"blocks": 7}"#)]).await;
        let recognizer = recognizer_for(&server);

        let result = recognizer
            .recognize(Path::new("menu.jpg"), &DynamicImage::new_rgba8(2, 2))
            .await;
        assert!(matches!(result, Err(RecognitionError::Http(_))));
    }

    #[test]
    fn test_sidecar_path() {
        let path = SidecarRecognizer::sidecar_path(Path::new("/tmp/photos/menu.jpg"));
        assert_eq!(path, PathBuf::from("/tmp/photos/menu.jpg.ocr.json"));
    }

    #[tokio::test]
    async fn test_sidecar_recognize() {
        let dir = tempdir().unwrap();
        let image_path = dir.path().join("sign.png");
        std::fs::write(
            dir.path().join("sign.png.ocr.json"),
            r#"{"text":"안녕","blocks":[{"text":"안녕","bounds":{"left":10,"top":10,"right":100,"bottom":40}}]}"#,
        )
        .unwrap();

        let recognizer = SidecarRecognizer::new("ko");
        let blank = DynamicImage::new_rgba8(1, 1);
        let result = recognizer.recognize(&image_path, &blank).await.unwrap();

        assert_eq!(recognizer.language(), "ko");
        assert_eq!(result.text, "안녕");
        assert_eq!(result.blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_sidecar_missing_is_error() {
        let dir = tempdir().unwrap();
        let recognizer = SidecarRecognizer::new("ko");
        let blank = DynamicImage::new_rgba8(1, 1);

        let result = recognizer.recognize(&dir.path().join("none.png"), &blank).await;
        assert!(matches!(result, Err(RecognitionError::Sidecar { .. })));
    }

    #[tokio::test]
    async fn test_sidecar_malformed_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.png.ocr.json"), "{ nope").unwrap();
        let recognizer = SidecarRecognizer::new("ko");
        let blank = DynamicImage::new_rgba8(1, 1);

        let result = recognizer.recognize(&dir.path().join("x.png"), &blank).await;
        assert!(matches!(result, Err(RecognitionError::Malformed(_))));
    }

    #[test]
    fn test_encode_png_roundtrips_dimensions() {
        let bytes = encode_png(&DynamicImage::new_rgba8(4, 3)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }
}
