//! Asset management for annotation
//!
//! Handles downloading, caching, and verifying the label font.

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable that disables all downloads
pub const OFFLINE_ENV: &str = "PHOTO_TRANSLATE_OFFLINE";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Offline mode: cannot download {name}. Download it from {url} and place it at {path:?}")]
    Offline { name: &'static str, url: &'static str, path: PathBuf },
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Download failed with status {status}: {url}")]
    Status { status: reqwest::StatusCode, url: &'static str },
    #[error("Asset I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("Checksum mismatch for {filename}: expected {expected}, got {actual}")]
    Checksum { filename: &'static str, expected: &'static str, actual: String },
    #[error("Downloaded {0} failed size verification")]
    Verification(&'static str),
}

/// Downloadable assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    /// CJK font used to render block labels
    LabelFont,
}

impl AssetType {
    /// Get the filename for this asset
    pub fn filename(&self) -> &'static str {
        match self {
            AssetType::LabelFont => "NotoSansCJKkr-Regular.otf",
        }
    }

    /// Get the download URL for this asset
    pub fn download_url(&self) -> &'static str {
        match self {
            AssetType::LabelFont => {
                "https://github.com/notofonts/noto-cjk/raw/main/Sans/OTF/Korean/NotoSansCJKkr-Regular.otf"
            }
        }
    }

    /// Expected file size for integrity check (approximate, in bytes)
    pub fn expected_size_range(&self) -> (u64, u64) {
        match self {
            AssetType::LabelFont => (10_000_000, 25_000_000), // ~16 MB
        }
    }

    /// Expected SHA256 checksum, None skips verification
    pub fn expected_sha256(&self) -> Option<&'static str> {
        match self {
            AssetType::LabelFont => None,
        }
    }

    /// Display name for progress reporting
    pub fn display_name(&self) -> &'static str {
        match self {
            AssetType::LabelFont => "Label Font",
        }
    }
}

/// Manifest tracking downloaded assets
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetManifest {
    pub version: String,
    pub assets: Vec<AssetInfo>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetInfo {
    pub asset_type: String,
    pub filename: String,
    pub size_bytes: u64,
    pub sha256: Option<String>,
    pub downloaded_at: String,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            assets: Vec::new(),
        }
    }
}

/// Asset manager for downloading and caching files under the data directory
pub struct AssetManager {
    assets_dir: PathBuf,
}

impl AssetManager {
    /// Create an asset manager rooted at `assets_dir`
    pub fn with_dir(assets_dir: PathBuf) -> Result<Self, AssetError> {
        std::fs::create_dir_all(&assets_dir)?;
        Ok(Self { assets_dir })
    }

    /// Get the path to a specific asset file
    pub fn asset_path(&self, asset: AssetType) -> PathBuf {
        self.assets_dir.join(asset.filename())
    }

    /// Check if an asset is already downloaded and plausibly complete
    pub fn is_available(&self, asset: AssetType) -> bool {
        match std::fs::metadata(self.asset_path(asset)) {
            Ok(metadata) => {
                let (min, max) = asset.expected_size_range();
                (min..=max).contains(&metadata.len())
            }
            Err(_) => false,
        }
    }

    /// Download an asset if not already available. Returns its path.
    pub async fn ensure(&self, asset: AssetType) -> Result<PathBuf, AssetError> {
        let path = self.asset_path(asset);

        if self.is_available(asset) {
            debug!("{} already available at {:?}", asset.display_name(), path);
            return Ok(path);
        }

        let url = asset.download_url();
        if std::env::var(OFFLINE_ENV).is_ok() {
            return Err(AssetError::Offline { name: asset.display_name(), url, path });
        }

        info!("Downloading {} from {}", asset.display_name(), url);
        let hash = self.download(url, &path, asset).await?;

        if !self.is_available(asset) {
            return Err(AssetError::Verification(asset.filename()));
        }

        self.record_download(asset, hash)?;
        info!("Successfully downloaded {}", asset.display_name());
        Ok(path)
    }

    /// Stream the file to a temp path, verify, then move into place.
    /// Returns the SHA-256 of the downloaded bytes.
    async fn download(&self, url: &'static str, path: &Path, asset: AssetType) -> Result<String, AssetError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()?;

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(AssetError::Status { status: response.status(), url });
        }

        let total_size = response.content_length();
        debug!("Download size: {:?} bytes", total_size);

        let temp_path = path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
        }
        file.flush()?;
        drop(file);
        debug!("{}: {} / {:?} bytes", asset.display_name(), downloaded, total_size);

        let hash = format!("{:x}", hasher.finalize());
        if let Some(expected) = asset.expected_sha256() {
            if hash != expected {
                std::fs::remove_file(&temp_path).ok();
                return Err(AssetError::Checksum {
                    filename: asset.filename(),
                    expected,
                    actual: hash,
                });
            }
        }

        std::fs::rename(&temp_path, path)?;
        Ok(hash)
    }

    fn record_download(&self, asset: AssetType, sha256: String) -> Result<(), AssetError> {
        let mut manifest = self.load_manifest()?;
        let metadata = std::fs::metadata(self.asset_path(asset))?;

        let info = AssetInfo {
            asset_type: format!("{:?}", asset),
            filename: asset.filename().to_string(),
            size_bytes: metadata.len(),
            sha256: Some(sha256),
            downloaded_at: chrono::Utc::now().to_rfc3339(),
        };

        if let Some(existing) = manifest.assets.iter_mut().find(|a| a.filename == info.filename) {
            *existing = info;
        } else {
            manifest.assets.push(info);
        }

        self.save_manifest(&manifest)
    }

    /// Load the asset manifest
    pub fn load_manifest(&self) -> Result<AssetManifest, AssetError> {
        let manifest_path = self.assets_dir.join("manifest.json");
        if manifest_path.exists() {
            let content = std::fs::read_to_string(&manifest_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(AssetManifest::default())
        }
    }

    /// Save the asset manifest
    pub fn save_manifest(&self, manifest: &AssetManifest) -> Result<(), AssetError> {
        let content = serde_json::to_string_pretty(manifest)?;
        std::fs::write(self.assets_dir.join("manifest.json"), content)?;
        Ok(())
    }
}
