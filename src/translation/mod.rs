//! Translation Layer
//!
//! Translates recognized text from the fixed source language into the
//! selected target. Each language pair gets one translator for the process
//! lifetime, so a model prepared once is reused by later calls.

pub mod http;
pub mod languages;

pub use http::HttpTranslator;
pub use languages::{LanguageCode, LanguagePair};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TranslationError {
    #[error("Unsupported language code: {0}")]
    UnsupportedLanguage(String),
    #[error("No model available for {0}")]
    ModelUnavailable(String),
    #[error("Translation request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Translation service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("Translation service error: {0}")]
    Service(String),
}

/// A translator bound to one language pair
#[async_trait]
pub trait Translator: Send + Sync {
    fn pair(&self) -> &LanguagePair;

    /// Make the pair's model usable. Cheap once it has succeeded.
    async fn download_model_if_needed(&self) -> Result<(), TranslationError>;

    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

/// What a translation step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated(String),
    /// Nothing to translate, or the service returned nothing
    NoContent,
    Failed(String),
}

impl TranslationOutcome {
    /// Translated text if there is any
    pub fn text(&self) -> Option<&str> {
        match self {
            TranslationOutcome::Translated(text) => Some(text),
            _ => None,
        }
    }

    /// Text shown to the user; empty for anything but a translation
    pub fn display_text(&self) -> &str {
        self.text().unwrap_or("")
    }
}

/// Builds a translator for a language pair
pub type TranslatorFactory = Box<dyn Fn(&LanguagePair) -> Arc<dyn Translator> + Send + Sync>;

/// One translator instance per language pair
pub struct TranslatorRegistry {
    factory: TranslatorFactory,
    translators: Mutex<HashMap<LanguagePair, Arc<dyn Translator>>>,
}

impl TranslatorRegistry {
    pub fn new(factory: TranslatorFactory) -> Self {
        Self {
            factory,
            translators: Mutex::new(HashMap::new()),
        }
    }

    /// Get the translator for `pair`, creating it on first use
    pub fn get(&self, pair: &LanguagePair) -> Arc<dyn Translator> {
        let mut translators = self.translators.lock();
        translators
            .entry(pair.clone())
            .or_insert_with(|| {
                debug!("Creating translator for {}", pair);
                (self.factory)(pair)
            })
            .clone()
    }

    /// Number of translators created so far
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.translators.lock().len()
    }
}

/// Translation entry point used by the pipeline. Never returns an error.
pub struct TranslationService {
    source: LanguageCode,
    registry: TranslatorRegistry,
}

impl TranslationService {
    pub fn new(source: LanguageCode, registry: TranslatorRegistry) -> Self {
        Self { source, registry }
    }

    pub fn source(&self) -> &LanguageCode {
        &self.source
    }

    pub async fn translate(&self, text: &str, target: &LanguageCode) -> TranslationOutcome {
        if text.trim().is_empty() {
            debug!("Nothing to translate");
            return TranslationOutcome::NoContent;
        }

        let pair = LanguagePair::new(self.source.clone(), target.clone());
        if pair.is_identity() {
            return TranslationOutcome::Translated(text.to_string());
        }

        let translator = self.registry.get(&pair);
        let result = async {
            translator.download_model_if_needed().await?;
            translator.translate(text).await
        }
        .await;

        match result {
            Ok(translated) if translated.trim().is_empty() => {
                warn!("Translation for {} came back empty", pair);
                TranslationOutcome::NoContent
            }
            Ok(translated) => {
                info!("Translated {} chars ({})", text.chars().count(), pair);
                TranslationOutcome::Translated(translated)
            }
            Err(e) => {
                warn!("Translation failed ({}): {}", pair, e);
                TranslationOutcome::Failed(e.to_string())
            }
        }
    }
}
