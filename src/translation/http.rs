//! LibreTranslate-compatible HTTP translator

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{LanguagePair, TranslationError, Translator};

#[derive(Debug, Deserialize)]
struct LanguageInfo {
    code: String,
    #[serde(default)]
    targets: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText", default)]
    translated_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Does the service's language list cover `pair`?
fn supports_pair(languages: &[LanguageInfo], pair: &LanguagePair) -> bool {
    languages
        .iter()
        .find(|lang| lang.code == pair.source.as_str())
        .map(|lang| lang.targets.is_empty() || lang.targets.iter().any(|t| t == pair.target.as_str()))
        .unwrap_or(false)
}

/// Translator for one pair against a LibreTranslate-style endpoint
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    pair: LanguagePair,
    model_ready: OnceCell<()>,
}

impl HttpTranslator {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, pair: LanguagePair) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
            pair,
            model_ready: OnceCell::new(),
        }
    }

    async fn check_languages(&self) -> Result<(), TranslationError> {
        let url = format!("{}/languages", self.endpoint);
        debug!("Checking model availability for {} at {}", self.pair, url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TranslationError::Status(response.status()));
        }
        let languages: Vec<LanguageInfo> = response.json().await?;

        if supports_pair(&languages, &self.pair) {
            info!("Translation model ready for {}", self.pair);
            Ok(())
        } else {
            Err(TranslationError::ModelUnavailable(self.pair.to_string()))
        }
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    async fn download_model_if_needed(&self) -> Result<(), TranslationError> {
        self.model_ready
            .get_or_try_init(|| self.check_languages())
            .await
            .map(|_| ())
    }

    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let request = TranslateRequest {
            q: text,
            source: self.pair.source.as_str(),
            target: self.pair.target.as_str(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/translate", self.endpoint))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: TranslateResponse = response.json().await?;
        if let Some(error) = body.error {
            return Err(TranslationError::Service(error));
        }
        if !status.is_success() {
            return Err(TranslationError::Status(status));
        }
        Ok(body.translated_text.unwrap_or_default())
    }
}
