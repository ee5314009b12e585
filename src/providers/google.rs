use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest};

/// Default endpoint of the public web translation API
pub const DEFAULT_GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com";

/// Google Translate client for the keyless `gtx` web endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslate {
    /// Base URL of the API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
}

impl GoogleTranslate {
    /// Create a new client against `base_url`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into();
        let base_url = if base_url.is_empty() {
            DEFAULT_GOOGLE_ENDPOINT.to_string()
        } else {
            base_url.trim_end_matches('/').to_string()
        };

        Self {
            base_url,
            client: Client::builder()
                .timeout(timeout)
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
        }
    }

    fn single_url(&self) -> String {
        format!("{}/translate_a/single", self.base_url)
    }
}

/// Extract the translated text from a `translate_a/single` response
///
/// The response is a nested array whose first element lists sentence
/// pairs `[translated, original, ...]`; the translation is their concatenation.
pub fn parse_gtx_response(value: &Value) -> Result<String, ProviderError> {
    let sentences = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::ParseError("missing sentence array".to_string()))?;

    let mut translated = String::new();
    for sentence in sentences {
        if let Some(part) = sentence.get(0).and_then(Value::as_str) {
            translated.push_str(part);
        }
    }

    if translated.is_empty() {
        return Err(ProviderError::ParseError("response held no translated text".to_string()));
    }
    Ok(translated)
}

#[async_trait]
impl Provider for GoogleTranslate {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(self.single_url())
            .query(&[
                ("client", "gtx"),
                ("sl", request.source_language.as_str()),
                ("tl", request.target_language.as_str()),
                ("dt", "t"),
                ("q", request.text.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimitExceeded(message));
            }
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        let translated = parse_gtx_response(&body)?;
        debug!("google: {} chars -> {} chars", request.text.len(), translated.len());
        Ok(translated)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let probe = TranslationRequest::new("hello", "en", "fr");
        self.translate(&probe).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "google"
    }
}
