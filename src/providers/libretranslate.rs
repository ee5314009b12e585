use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest};

/// LibreTranslate API client
#[derive(Debug, Clone)]
pub struct LibreTranslate {
    /// Base URL of the LibreTranslate server
    base_url: String,
    /// Optional API key
    api_key: Option<String>,
    /// HTTP client for making requests
    client: Client,
}

/// Body of `POST /translate`
#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

/// Successful response of `POST /translate`
#[derive(Debug, Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Error body returned alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct LibreErrorBody {
    error: String,
}

impl LibreTranslate {
    /// Create a new client
    pub fn new(base_url: impl Into<String>, api_key: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: if api_key.is_empty() { None } else { Some(api_key.to_string()) },
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let body = LibreRequest {
            q: &request.text,
            source: &request.source_language,
            target: &request.target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<LibreErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimitExceeded(message),
                code => ProviderError::ApiError { status_code: code, message },
            });
        }

        let parsed: LibreResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(parsed.translated_text)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let response = self
            .client
            .get(format!("{}/languages", self.base_url))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: response.status().as_u16(),
                message: "language listing failed".to_string(),
            })
        }
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}
