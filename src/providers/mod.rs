/*!
 * Backend implementations for different translation services.
 *
 * This module contains client implementations for the supported backends:
 * - Google: the public `gtx` web endpoint
 * - LibreTranslate: self-hosted or hosted LibreTranslate API
 * - Mock: deterministic in-process backend used for dry runs and tests
 */

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::{BackendKind, TranslationConfig};
use crate::errors::ProviderError;

/// A single unit of text to translate between two languages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// The text to translate
    pub text: String,
    /// Source language code, or "auto"
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

impl TranslationRequest {
    /// Create a new request
    pub fn new(text: impl Into<String>, source_language: &str, target_language: &str) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Common trait for all translation backends
///
/// This trait defines the interface that all backend implementations must follow,
/// allowing them to be used interchangeably behind an `Arc<dyn Provider>`.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate the request text
    ///
    /// # Arguments
    /// * `request` - The text and language pair
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;

    /// Test the connection to the backend
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Build the backend selected by the configuration
pub fn create_provider(config: &TranslationConfig) -> Arc<dyn Provider> {
    match config.backend {
        BackendKind::Google => Arc::new(google::GoogleTranslate::new(
            config.get_endpoint(),
            config.timeout(),
        )),
        BackendKind::LibreTranslate => Arc::new(libretranslate::LibreTranslate::new(
            config.get_endpoint(),
            &config.api_key,
            config.timeout(),
        )),
        BackendKind::Identity => Arc::new(mock::MockProvider::identity()),
    }
}

pub mod google;
pub mod libretranslate;
pub mod mock;
