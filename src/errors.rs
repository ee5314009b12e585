/*!
 * Error types for the hbs-translate library.
 *
 * Backend and cache errors are recovered inside the translation gateway and
 * never reach the caller of a document translation. Pipeline errors are the
 * only failures a caller observes, each with a reason category.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when calling a translation backend
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The backend did not answer within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Timeout(Duration::ZERO);
        }
        if error.is_connect() {
            return Self::ConnectionError(error.to_string());
        }
        match error.status() {
            Some(status) if status.as_u16() == 429 => Self::RateLimitExceeded(error.to_string()),
            Some(status) => Self::ApiError {
                status_code: status.as_u16(),
                message: error.to_string(),
            },
            None => Self::RequestFailed(error.to_string()),
        }
    }
}

/// Errors raised by a translation cache store
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store could not be reached; callers treat this as a miss
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The store was reachable but the read or write failed
    #[error("Cache storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for CacheError {
    fn from(error: anyhow::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Document-level failures surfaced by the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The document could not be segmented
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// The translated document could not be persisted
    #[error("Failed to write output to {path}: {message}")]
    DestinationWrite {
        /// Destination path
        path: String,
        /// Underlying I/O error message
        message: String,
    },

    /// An invariant was broken while processing the document
    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Reason category reported to callers
    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::DestinationWrite { .. } => "destination_write",
            Self::Internal(_) => "internal",
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the cache store
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error from the translation pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
