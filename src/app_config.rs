use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO), or "auto"
    pub source_language: String,

    /// Target language code (ISO)
    pub target_language: String,

    /// Translation config
    pub translation: TranslationConfig,

    /// Translation cache config
    #[serde(default)]
    pub cache: CacheConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation backend type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    // @backend: public Google web endpoint
    #[default]
    Google,
    // @backend: LibreTranslate server
    LibreTranslate,
    // @backend: dry run, returns the text unchanged
    Identity,
}

impl BackendKind {
    // @returns: Capitalized backend name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Google => "Google Translate",
            Self::LibreTranslate => "LibreTranslate",
            Self::Identity => "Identity (dry run)",
        }
    }

    // @returns: Lowercase backend identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Google => "google".to_string(),
            Self::LibreTranslate => "libretranslate".to_string(),
            Self::Identity => "identity".to_string(),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "libretranslate" | "libre" => Ok(Self::LibreTranslate),
            "identity" | "none" => Ok(Self::Identity),
            _ => Err(anyhow!("Invalid backend type: {}", s)),
        }
    }
}

/// How translation requests are scheduled within one document
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// Counting semaphore with FIFO wake-up
    #[default]
    Limiter,
    /// Fixed set of workers fed round-robin
    WorkerPool,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Backend to use
    #[serde(default)]
    pub backend: BackendKind,

    /// Service endpoint URL, empty for the backend default
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// API key, if the backend needs one
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Timeout of a single backend call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts before a unit degrades to its original text
    #[serde(default)]
    pub retry_count: u32,

    /// Backoff between attempts in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Scheduling strategy
    #[serde(default)]
    pub dispatch: DispatchStrategy,

    /// Limiter capacity
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Upper bound of the worker pool size
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Split text into sentences so each one is cached on its own
    #[serde(default = "default_true")]
    pub split_sentences: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            endpoint: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            dispatch: DispatchStrategy::default(),
            max_concurrent_requests: default_max_concurrent_requests(),
            worker_count: default_worker_count(),
            split_sentences: true,
        }
    }
}

impl TranslationConfig {
    /// Get the endpoint for the active backend
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.is_empty() {
            return self.endpoint.clone();
        }

        match self.backend {
            BackendKind::Google => crate::providers::google::DEFAULT_GOOGLE_ENDPOINT.to_string(),
            BackendKind::LibreTranslate | BackendKind::Identity => String::new(),
        }
    }

    /// Per-call timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Worker pool size: the configured ceiling bounded by available parallelism
    pub fn effective_worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.worker_count.min(cores).max(1)
    }

    /// Maximum number of simultaneous backend calls for the chosen strategy
    pub fn concurrency_limit(&self) -> usize {
        match self.dispatch {
            DispatchStrategy::Limiter => self.max_concurrent_requests.max(1),
            DispatchStrategy::WorkerPool => self.effective_worker_count(),
        }
    }
}

/// Where translations are cached
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// SQLite file, shared across runs
    #[default]
    Sqlite,
    /// Process memory only
    Memory,
}

/// Translation cache configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CacheConfig {
    /// Whether the cache is consulted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Storage backend
    #[serde(default)]
    pub backend: CacheBackend,

    /// Database path, default location when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            path: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_max_concurrent_requests() -> usize {
    5
}

fn default_worker_count() -> usize {
    4
}

fn default_true() -> bool {
    true
}

/// Source language value that lets the backend detect the language
pub const AUTO_LANGUAGE: &str = "auto";

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language != AUTO_LANGUAGE {
            crate::language_utils::validate_language_code(&self.source_language)
                .context("Invalid source language")?;
        }
        if self.target_language == AUTO_LANGUAGE {
            return Err(anyhow!("Target language cannot be 'auto'"));
        }
        crate::language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        let translation = &self.translation;
        if translation.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than zero"));
        }
        if translation.max_concurrent_requests == 0 {
            return Err(anyhow!("max_concurrent_requests must be greater than zero"));
        }
        if translation.worker_count == 0 {
            return Err(anyhow!("worker_count must be greater than zero"));
        }
        if translation.backend == BackendKind::LibreTranslate && translation.endpoint.is_empty() {
            return Err(anyhow!("An endpoint is required for the LibreTranslate backend"));
        }
        if !translation.endpoint.is_empty() {
            url::Url::parse(&translation.endpoint)
                .with_context(|| format!("Invalid endpoint URL '{}'", translation.endpoint))?;
        }

        Ok(())
    }

    /// Load the configuration at `path`, writing a default one if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: AUTO_LANGUAGE.to_string(),
            target_language: "es".to_string(),
            translation: TranslationConfig::default(),
            cache: CacheConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
