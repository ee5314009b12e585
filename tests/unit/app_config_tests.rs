/*!
 * Tests for application configuration functionality
 */

use hbs_translate::app_config::{
    BackendKind, CacheBackend, Config, DispatchStrategy, LogLevel, TranslationConfig,
};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "auto");
    assert_eq!(config.target_language, "es");
    assert_eq!(config.translation.backend, BackendKind::Google);
    assert_eq!(config.translation.dispatch, DispatchStrategy::Limiter);
    assert_eq!(config.translation.max_concurrent_requests, 5);
    assert_eq!(config.translation.timeout_secs, 30);
    assert_eq!(config.translation.retry_count, 0);
    assert!(config.translation.split_sentences);
    assert!(config.cache.enabled);
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Invalid source language
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "en".to_string();
    assert!(config.validate().is_ok());

    // Target language must be concrete
    config.target_language = "auto".to_string();
    assert!(config.validate().is_err());
    config.target_language = "".to_string();
    assert!(config.validate().is_err());
    config.target_language = "fr".to_string();

    // Zero limits are rejected
    config.translation.max_concurrent_requests = 0;
    assert!(config.validate().is_err());
    config.translation.max_concurrent_requests = 5;

    config.translation.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.translation.timeout_secs = 30;

    // LibreTranslate needs an endpoint
    config.translation.backend = BackendKind::LibreTranslate;
    assert!(config.validate().is_err());
    config.translation.endpoint = "http://localhost:5000".to_string();
    assert!(config.validate().is_ok());
}

/// Test that an endpoint must be a parseable URL
#[test]
fn test_config_validation_withMalformedEndpoint_shouldFail() {
    let mut config = Config::default();
    config.translation.backend = BackendKind::LibreTranslate;

    config.translation.endpoint = "not a url".to_string();
    let error = config.validate().unwrap_err();
    assert!(format!("{:#}", error).contains("Invalid endpoint URL"));

    config.translation.endpoint = "https://translate.example.com/translate".to_string();
    assert!(config.validate().is_ok());

    // an endpoint override is checked for every backend
    config.translation.backend = BackendKind::Google;
    config.translation.endpoint = "://missing-scheme".to_string();
    assert!(config.validate().is_err());
}

/// Test the concurrency bound per strategy
#[test]
fn test_concurrencyLimit_withEachStrategy_shouldUseMatchingSetting() {
    let mut translation = TranslationConfig {
        max_concurrent_requests: 7,
        worker_count: 1,
        ..TranslationConfig::default()
    };
    assert_eq!(translation.concurrency_limit(), 7);

    translation.dispatch = DispatchStrategy::WorkerPool;
    assert_eq!(translation.concurrency_limit(), 1);
}

/// Test that a missing config file is created with defaults
#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.target_language, "es");

    let reloaded = Config::load_or_create(&path)?;
    assert_eq!(reloaded.translation.backend, config.translation.backend);
    Ok(())
}

/// Test that partial config files fall back to defaults
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "source_language": "en",
            "target_language": "ja",
            "translation": { "backend": "identity", "dispatch": "worker_pool" }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.backend, BackendKind::Identity);
    assert_eq!(config.translation.dispatch, DispatchStrategy::WorkerPool);
    assert_eq!(config.translation.retry_backoff_ms, 500);
    assert!(config.cache.enabled);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test backend name parsing
#[test]
fn test_backendKind_fromStr_shouldAcceptAliases() {
    assert_eq!("google".parse::<BackendKind>().unwrap(), BackendKind::Google);
    assert_eq!("Libre".parse::<BackendKind>().unwrap(), BackendKind::LibreTranslate);
    assert_eq!("none".parse::<BackendKind>().unwrap(), BackendKind::Identity);
    assert!("deepl".parse::<BackendKind>().is_err());
}
