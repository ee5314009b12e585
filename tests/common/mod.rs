/*!
 * Common test utilities for the hbs-translate test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use hbs_translate::app_config::DispatchStrategy;
use hbs_translate::providers::mock::MockProvider;
use hbs_translate::translation::{CacheStore, GatewayOptions, MemoryCache, PipelineConfig, TranslationPipeline};

/// A transactional email with every kind of segment
pub const EMAIL_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>
    p { color: #333; font-family: Arial; }
  </style>
</head>
<body>
  <!-- greeting -->
  <h1>Hello {{user.firstName}}!</h1>
  <p>Your order {{order.id}} has shipped.</p>
  <img src="https://example.com/logo.png" alt="Company logo">
  {{#if coupon}}<p>Use code {{coupon.code}} for a discount.</p>{{/if}}
  <p>{{{footerHtml}}}</p>
  <p>&nbsp;</p>
  <a href="https://example.com/track">https://example.com/track</a>
  <p>Thank you for shopping with us.</p>
</body>
</html>
"#;

/// Route library logs to the test output, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Gateway options that keep failing tests fast
pub fn fast_options() -> GatewayOptions {
    GatewayOptions {
        timeout: Duration::from_secs(5),
        retry_count: 1,
        retry_backoff: Duration::from_millis(1),
        split_sentences: true,
    }
}

/// Pipeline from English to French over the given mock and cache
pub fn pipeline_with(
    provider: &MockProvider,
    cache: Option<Arc<dyn CacheStore>>,
    strategy: DispatchStrategy,
    concurrency: usize,
) -> TranslationPipeline {
    TranslationPipeline::with_backend(
        Arc::new(provider.clone()),
        cache,
        fast_options(),
        PipelineConfig::new("en", "fr").with_dispatch(strategy, concurrency),
    )
}

/// Pipeline with a fresh memory cache and the default limiter
pub fn memory_pipeline(provider: &MockProvider) -> TranslationPipeline {
    pipeline_with(
        provider,
        Some(Arc::new(MemoryCache::new())),
        DispatchStrategy::Limiter,
        5,
    )
}

/// Both scheduling strategies
pub fn strategies() -> [DispatchStrategy; 2] {
    [DispatchStrategy::Limiter, DispatchStrategy::WorkerPool]
}
