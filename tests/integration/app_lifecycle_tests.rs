/*!
 * Integration tests for file and folder processing
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use hbs_translate::app_config::{BackendKind, CacheBackend, Config};
use hbs_translate::app_controller::{Controller, FileOutcome, FolderSummary};
use hbs_translate::providers::mock::MockProvider;
use hbs_translate::translation::{CacheStore, PipelineConfig, SqliteCache, TranslationPipeline};

use crate::common;

fn working_controller() -> (Controller, MockProvider) {
    let provider = MockProvider::working();
    let controller = Controller::with_pipeline(Config::default(), common::memory_pipeline(&provider));
    (controller, provider)
}

/// Test the controller with a configuration that needs no network
#[test]
fn test_controller_withIdentityConfig_shouldInitialize() -> Result<()> {
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "deu".to_string();
    config.translation.backend = BackendKind::Identity;
    config.cache.backend = CacheBackend::Memory;

    let controller = Controller::with_config(config)?;

    assert_eq!(controller.pipeline().config().target_language, "de");
    assert_eq!(controller.pipeline().gateway().provider_name(), "mock");
    Ok(())
}

#[test]
fn test_controller_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.target_language = "auto".to_string();

    assert!(Controller::with_config(config).is_err());
}

/// Test translating one file next to its input
#[tokio::test]
async fn test_run_withSingleFile_shouldWriteTranslatedSibling() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "welcome.handlebars", "<h1>Welcome {{name}}</h1>")?;
    let (controller, _) = working_controller();

    let outcome = controller.run(input.clone(), None, false).await?;

    let FileOutcome::Translated { output, report } = outcome else {
        panic!("expected a translated file");
    };
    assert_eq!(output, dir.path().join("welcome.translated.handlebars"));
    assert_eq!(fs::read_to_string(&output)?, "<h1>[fr] Welcome {{name}}</h1>");
    assert_eq!(report.submitted_units, 1);
    // The input is never modified
    assert_eq!(fs::read_to_string(&input)?, "<h1>Welcome {{name}}</h1>");
    Ok(())
}

/// Test that existing outputs are kept unless forced
#[tokio::test]
async fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let input = common::create_test_file(dir.path(), "page.html", "<p>Hi there</p>")?;
    let existing = common::create_test_file(dir.path(), "page.translated.html", "old")?;
    let (controller, provider) = working_controller();

    let outcome = controller.run(input.clone(), None, false).await?;
    assert!(matches!(outcome, FileOutcome::Skipped { .. }));
    assert_eq!(fs::read_to_string(&existing)?, "old");
    assert_eq!(provider.request_count(), 0);

    controller.run(input, None, true).await?;
    assert_eq!(fs::read_to_string(&existing)?, "<p>[fr] Hi there</p>");
    Ok(())
}

#[test]
fn test_run_withMissingInput_shouldFail() {
    let result = tokio_test::block_on(async {
        let (controller, _) = working_controller();
        controller.run("/no/such/file.hbs".into(), None, false).await
    });

    assert!(result.is_err());
}

/// Test folder processing into a mirrored output tree
#[tokio::test]
async fn test_runFolder_withOutputDir_shouldMirrorTree() -> Result<()> {
    let input_dir = common::create_temp_dir()?;
    let output_dir = common::create_temp_dir()?;
    common::create_test_file(input_dir.path(), "index.html", "<p>Home</p>")?;
    common::create_test_file(input_dir.path(), "emails/receipt.hbs", "<p>Receipt {{id}}</p>")?;
    common::create_test_file(input_dir.path(), "emails/notes.txt", "not a template")?;

    let (controller, _) = working_controller();
    let summary = controller
        .run_folder(input_dir.path().to_path_buf(), Some(output_dir.path().to_path_buf()), false)
        .await?;

    assert_eq!(
        summary,
        FolderSummary {
            translated: 2,
            skipped: 0,
            failed: 0
        }
    );
    assert_eq!(
        fs::read_to_string(output_dir.path().join("index.translated.html"))?,
        "<p>[fr] Home</p>"
    );
    assert_eq!(
        fs::read_to_string(output_dir.path().join("emails/receipt.translated.hbs"))?,
        "<p>[fr] Receipt {{id}}</p>"
    );
    Ok(())
}

/// Test that one malformed file does not stop the folder run
#[tokio::test]
async fn test_runFolder_withMalformedFile_shouldCountFailureAndContinue() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "a.html", "<p>Fine</p>")?;
    common::create_test_file(dir.path(), "b.html", "<p>Broken {{name</p>")?;

    let (controller, _) = working_controller();
    let summary = controller.run_folder(dir.path().to_path_buf(), None, false).await?;

    assert_eq!(summary.translated, 1);
    assert_eq!(summary.failed, 1);
    assert!(dir.path().join("a.translated.html").exists());
    assert!(!dir.path().join("b.translated.html").exists());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withNoTemplates_shouldFail() -> Result<()> {
    let dir = common::create_temp_dir()?;
    common::create_test_file(dir.path(), "readme.md", "# hi")?;
    let (controller, _) = working_controller();

    assert!(controller.run_folder(dir.path().to_path_buf(), None, false).await.is_err());
    Ok(())
}

/// Test the persistent cache maintenance commands
#[tokio::test]
async fn test_cacheCommands_withSqliteFile_shouldReportAndClear() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "fr".to_string();
    let path = dir.path().join("cache.db");
    config.cache.path = Some(path.clone());

    let cache: Arc<dyn CacheStore> = Arc::new(SqliteCache::new(Some(path)));
    let pipeline = TranslationPipeline::with_backend(
        Arc::new(MockProvider::working()),
        Some(cache),
        common::fast_options(),
        PipelineConfig::new("en", "fr"),
    );
    let controller = Controller::with_pipeline(config.clone(), pipeline);
    let input = common::create_test_file(dir.path(), "a.html", "<p>Hello</p><p>World</p>")?;
    controller.run(input, None, false).await?;

    let stats = Controller::cache_stats(&config.cache).await?;
    assert_eq!(stats.total_entries, 2);

    let removed = Controller::clear_cache(&config.cache).await?;
    assert_eq!(removed, 2);
    assert_eq!(Controller::cache_stats(&config.cache).await?.total_entries, 0);
    Ok(())
}

/// Test that a dry run leaves the persistent cache empty
#[tokio::test]
async fn test_run_withIdentityBackend_shouldNotFillCache() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut config = Config::default();
    config.source_language = "en".to_string();
    config.target_language = "fr".to_string();
    config.translation.backend = BackendKind::Identity;
    config.cache.path = Some(dir.path().join("cache.db"));

    let controller = Controller::with_config(config.clone())?;
    let input = common::create_test_file(dir.path(), "a.html", "<p>Hello</p><p>World</p>")?;
    controller.run(input, None, false).await?;

    assert_eq!(Controller::cache_stats(&config.cache).await?.total_entries, 0);
    Ok(())
}
