/*!
 * End-to-end properties of the translation pipeline
 */

use std::sync::Arc;
use std::time::Duration;

use hbs_translate::app_config::DispatchStrategy;
use hbs_translate::providers::mock::MockProvider;
use hbs_translate::translation::{CacheEntry, CacheStore, MemoryCache, PipelineState, SegmentKind};

use crate::common;

/// Test that the identity backend reproduces the document byte for byte
#[tokio::test]
async fn test_translateDocument_withIdentityBackend_shouldRoundTrip() {
    for strategy in common::strategies() {
        let provider = MockProvider::identity();
        let pipeline = common::pipeline_with(&provider, None, strategy, 4);

        let translated = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();

        assert_eq!(translated.content, common::EMAIL_TEMPLATE, "{:?}", strategy);
        assert_eq!(translated.report.final_state(), PipelineState::Done);
    }
}

/// Test that repeated text with different inner whitespace survives a cached identity run
#[tokio::test]
async fn test_translateDocument_withIdentityBackendAndCache_shouldKeepWhitespaceVariants() {
    let document = "<p>Hello\n   world</p><p>Hello world</p>";

    for strategy in common::strategies() {
        let provider = MockProvider::identity();
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let pipeline = common::pipeline_with(&provider, Some(cache), strategy, 1);

        let translated = pipeline.translate_document(document).await.unwrap();

        assert_eq!(translated.content, document, "{:?}", strategy);
    }
}

/// Test that a partial call inside a tag is kept with the tag
#[tokio::test]
async fn test_translateDocument_withPartialInsideTag_shouldTranslateOnlyContent() {
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline
        .translate_document("<div class=\"x\" {{> attrs}}>Hi</div>")
        .await
        .unwrap();

    assert_eq!(translated.content, "<div class=\"x\" {{> attrs}}>[fr] Hi</div>");
    assert_eq!(translated.report.submitted_units, 1);
}

/// Test that markup, style blocks and attributes are never changed
#[tokio::test]
async fn test_translateDocument_withWorkingBackend_shouldPreserveMarkup() {
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();

    for seg in &translated.segments {
        if matches!(
            seg.kind,
            SegmentKind::Markup | SegmentKind::StyleBlock | SegmentKind::TemplateExpression
        ) {
            assert_eq!(seg.translated.as_deref(), Some(seg.raw.as_str()));
        }
    }
    assert!(translated.content.contains("<img src=\"https://example.com/logo.png\" alt=\"Company logo\">"));
    assert!(translated.content.contains("p { color: #333; font-family: Arial; }"));
    assert!(translated.content.contains("<!-- greeting -->"));
    assert!(translated.content.contains("<p>[fr] Thank you for shopping with us.</p>"));
}

/// Test that every template expression survives in order
#[tokio::test]
async fn test_translateDocument_withEmbeddedExpressions_shouldKeepThemVerbatim() {
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();

    let expressions = |text: &str| -> Vec<String> {
        regex::Regex::new(r"\{\{\{[^}]*\}\}\}|\{\{[^}]*\}\}")
            .unwrap()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    };
    assert_eq!(expressions(&translated.content), expressions(common::EMAIL_TEMPLATE));
    assert!(translated.content.contains("<h1>[fr] Hello {{user.firstName}}!</h1>"));
    assert!(provider.request_count() > 0);
}

/// Test that block helpers and interpolations stay put while the text around them is translated
#[tokio::test]
async fn test_translateDocument_withBlockHelperInSentence_shouldTranslateOnlyLiterals() {
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline
        .translate_document("<p>Hello {{name}}, visit {{#if x}}here{{/if}}.</p>")
        .await
        .unwrap();

    assert_eq!(
        translated.content,
        "<p>[fr] Hello {{name}}[fr] , visit {{#if x}}[fr] here{{/if}}.</p>"
    );
    assert_eq!(translated.report.submitted_units, 3);
}

/// Test that a translated sentence is placed where its source was, whatever the completion order
#[tokio::test]
async fn test_translateDocument_withJitteredBackend_shouldKeepDocumentOrder() {
    let document: String = (0..30).map(|i| format!("<li>Item number {}</li>\n", i)).collect();
    let expected: String = (0..30)
        .map(|i| format!("<li>[fr] Item number {}</li>\n", i))
        .collect();

    for strategy in common::strategies() {
        let provider = MockProvider::working().with_jitter(10);
        let pipeline = common::pipeline_with(&provider, None, strategy, 4);

        let translated = pipeline.translate_document(&document).await.unwrap();

        assert_eq!(translated.content, expected, "{:?}", strategy);
    }
}

/// Test that backend concurrency never exceeds the configured bound
#[tokio::test]
async fn test_translateDocument_withSlowBackend_shouldBoundConcurrency() {
    let document: String = (0..16).map(|i| format!("<p>Paragraph {}</p>", i)).collect();

    for strategy in common::strategies() {
        let provider = MockProvider::identity().with_delay(Duration::from_millis(15));
        let pipeline = common::pipeline_with(&provider, None, strategy, 3);

        let translated = pipeline.translate_document(&document).await.unwrap();

        assert_eq!(translated.report.submitted_units, 16);
        assert_eq!(provider.request_count(), 16);
        assert!(
            provider.max_in_flight() <= 3,
            "{:?} had {} calls in flight",
            strategy,
            provider.max_in_flight()
        );
    }
}

/// Test that a second run over the same content is served from the cache
#[tokio::test]
async fn test_translateDocument_twiceWithSharedCache_shouldSkipBackend() {
    let provider = MockProvider::working();
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
    let pipeline = common::pipeline_with(&provider, Some(cache), DispatchStrategy::Limiter, 5);

    let first = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();
    let calls_after_first = provider.request_count();
    assert!(calls_after_first > 0);
    assert_eq!(first.report.gateway.backend_calls, calls_after_first);

    let second = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();

    assert_eq!(provider.request_count(), calls_after_first);
    assert_eq!(second.report.gateway.backend_calls, 0);
    assert!(second.report.gateway.cache_hits > 0);
    assert_eq!(second.content, first.content);
}

/// Test that a pre-populated cache entry answers without the backend
#[tokio::test]
async fn test_translateDocument_withPrepopulatedCache_shouldNotCallBackend() {
    let provider = MockProvider::working();
    let cache = Arc::new(MemoryCache::new());
    cache
        .store(&CacheEntry::new("Hello", "Bonjour", "en", "fr"))
        .await
        .unwrap();
    let pipeline = common::pipeline_with(
        &provider,
        Some(cache as Arc<dyn CacheStore>),
        DispatchStrategy::WorkerPool,
        2,
    );

    let translated = pipeline.translate_document("<p>  Hello </p>").await.unwrap();

    assert_eq!(translated.content, "<p>  Bonjour </p>");
    assert_eq!(provider.request_count(), 0);
    assert_eq!(translated.report.gateway.cache_hits, 1);
}

/// Test that text the backend must never see is passed through untouched
#[tokio::test]
async fn test_translateDocument_withOnlySkippableText_shouldNotCallBackend() {
    let document = "<p>{{name}}</p><p>&nbsp;</p><p>https://example.com/a</p><p>   </p><p>--</p><p>{{a}} {{{b}}}</p>";
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline.translate_document(document).await.unwrap();

    assert_eq!(translated.content, document);
    assert_eq!(provider.request_count(), 0);
    assert_eq!(translated.report.submitted_units, 0);
}

/// Test that a dead backend degrades to the original text without failing the document
#[tokio::test]
async fn test_translateDocument_withFailingBackend_shouldDegradeToOriginal() {
    common::init_logging();
    let provider = MockProvider::failing();
    let cache = Arc::new(MemoryCache::new());
    let pipeline = common::pipeline_with(
        &provider,
        Some(cache.clone() as Arc<dyn CacheStore>),
        DispatchStrategy::WorkerPool,
        2,
    );

    let translated = pipeline.translate_document(common::EMAIL_TEMPLATE).await.unwrap();

    assert_eq!(translated.content, common::EMAIL_TEMPLATE);
    assert_eq!(translated.report.final_state(), PipelineState::Done);
    assert!(translated.report.gateway.degraded_units > 0);
    assert!(cache.is_empty());
}

/// Test that a partially failing backend only degrades the failed units
#[tokio::test]
async fn test_translateDocument_withIntermittentBackend_shouldTranslateTheRest() {
    let document = "<p>One.</p><p>Two.</p><p>Three.</p><p>Four.</p>";
    let provider = MockProvider::intermittent(2);
    let pipeline = common::pipeline_with(&provider, None, DispatchStrategy::Limiter, 1);

    let translated = pipeline.translate_document(document).await.unwrap();

    // Every other call fails once and succeeds on its retry
    assert_eq!(
        translated.content,
        "<p>[fr] One.</p><p>[fr] Two.</p><p>[fr] Three.</p><p>[fr] Four.</p>"
    );
}

/// Test the document-level failure for malformed input
#[tokio::test]
async fn test_translateDocument_withUnterminatedExpression_shouldFailMalformed() {
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let error = pipeline.translate_document("<p>Hi {{name</p>").await.unwrap_err();

    assert_eq!(error.category(), "malformed_input");
    assert_eq!(provider.request_count(), 0);
}

/// Test writing the translated document to disk
#[tokio::test]
async fn test_translateToPath_shouldWriteFileOrReportDestinationError() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let provider = MockProvider::working();
    let pipeline = common::memory_pipeline(&provider);

    let destination = dir.path().join("out.translated.html");
    let report = pipeline.translate_to_path("<b>Hello</b>", &destination).await?;
    assert_eq!(std::fs::read_to_string(&destination)?, "<b>[fr] Hello</b>");
    assert_eq!(report.final_state(), PipelineState::Done);

    let missing = dir.path().join("missing").join("out.html");
    let error = pipeline.translate_to_path("<b>Hello</b>", &missing).await.unwrap_err();
    assert_eq!(error.category(), "destination_write");
    assert!(!missing.exists());
    Ok(())
}

/// Test that runs visit every state in order
#[tokio::test]
async fn test_report_shouldListStatesInOrder() {
    let provider = MockProvider::identity();
    let pipeline = common::memory_pipeline(&provider);

    let translated = pipeline.translate_document("<p>Hello</p>").await.unwrap();

    assert_eq!(
        translated.report.states,
        vec![
            PipelineState::Idle,
            PipelineState::Segmenting,
            PipelineState::Classifying,
            PipelineState::Dispatching,
            PipelineState::Reassembling,
            PipelineState::Done,
        ]
    );
    assert_eq!(translated.report.text_segments, 3);
    assert_eq!(translated.report.markup_segments, 2);
}
