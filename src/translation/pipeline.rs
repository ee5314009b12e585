/*!
 * Document translation pipeline.
 *
 * Drives one document through its states:
 *
 * ```text
 * Idle -> Segmenting -> Classifying -> Dispatching -> Reassembling -> Done
 *            \______________\______________\_______________\-> Failed
 * ```
 *
 * Segmentation errors, write errors and broken invariants fail the document.
 * Backend and cache problems never do: the gateway degrades affected pieces
 * to their original text. Every run gets its own dispatcher, so concurrent
 * documents do not share scheduling state, while the backend and the cache
 * store are shared by every run of a pipeline.
 */

use anyhow::{Context, Result};
use futures::future::join_all;
use log::{debug, error, info};
use std::fmt;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_config::{AUTO_LANGUAGE, Config, DispatchStrategy};
use crate::errors::PipelineError;
use crate::language_utils::normalize_for_backend;
use crate::providers::{Provider, TranslationRequest, create_provider};
use crate::translation::cache::{CacheStore, open_cache_store};
use crate::translation::classifier::{Classification, SubToken, classify, join_sub_tokens};
use crate::translation::dispatcher::{DispatchHandle, create_dispatcher};
use crate::translation::gateway::{CacheGateway, GatewayOptions, GatewayStatsSnapshot};
use crate::translation::reassembler::{reassemble, write_to};
use crate::translation::segmenter::{Segment, SegmentKind, segment};

/// Lifecycle of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Segmenting,
    Classifying,
    Dispatching,
    Reassembling,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Segmenting => "segmenting",
            Self::Classifying => "classifying",
            Self::Dispatching => "dispatching",
            Self::Reassembling => "reassembling",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Languages and scheduling of a pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Backend source language code, or "auto"
    pub source_language: String,
    /// Backend target language code
    pub target_language: String,
    /// Scheduling strategy
    pub dispatch: DispatchStrategy,
    /// Maximum simultaneous backend requests
    pub concurrency: usize,
}

impl PipelineConfig {
    /// Limiter with five slots between the given languages
    pub fn new(source_language: &str, target_language: &str) -> Self {
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            dispatch: DispatchStrategy::Limiter,
            concurrency: 5,
        }
    }

    /// Use `strategy` with at most `concurrency` requests in flight
    pub fn with_dispatch(mut self, strategy: DispatchStrategy, concurrency: usize) -> Self {
        self.dispatch = strategy;
        self.concurrency = concurrency.max(1);
        self
    }
}

/// What happened while translating one document
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// Unique id of the run, used in log lines
    pub run_id: String,
    /// Total number of segments
    pub segments: usize,
    /// Tags and comments
    pub markup_segments: usize,
    /// Style and script blocks
    pub style_blocks: usize,
    /// Expression-only text
    pub expression_segments: usize,
    /// Text segments
    pub text_segments: usize,
    /// Text segments passed through without translation
    pub skipped_segments: usize,
    /// Literal pieces sent through the dispatcher
    pub submitted_units: usize,
    /// Cache and backend counters of this run
    pub gateway: GatewayStatsSnapshot,
    /// States visited, in order
    pub states: Vec<PipelineState>,
    /// Wall-clock duration
    pub elapsed: Duration,
}

impl PipelineReport {
    /// Last state reached
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }
}

/// A translated document with its segments and report
#[derive(Debug, Clone)]
pub struct TranslatedDocument {
    /// Output document
    pub content: String,
    /// Segments with their output filled in
    pub segments: Vec<Segment>,
    /// Run report
    pub report: PipelineReport,
}

/// State tracking for one run
struct Run {
    report: PipelineReport,
    started: Instant,
}

impl Run {
    fn start() -> Self {
        let report = PipelineReport {
            run_id: Uuid::new_v4().to_string(),
            states: vec![PipelineState::Idle],
            ..PipelineReport::default()
        };
        Self { report, started: Instant::now() }
    }

    fn advance(&mut self, next: PipelineState) {
        debug!("[{}] {} -> {}", short_id(&self.report.run_id), self.report.final_state(), next);
        self.report.states.push(next);
    }

    fn fail(&mut self, err: &PipelineError) {
        error!(
            "[{}] Document failed while {} ({}): {}",
            short_id(&self.report.run_id),
            self.report.final_state(),
            err.category(),
            err
        );
        self.report.states.push(PipelineState::Failed);
    }

    fn finish(mut self) -> PipelineReport {
        self.advance(PipelineState::Done);
        self.report.elapsed = self.started.elapsed();
        info!(
            "[{}] Translated {} segments ({} units, {} cache hits, {} degraded) in {:.2?}",
            short_id(&self.report.run_id),
            self.report.segments,
            self.report.submitted_units,
            self.report.gateway.cache_hits,
            self.report.gateway.degraded_units,
            self.report.elapsed
        );
        self.report
    }
}

fn short_id(run_id: &str) -> &str {
    run_id.get(..8).unwrap_or(run_id)
}

/// Translatable text segment awaiting its pieces
struct PlannedSegment {
    index: usize,
    tokens: Vec<SubToken>,
}

/// Orchestrates segmentation, classification, dispatch and reassembly
#[derive(Debug, Clone)]
pub struct TranslationPipeline {
    gateway: CacheGateway,
    config: PipelineConfig,
}

impl TranslationPipeline {
    /// Create a pipeline over an existing gateway
    pub fn new(gateway: CacheGateway, config: PipelineConfig) -> Self {
        Self { gateway, config }
    }

    /// Create a pipeline with an explicit backend and cache store
    pub fn with_backend(
        provider: Arc<dyn Provider>,
        cache: Option<Arc<dyn CacheStore>>,
        options: GatewayOptions,
        config: PipelineConfig,
    ) -> Self {
        Self::new(CacheGateway::new(provider, cache, options), config)
    }

    /// Build backend, cache and scheduling from the application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let translation = &config.translation;
        let pipeline_config = PipelineConfig {
            source_language: backend_language(&config.source_language)?,
            target_language: backend_language(&config.target_language)?,
            dispatch: translation.dispatch,
            concurrency: translation.concurrency_limit(),
        };

        let provider = create_provider(translation);
        let cache = open_cache_store(&config.cache);
        info!(
            "Using {} backend, {} cache, {:?} dispatch with {} slots",
            translation.backend.display_name(),
            cache.as_ref().map(|c| c.name()).unwrap_or("no"),
            pipeline_config.dispatch,
            pipeline_config.concurrency
        );

        Ok(Self::with_backend(
            provider,
            cache,
            GatewayOptions::from(translation),
            pipeline_config,
        ))
    }

    /// Same backend and cache, different target language
    pub fn with_target_language(&self, target_language: &str) -> Result<Self> {
        if target_language == AUTO_LANGUAGE {
            anyhow::bail!("Target language cannot be 'auto'");
        }
        let mut config = self.config.clone();
        config.target_language = backend_language(target_language)?;
        Ok(Self::new(self.gateway.clone(), config))
    }

    /// Pipeline settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Gateway shared by every run
    pub fn gateway(&self) -> &CacheGateway {
        &self.gateway
    }

    /// Translate `document` and return the result in memory
    pub async fn translate_document(&self, document: &str) -> Result<TranslatedDocument, PipelineError> {
        let mut run = Run::start();

        let segments = match self.translate_segments(&mut run, document).await {
            Ok(segments) => segments,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };

        run.advance(PipelineState::Reassembling);
        let content = match reassemble(&segments) {
            Ok(content) => content,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };

        Ok(TranslatedDocument {
            content,
            segments,
            report: run.finish(),
        })
    }

    /// Translate `document` and write it to `destination`
    ///
    /// The output is written to a temporary file next to `destination` and
    /// moved into place once complete, so a failed run never leaves a
    /// partial file behind.
    pub async fn translate_to_path(&self, document: &str, destination: &Path) -> Result<PipelineReport, PipelineError> {
        let mut run = Run::start();

        let segments = match self.translate_segments(&mut run, document).await {
            Ok(segments) => segments,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };

        run.advance(PipelineState::Reassembling);
        if let Err(e) = persist_segments(&segments, destination) {
            run.fail(&e);
            return Err(e);
        }

        Ok(run.finish())
    }

    async fn translate_segments(&self, run: &mut Run, document: &str) -> Result<Vec<Segment>, PipelineError> {
        run.advance(PipelineState::Segmenting);
        let mut segments = segment(document)?;
        tally_segments(&mut run.report, &segments);

        run.advance(PipelineState::Classifying);
        let mut plan = Vec::new();
        for (index, seg) in segments.iter_mut().enumerate() {
            if seg.kind != SegmentKind::Text {
                continue;
            }
            match classify(&seg.raw) {
                Classification::Skippable(reason) => {
                    if !seg.raw.is_empty() {
                        debug!("Skipping segment {} ({:?})", seg.position, reason);
                    }
                    seg.translated = Some(seg.raw.clone());
                    run.report.skipped_segments += 1;
                }
                Classification::Translatable(tokens) => plan.push(PlannedSegment { index, tokens }),
            }
        }

        run.advance(PipelineState::Dispatching);
        let gateway = self.gateway.fork();
        let mut dispatcher = create_dispatcher(self.config.dispatch, self.config.concurrency, gateway.clone());

        let mut pending: Vec<(usize, usize, DispatchHandle)> = Vec::new();
        for (plan_index, planned) in plan.iter().enumerate() {
            for (token_index, token) in planned.tokens.iter().enumerate() {
                if !token.needs_translation() {
                    continue;
                }
                let request = TranslationRequest::new(
                    token.as_str(),
                    &self.config.source_language,
                    &self.config.target_language,
                );
                pending.push((plan_index, token_index, dispatcher.submit(request).await));
            }
        }
        run.report.submitted_units = pending.len();

        dispatcher.drain().await;

        let (slots, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|(plan_index, token_index, handle)| ((plan_index, token_index), handle))
            .unzip();
        let results = join_all(handles.into_iter().map(DispatchHandle::wait)).await;

        for ((plan_index, token_index), translated) in slots.into_iter().zip(results) {
            plan[plan_index].tokens[token_index] = SubToken::Literal(translated);
        }
        for planned in plan {
            segments[planned.index].translated = Some(join_sub_tokens(&planned.tokens));
        }

        run.report.gateway = gateway.stats();
        Ok(segments)
    }
}

/// Map a user-facing language code to the form backends expect
fn backend_language(code: &str) -> Result<String> {
    if code == AUTO_LANGUAGE {
        return Ok(code.to_string());
    }
    normalize_for_backend(code).with_context(|| format!("Unsupported language '{}'", code))
}

fn tally_segments(report: &mut PipelineReport, segments: &[Segment]) {
    report.segments = segments.len();
    for seg in segments {
        match seg.kind {
            SegmentKind::Markup => report.markup_segments += 1,
            SegmentKind::StyleBlock => report.style_blocks += 1,
            SegmentKind::TemplateExpression => report.expression_segments += 1,
            SegmentKind::Text => report.text_segments += 1,
        }
    }
}

fn persist_segments(segments: &[Segment], destination: &Path) -> Result<(), PipelineError> {
    let display = destination.display().to_string();
    let write_error = |message: String| PipelineError::DestinationWrite {
        path: display.clone(),
        message,
    };

    let directory = destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(directory).map_err(|e| write_error(e.to_string()))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write_to(segments, &mut writer, &display)?;
    }
    temp.persist(destination)
        .map_err(|e| write_error(e.error.to_string()))?;

    Ok(())
}
