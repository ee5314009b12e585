use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_config::{CacheBackend, CacheConfig, Config};
use crate::database::CacheStats;
use crate::file_utils::FileManager;
use crate::translation::{PipelineReport, SqliteCache, TranslationPipeline};

// @module: Application controller for template translation

/// Result of processing one input file
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// The file was translated and written to `output`
    Translated {
        output: PathBuf,
        report: PipelineReport,
    },
    /// An output already existed and overwriting was not requested
    Skipped { output: PathBuf },
}

/// Counts for a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub translated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller for template translation
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Pipeline shared by every file of the run
    pipeline: TranslationPipeline,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        let pipeline = TranslationPipeline::from_config(&config)?;
        Ok(Self { config, pipeline })
    }

    /// Create a controller around an already built pipeline
    pub fn with_pipeline(config: Config, pipeline: TranslationPipeline) -> Self {
        Self { config, pipeline }
    }

    /// Pipeline used for every document
    pub fn pipeline(&self) -> &TranslationPipeline {
        &self.pipeline
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate a single file next to itself, or into `output_dir`
    pub async fn run(&self, input_file: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<FileOutcome> {
        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }
        if let Some(dir) = &output_dir {
            FileManager::ensure_dir(dir)?;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner.set_message(format!("Translating {}", display_name(&input_file)));

        let outcome = self
            .translate_file(&input_file, output_dir.as_deref(), force_overwrite)
            .await;
        spinner.finish_and_clear();

        match &outcome {
            Ok(FileOutcome::Translated { output, report }) => info!(
                "Translation completed in {}: {:?}",
                Self::format_duration(report.elapsed),
                output
            ),
            Ok(FileOutcome::Skipped { output }) => warn!(
                "Skipping file, translation already exists at {:?} (use -f to force overwrite)",
                output
            ),
            Err(_) => {}
        }
        outcome
    }

    /// Translate every template file below `input_dir`
    ///
    /// A failing file is logged and counted; the remaining files are still processed.
    pub async fn run_folder(&self, input_dir: PathBuf, output_dir: Option<PathBuf>, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_template_files(&input_dir)?;
        if files.is_empty() {
            return Err(anyhow!("No template files found in directory: {:?}", input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("█▓▒░"));
        folder_pb.set_message("Processing files");

        let mut summary = FolderSummary::default();

        for file in &files {
            folder_pb.set_message(format!("Processing: {}", display_name(file)));

            // Mirror the input tree below the output directory
            let target_dir = match &output_dir {
                Some(root) => {
                    let relative_parent = file
                        .parent()
                        .and_then(|p| p.strip_prefix(&input_dir).ok())
                        .unwrap_or_else(|| Path::new(""));
                    let dir = root.join(relative_parent);
                    FileManager::ensure_dir(&dir)?;
                    Some(dir)
                }
                None => None,
            };

            match self.translate_file(file, target_dir.as_deref(), force_overwrite).await {
                Ok(FileOutcome::Translated { .. }) => summary.translated += 1,
                Ok(FileOutcome::Skipped { output }) => {
                    warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", output);
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {:#}", display_name(file), e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();

        info!(
            "Processed {} files: {} translated, {} skipped, {} failed - Duration: {}",
            files.len(),
            summary.translated,
            summary.skipped,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    async fn translate_file(&self, input_file: &Path, output_dir: Option<&Path>, force_overwrite: bool) -> Result<FileOutcome> {
        let output = FileManager::generate_output_path(input_file, output_dir);
        if output.exists() && !force_overwrite {
            return Ok(FileOutcome::Skipped { output });
        }

        let document = FileManager::read_to_string(input_file)?;
        let report = self
            .pipeline
            .translate_to_path(&document, &output)
            .await
            .with_context(|| format!("Failed to translate {:?}", input_file))?;

        Ok(FileOutcome::Translated { output, report })
    }

    /// Statistics of the persistent cache
    pub async fn cache_stats(config: &CacheConfig) -> Result<CacheStats> {
        let cache = Self::persistent_cache(config)?;
        Ok(cache.stats().await?)
    }

    /// Empty the persistent cache, returning the number of removed rows
    pub async fn clear_cache(config: &CacheConfig) -> Result<i64> {
        let cache = Self::persistent_cache(config)?;
        Ok(cache.clear().await?)
    }

    fn persistent_cache(config: &CacheConfig) -> Result<SqliteCache> {
        if config.backend != CacheBackend::Sqlite {
            return Err(anyhow!("Only the sqlite cache backend is persistent"));
        }
        Ok(SqliteCache::new(config.path.clone()))
    }

    /// Human-readable duration
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
