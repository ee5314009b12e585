/*!
 * # hbs-translate - selective translation of Handlebars/HTML templates
 *
 * A Rust library that translates the human-readable text of template
 * documents while leaving everything else byte-for-byte intact.
 *
 * ## Features
 *
 * - Markup, attributes, comments, `<style>`/`<script>` blocks and
 *   `{{...}}` expressions are never sent to a translation backend
 * - Text that is only whitespace, punctuation, expressions or a URL is skipped
 * - Translations are cached by normalized text and language pair
 *   (in memory or in SQLite)
 * - Bounded concurrency with two interchangeable strategies:
 *   a permit-based limiter and a fixed worker pool
 * - A failing backend degrades to the original text instead of failing the document
 * - File, folder and HTTP upload front ends
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The pipeline and its stages:
 *   - `translation::segmenter`: Splits a document into segments
 *   - `translation::classifier`: Decides which text needs translation
 *   - `translation::cache`: Translation cache stores
 *   - `translation::gateway`: Cache-first access to the backend
 *   - `translation::dispatcher`: Bounded scheduling of requests
 *   - `translation::reassembler`: Rebuilds the document
 *   - `translation::pipeline`: Drives a document through every stage
 * - `providers`: Translation backend clients:
 *   - `providers::google`: Public Google Translate endpoint
 *   - `providers::libretranslate`: LibreTranslate API client
 *   - `providers::mock`: Identity and test backends
 * - `database`: SQLite storage for the persistent cache
 * - `file_utils`: File system operations
 * - `app_controller`: File and folder processing
 * - `server`: HTTP upload endpoint
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod server;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use errors::{AppError, CacheError, PipelineError, ProviderError};
pub use language_utils::{get_language_name, validate_language_code};
pub use translation::{TranslatedDocument, TranslationPipeline, segment};
