/*!
 * Selective translation of template documents.
 *
 * This module contains the translation pipeline and its stages:
 *
 * - `segmenter`: splits a document into markup, raw blocks and text
 * - `classifier`: decides which text is translated and protects expressions
 * - `cache`: cache stores keyed by normalized text and language pair
 * - `gateway`: cache-first, failure-tolerant access to the backend
 * - `dispatcher`: bounded scheduling of translation requests
 * - `reassembler`: joins translated segments back into a document
 * - `pipeline`: drives one document through all of the above
 */

// Re-export main types for easier usage
pub use self::cache::{CacheEntry, CacheStore, MemoryCache, SqliteCache, normalize_text};
pub use self::classifier::{Classification, SkipReason, SubToken, classify};
pub use self::dispatcher::{DispatchHandle, Dispatcher, Limiter, WorkerPool};
pub use self::gateway::{CacheGateway, GatewayOptions, GatewayStatsSnapshot};
pub use self::pipeline::{
    PipelineConfig, PipelineReport, PipelineState, TranslatedDocument, TranslationPipeline,
};
pub use self::segmenter::{Segment, SegmentKind, segment};

// Submodules
pub mod cache;
pub mod classifier;
pub mod dispatcher;
pub mod gateway;
pub mod pipeline;
pub mod reassembler;
pub mod segmenter;
