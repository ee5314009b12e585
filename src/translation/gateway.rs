/*!
 * Cache gateway.
 *
 * Resolves one piece of text to its translation: leading and trailing
 * whitespace is kept aside, the core is looked up in the cache, split into
 * sentences, and every missing sentence goes to the backend. Any backend or
 * cache failure degrades to the original text, so `resolve` never fails.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::app_config::TranslationConfig;
use crate::errors::ProviderError;
use crate::providers::{Provider, TranslationRequest};
use crate::translation::cache::{CacheEntry, CacheStore, normalize_text, truncate_text};

/// Sentence-ending punctuation, the whitespace after it, then an uppercase letter
static SENTENCE_BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.?!](\s+)\p{Lu}").expect("valid sentence boundary regex"));

/// Piece of a text after sentence splitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentencePiece<'a> {
    /// A sentence, translated on its own
    Unit(&'a str),
    /// Whitespace between two sentences, kept verbatim
    Separator(&'a str),
}

/// Split `text` after sentence-ending punctuation that is followed by whitespace
/// and an uppercase letter. Concatenating the pieces yields `text` again.
pub fn split_sentences(text: &str) -> Vec<SentencePiece<'_>> {
    let mut pieces = Vec::new();
    let mut cursor = 0;

    for captures in SENTENCE_BOUNDARY_RE.captures_iter(text) {
        let Some(separator) = captures.get(1) else {
            continue;
        };
        if separator.start() > cursor {
            pieces.push(SentencePiece::Unit(&text[cursor..separator.start()]));
        }
        pieces.push(SentencePiece::Separator(separator.as_str()));
        cursor = separator.end();
    }
    if cursor < text.len() {
        pieces.push(SentencePiece::Unit(&text[cursor..]));
    }

    pieces
}

/// Split `text` into leading whitespace, core, and trailing whitespace
fn split_padding(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len().max(start);
    (&text[..start], &text[start..end], &text[end..])
}

/// Tuning knobs of the gateway
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Timeout of one backend call
    pub timeout: Duration,
    /// Extra attempts after a failed call
    pub retry_count: u32,
    /// Delay before the first retry, doubled each time
    pub retry_backoff: Duration,
    /// Translate and cache sentence by sentence
    pub split_sentences: bool,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self::from(&TranslationConfig::default())
    }
}

impl From<&TranslationConfig> for GatewayOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            timeout: config.timeout(),
            retry_count: config.retry_count,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            split_sentences: config.split_sentences,
        }
    }
}

/// Counters shared by clones of one gateway
#[derive(Debug, Default)]
pub struct GatewayStats {
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    cache_errors: AtomicUsize,
    backend_calls: AtomicUsize,
    degraded_units: AtomicUsize,
}

/// Point-in-time copy of [`GatewayStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatewayStatsSnapshot {
    /// Lookups answered from the cache
    pub cache_hits: usize,
    /// Lookups that found nothing
    pub cache_misses: usize,
    /// Failed cache reads or writes
    pub cache_errors: usize,
    /// Backend calls made, retries included
    pub backend_calls: usize,
    /// Units that fell back to their original text
    pub degraded_units: usize,
}

impl GatewayStats {
    /// Copy the current counter values
    pub fn snapshot(&self) -> GatewayStatsSnapshot {
        GatewayStatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            backend_calls: self.backend_calls.load(Ordering::Relaxed),
            degraded_units: self.degraded_units.load(Ordering::Relaxed),
        }
    }
}

/// Cache-first access to the translation backend
#[derive(Clone)]
pub struct CacheGateway {
    provider: Arc<dyn Provider>,
    cache: Option<Arc<dyn CacheStore>>,
    options: GatewayOptions,
    stats: Arc<GatewayStats>,
}

impl std::fmt::Debug for CacheGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGateway")
            .field("provider", &self.provider.name())
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .field("options", &self.options)
            .finish()
    }
}

impl CacheGateway {
    /// Create a gateway over a backend and an optional cache store
    pub fn new(
        provider: Arc<dyn Provider>,
        cache: Option<Arc<dyn CacheStore>>,
        options: GatewayOptions,
    ) -> Self {
        Self {
            provider,
            cache,
            options,
            stats: Arc::new(GatewayStats::default()),
        }
    }

    /// Same backend and cache with fresh counters
    pub fn fork(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            cache: self.cache.clone(),
            options: self.options.clone(),
            stats: Arc::new(GatewayStats::default()),
        }
    }

    /// Counters of this gateway and its clones
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats.snapshot()
    }

    /// Name of the backend in use
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Translate `text`, or return it unchanged if translation is impossible
    ///
    /// Leading and trailing whitespace of `text` is preserved exactly.
    pub async fn resolve(&self, text: &str, source_language: &str, target_language: &str) -> String {
        let (leading, core, trailing) = split_padding(text);
        if core.is_empty() {
            return text.to_string();
        }

        let normalized = normalize_text(core);
        if let Some(hit) = self.lookup(&normalized, source_language, target_language).await {
            return format!("{}{}{}", leading, hit, trailing);
        }

        let pieces = if self.options.split_sentences {
            split_sentences(core)
        } else {
            vec![SentencePiece::Unit(core)]
        };

        let translated_core = if let [SentencePiece::Unit(unit)] = pieces.as_slice() {
            self.translate_unit(unit, normalized, source_language, target_language)
                .await
        } else {
            let mut out = String::with_capacity(core.len());
            for piece in pieces {
                match piece {
                    SentencePiece::Separator(separator) => out.push_str(separator),
                    SentencePiece::Unit(unit) => {
                        let translated = self.resolve_unit(unit, source_language, target_language).await;
                        out.push_str(&translated);
                    }
                }
            }
            out
        };

        format!("{}{}{}", leading, translated_core, trailing)
    }

    /// One sentence: cache first, then the backend
    async fn resolve_unit(&self, unit: &str, source_language: &str, target_language: &str) -> String {
        let normalized = normalize_text(unit);
        if let Some(hit) = self.lookup(&normalized, source_language, target_language).await {
            return hit;
        }
        self.translate_unit(unit, normalized, source_language, target_language)
            .await
    }

    /// Call the backend for a unit that missed the cache, caching a successful result that differs from it
    async fn translate_unit(
        &self,
        unit: &str,
        normalized: String,
        source_language: &str,
        target_language: &str,
    ) -> String {
        let request = TranslationRequest::new(unit, source_language, target_language);

        match self.call_backend(&request).await {
            Ok(translated) => {
                // An unchanged answer is not stored: a later hit would replay the
                // normalized key and lose this unit's own whitespace
                if translated != unit {
                    let entry = CacheEntry {
                        normalized_original: normalized,
                        translated: translated.clone(),
                        source_language: source_language.to_string(),
                        target_language: target_language.to_string(),
                    };
                    self.store(&entry).await;
                }
                translated
            }
            Err(e) => {
                self.stats.degraded_units.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Translation of '{}' via {} failed, keeping original text: {}",
                    truncate_text(unit, 40),
                    self.provider.name(),
                    e
                );
                unit.to_string()
            }
        }
    }

    /// Backend call with per-attempt timeout and exponential backoff between attempts
    async fn call_backend(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let mut backoff = self.options.retry_backoff;
        let mut attempt = 0;

        loop {
            self.stats.backend_calls.fetch_add(1, Ordering::Relaxed);
            let result = match tokio::time::timeout(self.options.timeout, self.provider.translate(request)).await {
                Ok(Ok(translated)) if translated.trim().is_empty() => Err(ProviderError::ParseError(
                    "backend returned an empty translation".to_string(),
                )),
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(self.options.timeout)),
            };

            match result {
                Ok(translated) => return Ok(translated),
                Err(e) if attempt < self.options.retry_count => {
                    attempt += 1;
                    debug!(
                        "Backend attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        self.options.retry_count + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn lookup(&self, normalized: &str, source_language: &str, target_language: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.lookup(normalized, source_language, target_language).await {
            Ok(Some(hit)) => {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                Some(hit)
            }
            Ok(None) => {
                self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                self.stats.cache_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    async fn store(&self, entry: &CacheEntry) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if let Err(e) = cache.store(entry).await {
            self.stats.cache_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to cache translation of '{}': {}", truncate_text(&entry.normalized_original, 40), e);
        }
    }
}
