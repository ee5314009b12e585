/*!
 * Translation caching functionality.
 *
 * A cache store maps a normalized source text and a language pair to a
 * previously obtained translation. Two stores are provided: an in-process
 * map and the SQLite-backed persistent cache. Both are append-only; once a
 * key has a translation, later writes for the same key do not replace it.
 */

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app_config::{CacheBackend, CacheConfig};
use crate::database::{CacheRecord, CacheStats, DatabaseConnection, Repository};
use crate::errors::CacheError;

/// Collapse every run of whitespace to a single space and trim both ends
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A translation ready to be written to a cache store
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Normalized source text
    pub normalized_original: String,
    /// Backend output
    pub translated: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

impl CacheEntry {
    /// Create an entry; `original` is normalized here
    pub fn new(original: &str, translated: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            normalized_original: normalize_text(original),
            translated: translated.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Storage behind the cache gateway
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up the translation of an already normalized text
    async fn lookup(
        &self,
        normalized: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, CacheError>;

    /// Record a translation; never overwrites an existing one
    async fn store(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Cache key combining normalized text, source language, and target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source_text: String,
    source_language: String,
    target_language: String,
}

impl CacheKey {
    fn new(source_text: &str, source_language: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// In-process translation cache
#[derive(Clone, Default)]
pub struct MemoryCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits, misses and hit rate
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 { hits as f64 / total as f64 } else { 0.0 };

        (hits, misses, hit_rate)
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        self.cache.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        debug!("Translation cache cleared");
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn lookup(
        &self,
        normalized: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, CacheError> {
        let key = CacheKey::new(normalized, source_language, target_language);
        let found = self.cache.read().get(&key).cloned();

        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Cache hit for '{}' ({} -> {})",
                    truncate_text(normalized, 30),
                    source_language,
                    target_language
                );
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        Ok(found)
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let key = CacheKey::new(
            &entry.normalized_original,
            &entry.source_language,
            &entry.target_language,
        );
        self.cache
            .write()
            .entry(key)
            .or_insert_with(|| entry.translated.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// SQLite-backed persistent cache
///
/// The database is opened on first use. If opening fails, the store reports
/// itself unavailable and tries again on the next call.
pub struct SqliteCache {
    path: Option<PathBuf>,
    repository: tokio::sync::OnceCell<Repository>,
}

impl SqliteCache {
    /// Cache at `path`, or at the default data-directory location when `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            repository: tokio::sync::OnceCell::new(),
        }
    }

    /// Cache over an already opened repository
    pub fn with_repository(repository: Repository) -> Self {
        Self {
            path: None,
            repository: tokio::sync::OnceCell::new_with(Some(repository)),
        }
    }

    /// The repository, opening the database if needed
    pub async fn repository(&self) -> Result<&Repository, CacheError> {
        self.repository
            .get_or_try_init(|| async {
                let path = self.path.clone();
                tokio::task::spawn_blocking(move || {
                    let connection = match path {
                        Some(path) => DatabaseConnection::new(path),
                        None => DatabaseConnection::new_default(),
                    };
                    connection.map(Repository::new)
                })
                .await
                .map_err(|e| CacheError::Unavailable(e.to_string()))?
                .map_err(|e| CacheError::Unavailable(format!("{:#}", e)))
            })
            .await
    }

    /// Row statistics of the persistent cache
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        Ok(self.repository().await?.get_cache_stats().await?)
    }

    /// Delete every row, returning how many were removed
    pub async fn clear(&self) -> Result<i64, CacheError> {
        Ok(self.repository().await?.clear_cache().await?)
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn lookup(
        &self,
        normalized: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>, CacheError> {
        let repository = self.repository().await?;
        Ok(repository
            .get_cached_translation(normalized, source_language, target_language)
            .await?)
    }

    async fn store(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let repository = self.repository().await?;
        let record = CacheRecord::new(
            Repository::hash_text(&entry.normalized_original),
            entry.normalized_original.clone(),
            entry.translated.clone(),
            entry.source_language.clone(),
            entry.target_language.clone(),
        );
        Ok(repository.cache_translation(&record).await?)
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

/// Build the cache store described by the configuration, `None` when caching is disabled
pub fn open_cache_store(config: &CacheConfig) -> Option<Arc<dyn CacheStore>> {
    if !config.enabled {
        return None;
    }
    match config.backend {
        CacheBackend::Sqlite => Some(Arc::new(SqliteCache::new(config.path.clone()))),
        CacheBackend::Memory => Some(Arc::new(MemoryCache::new())),
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
