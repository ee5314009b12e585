/*!
 * Repository layer for database operations.
 *
 * This module provides a high-level API for the translation cache table,
 * abstracting away the SQL details and providing type-safe access.
 */

use anyhow::Result;
use log::debug;
use rusqlite::{OptionalExtension, params};
use sha2::{Digest, Sha256};

use super::connection::DatabaseConnection;
use super::models::CacheRecord;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a repository with the default database location
    pub fn new_default() -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db))
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Compute SHA256 hash of text
    pub fn hash_text(text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Get the earliest cached translation of `source_text` for the language pair
    pub async fn get_cached_translation(
        &self,
        source_text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<String>> {
        let source_text_hash = Self::hash_text(source_text);
        let source_text = source_text.to_string();
        let source_language = source_language.to_string();
        let target_language = target_language.to_string();

        self.db
            .execute_async(move |conn| {
                let translated: Option<String> = conn
                    .query_row(
                        r#"
                        SELECT translated_text
                        FROM translation_cache
                        WHERE source_text_hash = ?1
                          AND source_text = ?2
                          AND source_language = ?3
                          AND target_language = ?4
                        ORDER BY id ASC
                        LIMIT 1
                        "#,
                        params![source_text_hash, source_text, source_language, target_language],
                        |row| row.get(0),
                    )
                    .optional()?;

                if translated.is_some() {
                    debug!("Cache hit for translation");
                }
                Ok(translated)
            })
            .await
    }

    /// Append a translation to the cache
    pub async fn cache_translation(&self, record: &CacheRecord) -> Result<()> {
        let record = record.clone();

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_cache (
                        source_text_hash, source_text, translated_text,
                        source_language, target_language, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        record.source_text_hash,
                        record.source_text,
                        record.translated_text,
                        record.source_language,
                        record.target_language,
                        record.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    /// Get cache statistics
    pub async fn get_cache_stats(&self) -> Result<CacheStats> {
        let file_size_bytes = self.db.file_size();

        self.db
            .execute_async(move |conn| {
                let total_entries: i64 =
                    conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))?;

                let distinct_sources: i64 = conn.query_row(
                    "SELECT COUNT(DISTINCT source_text_hash) FROM translation_cache",
                    [],
                    |row| row.get(0),
                )?;

                let language_pairs: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM (SELECT DISTINCT source_language, target_language FROM translation_cache)",
                    [],
                    |row| row.get(0),
                )?;

                let (oldest_entry, newest_entry): (Option<String>, Option<String>) = conn.query_row(
                    "SELECT MIN(created_at), MAX(created_at) FROM translation_cache",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                Ok(CacheStats {
                    total_entries,
                    distinct_sources,
                    language_pairs,
                    oldest_entry,
                    newest_entry,
                    file_size_bytes,
                })
            })
            .await
    }

    /// Clear the translation cache, returning the number of deleted rows
    pub async fn clear_cache(&self) -> Result<i64> {
        self.db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM translation_cache", [])?;
                Ok(deleted as i64)
            })
            .await
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Total number of rows, duplicates included
    pub total_entries: i64,
    /// Number of distinct source texts
    pub distinct_sources: i64,
    /// Number of distinct language pairs
    pub language_pairs: i64,
    /// Timestamp of the oldest row
    pub oldest_entry: Option<String>,
    /// Timestamp of the newest row
    pub newest_entry: Option<String>,
    /// Database file size in bytes
    pub file_size_bytes: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Entries: {}, Distinct sources: {}, Language pairs: {}, Size: {} KB",
            self.total_entries,
            self.distinct_sources,
            self.language_pairs,
            self.file_size_bytes / 1024
        )
    }
}
