/*!
 * Database entity models.
 */

use serde::{Deserialize, Serialize};

/// Row of the `translation_cache` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Database ID, assigned on insert
    pub id: i64,
    /// SHA256 hash of the normalized source text
    pub source_text_hash: String,
    /// Normalized source text
    pub source_text: String,
    /// Translated text
    pub translated_text: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
}

impl CacheRecord {
    /// Create a new cache record stamped with the current time
    pub fn new(
        source_text_hash: String,
        source_text: String,
        translated_text: String,
        source_language: String,
        target_language: String,
    ) -> Self {
        Self {
            id: 0,
            source_text_hash,
            source_text,
            translated_text,
            source_language,
            target_language,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
