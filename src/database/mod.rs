/*!
 * Database module for the persistent translation cache.
 *
 * SQLite holds every translation ever produced, keyed by the SHA-256 hash of
 * the normalized source text and the language pair. Rows are only appended;
 * lookups return the earliest row for a key.
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::CacheRecord;
pub use repository::{CacheStats, Repository};
