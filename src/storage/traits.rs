//! Storage trait definitions

use crate::chapter::Chapter;
use crate::identity::IdentityMapping;
use crate::version::TranslationVersion;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for the record storage substrate.
///
/// Three keyed collections: chapters by `url`, identity mappings by `url`,
/// translation versions by opaque `id` with secondary lookups by
/// `chapter_url` and `stable_id`.
///
/// Atomicity contract: each method commits as a single unit, taking
/// full effect or none. The substrate does NOT extend that atomicity
/// across a read-then-write sequence; callers that need one must serialize
/// through the `KeyedLock` coordinator.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait RecordStore: Send + Sync {
    // === Chapters ===

    /// Insert or replace a chapter row.
    fn put_chapter(&self, chapter: &Chapter) -> StorageResult<()>;

    /// Load a chapter by URL.
    fn get_chapter(&self, url: &str) -> StorageResult<Option<Chapter>>;

    /// Load a chapter by its persisted stable id. Indexed path only:
    /// rows whose stable id was never persisted are invisible here.
    fn chapter_by_stable_id(&self, stable_id: &str) -> StorageResult<Option<Chapter>>;

    /// Load every chapter row.
    fn list_chapters(&self) -> StorageResult<Vec<Chapter>>;

    // === Identity mappings ===

    /// Insert or replace a mapping row, keyed by URL.
    ///
    /// When `mapping.is_canonical` is set, every other canonical row for
    /// the same stable id is demoted in the same transaction, so "at most
    /// one canonical mapping per stable id" holds after every call.
    fn put_mapping(&self, mapping: &IdentityMapping) -> StorageResult<()>;

    /// Load the mapping row for a URL.
    fn mapping_for_url(&self, url: &str) -> StorageResult<Option<IdentityMapping>>;

    /// Load all mapping rows carrying a stable id, canonical first.
    fn mappings_for_stable_id(&self, stable_id: &str) -> StorageResult<Vec<IdentityMapping>>;

    /// Load every mapping row.
    fn list_mappings(&self) -> StorageResult<Vec<IdentityMapping>>;

    // === Translation versions ===

    /// Upsert and delete version rows as one atomic batch.
    ///
    /// This is the only version write path; version assignment and
    /// active-flag transitions ride on its all-or-nothing guarantee.
    fn apply_versions(
        &self,
        upserts: &[TranslationVersion],
        delete_ids: &[String],
    ) -> StorageResult<()>;

    /// Highest version number ever written for a chapter (0 when none).
    ///
    /// Maintained inside the `apply_versions` transaction and never
    /// lowered by deletions; version numbers are not reused within a
    /// chapter's lifetime.
    fn version_high_water(&self, chapter_url: &str) -> StorageResult<u32>;

    /// Load a version by its opaque id.
    fn version_by_id(&self, id: &str) -> StorageResult<Option<TranslationVersion>>;

    /// Load all versions for a chapter URL.
    fn versions_for_url(&self, chapter_url: &str) -> StorageResult<Vec<TranslationVersion>>;

    /// Load all versions carrying a denormalized stable id.
    fn versions_for_stable_id(&self, stable_id: &str) -> StorageResult<Vec<TranslationVersion>>;

    /// Load every version row.
    fn list_versions(&self) -> StorageResult<Vec<TranslationVersion>>;
}

/// Extension trait for opening stores from paths
pub trait OpenRecordStore: RecordStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
