//! Domain error taxonomy for the chapter/translation store.
//!
//! Substrate failures (`StorageError`) are wrapped, never swallowed: a
//! dropped write could leave a chapter with zero or two active versions.

use crate::storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the store's consumer-facing operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Resolution exhausted every strategy. The message carries the full
    /// diagnostic trail so callers never see a bare "not found".
    #[error("stable id '{stable_id}' could not be resolved: tried direct lookup, format repair, and chapter search")]
    StableIdNotFound { stable_id: String },

    /// An explicit version number is absent for a chapter.
    #[error("version {version} not found for chapter '{chapter_url}'")]
    VersionNotFound { chapter_url: String, version: u32 },

    /// A translation reference resolved to no known chapter.
    #[error("no chapter stored for '{reference}'")]
    ChapterRequired { reference: String },

    /// A `ChapterRef` with neither a URL nor a stable id.
    #[error("chapter reference requires a url or a stable id")]
    InvalidReference,

    /// No chapter matches the given stable id.
    #[error("chapter not found: {stable_id}")]
    ChapterNotFound { stable_id: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
