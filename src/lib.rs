//! Palimpsest: versioned local store for chapters and their translations
//!
//! A chapter is reachable by two interchangeable identities: its mutable
//! source URL and a content-derived stable id. On top of a substrate that
//! only commits single calls atomically, the store guarantees:
//!
//! - exactly one active translation version per chapter (when any exist)
//! - monotonic, never-reused version numbers
//! - self-healing stable-id resolution that tolerates separator drift
//!   and mappings that were never written
//!
//! # Example
//!
//! ```no_run
//! use palimpsest::{ChapterInput, ChapterRef, Library, SettingsSnapshot, TranslationResult};
//!
//! # async fn demo() -> Result<(), palimpsest::StoreError> {
//! let library = Library::open_in_memory()?;
//! let chapter = library.store_chapter(ChapterInput::new(
//!     "https://example.com/novel/ch-1",
//!     "Chapter 1",
//!     "It was a dark and stormy night.",
//! ))?;
//!
//! let version = library
//!     .store_translation(
//!         &ChapterRef::by_url(&chapter.url),
//!         TranslationResult::new("Chapter 1", "Es war eine dunkle Nacht."),
//!         SettingsSnapshot::new("openai", "gpt-4o"),
//!     )
//!     .await?;
//! assert_eq!(version.version, 1);
//! assert!(version.is_active);
//! # Ok(())
//! # }
//! ```

mod api;
pub mod chapter;
mod coordinator;
mod error;
pub mod identity;
pub mod migration;
pub mod storage;
pub mod version;

pub use api::{Library, LibrarySnapshot};
pub use chapter::{Chapter, ChapterInput, ChapterRef, ChapterStore};
pub use coordinator::KeyedLock;
pub use error::{StoreError, StoreResult};
pub use identity::{IdentityMapping, IdentityResolver, Resolution, ResolutionSource};
pub use migration::MigrationSession;
pub use storage::{OpenRecordStore, RecordStore, SqliteStore, StorageError, StorageResult};
pub use version::{
    AmendmentProposal, Footnote, SettingsSnapshot, TranslationResult, TranslationVersion,
    TranslationVersionStore, UsageMetrics,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
