//! Consumer-facing API layer.
//!
//! `Library` is the single entry point for all consumer-facing
//! operations. Callers (CLI, export jobs, migration batches, embedding
//! applications) go through it; they never reach into the component
//! stores or the substrate directly.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chapter::{Chapter, ChapterInput, ChapterRef, ChapterStore};
use crate::coordinator::KeyedLock;
use crate::error::StoreResult;
use crate::identity::{IdentityMapping, IdentityResolver, Resolution};
use crate::storage::{OpenRecordStore, RecordStore, SqliteStore};
use crate::version::{
    SettingsSnapshot, TranslationResult, TranslationVersion, TranslationVersionStore,
};

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct Library {
    store: Arc<dyn RecordStore>,
    chapters: ChapterStore,
    resolver: IdentityResolver,
    versions: TranslationVersionStore,
}

impl Library {
    /// Wire the component stores over an already-open substrate.
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        let chapters = ChapterStore::new(store.clone());
        let resolver = IdentityResolver::new(store.clone(), chapters.clone());
        let coordinator = Arc::new(KeyedLock::new());
        let versions = TranslationVersionStore::new(
            store.clone(),
            chapters.clone(),
            resolver.clone(),
            coordinator,
        );
        Self {
            store,
            chapters,
            resolver,
            versions,
        }
    }

    /// Open or create a library at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::with_store(Arc::new(SqliteStore::open(path)?)))
    }

    /// In-memory library (useful for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::with_store(Arc::new(SqliteStore::open_in_memory()?)))
    }

    // --- Chapters ---

    /// Upsert a chapter by URL; assigns its stable id on first store.
    pub fn store_chapter(&self, input: ChapterInput) -> StoreResult<Chapter> {
        let chapter = self.chapters.store(input)?;
        if let Some(stable_id) = &chapter.stable_id {
            self.resolver.ensure_mapping(&chapter.url, stable_id)?;
        }
        Ok(chapter)
    }

    pub fn get_chapter(&self, url: &str) -> StoreResult<Option<Chapter>> {
        self.chapters.get(url)
    }

    pub fn get_chapter_by_stable_id(&self, stable_id: &str) -> StoreResult<Option<Chapter>> {
        self.chapters.get_by_stable_id(stable_id)
    }

    pub fn set_chapter_number(&self, stable_id: &str, n: u32) -> StoreResult<Chapter> {
        self.chapters.set_chapter_number(stable_id, n)
    }

    pub fn touch_chapter(&self, url: &str) -> StoreResult<()> {
        self.chapters.touch_accessed(url)
    }

    // --- Identity ---

    /// Resolve a stable id to its canonical URL, repairing mappings as
    /// needed. The result reports which strategy succeeded and whether a
    /// repair was written.
    pub fn resolve(&self, stable_id: &str) -> StoreResult<Resolution> {
        self.resolver.resolve_to_url(stable_id)
    }

    /// Idempotently record that a URL carries a stable id.
    pub fn ensure_mapping(&self, url: &str, stable_id: &str) -> StoreResult<()> {
        self.resolver.ensure_mapping(url, stable_id)
    }

    // --- Translation versions ---

    /// The single translation write endpoint.
    pub async fn store_translation(
        &self,
        chapter_ref: &ChapterRef,
        result: TranslationResult,
        settings: SettingsSnapshot,
    ) -> StoreResult<TranslationVersion> {
        self.versions.store(chapter_ref, result, settings).await
    }

    pub async fn active_translation(
        &self,
        chapter_ref: &ChapterRef,
    ) -> StoreResult<Option<TranslationVersion>> {
        self.versions.get_active(chapter_ref).await
    }

    /// All versions for a chapter, newest first.
    pub async fn translation_versions(
        &self,
        chapter_ref: &ChapterRef,
    ) -> StoreResult<Vec<TranslationVersion>> {
        self.versions.list_versions(chapter_ref).await
    }

    pub async fn set_active_version(
        &self,
        chapter_ref: &ChapterRef,
        version: u32,
    ) -> StoreResult<TranslationVersion> {
        self.versions.set_active(chapter_ref, version).await
    }

    pub async fn delete_version(&self, id: &str) -> StoreResult<bool> {
        self.versions.delete_version(id).await
    }

    pub async fn delete_version_number(
        &self,
        chapter_ref: &ChapterRef,
        version: u32,
    ) -> StoreResult<()> {
        self.versions.delete_version_number(chapter_ref, version).await
    }

    // --- Export reads (session/EPUB collaborators) ---

    /// Everything in the store, as a consistent snapshot of completed
    /// writes. No cross-collection transactional guarantee: a write that
    /// lands between the three reads shows up only in the later ones.
    pub fn export_snapshot(&self) -> StoreResult<LibrarySnapshot> {
        Ok(LibrarySnapshot {
            chapters: self.chapters.list()?,
            mappings: self.resolver.list_mappings()?,
            versions: self.store.list_versions()?,
        })
    }

    /// All versions carrying a stable id (denormalized lookup path).
    pub fn versions_for_stable_id(&self, stable_id: &str) -> StoreResult<Vec<TranslationVersion>> {
        Ok(self.store.versions_for_stable_id(stable_id)?)
    }

    /// All versions for a chapter URL.
    pub fn versions_for_url(&self, url: &str) -> StoreResult<Vec<TranslationVersion>> {
        Ok(self.store.versions_for_url(url)?)
    }

    pub fn list_chapters(&self) -> StoreResult<Vec<Chapter>> {
        self.chapters.list()
    }
}

/// Bulk export payload for the session/EPUB collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub chapters: Vec<Chapter>,
    pub mappings: Vec<IdentityMapping>,
    pub versions: Vec<TranslationVersion>,
}
