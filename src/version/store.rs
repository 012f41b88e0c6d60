//! Translation version store
//!
//! Owns the two version invariants: version numbers are strictly
//! increasing and never reused, and whenever at least one version exists
//! exactly one is active. Every read-modify-write here runs under the
//! per-chapter lock and lands in a single atomic substrate batch, so a
//! failed store never leaves two active records or an orphan.

use crate::chapter::{ChapterRef, ChapterStore};
use crate::coordinator::KeyedLock;
use crate::error::{StoreError, StoreResult};
use crate::identity::IdentityResolver;
use crate::storage::RecordStore;
use crate::version::{SettingsSnapshot, TranslationResult, TranslationVersion};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct TranslationVersionStore {
    store: Arc<dyn RecordStore>,
    chapters: ChapterStore,
    resolver: IdentityResolver,
    coordinator: Arc<KeyedLock>,
}

impl TranslationVersionStore {
    pub fn new(
        store: Arc<dyn RecordStore>,
        chapters: ChapterStore,
        resolver: IdentityResolver,
        coordinator: Arc<KeyedLock>,
    ) -> Self {
        Self {
            store,
            chapters,
            resolver,
            coordinator,
        }
    }

    /// Store a new translation version for a chapter.
    ///
    /// Stable-id refs go through the resolver first (including its
    /// auto-repair); this is the main place callers observe resolver
    /// self-healing. The new record gets the next never-used version
    /// number and becomes the sole active version.
    pub async fn store(
        &self,
        chapter_ref: &ChapterRef,
        result: TranslationResult,
        settings: SettingsSnapshot,
    ) -> StoreResult<TranslationVersion> {
        let (url, stable_id) = self.resolve_ref(chapter_ref)?;
        let _guard = self.coordinator.acquire(&url).await;

        let existing = self.store.versions_for_url(&url)?;
        // The high-water mark outlives deleted records; numbers are never
        // reused even after the newest version is removed.
        let max_existing = existing.iter().map(|v| v.version).max().unwrap_or(0);
        let next_version = max_existing.max(self.store.version_high_water(&url)?) + 1;

        let mut upserts: Vec<TranslationVersion> = existing
            .into_iter()
            .filter(|v| v.is_active)
            .map(|mut v| {
                v.is_active = false;
                v
            })
            .collect();

        let record = TranslationVersion {
            id: TranslationVersion::generate_id(),
            chapter_url: url.clone(),
            stable_id,
            version: next_version,
            is_active: true,
            translated_title: result.translated_title,
            translated_content: result.translated_content,
            footnotes: result.footnotes,
            settings,
            usage: result.usage,
            amendment: result.amendment,
            created_at: Utc::now(),
        };
        upserts.push(record.clone());

        self.store.apply_versions(&upserts, &[])?;
        info!(url = %url, version = next_version, id = %record.id, "stored translation version");
        Ok(record)
    }

    /// The currently active version, or None when no translation exists
    /// yet. None is a valid answer, never an error.
    pub async fn get_active(&self, chapter_ref: &ChapterRef) -> StoreResult<Option<TranslationVersion>> {
        let (url, _) = self.resolve_ref(chapter_ref)?;
        Ok(self
            .store
            .versions_for_url(&url)?
            .into_iter()
            .find(|v| v.is_active))
    }

    /// All versions for a chapter, newest version number first.
    pub async fn list_versions(&self, chapter_ref: &ChapterRef) -> StoreResult<Vec<TranslationVersion>> {
        let (url, _) = self.resolve_ref(chapter_ref)?;
        let mut versions = self.store.versions_for_url(&url)?;
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    /// Flip exactly the targeted version to active, all others inactive.
    pub async fn set_active(&self, chapter_ref: &ChapterRef, version: u32) -> StoreResult<TranslationVersion> {
        let (url, _) = self.resolve_ref(chapter_ref)?;
        let _guard = self.coordinator.acquire(&url).await;

        let mut target = None;
        let mut updates = Vec::new();
        for mut v in self.store.versions_for_url(&url)? {
            let should_be_active = v.version == version;
            if should_be_active {
                let mut hit = v.clone();
                hit.is_active = true;
                target = Some(hit);
            }
            if v.is_active != should_be_active {
                v.is_active = should_be_active;
                updates.push(v);
            }
        }
        let target = target.ok_or_else(|| StoreError::VersionNotFound {
            chapter_url: url.clone(),
            version,
        })?;

        self.store.apply_versions(&updates, &[])?;
        debug!(url = %url, version, "switched active version");
        Ok(target)
    }

    /// Delete a version by its opaque id. Returns false when the id is
    /// unknown. Deleting the active version promotes the highest
    /// remaining one; deleting the last version leaves zero records,
    /// which is a valid terminal state.
    pub async fn delete_version(&self, id: &str) -> StoreResult<bool> {
        let Some(found) = self.store.version_by_id(id)? else {
            return Ok(false);
        };
        let _guard = self.coordinator.acquire(&found.chapter_url).await;

        // Re-read under the lock; a concurrent delete may have won.
        let Some(record) = self.store.version_by_id(id)? else {
            return Ok(false);
        };
        self.delete_locked(record)?;
        Ok(true)
    }

    /// Delete a version by its number for a chapter.
    pub async fn delete_version_number(&self, chapter_ref: &ChapterRef, version: u32) -> StoreResult<()> {
        let (url, _) = self.resolve_ref(chapter_ref)?;
        let _guard = self.coordinator.acquire(&url).await;

        let record = self
            .store
            .versions_for_url(&url)?
            .into_iter()
            .find(|v| v.version == version)
            .ok_or_else(|| StoreError::VersionNotFound {
                chapter_url: url.clone(),
                version,
            })?;
        self.delete_locked(record)
    }

    /// Remove a record and, when it was active, promote the highest
    /// remaining version in one atomic batch. Caller holds the lock.
    fn delete_locked(&self, record: TranslationVersion) -> StoreResult<()> {
        let remaining: Vec<TranslationVersion> = self
            .store
            .versions_for_url(&record.chapter_url)?
            .into_iter()
            .filter(|v| v.id != record.id)
            .collect();

        let mut upserts = Vec::new();
        if record.is_active {
            if let Some(mut successor) = remaining.into_iter().max_by_key(|v| v.version) {
                successor.is_active = true;
                info!(
                    url = %record.chapter_url,
                    promoted = successor.version,
                    deleted = record.version,
                    "promoted highest remaining version to active"
                );
                upserts.push(successor);
            }
        }

        self.store
            .apply_versions(&upserts, &[record.id.clone()])?;
        debug!(url = %record.chapter_url, version = record.version, "deleted translation version");
        Ok(())
    }

    /// Resolve a `ChapterRef` to the chapter's URL and stable id.
    ///
    /// URL refs must name a stored chapter (`ChapterRequired` otherwise);
    /// stable-id refs resolve through the identity resolver with its full
    /// repair ladder.
    fn resolve_ref(&self, chapter_ref: &ChapterRef) -> StoreResult<(String, Option<String>)> {
        if let Some(url) = &chapter_ref.url {
            let chapter = self
                .chapters
                .get(url)?
                .ok_or_else(|| StoreError::ChapterRequired {
                    reference: url.clone(),
                })?;
            if let Some(stable_id) = &chapter.stable_id {
                self.resolver.ensure_mapping(url, stable_id)?;
            }
            return Ok((chapter.url, chapter.stable_id));
        }

        if let Some(stable_id) = &chapter_ref.stable_id {
            let resolution = self.resolver.resolve_to_url(stable_id)?;
            let chapter = self
                .chapters
                .get(&resolution.url)?
                .ok_or_else(|| StoreError::ChapterRequired {
                    reference: stable_id.clone(),
                })?;
            let sid = chapter.stable_id.or_else(|| Some(stable_id.clone()));
            return Ok((resolution.url, sid));
        }

        Err(StoreError::InvalidReference)
    }
}
