//! Chapter store: upsert by URL, stable-id assignment, degraded lookup

use super::record::{canonicalize_url, derive_stable_id, Chapter, ChapterInput, CHAPTER_SCHEMA_VERSION};
use crate::error::{StoreError, StoreResult};
use crate::identity::fold_separators;
use crate::storage::RecordStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persists chapters keyed by source URL and owns stable-id derivation.
///
/// No other component assigns or rewrites a chapter's stable id.
#[derive(Clone)]
pub struct ChapterStore {
    store: Arc<dyn RecordStore>,
}

impl ChapterStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Upsert a chapter by URL.
    ///
    /// First store assigns a stable id (input-provided or derived) and
    /// `date_added`. Updates replace title/content and sequence links but
    /// preserve `date_added`, an already-assigned stable id, and an
    /// existing canonical URL when the incoming values are empty.
    pub fn store(&self, input: ChapterInput) -> StoreResult<Chapter> {
        let existing = self.store.get_chapter(&input.url)?;

        let chapter = match existing {
            Some(prev) => {
                let stable_id = prev
                    .stable_id
                    .or(input.stable_id)
                    .unwrap_or_else(|| {
                        derive_stable_id(&input.content, input.chapter_number, &input.title)
                    });
                let original_url = input.original_url.or(prev.original_url);
                let canonical_url = original_url
                    .as_deref()
                    .map(canonicalize_url)
                    .or(prev.canonical_url);
                Chapter {
                    url: input.url,
                    stable_id: Some(stable_id),
                    title: input.title,
                    content: input.content,
                    original_url,
                    canonical_url,
                    next_url: input.next_url.or(prev.next_url),
                    prev_url: input.prev_url.or(prev.prev_url),
                    chapter_number: input.chapter_number.or(prev.chapter_number),
                    date_added: prev.date_added,
                    last_accessed: prev.last_accessed,
                    schema_version: CHAPTER_SCHEMA_VERSION,
                }
            }
            None => {
                let stable_id = input.stable_id.clone().unwrap_or_else(|| {
                    derive_stable_id(&input.content, input.chapter_number, &input.title)
                });
                let canonical_url = input.original_url.as_deref().map(canonicalize_url);
                Chapter {
                    url: input.url,
                    stable_id: Some(stable_id),
                    title: input.title,
                    content: input.content,
                    original_url: input.original_url,
                    canonical_url,
                    next_url: input.next_url,
                    prev_url: input.prev_url,
                    chapter_number: input.chapter_number,
                    date_added: Utc::now(),
                    last_accessed: None,
                    schema_version: CHAPTER_SCHEMA_VERSION,
                }
            }
        };

        self.store.put_chapter(&chapter)?;
        debug!(url = %chapter.url, stable_id = ?chapter.stable_id, "stored chapter");
        Ok(chapter)
    }

    /// Load a chapter by URL.
    pub fn get(&self, url: &str) -> StoreResult<Option<Chapter>> {
        Ok(self.store.get_chapter(url)?)
    }

    /// Load a chapter by stable id.
    ///
    /// Tries the indexed column first, then falls back to a linear scan
    /// that matches persisted ids (exact or separator-folded) and derives
    /// ids for rows written before the stable-id column existed. The scan
    /// is degraded but correct; a hit on an untagged row persists the
    /// discovered id so the next lookup is indexed.
    pub fn get_by_stable_id(&self, stable_id: &str) -> StoreResult<Option<Chapter>> {
        if let Some(chapter) = self.store.chapter_by_stable_id(stable_id)? {
            return Ok(Some(chapter));
        }

        warn!(stable_id, "stable id missed the index, scanning all chapters");
        let folded = fold_separators(stable_id);
        for mut chapter in self.store.list_chapters()? {
            let known = match &chapter.stable_id {
                Some(id) => id.clone(),
                // Pre-v2 row: the id was never persisted, derive it now.
                None => derive_stable_id(
                    &chapter.content,
                    chapter.chapter_number,
                    &chapter.title,
                ),
            };
            if known == stable_id || fold_separators(&known) == folded {
                if chapter.stable_id.is_none() {
                    chapter.stable_id = Some(known);
                    chapter.schema_version = CHAPTER_SCHEMA_VERSION;
                    self.store.put_chapter(&chapter)?;
                    info!(url = %chapter.url, stable_id, "healed chapter row with derived stable id");
                }
                return Ok(Some(chapter));
            }
        }

        Ok(None)
    }

    /// Update a chapter's number. The persisted stable id is untouched;
    /// it was derived at first store and stays valid.
    pub fn set_chapter_number(&self, stable_id: &str, n: u32) -> StoreResult<Chapter> {
        let mut chapter = self
            .get_by_stable_id(stable_id)?
            .ok_or_else(|| StoreError::ChapterNotFound {
                stable_id: stable_id.to_string(),
            })?;
        chapter.chapter_number = Some(n);
        self.store.put_chapter(&chapter)?;
        debug!(stable_id, chapter_number = n, "set chapter number");
        Ok(chapter)
    }

    /// Record a read access.
    pub fn touch_accessed(&self, url: &str) -> StoreResult<()> {
        if let Some(mut chapter) = self.store.get_chapter(url)? {
            chapter.last_accessed = Some(Utc::now());
            self.store.put_chapter(&chapter)?;
        }
        Ok(())
    }

    /// Load every chapter.
    pub fn list(&self) -> StoreResult<Vec<Chapter>> {
        Ok(self.store.list_chapters()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{OpenRecordStore, SqliteStore};

    fn store() -> ChapterStore {
        ChapterStore::new(Arc::new(SqliteStore::open_in_memory().unwrap()))
    }

    #[test]
    fn first_store_assigns_stable_id_and_date_added() {
        let chapters = store();
        let chapter = chapters
            .store(ChapterInput::new("https://example.com/ch-1", "One", "text"))
            .unwrap();
        assert!(chapter.stable_id.is_some());
        assert_eq!(chapter.schema_version, CHAPTER_SCHEMA_VERSION);
    }

    #[test]
    fn update_preserves_identity_fields() {
        let chapters = store();
        let first = chapters
            .store(
                ChapterInput::new("https://example.com/ch-1", "One", "text")
                    .with_original_url("https://Origin.example/ch-1/"),
            )
            .unwrap();

        // Update with new content, no original URL this time.
        let updated = chapters
            .store(ChapterInput::new(
                "https://example.com/ch-1",
                "One (edited)",
                "revised text",
            ))
            .unwrap();

        assert_eq!(updated.date_added, first.date_added);
        assert_eq!(updated.stable_id, first.stable_id, "content edits do not re-derive the id");
        assert_eq!(updated.canonical_url, first.canonical_url);
        assert_eq!(updated.title, "One (edited)");
        assert_eq!(updated.content, "revised text");
    }

    #[test]
    fn explicit_stable_id_wins_over_derivation() {
        let chapters = store();
        let chapter = chapters
            .store(
                ChapterInput::new("https://example.com/ch-1", "One", "text")
                    .with_stable_id("nov-1-ch-1"),
            )
            .unwrap();
        assert_eq!(chapter.stable_id.as_deref(), Some("nov-1-ch-1"));
    }

    #[test]
    fn lookup_by_folded_separator_form() {
        let chapters = store();
        chapters
            .store(
                ChapterInput::new("https://example.com/ch-1", "One", "text")
                    .with_stable_id("nov-1-ch-1"),
            )
            .unwrap();

        let hit = chapters.get_by_stable_id("nov_1_ch_1").unwrap();
        assert!(hit.is_some(), "separator-folded form reaches the same chapter");
    }

    #[test]
    fn scan_heals_row_without_persisted_id() {
        let raw = Arc::new(SqliteStore::open_in_memory().unwrap());
        let chapters = ChapterStore::new(raw.clone());

        // Simulate a pre-v2 row: stored without a stable id.
        let legacy = Chapter {
            url: "https://example.com/old".to_string(),
            stable_id: None,
            title: "Old".to_string(),
            content: "old text".to_string(),
            original_url: None,
            canonical_url: None,
            next_url: None,
            prev_url: None,
            chapter_number: Some(7),
            date_added: Utc::now(),
            last_accessed: None,
            schema_version: 1,
        };
        raw.put_chapter(&legacy).unwrap();

        let expected = derive_stable_id("old text", Some(7), "Old");
        let found = chapters.get_by_stable_id(&expected).unwrap().unwrap();
        assert_eq!(found.url, legacy.url);

        // The discovered id was persisted; the next lookup is indexed.
        let healed = raw.chapter_by_stable_id(&expected).unwrap().unwrap();
        assert_eq!(healed.stable_id.as_deref(), Some(expected.as_str()));
        assert_eq!(healed.schema_version, CHAPTER_SCHEMA_VERSION);
    }

    #[test]
    fn touch_accessed_records_the_read() {
        let chapters = store();
        let stored = chapters
            .store(ChapterInput::new("https://example.com/ch-1", "One", "text"))
            .unwrap();
        assert!(stored.last_accessed.is_none());

        chapters.touch_accessed("https://example.com/ch-1").unwrap();
        let read = chapters.get("https://example.com/ch-1").unwrap().unwrap();
        assert!(read.last_accessed.is_some());

        // Touching an unknown URL is a no-op, not an error.
        chapters.touch_accessed("https://example.com/ghost").unwrap();
    }

    #[test]
    fn set_chapter_number_requires_a_match() {
        let chapters = store();
        let err = chapters.set_chapter_number("ghost_9_00000000", 9).unwrap_err();
        assert!(matches!(err, StoreError::ChapterNotFound { .. }));
    }
}
