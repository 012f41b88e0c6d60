//! Caller-owned migration session
//!
//! One-time bulk imports from a legacy store used to toggle a process-wide
//! "migration in progress" flag. This replaces that with an explicit
//! session object: the caller starts it, routes imports through it, and
//! completes it. The store itself is unaware a migration is happening;
//! imports use the normal write APIs with ordinary upsert semantics.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::Library;
use crate::chapter::{Chapter, ChapterInput, ChapterRef};
use crate::error::StoreResult;
use crate::version::{SettingsSnapshot, TranslationResult, TranslationVersion};

/// Tracks one bulk import from start to completion.
#[derive(Debug)]
pub struct MigrationSession {
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    chapters_imported: usize,
    versions_imported: usize,
}

impl MigrationSession {
    /// Begin a migration session.
    pub fn start() -> Self {
        info!("migration session started");
        Self {
            started_at: Utc::now(),
            completed_at: None,
            chapters_imported: 0,
            versions_imported: 0,
        }
    }

    /// Import one chapter through the normal chapter-store write path.
    pub fn import_chapter(&mut self, library: &Library, input: ChapterInput) -> StoreResult<Chapter> {
        if self.is_complete() {
            warn!("import after migration session completed");
        }
        let chapter = library.store_chapter(input)?;
        self.chapters_imported += 1;
        Ok(chapter)
    }

    /// Import one translation version through the normal version-store
    /// write path.
    pub async fn import_translation(
        &mut self,
        library: &Library,
        chapter_ref: &ChapterRef,
        result: TranslationResult,
        settings: SettingsSnapshot,
    ) -> StoreResult<TranslationVersion> {
        if self.is_complete() {
            warn!("import after migration session completed");
        }
        let version = library.store_translation(chapter_ref, result, settings).await?;
        self.versions_imported += 1;
        Ok(version)
    }

    /// Mark the session complete.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
        info!(
            chapters = self.chapters_imported,
            versions = self.versions_imported,
            "migration session completed"
        );
    }

    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn chapters_imported(&self) -> usize {
        self.chapters_imported
    }

    pub fn versions_imported(&self) -> usize {
        self.versions_imported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_tracks_lifecycle_and_counts() {
        let library = Library::open_in_memory().unwrap();
        let mut session = MigrationSession::start();
        assert!(!session.is_complete());

        session
            .import_chapter(
                &library,
                ChapterInput::new("https://old.example/ch-1", "One", "text"),
            )
            .unwrap();
        session
            .import_translation(
                &library,
                &ChapterRef::by_url("https://old.example/ch-1"),
                TranslationResult::new("One", "translated text"),
                SettingsSnapshot::new("openai", "gpt-4o"),
            )
            .await
            .unwrap();

        session.complete();
        assert!(session.is_complete());
        assert_eq!(session.chapters_imported(), 1);
        assert_eq!(session.versions_imported(), 1);
    }
}
