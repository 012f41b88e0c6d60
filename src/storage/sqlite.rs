//! SQLite storage backend
//!
//! Every public method commits as one transaction; the substrate never
//! extends atomicity across calls (that composition belongs to the
//! coordinator). Schema evolution is driven by an explicit version tag in
//! `schema_meta`, one pure migration function per bump.

use super::traits::{OpenRecordStore, RecordStore, StorageError, StorageResult};
use crate::chapter::Chapter;
use crate::identity::IdentityMapping;
use crate::version::TranslationVersion;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Current on-disk schema version.
///
/// v1: chapters keyed by url, no persisted stable id.
/// v2: adds `chapters.stable_id` and its index.
const SCHEMA_VERSION: u32 = 2;

/// SQLite-backed record store.
///
/// A single database file with tables for chapters, identity mappings,
/// and translation versions. Thread-safe via an internal mutex on the
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Initialize the database schema.
    ///
    /// Two-phase: create the v1 base tables (a no-op for existing
    /// databases), then walk the migration ladder from the tagged
    /// version up to `SCHEMA_VERSION`.
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            -- Schema version tag; migrations key off this, not off
            -- probing for columns at runtime.
            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );

            -- Chapters, keyed by source URL (v1 base: no stable_id yet)
            CREATE TABLE IF NOT EXISTS chapters (
                url TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                original_url TEXT,
                canonical_url TEXT,
                next_url TEXT,
                prev_url TEXT,
                chapter_number INTEGER,
                date_added TEXT NOT NULL,
                last_accessed TEXT,
                schema_version INTEGER NOT NULL DEFAULT 1
            );

            -- Identity mappings, keyed by URL; many URLs per stable id
            CREATE TABLE IF NOT EXISTS url_mappings (
                url TEXT PRIMARY KEY,
                stable_id TEXT NOT NULL,
                is_canonical INTEGER NOT NULL DEFAULT 0,
                date_added TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mappings_stable_id
                ON url_mappings(stable_id);

            -- Translation versions, keyed by opaque id
            CREATE TABLE IF NOT EXISTS translation_versions (
                id TEXT PRIMARY KEY,
                chapter_url TEXT NOT NULL,
                stable_id TEXT,
                version INTEGER NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                translated_title TEXT NOT NULL,
                translated_content TEXT NOT NULL,
                footnotes_json TEXT NOT NULL DEFAULT '[]',
                settings_json TEXT NOT NULL,
                usage_json TEXT NOT NULL,
                amendment_json TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_versions_chapter_url
                ON translation_versions(chapter_url);
            CREATE INDEX IF NOT EXISTS idx_versions_stable_id
                ON translation_versions(stable_id);

            -- Per-chapter version high-water mark; never lowered, so
            -- version numbers survive deletion of the newest records.
            CREATE TABLE IF NOT EXISTS version_counters (
                chapter_url TEXT PRIMARY KEY,
                high_water INTEGER NOT NULL
            );

            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;

        let mut version = Self::schema_version(conn)?;
        while version < SCHEMA_VERSION {
            match version {
                1 => Self::migrate_v2_chapter_stable_ids(conn)?,
                _ => break,
            }
            version += 1;
            Self::set_schema_version(conn, version)?;
        }

        Ok(())
    }

    fn schema_version(conn: &Connection) -> StorageResult<u32> {
        let version: Option<u32> = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version.unwrap_or(1))
    }

    fn set_schema_version(conn: &Connection, version: u32) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO schema_meta (key, value) VALUES ('schema_version', ?1)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![version],
        )?;
        Ok(())
    }

    /// Migration v1 → v2: persist stable ids on chapter rows.
    ///
    /// Existing rows keep a NULL stable id; the chapter store's scan
    /// fallback derives and heals them on first lookup.
    fn migrate_v2_chapter_stable_ids(conn: &Connection) -> StorageResult<()> {
        conn.execute("ALTER TABLE chapters ADD COLUMN stable_id TEXT", [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chapters_stable_id ON chapters(stable_id)",
            [],
        )?;
        Ok(())
    }

    fn parse_date(value: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(e.to_string()))
    }

    #[allow(clippy::type_complexity)]
    fn row_to_chapter(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(
        String,
        Option<String>,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<String>,
        Option<u32>,
        String,
        Option<String>,
        u32,
    )> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ))
    }

    #[allow(clippy::type_complexity)]
    fn chapter_from_row(
        raw: (
            String,
            Option<String>,
            String,
            String,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<u32>,
            String,
            Option<String>,
            u32,
        ),
    ) -> StorageResult<Chapter> {
        let (
            url,
            stable_id,
            title,
            content,
            original_url,
            canonical_url,
            next_url,
            prev_url,
            chapter_number,
            date_added,
            last_accessed,
            schema_version,
        ) = raw;
        Ok(Chapter {
            url,
            stable_id,
            title,
            content,
            original_url,
            canonical_url,
            next_url,
            prev_url,
            chapter_number,
            date_added: Self::parse_date(&date_added)?,
            last_accessed: last_accessed.as_deref().map(Self::parse_date).transpose()?,
            schema_version,
        })
    }

    const CHAPTER_COLUMNS: &'static str = "url, stable_id, title, content, original_url, \
         canonical_url, next_url, prev_url, chapter_number, date_added, last_accessed, schema_version";

    fn mapping_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, bool, String)> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get::<_, i64>(2)? != 0,
            row.get(3)?,
        ))
    }

    fn mapping_from_raw(raw: (String, String, bool, String)) -> StorageResult<IdentityMapping> {
        let (url, stable_id, is_canonical, date_added) = raw;
        Ok(IdentityMapping {
            url,
            stable_id,
            is_canonical,
            date_added: Self::parse_date(&date_added)?,
        })
    }

    #[allow(clippy::type_complexity)]
    fn version_from_row(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(
        String,
        String,
        Option<String>,
        u32,
        bool,
        String,
        String,
        String,
        String,
        String,
        Option<String>,
        String,
    )> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get::<_, i64>(4)? != 0,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
        ))
    }

    #[allow(clippy::type_complexity)]
    fn version_from_raw(
        raw: (
            String,
            String,
            Option<String>,
            u32,
            bool,
            String,
            String,
            String,
            String,
            String,
            Option<String>,
            String,
        ),
    ) -> StorageResult<TranslationVersion> {
        let (
            id,
            chapter_url,
            stable_id,
            version,
            is_active,
            translated_title,
            translated_content,
            footnotes_json,
            settings_json,
            usage_json,
            amendment_json,
            created_at,
        ) = raw;
        Ok(TranslationVersion {
            id,
            chapter_url,
            stable_id,
            version,
            is_active,
            translated_title,
            translated_content,
            footnotes: serde_json::from_str(&footnotes_json)?,
            settings: serde_json::from_str(&settings_json)?,
            usage: serde_json::from_str(&usage_json)?,
            amendment: amendment_json
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            created_at: Self::parse_date(&created_at)?,
        })
    }

    const VERSION_COLUMNS: &'static str = "id, chapter_url, stable_id, version, is_active, \
         translated_title, translated_content, footnotes_json, settings_json, usage_json, \
         amendment_json, created_at";

    fn upsert_version(conn: &Connection, v: &TranslationVersion) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO translation_versions (id, chapter_url, stable_id, version, is_active,
                translated_title, translated_content, footnotes_json, settings_json, usage_json,
                amendment_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(id) DO UPDATE SET
                chapter_url = excluded.chapter_url,
                stable_id = excluded.stable_id,
                version = excluded.version,
                is_active = excluded.is_active,
                translated_title = excluded.translated_title,
                translated_content = excluded.translated_content,
                footnotes_json = excluded.footnotes_json,
                settings_json = excluded.settings_json,
                usage_json = excluded.usage_json,
                amendment_json = excluded.amendment_json
            "#,
            params![
                v.id,
                v.chapter_url,
                v.stable_id,
                v.version,
                v.is_active as i64,
                v.translated_title,
                v.translated_content,
                serde_json::to_string(&v.footnotes)?,
                serde_json::to_string(&v.settings)?,
                serde_json::to_string(&v.usage)?,
                v.amendment
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?,
                v.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl OpenRecordStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl RecordStore for SqliteStore {
    // === Chapters ===

    fn put_chapter(&self, chapter: &Chapter) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO chapters (url, stable_id, title, content, original_url, canonical_url,
                next_url, prev_url, chapter_number, date_added, last_accessed, schema_version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(url) DO UPDATE SET
                stable_id = excluded.stable_id,
                title = excluded.title,
                content = excluded.content,
                original_url = excluded.original_url,
                canonical_url = excluded.canonical_url,
                next_url = excluded.next_url,
                prev_url = excluded.prev_url,
                chapter_number = excluded.chapter_number,
                date_added = excluded.date_added,
                last_accessed = excluded.last_accessed,
                schema_version = excluded.schema_version
            "#,
            params![
                chapter.url,
                chapter.stable_id,
                chapter.title,
                chapter.content,
                chapter.original_url,
                chapter.canonical_url,
                chapter.next_url,
                chapter.prev_url,
                chapter.chapter_number,
                chapter.date_added.to_rfc3339(),
                chapter.last_accessed.map(|d| d.to_rfc3339()),
                chapter.schema_version,
            ],
        )?;
        Ok(())
    }

    fn get_chapter(&self, url: &str) -> StorageResult<Option<Chapter>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM chapters WHERE url = ?1",
                    Self::CHAPTER_COLUMNS
                ),
                params![url],
                Self::row_to_chapter,
            )
            .optional()?;
        raw.map(Self::chapter_from_row).transpose()
    }

    fn chapter_by_stable_id(&self, stable_id: &str) -> StorageResult<Option<Chapter>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM chapters WHERE stable_id = ?1",
                    Self::CHAPTER_COLUMNS
                ),
                params![stable_id],
                Self::row_to_chapter,
            )
            .optional()?;
        raw.map(Self::chapter_from_row).transpose()
    }

    fn list_chapters(&self) -> StorageResult<Vec<Chapter>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chapters ORDER BY date_added ASC",
            Self::CHAPTER_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_chapter)?;

        let mut chapters = Vec::new();
        for raw in rows {
            chapters.push(Self::chapter_from_row(raw?)?);
        }
        Ok(chapters)
    }

    // === Identity mappings ===

    fn put_mapping(&self, mapping: &IdentityMapping) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        if mapping.is_canonical {
            // Single canonical row per stable id, demotion and upsert in
            // one transaction.
            tx.execute(
                "UPDATE url_mappings SET is_canonical = 0 WHERE stable_id = ?1 AND url != ?2",
                params![mapping.stable_id, mapping.url],
            )?;
        }
        tx.execute(
            r#"
            INSERT INTO url_mappings (url, stable_id, is_canonical, date_added)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(url) DO UPDATE SET
                stable_id = excluded.stable_id,
                is_canonical = excluded.is_canonical,
                date_added = excluded.date_added
            "#,
            params![
                mapping.url,
                mapping.stable_id,
                mapping.is_canonical as i64,
                mapping.date_added.to_rfc3339(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn mapping_for_url(&self, url: &str) -> StorageResult<Option<IdentityMapping>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                "SELECT url, stable_id, is_canonical, date_added FROM url_mappings WHERE url = ?1",
                params![url],
                Self::mapping_from_row,
            )
            .optional()?;
        raw.map(Self::mapping_from_raw).transpose()
    }

    fn mappings_for_stable_id(&self, stable_id: &str) -> StorageResult<Vec<IdentityMapping>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT url, stable_id, is_canonical, date_added FROM url_mappings
             WHERE stable_id = ?1 ORDER BY is_canonical DESC, date_added ASC",
        )?;
        let rows = stmt.query_map(params![stable_id], Self::mapping_from_row)?;

        let mut mappings = Vec::new();
        for raw in rows {
            mappings.push(Self::mapping_from_raw(raw?)?);
        }
        Ok(mappings)
    }

    fn list_mappings(&self) -> StorageResult<Vec<IdentityMapping>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT url, stable_id, is_canonical, date_added FROM url_mappings ORDER BY date_added ASC",
        )?;
        let rows = stmt.query_map([], Self::mapping_from_row)?;

        let mut mappings = Vec::new();
        for raw in rows {
            mappings.push(Self::mapping_from_raw(raw?)?);
        }
        Ok(mappings)
    }

    // === Translation versions ===

    fn apply_versions(
        &self,
        upserts: &[TranslationVersion],
        delete_ids: &[String],
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for id in delete_ids {
            tx.execute(
                "DELETE FROM translation_versions WHERE id = ?1",
                params![id],
            )?;
        }
        for version in upserts {
            Self::upsert_version(&tx, version)?;
            tx.execute(
                r#"
                INSERT INTO version_counters (chapter_url, high_water) VALUES (?1, ?2)
                ON CONFLICT(chapter_url) DO UPDATE SET
                    high_water = MAX(high_water, excluded.high_water)
                "#,
                params![version.chapter_url, version.version],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn version_high_water(&self, chapter_url: &str) -> StorageResult<u32> {
        let conn = self.conn.lock().unwrap();
        let high: Option<u32> = conn
            .query_row(
                "SELECT high_water FROM version_counters WHERE chapter_url = ?1",
                params![chapter_url],
                |row| row.get(0),
            )
            .optional()?;
        Ok(high.unwrap_or(0))
    }

    fn version_by_id(&self, id: &str) -> StorageResult<Option<TranslationVersion>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM translation_versions WHERE id = ?1",
                    Self::VERSION_COLUMNS
                ),
                params![id],
                Self::version_from_row,
            )
            .optional()?;
        raw.map(Self::version_from_raw).transpose()
    }

    fn versions_for_url(&self, chapter_url: &str) -> StorageResult<Vec<TranslationVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM translation_versions WHERE chapter_url = ?1 ORDER BY version ASC",
            Self::VERSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![chapter_url], Self::version_from_row)?;

        let mut versions = Vec::new();
        for raw in rows {
            versions.push(Self::version_from_raw(raw?)?);
        }
        Ok(versions)
    }

    fn versions_for_stable_id(&self, stable_id: &str) -> StorageResult<Vec<TranslationVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM translation_versions WHERE stable_id = ?1 ORDER BY version ASC",
            Self::VERSION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![stable_id], Self::version_from_row)?;

        let mut versions = Vec::new();
        for raw in rows {
            versions.push(Self::version_from_raw(raw?)?);
        }
        Ok(versions)
    }

    fn list_versions(&self) -> StorageResult<Vec<TranslationVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM translation_versions ORDER BY chapter_url ASC, version ASC",
            Self::VERSION_COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::version_from_row)?;

        let mut versions = Vec::new();
        for raw in rows {
            versions.push(Self::version_from_raw(raw?)?);
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chapter::CHAPTER_SCHEMA_VERSION;

    fn chapter(url: &str, stable_id: Option<&str>) -> Chapter {
        Chapter {
            url: url.to_string(),
            stable_id: stable_id.map(|s| s.to_string()),
            title: "Title".to_string(),
            content: "Content".to_string(),
            original_url: None,
            canonical_url: None,
            next_url: None,
            prev_url: None,
            chapter_number: Some(1),
            date_added: Utc::now(),
            last_accessed: None,
            schema_version: CHAPTER_SCHEMA_VERSION,
        }
    }

    #[test]
    fn fresh_store_is_at_current_schema_version() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.conn.lock().unwrap();
        assert_eq!(SqliteStore::schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn chapter_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .put_chapter(&chapter("https://example.com/ch-1", Some("title_1_abcd1234")))
            .unwrap();

        let loaded = store.get_chapter("https://example.com/ch-1").unwrap().unwrap();
        assert_eq!(loaded.stable_id.as_deref(), Some("title_1_abcd1234"));
        assert_eq!(loaded.title, "Title");

        let by_id = store.chapter_by_stable_id("title_1_abcd1234").unwrap();
        assert!(by_id.is_some());
    }

    #[test]
    fn canonical_mapping_demotes_previous() {
        let store = SqliteStore::open_in_memory().unwrap();
        let now = Utc::now();
        store
            .put_mapping(&IdentityMapping {
                url: "https://a.example/1".to_string(),
                stable_id: "ch_1_x".to_string(),
                is_canonical: true,
                date_added: now,
            })
            .unwrap();
        store
            .put_mapping(&IdentityMapping {
                url: "https://b.example/1".to_string(),
                stable_id: "ch_1_x".to_string(),
                is_canonical: true,
                date_added: now,
            })
            .unwrap();

        let mappings = store.mappings_for_stable_id("ch_1_x").unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(
            mappings.iter().filter(|m| m.is_canonical).count(),
            1,
            "exactly one canonical mapping per stable id"
        );
        assert_eq!(mappings[0].url, "https://b.example/1");
    }

    #[test]
    fn apply_versions_is_atomic_batch() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut v1 = TranslationVersion {
            id: TranslationVersion::generate_id(),
            chapter_url: "https://example.com/ch-1".to_string(),
            stable_id: Some("title_1_abcd1234".to_string()),
            version: 1,
            is_active: true,
            translated_title: "T1".to_string(),
            translated_content: "C1".to_string(),
            footnotes: Vec::new(),
            settings: Default::default(),
            usage: Default::default(),
            amendment: None,
            created_at: Utc::now(),
        };
        store.apply_versions(std::slice::from_ref(&v1), &[]).unwrap();

        let mut v2 = v1.clone();
        v2.id = TranslationVersion::generate_id();
        v2.version = 2;
        v1.is_active = false;
        store.apply_versions(&[v1.clone(), v2.clone()], &[]).unwrap();

        let versions = store.versions_for_url("https://example.com/ch-1").unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions.iter().filter(|v| v.is_active).count(), 1);

        // Delete and upsert in the same batch
        store.apply_versions(&[], &[v2.id.clone()]).unwrap();
        let versions = store.versions_for_url("https://example.com/ch-1").unwrap();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].id, v1.id);
    }

    #[test]
    fn secondary_lookup_by_stable_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let v = TranslationVersion {
            id: TranslationVersion::generate_id(),
            chapter_url: "https://example.com/ch-2".to_string(),
            stable_id: Some("other_2_ffff0000".to_string()),
            version: 1,
            is_active: true,
            translated_title: "T".to_string(),
            translated_content: "C".to_string(),
            footnotes: Vec::new(),
            settings: Default::default(),
            usage: Default::default(),
            amendment: None,
            created_at: Utc::now(),
        };
        store.apply_versions(std::slice::from_ref(&v), &[]).unwrap();

        let by_sid = store.versions_for_stable_id("other_2_ffff0000").unwrap();
        assert_eq!(by_sid.len(), 1);
        assert_eq!(by_sid[0].id, v.id);
        assert!(store.version_by_id(&v.id).unwrap().is_some());
    }
}
