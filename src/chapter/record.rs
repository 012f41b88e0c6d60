//! Chapter records and stable-id derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version written on new chapter rows.
///
/// v1 rows predate the persisted stable id; the SQLite backend's v1→v2
/// migration leaves them NULL for the degraded lookup path to heal.
pub const CHAPTER_SCHEMA_VERSION: u32 = 2;

/// A chapter as persisted in the store.
///
/// `url` is the primary key and may change over the chapter's life;
/// `stable_id` is derived once from the chapter's content and persisted;
/// it is never recomputed on read. Legacy rows may carry `None` until the
/// degraded lookup path discovers and heals them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub url: String,
    pub stable_id: Option<String>,
    pub title: String,
    pub content: String,
    /// The URL the chapter was originally fetched from.
    pub original_url: Option<String>,
    /// Normalized form of `original_url`.
    pub canonical_url: Option<String>,
    pub next_url: Option<String>,
    pub prev_url: Option<String>,
    pub chapter_number: Option<u32>,
    pub date_added: DateTime<Utc>,
    pub last_accessed: Option<DateTime<Utc>>,
    pub schema_version: u32,
}

/// Input for storing a chapter (new or update).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterInput {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Pre-assigned stable id (e.g. from a bulk import); derived when absent.
    pub stable_id: Option<String>,
    pub original_url: Option<String>,
    pub next_url: Option<String>,
    pub prev_url: Option<String>,
    pub chapter_number: Option<u32>,
}

impl ChapterInput {
    /// Create an input with the required fields.
    pub fn new(url: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_stable_id(mut self, stable_id: impl Into<String>) -> Self {
        self.stable_id = Some(stable_id.into());
        self
    }

    pub fn with_original_url(mut self, original_url: impl Into<String>) -> Self {
        self.original_url = Some(original_url.into());
        self
    }

    pub fn with_chapter_number(mut self, n: u32) -> Self {
        self.chapter_number = Some(n);
        self
    }

    pub fn with_links(mut self, prev: Option<String>, next: Option<String>) -> Self {
        self.prev_url = prev;
        self.next_url = next;
        self
    }
}

/// Derive a chapter's stable id from its content, number, and title.
///
/// Deterministic: identical inputs always yield the same id. The id uses
/// `_` as its separator; a legacy generation era used `-`, which the
/// identity resolver folds back together at lookup time.
pub fn derive_stable_id(content: &str, chapter_number: Option<u32>, title: &str) -> String {
    let number = chapter_number.unwrap_or(0);
    let input = format!("{}\u{1f}{}\u{1f}{}", title, number, content);
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, input.as_bytes());
    let digest = digest.simple().to_string();
    format!("{}_{}_{}", slug(title), number, &digest[..8])
}

/// Reduce a title to a short lowercase slug with `_` separators.
fn slug(title: &str) -> String {
    let mut out = String::new();
    let mut last_sep = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
        if out.len() >= 24 {
            break;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "chapter".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Normalize a source URL into its canonical form: fragment stripped,
/// trailing slash removed, scheme and host lowercased.
pub fn canonicalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let url = url.trim_end_matches('/');

    match url.find("://") {
        Some(idx) => {
            let (scheme, rest) = url.split_at(idx + 3);
            let host_end = rest.find('/').unwrap_or(rest.len());
            let (host, path) = rest.split_at(host_end);
            format!("{}{}{}", scheme.to_ascii_lowercase(), host.to_ascii_lowercase(), path)
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_id_is_deterministic() {
        let a = derive_stable_id("once upon a time", Some(1), "The Beginning");
        let b = derive_stable_id("once upon a time", Some(1), "The Beginning");
        assert_eq!(a, b);
    }

    #[test]
    fn stable_id_varies_with_inputs() {
        let a = derive_stable_id("once upon a time", Some(1), "The Beginning");
        let b = derive_stable_id("once upon a time", Some(2), "The Beginning");
        let c = derive_stable_id("different content", Some(1), "The Beginning");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn stable_id_uses_underscore_separators() {
        let id = derive_stable_id("text", Some(3), "A Long Road Home");
        assert!(id.contains('_'));
        assert!(!id.contains('-'));
        assert!(id.starts_with("a_long_road_home_3_"));
    }

    #[test]
    fn slug_handles_empty_and_symbolic_titles() {
        assert_eq!(slug(""), "chapter");
        assert_eq!(slug("!!!"), "chapter");
        assert_eq!(slug("第三章"), "chapter");
    }

    #[test]
    fn canonicalize_strips_fragment_and_trailing_slash() {
        assert_eq!(
            canonicalize_url("HTTPS://Example.COM/novel/ch-1/#comments"),
            "https://example.com/novel/ch-1"
        );
        assert_eq!(
            canonicalize_url("https://example.com/"),
            "https://example.com"
        );
    }

    #[test]
    fn canonicalize_preserves_path_case() {
        assert_eq!(
            canonicalize_url("https://Example.com/Novel/Ch-1"),
            "https://example.com/Novel/Ch-1"
        );
    }
}
