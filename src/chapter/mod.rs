//! Chapter storage: records, stable-id derivation, and the chapter store

mod record;
mod store;

use serde::{Deserialize, Serialize};

pub use record::{canonicalize_url, derive_stable_id, Chapter, ChapterInput, CHAPTER_SCHEMA_VERSION};
pub use store::ChapterStore;

/// The addressing scheme callers use for a chapter: a URL, a stable id,
/// or both. At least one field must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChapterRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<String>,
}

impl ChapterRef {
    pub fn by_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            stable_id: None,
        }
    }

    pub fn by_stable_id(stable_id: impl Into<String>) -> Self {
        Self {
            url: None,
            stable_id: Some(stable_id.into()),
        }
    }

    /// Human-readable form for diagnostics.
    pub fn describe(&self) -> String {
        match (&self.url, &self.stable_id) {
            (Some(url), _) => url.clone(),
            (None, Some(id)) => id.clone(),
            (None, None) => "<empty reference>".to_string(),
        }
    }
}
