//! Translation version records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored translation attempt for a chapter.
///
/// Append-only: after creation only `is_active` ever changes. Version
/// numbers are unique per chapter, start at 1, and are never reused;
/// the counter derives from the max ever observed, not a row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationVersion {
    /// Opaque, globally unique id.
    pub id: String,
    pub chapter_url: String,
    /// Denormalized copy of the chapter's stable id for lookup.
    pub stable_id: Option<String>,
    pub version: u32,
    pub is_active: bool,
    pub translated_title: String,
    pub translated_content: String,
    pub footnotes: Vec<Footnote>,
    /// Snapshot of the settings the translation was produced with.
    pub settings: SettingsSnapshot,
    pub usage: UsageMetrics,
    /// Structured proposal to amend the chapter source, when the
    /// translator emitted one.
    pub amendment: Option<AmendmentProposal>,
    pub created_at: DateTime<Utc>,
}

impl TranslationVersion {
    /// Generate an opaque version id.
    pub fn generate_id() -> String {
        format!("tv:{}", Uuid::new_v4())
    }
}

/// The output of a translation call, as handed to the version store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_title: String,
    pub translated_content: String,
    #[serde(default)]
    pub footnotes: Vec<Footnote>,
    #[serde(default)]
    pub usage: UsageMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amendment: Option<AmendmentProposal>,
}

impl TranslationResult {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            translated_title: title.into(),
            translated_content: content.into(),
            ..Default::default()
        }
    }
}

/// A translator's footnote attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footnote {
    /// Marker as it appears in the translated text, e.g. `[1]`.
    pub marker: String,
    pub text: String,
}

/// Provider settings frozen at translation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    pub provider: String,
    pub model: String,
    pub temperature: f32,
    #[serde(default)]
    pub system_prompt: String,
}

impl SettingsSnapshot {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            temperature: 0.3,
            system_prompt: String::new(),
        }
    }
}

/// Token and latency accounting for one translation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub request_time_ms: u64,
    pub estimated_cost: f64,
}

/// A structured proposal to fix something in the chapter source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentProposal {
    pub observation: String,
    pub current_value: String,
    pub proposed_value: String,
    pub reasoning: String,
}
