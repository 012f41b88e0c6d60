//! Translation versions: records and the version store

mod record;
mod store;

pub use record::{
    AmendmentProposal, Footnote, SettingsSnapshot, TranslationResult, TranslationVersion,
    UsageMetrics,
};
pub use store::TranslationVersionStore;
