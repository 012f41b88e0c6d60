//! Identity mappings and the auto-repairing stable-id resolver

mod resolver;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use resolver::{IdentityResolver, RepairStrategy, Resolution, ResolutionSource};

/// A row in the identity mapping table, keyed by URL.
///
/// Mappings are many-URL-to-one-stable-id: a chapter stays reachable
/// through every URL it has ever been stored under. For a given stable id
/// at most one mapping is canonical at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityMapping {
    pub url: String,
    pub stable_id: String,
    pub is_canonical: bool,
    pub date_added: DateTime<Utc>,
}

/// Fold the two historical stable-id separator eras into one form.
///
/// Early ids used `-`, later ones `_`; both name the same chapter.
pub fn fold_separators(stable_id: &str) -> String {
    stable_id.replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_separators_unifies_eras() {
        assert_eq!(fold_separators("nov-1-ch-1"), "nov_1_ch_1");
        assert_eq!(fold_separators("nov_1_ch_1"), "nov_1_ch_1");
        assert_eq!(fold_separators("mixed-id_form"), "mixed_id_form");
    }
}
