//! Stable-id resolution with self-healing mappings
//!
//! Resolution tries three strategies in order: direct lookup, format
//! repair, chapter search. Repairs persist a mapping for the exact form
//! queried so the next lookup succeeds directly. Every repair is logged
//! and reported on the `Resolution`, never silent.

use super::{fold_separators, IdentityMapping};
use crate::chapter::ChapterStore;
use crate::error::{StoreError, StoreResult};
use crate::storage::RecordStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Which strategy produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Direct,
    FormatRepair,
    ChapterSearch,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionSource::Direct => "direct",
            ResolutionSource::FormatRepair => "format_repair",
            ResolutionSource::ChapterSearch => "chapter_search",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of resolving a stable id to its current canonical URL.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub url: String,
    pub source: ResolutionSource,
    /// True when resolution had to write a mapping to succeed. Callers
    /// needing strict identity hygiene inspect this.
    pub repaired: bool,
}

/// A named normalization applied to stable ids during format repair.
///
/// Separator folding is the only known drift today; new generators that
/// introduce case or whitespace drift get a new entry, not a rewrite.
#[derive(Clone, Copy)]
pub struct RepairStrategy {
    pub name: &'static str,
    pub normalize: fn(&str) -> String,
}

/// Default repair strategy list.
fn default_repairs() -> Vec<RepairStrategy> {
    vec![RepairStrategy {
        name: "separator_fold",
        normalize: fold_separators,
    }]
}

/// Maps stable ids to canonical URLs, repairing the mapping table as it
/// discovers drifted or missing entries. Owns mapping canonicality; no
/// other component marks rows canonical.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn RecordStore>,
    chapters: ChapterStore,
    repairs: Vec<RepairStrategy>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn RecordStore>, chapters: ChapterStore) -> Self {
        Self {
            store,
            chapters,
            repairs: default_repairs(),
        }
    }

    /// Resolve a stable id to its current canonical URL.
    ///
    /// Strategy order, first success wins: direct mapping lookup, format
    /// repair over the normalizer list, chapter-store search. Exhaustion
    /// fails with `StableIdNotFound` naming the id and all three
    /// strategies.
    pub fn resolve_to_url(&self, stable_id: &str) -> StoreResult<Resolution> {
        // 1. Direct: the mapping table knows this exact form.
        if let Some(mapping) = self.lookup_direct(stable_id)? {
            debug!(stable_id, url = %mapping.url, "resolved stable id directly");
            return Ok(Resolution {
                url: mapping.url,
                source: ResolutionSource::Direct,
                repaired: false,
            });
        }

        // 2. Format repair: normalize both sides and retry.
        for repair in &self.repairs {
            let wanted = (repair.normalize)(stable_id);
            let mut matches: Vec<IdentityMapping> = self
                .store
                .list_mappings()?
                .into_iter()
                .filter(|m| (repair.normalize)(&m.stable_id) == wanted)
                .collect();
            // Canonical first, then oldest; a demoted historical URL must
            // not win over the current canonical mapping.
            matches.sort_by(|a, b| {
                b.is_canonical
                    .cmp(&a.is_canonical)
                    .then(a.date_added.cmp(&b.date_added))
            });
            if let Some(mapping) = matches.into_iter().next() {
                info!(
                    stable_id,
                    stored_as = %mapping.stable_id,
                    strategy = repair.name,
                    "format repair matched a drifted mapping"
                );
                // Persist the exact form queried so the next lookup is direct.
                self.persist_canonical(&mapping.url, stable_id)?;
                return Ok(Resolution {
                    url: mapping.url,
                    source: ResolutionSource::FormatRepair,
                    repaired: true,
                });
            }
        }

        // 3. Chapter search: the chapter exists but was stored before any
        // mapping did; synthesize one.
        if let Some(chapter) = self.chapters.get_by_stable_id(stable_id)? {
            info!(stable_id, url = %chapter.url, "chapter search recovered an unmapped stable id");
            self.persist_canonical(&chapter.url, stable_id)?;
            return Ok(Resolution {
                url: chapter.url,
                source: ResolutionSource::ChapterSearch,
                repaired: true,
            });
        }

        Err(StoreError::StableIdNotFound {
            stable_id: stable_id.to_string(),
        })
    }

    /// Record that `url` carries `stable_id`. Idempotent: repeating the
    /// same pair changes nothing, and canonicality is only granted when
    /// the stable id has no canonical mapping yet.
    pub fn ensure_mapping(&self, url: &str, stable_id: &str) -> StoreResult<()> {
        if let Some(existing) = self.store.mapping_for_url(url)? {
            if existing.stable_id == stable_id {
                return Ok(());
            }
        }
        let has_canonical = self
            .store
            .mappings_for_stable_id(stable_id)?
            .iter()
            .any(|m| m.is_canonical);
        self.put(url, stable_id, !has_canonical)?;
        Ok(())
    }

    /// List every mapping row (export surface).
    pub fn list_mappings(&self) -> StoreResult<Vec<IdentityMapping>> {
        Ok(self.store.list_mappings()?)
    }

    fn lookup_direct(&self, stable_id: &str) -> StoreResult<Option<IdentityMapping>> {
        // mappings_for_stable_id orders canonical rows first.
        Ok(self
            .store
            .mappings_for_stable_id(stable_id)?
            .into_iter()
            .next())
    }

    /// Write a canonical mapping for the exact queried form. The substrate
    /// demotes any other canonical row for this stable id in the same
    /// transaction.
    fn persist_canonical(&self, url: &str, stable_id: &str) -> StoreResult<()> {
        self.put(url, stable_id, true)
    }

    fn put(&self, url: &str, stable_id: &str, is_canonical: bool) -> StoreResult<()> {
        let date_added = self
            .store
            .mapping_for_url(url)?
            .map(|m| m.date_added)
            .unwrap_or_else(Utc::now);
        self.store.put_mapping(&IdentityMapping {
            url: url.to_string(),
            stable_id: stable_id.to_string(),
            is_canonical,
            date_added,
        })?;
        Ok(())
    }
}
