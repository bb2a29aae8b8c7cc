//! Dedup and quality filtering of normalized items.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{CatalogItem, CatalogKey};

/// Junk heuristic: few votes AND a low rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub min_vote_count: u32,
    pub min_vote_average: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_vote_count: 10,
            min_vote_average: 3.0,
        }
    }
}

impl QualityThresholds {
    pub fn is_junk(&self, item: &CatalogItem) -> bool {
        item.vote_count < self.min_vote_count && item.vote_average < self.min_vote_average
    }
}

/// Returns the items worth showing, in input order
///
/// Drops items already in `accepted`, items without an image, junk items and
/// repeats within the batch. Does not touch `accepted`; callers record what
/// they keep with [`remember`].
pub fn filter_batch(
    items: Vec<CatalogItem>,
    accepted: &HashSet<CatalogKey>,
    thresholds: &QualityThresholds,
) -> Vec<CatalogItem> {
    let mut seen_in_batch = HashSet::new();

    items
        .into_iter()
        .filter(|item| {
            let key = item.key();
            !accepted.contains(&key)
                && item.image_path.is_some()
                && !thresholds.is_junk(item)
                && seen_in_batch.insert(key)
        })
        .collect()
}

/// Records accepted items so later batches skip them
pub fn remember(accepted: &mut HashSet<CatalogKey>, items: &[CatalogItem]) {
    accepted.extend(items.iter().map(CatalogItem::key));
}
