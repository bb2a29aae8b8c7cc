//! Ranking of filtered items.
//!
//! Order is vote count descending, then vote average descending. Remaining ties
//! keep their input order, which carries upstream relevance and source order.

use std::cmp::Ordering;

use crate::models::CatalogItem;

pub fn compare(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    b.vote_count
        .cmp(&a.vote_count)
        .then_with(|| b.vote_average.total_cmp(&a.vote_average))
}

/// Stable sort by [`compare`]
pub fn rank(mut items: Vec<CatalogItem>) -> Vec<CatalogItem> {
    items.sort_by(compare);
    items
}

/// Concatenates per-source batches in request order, then ranks them
pub fn merge_streams(streams: Vec<Vec<CatalogItem>>) -> Vec<CatalogItem> {
    rank(streams.into_iter().flatten().collect())
}
