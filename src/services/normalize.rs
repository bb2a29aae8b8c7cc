//! Converts upstream items of mixed shape into [`CatalogItem`]s.
//!
//! Movies carry `title`/`release_date`, series carry `name`/`first_air_date`,
//! and multi-search pages mix in people. Only movies and series survive.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{CatalogItem, Category, RawPage};

/// Loose view of one upstream item; every field is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawItem {
    id: Option<u64>,
    media_type: Option<String>,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    genre_ids: Vec<u32>,
    overview: Option<String>,
}

/// Normalizes one upstream item, `None` when it is not displayable
///
/// `hint` is the category implied by the endpoint; an explicit `media_type`
/// on the item takes precedence over it.
pub fn normalize(raw: &Value, hint: Option<Category>) -> Option<CatalogItem> {
    let item = RawItem::deserialize(raw).ok()?;

    let category = match item.media_type.as_deref() {
        Some(media_type) => Category::from_media_type(media_type)?,
        None => hint?,
    };

    let id = item.id?;

    let (title, date) = match category {
        Category::Movie => (
            item.title.or(item.name),
            item.release_date.or(item.first_air_date),
        ),
        Category::Series => (
            item.name.or(item.title),
            item.first_air_date.or(item.release_date),
        ),
    };

    let title = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;

    Some(CatalogItem {
        id,
        category,
        title,
        image_path: item.poster_path.filter(|p| !p.trim().is_empty()),
        popularity: sanitize(item.popularity).max(0.0),
        vote_average: sanitize(item.vote_average).clamp(0.0, 10.0),
        vote_count: item
            .vote_count
            .map(|c| c.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0),
        release_date: date.as_deref().and_then(parse_date),
        genre_ids: item.genre_ids,
        overview: item.overview.filter(|o| !o.is_empty()),
    })
}

/// Normalizes a whole page, skipping items that cannot be displayed
pub fn normalize_page(page: &RawPage, hint: Option<Category>) -> Vec<CatalogItem> {
    let items: Vec<CatalogItem> = page
        .results
        .iter()
        .filter_map(|raw| normalize(raw, hint))
        .collect();

    let skipped = page.results.len() - items.len();
    if skipped > 0 {
        tracing::debug!(
            page = page.page,
            kept = items.len(),
            skipped = skipped,
            "Dropped non-displayable items"
        );
    }

    items
}

fn sanitize(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
