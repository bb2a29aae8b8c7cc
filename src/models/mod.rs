use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

mod interest;

pub use interest::{Interest, InterestRow};

/// Displayable catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

impl Category {
    /// Path segment TMDB uses for this category
    pub fn as_path(&self) -> &'static str {
        match self {
            Category::Movie => "movie",
            Category::Series => "tv",
        }
    }

    /// Parses a TMDB `media_type` value; persons and unknown types yield `None`
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type {
            "movie" => Some(Category::Movie),
            "tv" | "series" => Some(Category::Series),
            _ => None,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_path())
    }
}

/// Dedup key: the same numeric id may exist once per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogKey {
    pub id: u64,
    pub category: Category,
}

/// A movie or series in the uniform shape the aggregation stages work on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub id: u64,
    pub category: Category,
    pub title: String,
    /// Poster path relative to the image CDN
    pub image_path: Option<String>,
    pub popularity: f64,
    /// 0 to 10
    pub vote_average: f64,
    pub vote_count: u32,
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl CatalogItem {
    pub fn key(&self) -> CatalogKey {
        CatalogKey {
            id: self.id,
            category: self.category,
        }
    }
}

/// One upstream page before normalization
///
/// Items stay as raw JSON so one malformed entry cannot fail the whole page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

fn first_page() -> u32 {
    1
}

/// One page of normalized, filtered items
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResultPage {
    pub items: Vec<CatalogItem>,
    pub page: u32,
    pub total_pages: u32,
}

/// Genre entry from the catalog taxonomy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}
