use serde::{Deserialize, Serialize};

use super::{CatalogKey, Category};

/// A user's declared affinity, read once per recommendation computation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Interest {
    /// Likes a genre within a category
    Genre { genre_id: u32, category: Category },
    /// Likes a specific title
    Title { id: u64, category: Category },
}

impl Interest {
    /// The catalog entry this interest points at, if it names one
    pub fn title_key(&self) -> Option<CatalogKey> {
        match self {
            Interest::Title { id, category } => Some(CatalogKey {
                id: *id,
                category: *category,
            }),
            Interest::Genre { .. } => None,
        }
    }
}

/// Row shape of the `user_interests` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InterestRow {
    pub kind: String,
    pub reference_id: i64,
    pub category: String,
}

impl TryFrom<InterestRow> for Interest {
    type Error = String;

    fn try_from(row: InterestRow) -> Result<Self, Self::Error> {
        let category = Category::from_media_type(&row.category)
            .ok_or_else(|| format!("unknown category '{}'", row.category))?;

        if row.reference_id < 0 {
            return Err(format!("negative reference id {}", row.reference_id));
        }

        match row.kind.as_str() {
            "genre" => Ok(Interest::Genre {
                genre_id: u32::try_from(row.reference_id)
                    .map_err(|_| format!("genre id {} out of range", row.reference_id))?,
                category,
            }),
            "title" => Ok(Interest::Title {
                id: row.reference_id as u64,
                category,
            }),
            other => Err(format!("unknown interest kind '{}'", other)),
        }
    }
}
