//! Domain entities mirrored from the remote document store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::LanguageAvailability;

/// One literary work, in up to two languages.
///
/// Identifiers are assigned by the remote store and treated as opaque
/// strings. The invariant that at least one title and one body are non-empty
/// is enforced on the creation path, not re-checked on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoemRecord {
    pub id: String,
    pub title_en: String,
    pub title_ur: Option<String>,
    pub content_en: String,
    pub content_ur: Option<String>,
    /// Slug of the owning category; the sole join key to [`CategoryRecord`].
    pub category: String,
    pub language: LanguageAvailability,
    pub featured: bool,
    pub description_en: Option<String>,
    pub description_ur: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A poem category. Read-mostly; cached with its own validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: String,
    /// Stable machine key, unique across the category set.
    pub slug: String,
    pub name_en: String,
    pub name_ur: Option<String>,
}

/// Poem draft submitted through the admin authoring flow.
#[derive(Debug, Clone, Serialize)]
pub struct NewPoem {
    pub title_en: String,
    pub title_ur: Option<String>,
    pub content_en: String,
    pub content_ur: Option<String>,
    pub category: String,
    pub language: LanguageAvailability,
    pub featured: bool,
    pub description_en: Option<String>,
    pub description_ur: Option<String>,
}

/// Category draft. When `slug` is absent one is derived from `name_en`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub slug: Option<String>,
    pub name_en: String,
    pub name_ur: Option<String>,
}
