//! Pure client-side filter engine.
//!
//! Deterministic, allocation-only, no I/O. Preserves the input ordering and
//! never re-sorts; the corpus arrives most-recent-first from the remote store
//! and stays that way.

use serde::{Deserialize, Serialize};

use crate::domain::entities::PoemRecord;

/// Current search/category filter. Empty fields mean "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search: String,
    pub category: String,
}

impl FilterCriteria {
    pub fn new(search: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            category: category.into(),
        }
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self::new(term, "")
    }

    pub fn category(slug: impl Into<String>) -> Self {
        Self::new("", slug)
    }

    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.category.trim().is_empty()
    }
}

/// Apply the criteria to the full corpus, producing the display subset.
///
/// Category: case-insensitive slug equality. Search: every whitespace-split
/// term must be a case-insensitive substring of the poem's searchable text.
/// Both filters apply conjunctively.
pub fn apply(poems: &[PoemRecord], criteria: &FilterCriteria) -> Vec<PoemRecord> {
    let category = criteria.category.trim().to_lowercase();
    let terms: Vec<String> = criteria
        .search
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    poems
        .iter()
        .filter(|poem| category.is_empty() || poem.category.to_lowercase() == category)
        .filter(|poem| {
            if terms.is_empty() {
                return true;
            }
            let haystack = searchable_text(poem);
            terms.iter().all(|term| haystack.contains(term.as_str()))
        })
        .cloned()
        .collect()
}

/// Keep the first `limit` featured poems, in original order.
pub fn featured_subset(poems: &[PoemRecord], limit: usize) -> Vec<PoemRecord> {
    poems
        .iter()
        .filter(|poem| poem.featured)
        .take(limit)
        .cloned()
        .collect()
}

fn searchable_text(poem: &PoemRecord) -> String {
    let mut haystack = String::new();
    let mut push = |part: &str| {
        haystack.push_str(&part.to_lowercase());
        haystack.push(' ');
    };

    push(&poem.title_en);
    if let Some(title_ur) = poem.title_ur.as_deref() {
        push(title_ur);
    }
    push(&poem.content_en);
    if let Some(content_ur) = poem.content_ur.as_deref() {
        push(content_ur);
    }
    push(&poem.category);
    if let Some(description) = poem.description_en.as_deref() {
        push(description);
    }
    if let Some(description) = poem.description_ur.as_deref() {
        push(description);
    }

    haystack
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::domain::types::LanguageAvailability;

    fn poem(id: &str, category: &str, title_en: &str) -> PoemRecord {
        PoemRecord {
            id: id.to_string(),
            title_en: title_en.to_string(),
            title_ur: None,
            content_en: "body".to_string(),
            content_ur: None,
            category: category.to_string(),
            language: LanguageAvailability::English,
            featured: false,
            description_en: None,
            description_ur: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn corpus() -> Vec<PoemRecord> {
        vec![
            poem("p1", "naat", "First Verse"),
            poem("p2", "hamd", "Second Verse"),
            poem("p3", "naat", "Morning Light"),
        ]
    }

    #[test]
    fn empty_criteria_passes_everything_through() {
        let poems = corpus();
        let result = apply(&poems, &FilterCriteria::default());
        assert_eq!(result, poems);
    }

    #[test]
    fn category_filter_is_case_insensitive_and_order_preserving() {
        let poems = corpus();
        let result = apply(&poems, &FilterCriteria::category("NAAT"));
        let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p1", "p3"]);
    }

    #[test]
    fn conjunctive_category_and_search() {
        let poems = corpus();
        let result = apply(&poems, &FilterCriteria::new("light", "naat"));
        let ids: Vec<&str> = result.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p3"]);
    }

    #[test]
    fn search_terms_use_and_semantics() {
        let poems = corpus();
        assert_eq!(apply(&poems, &FilterCriteria::search("morning light")).len(), 1);
        assert!(apply(&poems, &FilterCriteria::search("morning verse")).is_empty());
    }

    #[test]
    fn urdu_text_matches_by_substring() {
        let mut poems = corpus();
        poems[0].title_ur = Some("صبح کی روشنی".to_string());
        let result = apply(&poems, &FilterCriteria::search("روشنی"));
        assert_eq!(result[0].id, "p1");
    }

    #[test]
    fn filtering_is_idempotent() {
        let poems = corpus();
        let criteria = FilterCriteria::new("verse", "naat");
        let once = apply(&poems, &criteria);
        let twice = apply(&once, &criteria);
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_corpus_yields_empty_result() {
        assert!(apply(&[], &FilterCriteria::search("anything")).is_empty());
    }

    #[test]
    fn featured_subset_keeps_original_order_and_limit() {
        let mut poems = corpus();
        poems[0].featured = true;
        poems[2].featured = true;
        let subset = featured_subset(&poems, 1);
        assert_eq!(subset.len(), 1);
        assert_eq!(subset[0].id, "p1");
    }
}
