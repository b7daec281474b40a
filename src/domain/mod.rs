//! Domain model: poem and category records, filter engine, validation.

pub mod entities;
pub mod error;
pub mod filter;
pub mod types;

pub use entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};
pub use error::DomainError;
pub use filter::FilterCriteria;
pub use types::{DatasetKind, LanguageAvailability};

/// Validate a poem draft before it is sent to the remote store.
///
/// A poem needs at least one non-empty title and one non-empty body, in
/// either language, plus a category slug to join against.
pub fn validate_new_poem(draft: &NewPoem) -> Result<(), DomainError> {
    let has_title = !draft.title_en.trim().is_empty()
        || draft
            .title_ur
            .as_deref()
            .is_some_and(|title| !title.trim().is_empty());
    if !has_title {
        return Err(DomainError::validation(
            "poem requires a title in at least one language",
        ));
    }

    let has_content = !draft.content_en.trim().is_empty()
        || draft
            .content_ur
            .as_deref()
            .is_some_and(|content| !content.trim().is_empty());
    if !has_content {
        return Err(DomainError::validation(
            "poem requires content in at least one language",
        ));
    }

    if draft.category.trim().is_empty() {
        return Err(DomainError::validation("poem requires a category slug"));
    }

    Ok(())
}

/// Validate a category draft before creation.
pub fn validate_new_category(draft: &NewCategory) -> Result<(), DomainError> {
    if draft.name_en.trim().is_empty() {
        return Err(DomainError::validation(
            "category requires an English display name",
        ));
    }
    Ok(())
}
