//! Remote document-store contract.
//!
//! The remote side owns the document schema and the identifier namespace;
//! this trait is the only surface the cache core sees. Implemented for real
//! by [`crate::infra::remote::AppwriteClient`] and by counting fakes in
//! tests.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};

/// Sentinel identifier asking the remote store to mint a document id.
pub const AUTO_ID: &str = "unique()";

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("remote service returned {status}: {message}")]
    Service { status: u16, message: String },
    #[error("document not found")]
    NotFound,
    #[error("failed to decode remote document: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedDesc,
}

/// Equality filter on one remote document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEquals {
    pub field: String,
    pub value: Value,
}

/// The bounded query surface the remote list API supports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub order: Option<SortOrder>,
    pub limit: Option<u32>,
    pub equals: Option<FieldEquals>,
}

impl ListQuery {
    /// Most-recent-first page of at most `limit` documents.
    pub fn recent(limit: u32) -> Self {
        Self {
            order: Some(SortOrder::CreatedDesc),
            limit: Some(limit),
            equals: None,
        }
    }

    /// Equality-filtered page of at most `limit` documents.
    pub fn where_equals(field: impl Into<String>, value: Value, limit: u32) -> Self {
        Self {
            order: None,
            limit: Some(limit),
            equals: Some(FieldEquals {
                field: field.into(),
                value,
            }),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_poems(&self, query: &ListQuery) -> Result<Vec<PoemRecord>, RemoteError>;

    async fn list_categories(&self, query: &ListQuery)
    -> Result<Vec<CategoryRecord>, RemoteError>;

    async fn create_poem(&self, draft: &NewPoem) -> Result<PoemRecord, RemoteError>;

    async fn create_category(&self, draft: &NewCategory) -> Result<CategoryRecord, RemoteError>;

    async fn get_poem(&self, id: &str) -> Result<PoemRecord, RemoteError>;
}
