use thiserror::Error;

use crate::application::repos::RemoteError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("remote fetch failed: {0}")]
    Remote(#[from] RemoteError),
    /// Control-flow signal, not a user-facing failure: no fresh in-memory
    /// corpus exists, so the caller should fall back to a full ensure.
    #[error("no valid cached corpus for local filtering")]
    NoValidCache,
}

impl AppError {
    pub fn is_no_valid_cache(&self) -> bool {
        matches!(self, Self::NoValidCache)
    }
}
