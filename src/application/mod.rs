//! Application layer: state store, fetch orchestrator, debouncer, and the
//! remote document-store contract.

pub mod debounce;
pub mod error;
pub mod orchestrator;
pub mod repos;
pub mod state;

pub use debounce::FilterDebouncer;
pub use error::AppError;
pub use orchestrator::{CacheOrchestrator, EnsureOutcome};
pub use repos::{DocumentStore, FieldEquals, ListQuery, RemoteError, SortOrder};
pub use state::{AppState, StateStore};
