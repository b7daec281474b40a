//! Bayaz: cache and local-filtering core for a bilingual poetry library.
//!
//! The crate fronts a remote document store with a two-tier cache: a single
//! in-memory [`application::StateStore`] and an optional durable SQLite tier.
//! Once a dataset is cached and within its validity window, every search and
//! category filter is answered from memory with zero network traffic.
//!
//! Layering follows the usual direction: `domain` knows nothing of caching,
//! `cache` knows nothing of Appwrite or SQLite, `application` wires the two
//! together behind the [`application::DocumentStore`] trait, and `infra`
//! provides the real remote client and durable store.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;

pub use application::{CacheOrchestrator, FilterDebouncer, StateStore};
pub use cache::{CacheConfig, CacheMetrics};
pub use domain::filter::FilterCriteria;
