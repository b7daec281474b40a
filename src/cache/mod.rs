//! Bayaz cache primitives.
//!
//! - [`CacheRecord`]: a timestamped dataset payload with a validity window.
//! - [`CacheConfig`]: per-dataset validity durations and fetch bounds.
//! - [`CacheMetrics`]: advisory hit/miss/remote/filter counters.
//!
//! Validity windows are configured in `bayaz.toml`:
//!
//! ```toml
//! [cache]
//! poems_ttl_seconds = 1800
//! categories_ttl_seconds = 1800
//! featured_ttl_seconds = 1800
//! ```

mod config;
mod metrics;
mod record;

pub use config::CacheConfig;
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use record::{CacheRecord, CacheSource};
