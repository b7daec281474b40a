//! Cache configuration.

use std::time::Duration;

use crate::domain::types::DatasetKind;

// Default values for cache configuration. The source application carried two
// competing in-memory windows (15 and 30 minutes) in near-duplicate modules;
// here every window is a per-dataset setting and only defaults live in code.
const DEFAULT_POEMS_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_CATEGORIES_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_FEATURED_TTL: Duration = Duration::from_secs(30 * 60);
const DEFAULT_FETCH_LIMIT: u32 = 1000;
const DEFAULT_FEATURED_LIMIT: usize = 6;
const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Resolved cache tuning, one validity window per dataset kind.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub poems_ttl: Duration,
    pub categories_ttl: Duration,
    pub featured_ttl: Duration,
    /// Upper bound on the full-corpus page fetched from the remote store.
    pub fetch_limit: u32,
    /// Size of the featured subset (derivation and remote query alike).
    pub featured_limit: usize,
    /// Quiet window before a criteria burst is applied.
    pub debounce_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            poems_ttl: DEFAULT_POEMS_TTL,
            categories_ttl: DEFAULT_CATEGORIES_TTL,
            featured_ttl: DEFAULT_FEATURED_TTL,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            featured_limit: DEFAULT_FEATURED_LIMIT,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, kind: DatasetKind) -> Duration {
        match kind {
            DatasetKind::Poems => self.poems_ttl,
            DatasetKind::Categories => self.categories_ttl,
            DatasetKind::Featured => self.featured_ttl,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            poems_ttl: settings.poems_ttl,
            categories_ttl: settings.categories_ttl,
            featured_ttl: settings.featured_ttl,
            fetch_limit: settings.fetch_limit,
            featured_limit: settings.featured_limit,
            debounce_window: settings.debounce_window,
        }
    }
}
