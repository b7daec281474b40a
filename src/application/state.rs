//! Observable application state.
//!
//! Holds the three dataset views (full corpus, filtered display subset,
//! featured subset) plus categories, loading/error flags, current criteria,
//! and the cache metrics. All mutation goes through named actions; every
//! action bumps a watch-channel version so views can re-render on change.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::{CacheMetrics, CacheRecord};
use crate::domain::entities::{CategoryRecord, PoemRecord};
use crate::domain::filter::{self, FilterCriteria};
use crate::domain::types::DatasetKind;

#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Complete corpus, most-recent-first, for client-side filtering.
    pub poems: Option<CacheRecord<PoemRecord>>,
    /// Currently displayed subset, always derivable from `poems` + `criteria`.
    pub display: Vec<PoemRecord>,
    pub featured: Option<CacheRecord<PoemRecord>>,
    pub categories: Option<CacheRecord<CategoryRecord>>,
    pub criteria: FilterCriteria,
    pub loading: bool,
    pub last_error: Option<String>,
    pub initialized: bool,
}

pub struct StateStore {
    inner: RwLock<AppState>,
    metrics: CacheMetrics,
    version: watch::Sender<u64>,
}

impl StateStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: RwLock::new(AppState::default()),
            metrics: CacheMetrics::new(),
            version,
        }
    }

    pub fn snapshot(&self) -> AppState {
        self.read().clone()
    }

    /// Change notification: the value is a monotonically increasing version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    // A panicked action leaves the last consistent AppState behind the
    // poisoned lock; recovering it is always safe because actions replace
    // fields wholesale and never stage partial writes.
    fn read(&self) -> RwLockReadGuard<'_, AppState> {
        self.inner.read().unwrap_or_else(|poisoned| {
            warn!(action = "snapshot", "State lock poisoned; serving last consistent state");
            poisoned.into_inner()
        })
    }

    fn write(&self, action: &'static str) -> RwLockWriteGuard<'_, AppState> {
        self.inner.write().unwrap_or_else(|poisoned| {
            warn!(action, "State lock poisoned; resuming on last consistent state");
            poisoned.into_inner()
        })
    }

    fn mutate<R>(&self, op: &'static str, action: impl FnOnce(&mut AppState) -> R) -> R {
        let result = action(&mut self.write(op));
        self.version.send_modify(|version| *version += 1);
        result
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub fn begin_fetch(&self) {
        self.mutate("begin_fetch", |state| {
            state.loading = true;
            state.last_error = None;
        });
    }

    pub fn fetch_failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.mutate("fetch_failed", |state| {
            state.loading = false;
            state.last_error = Some(message);
        });
    }

    pub fn clear_error(&self) {
        self.mutate("clear_error", |state| {
            state.last_error = None;
        });
    }

    /// Merge a freshly loaded full corpus and derive the display subset.
    pub fn poems_loaded(&self, record: CacheRecord<PoemRecord>, criteria: &FilterCriteria) {
        self.mutate("poems_loaded", |state| {
            state.display = filter::apply(&record.items, criteria);
            state.criteria = criteria.clone();
            state.poems = Some(record);
            state.loading = false;
            state.last_error = None;
            state.initialized = true;
        });
    }

    pub fn featured_loaded(&self, record: CacheRecord<PoemRecord>) {
        self.mutate("featured_loaded", |state| {
            state.featured = Some(record);
            state.loading = false;
            state.last_error = None;
        });
    }

    pub fn categories_loaded(&self, record: CacheRecord<CategoryRecord>) {
        self.mutate("categories_loaded", |state| {
            state.categories = Some(record);
            state.loading = false;
            state.last_error = None;
        });
    }

    /// Re-derive the display subset from the in-memory corpus. Returns the
    /// new subset; empty when no corpus is cached.
    pub fn set_local_filters(&self, criteria: &FilterCriteria) -> Vec<PoemRecord> {
        self.mutate("set_local_filters", |state| {
            state.criteria = criteria.clone();
            if let Some(poems) = state.poems.as_ref() {
                state.display = filter::apply(&poems.items, criteria);
            }
            debug!(
                search = %criteria.search,
                category = %criteria.category,
                results = state.display.len(),
                "Applied local filters"
            );
            state.display.clone()
        })
    }

    /// Optimistic merge of a newly created poem: prepend to the corpus,
    /// re-run the filter for the display subset, and maintain the featured
    /// subset bound.
    pub fn poem_created(&self, poem: PoemRecord, featured_limit: usize) {
        self.mutate("poem_created", |state| {
            if let Some(poems) = state.poems.as_mut() {
                poems.items.insert(0, poem.clone());
                state.display = filter::apply(&poems.items, &state.criteria);
            }
            if poem.featured {
                if let Some(featured) = state.featured.as_mut() {
                    featured.items.insert(0, poem);
                    featured.items.truncate(featured_limit);
                }
            }
        });
    }

    pub fn category_created(&self, category: CategoryRecord) {
        self.mutate("category_created", |state| {
            if let Some(categories) = state.categories.as_mut() {
                categories.items.push(category);
            }
        });
    }

    /// Drop freshness for one dataset while keeping its payload visible.
    pub fn invalidate(&self, kind: DatasetKind) {
        self.mutate("invalidate", |state| match kind {
            DatasetKind::Poems => {
                if let Some(poems) = state.poems.as_mut() {
                    poems.invalidate();
                }
            }
            DatasetKind::Categories => {
                if let Some(categories) = state.categories.as_mut() {
                    categories.invalidate();
                }
            }
            DatasetKind::Featured => {
                if let Some(featured) = state.featured.as_mut() {
                    featured.invalidate();
                }
            }
        });
    }

    pub fn invalidate_all(&self) {
        for kind in DatasetKind::ALL {
            self.invalidate(kind);
        }
    }

    /// Empty every dataset and reset the advisory counters.
    pub fn clear(&self) {
        self.mutate("clear", |state| {
            *state = AppState::default();
        });
        self.metrics.reset();
        debug!("All cached state cleared");
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
