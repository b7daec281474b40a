//! Cache-aware fetch orchestrator.
//!
//! One place owns the memory → durable → remote fallback chain for every
//! dataset kind, so no two consumers can grow divergent caching logic. Pure
//! filtering and state transitions never suspend; the only await points are
//! the remote fetch and durable-store I/O.

use std::sync::Arc;

use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::application::error::AppError;
use crate::application::repos::{DocumentStore, ListQuery};
use crate::application::state::StateStore;
use crate::cache::{CacheConfig, CacheRecord, CacheSource};
use crate::domain::entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};
use crate::domain::filter::{self, FilterCriteria};
use crate::domain::types::DatasetKind;
use crate::domain::{validate_new_category, validate_new_poem};
use crate::infra::storage::{DatasetStats, SqliteCacheStore};

/// Result of an `ensure` call: the filtered payload plus provenance.
#[derive(Debug, Clone)]
pub struct EnsureOutcome<T> {
    pub data: Vec<T>,
    pub from_cache: bool,
    pub source: CacheSource,
}

pub struct CacheOrchestrator {
    state: Arc<StateStore>,
    remote: Arc<dyn DocumentStore>,
    /// Best-effort durable tier; `None` degrades every lookup to a miss.
    durable: Option<Arc<SqliteCacheStore>>,
    config: CacheConfig,
}

impl CacheOrchestrator {
    pub fn new(
        state: Arc<StateStore>,
        remote: Arc<dyn DocumentStore>,
        durable: Option<Arc<SqliteCacheStore>>,
        config: CacheConfig,
    ) -> Self {
        Self {
            state,
            remote,
            durable,
            config,
        }
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // ========================================================================
    // Poems
    // ========================================================================

    /// Serve the filtered corpus from the freshest tier available.
    ///
    /// Memory first (zero I/O), then the durable store (zero remote calls),
    /// then a bounded remote fetch that repopulates both tiers. A remote
    /// failure leaves existing cache state untouched.
    pub async fn ensure_poems(
        &self,
        criteria: &FilterCriteria,
        force_refresh: bool,
    ) -> Result<EnsureOutcome<PoemRecord>, AppError> {
        if !force_refresh {
            let now = OffsetDateTime::now_utc();
            let snapshot = self.state.snapshot();
            if let Some(record) = snapshot.poems.as_ref()
                && !record.is_empty()
                && record.is_valid_at(now)
            {
                let source = record.source;
                self.state.metrics().record_hit(DatasetKind::Poems);
                self.state.metrics().record_local_filter();
                let display = self.state.set_local_filters(criteria);
                let result_count = display.len();
                debug!(results = result_count, source = source.as_str(), "Poems served from memory");
                return Ok(EnsureOutcome {
                    data: display,
                    from_cache: true,
                    source,
                });
            }

            if let Some(stored) = self.durable_get_poems(DatasetKind::Poems).await {
                let record = CacheRecord::new(
                    stored.items,
                    stored.fetched_at,
                    stored.ttl,
                    CacheSource::Durable,
                );
                if !record.is_empty() {
                    self.state.metrics().record_hit(DatasetKind::Poems);
                    self.state.metrics().record_local_filter();
                    self.state.poems_loaded(record, criteria);
                    let display = self.state.snapshot().display;
                    let result_count = display.len();
                    debug!(results = result_count, "Poems restored from durable cache");
                    return Ok(EnsureOutcome {
                        data: display,
                        from_cache: true,
                        source: CacheSource::Durable,
                    });
                }
            }
        }

        self.fetch_poems_remote(criteria).await
    }

    async fn fetch_poems_remote(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<EnsureOutcome<PoemRecord>, AppError> {
        self.state.begin_fetch();

        let query = ListQuery::recent(self.config.fetch_limit);
        match self.remote.list_poems(&query).await {
            Ok(poems) => {
                self.state.metrics().record_remote_call(DatasetKind::Poems);
                self.state.metrics().record_miss(DatasetKind::Poems);

                let fetched_at = OffsetDateTime::now_utc();
                let record = CacheRecord::new(
                    poems.clone(),
                    fetched_at,
                    self.config.poems_ttl,
                    CacheSource::Remote,
                );
                self.state.poems_loaded(record, criteria);
                self.durable_put(DatasetKind::Poems, &poems, fetched_at).await;

                let display = self.state.snapshot().display;
                let result_count = display.len();
                info!(corpus = poems.len(), results = result_count, "Fresh poem corpus cached");
                Ok(EnsureOutcome {
                    data: display,
                    from_cache: false,
                    source: CacheSource::Remote,
                })
            }
            Err(err) => {
                self.state.fetch_failed(err.to_string());
                Err(AppError::Remote(err))
            }
        }
    }

    /// Local filtering with zero I/O. Fails with [`AppError::NoValidCache`]
    /// when no fresh corpus is in memory; callers fall back to
    /// [`Self::ensure_poems`].
    pub fn filter_locally(&self, criteria: &FilterCriteria) -> Result<Vec<PoemRecord>, AppError> {
        let snapshot = self.state.snapshot();
        let usable = snapshot
            .poems
            .as_ref()
            .is_some_and(|record| !record.is_empty() && record.is_valid());
        if !usable {
            return Err(AppError::NoValidCache);
        }

        self.state.metrics().record_local_filter();
        Ok(self.state.set_local_filters(criteria))
    }

    // ========================================================================
    // Featured
    // ========================================================================

    /// Serve the featured subset, preferring derivation from the cached
    /// corpus over any remote call.
    pub async fn ensure_featured(&self) -> Result<EnsureOutcome<PoemRecord>, AppError> {
        let now = OffsetDateTime::now_utc();
        let snapshot = self.state.snapshot();

        if let Some(record) = snapshot.featured.as_ref()
            && !record.is_empty()
            && record.is_valid_at(now)
        {
            self.state.metrics().record_hit(DatasetKind::Featured);
            return Ok(EnsureOutcome {
                data: record.items.clone(),
                from_cache: true,
                source: record.source,
            });
        }

        // Derive from the full corpus before touching any other tier.
        if let Some(poems) = snapshot.poems.as_ref()
            && poems.is_valid_at(now)
        {
            let derived = filter::featured_subset(&poems.items, self.config.featured_limit);
            if !derived.is_empty() {
                self.state.metrics().record_hit(DatasetKind::Featured);
                let record = CacheRecord::new(
                    derived.clone(),
                    poems.fetched_at,
                    self.config.featured_ttl,
                    CacheSource::Memory,
                );
                self.state.featured_loaded(record);
                debug!(count = derived.len(), "Featured subset derived from corpus");
                return Ok(EnsureOutcome {
                    data: derived,
                    from_cache: true,
                    source: CacheSource::Memory,
                });
            }
        }

        if let Some(stored) = self.durable_get_poems(DatasetKind::Featured).await {
            if !stored.items.is_empty() {
                self.state.metrics().record_hit(DatasetKind::Featured);
                let record = CacheRecord::new(
                    stored.items.clone(),
                    stored.fetched_at,
                    stored.ttl,
                    CacheSource::Durable,
                );
                self.state.featured_loaded(record);
                return Ok(EnsureOutcome {
                    data: stored.items,
                    from_cache: true,
                    source: CacheSource::Durable,
                });
            }
        }

        self.state.begin_fetch();

        let query = ListQuery::where_equals("featured", json!(true), self.config.featured_limit as u32);
        match self.remote.list_poems(&query).await {
            Ok(featured) => {
                self.state.metrics().record_remote_call(DatasetKind::Featured);
                self.state.metrics().record_miss(DatasetKind::Featured);

                let fetched_at = OffsetDateTime::now_utc();
                let record = CacheRecord::new(
                    featured.clone(),
                    fetched_at,
                    self.config.featured_ttl,
                    CacheSource::Remote,
                );
                self.state.featured_loaded(record);
                self.durable_put(DatasetKind::Featured, &featured, fetched_at).await;
                Ok(EnsureOutcome {
                    data: featured,
                    from_cache: false,
                    source: CacheSource::Remote,
                })
            }
            Err(err) => {
                self.state.fetch_failed(err.to_string());
                Err(AppError::Remote(err))
            }
        }
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn ensure_categories(
        &self,
        force_refresh: bool,
    ) -> Result<EnsureOutcome<CategoryRecord>, AppError> {
        if !force_refresh {
            let now = OffsetDateTime::now_utc();
            let snapshot = self.state.snapshot();
            if let Some(record) = snapshot.categories.as_ref()
                && !record.is_empty()
                && record.is_valid_at(now)
            {
                self.state.metrics().record_hit(DatasetKind::Categories);
                return Ok(EnsureOutcome {
                    data: record.items.clone(),
                    from_cache: true,
                    source: record.source,
                });
            }

            if let Some(stored) = self.durable_get_categories().await
                && !stored.items.is_empty()
            {
                self.state.metrics().record_hit(DatasetKind::Categories);
                let record = CacheRecord::new(
                    stored.items.clone(),
                    stored.fetched_at,
                    stored.ttl,
                    CacheSource::Durable,
                );
                self.state.categories_loaded(record);
                return Ok(EnsureOutcome {
                    data: stored.items,
                    from_cache: true,
                    source: CacheSource::Durable,
                });
            }
        }

        self.state.begin_fetch();
        match self.remote.list_categories(&ListQuery::default()).await {
            Ok(categories) => {
                self.state.metrics().record_remote_call(DatasetKind::Categories);
                self.state.metrics().record_miss(DatasetKind::Categories);

                let fetched_at = OffsetDateTime::now_utc();
                let record = CacheRecord::new(
                    categories.clone(),
                    fetched_at,
                    self.config.categories_ttl,
                    CacheSource::Remote,
                );
                self.state.categories_loaded(record);
                self.durable_put(DatasetKind::Categories, &categories, fetched_at).await;
                info!(count = categories.len(), "Fresh categories cached");
                Ok(EnsureOutcome {
                    data: categories,
                    from_cache: false,
                    source: CacheSource::Remote,
                })
            }
            Err(err) => {
                self.state.fetch_failed(err.to_string());
                Err(AppError::Remote(err))
            }
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Validate and persist a new poem, then merge it optimistically into
    /// the in-memory views. The durable store is intentionally not written
    /// through; it stays consistent up to the last full refresh.
    pub async fn create_poem(&self, draft: NewPoem) -> Result<PoemRecord, AppError> {
        validate_new_poem(&draft)?;

        match self.remote.create_poem(&draft).await {
            Ok(poem) => {
                self.state.poem_created(poem.clone(), self.config.featured_limit);
                info!(id = %poem.id, featured = poem.featured, "Poem created");
                Ok(poem)
            }
            Err(err) => {
                self.state.fetch_failed(err.to_string());
                Err(AppError::Remote(err))
            }
        }
    }

    pub async fn create_category(&self, mut draft: NewCategory) -> Result<CategoryRecord, AppError> {
        validate_new_category(&draft)?;
        if draft.slug.as_deref().is_none_or(|slug| slug.trim().is_empty()) {
            draft.slug = Some(slug::slugify(&draft.name_en));
        }

        match self.remote.create_category(&draft).await {
            Ok(category) => {
                self.state.category_created(category.clone());
                info!(slug = %category.slug, "Category created");
                Ok(category)
            }
            Err(err) => {
                self.state.fetch_failed(err.to_string());
                Err(AppError::Remote(err))
            }
        }
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Idempotent startup preload. Each dataset is checked on its own: a
    /// search that already filled the corpus does not stop warmup from
    /// loading featured and categories.
    pub async fn warm(&self) -> Result<(), AppError> {
        let now = OffsetDateTime::now_utc();
        let snapshot = self.state.snapshot();
        let poems_ready = snapshot.poems.as_ref().is_some_and(|r| r.is_valid_at(now));
        let featured_ready = snapshot.featured.as_ref().is_some_and(|r| r.is_valid_at(now));
        let categories_ready = snapshot
            .categories
            .as_ref()
            .is_some_and(|r| r.is_valid_at(now));

        if poems_ready && featured_ready && categories_ready {
            debug!("Warmup skipped: every dataset is fresh");
            return Ok(());
        }

        if !poems_ready {
            self.ensure_poems(&FilterCriteria::default(), false).await?;
        }
        if !featured_ready {
            self.ensure_featured().await?;
        }
        if !categories_ready {
            self.ensure_categories(false).await?;
        }
        info!("Warmup complete");
        Ok(())
    }

    /// Drop freshness for one dataset; the stale payload stays displayable.
    pub fn invalidate(&self, kind: DatasetKind) {
        self.state.invalidate(kind);
    }

    pub fn invalidate_all(&self) {
        self.state.invalidate_all();
    }

    /// Empty both tiers and reset the counters.
    pub async fn clear_cache(&self) {
        self.state.clear();
        if let Some(store) = self.durable.as_ref()
            && let Err(err) = store.clear_all().await
        {
            warn!(error = %err, "Durable cache clear failed");
        }
    }

    pub async fn durable_stats(&self) -> Vec<DatasetStats> {
        let Some(store) = self.durable.as_ref() else {
            return Vec::new();
        };
        match store.stats().await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "Durable cache stats unavailable");
                Vec::new()
            }
        }
    }

    // ========================================================================
    // Durable tier helpers (errors absorbed, never propagated)
    // ========================================================================

    async fn durable_get_poems(
        &self,
        kind: DatasetKind,
    ) -> Option<crate::infra::storage::StoredDataset<PoemRecord>> {
        let store = self.durable.as_ref()?;
        match store.get::<PoemRecord>(kind).await {
            Ok(found) => found,
            Err(err) => {
                warn!(dataset = %kind, error = %err, "Durable cache read failed; treating as miss");
                None
            }
        }
    }

    async fn durable_get_categories(
        &self,
    ) -> Option<crate::infra::storage::StoredDataset<CategoryRecord>> {
        let store = self.durable.as_ref()?;
        match store.get::<CategoryRecord>(DatasetKind::Categories).await {
            Ok(found) => found,
            Err(err) => {
                warn!(dataset = %DatasetKind::Categories, error = %err, "Durable cache read failed; treating as miss");
                None
            }
        }
    }

    async fn durable_put<T: serde::Serialize + Sync>(
        &self,
        kind: DatasetKind,
        items: &[T],
        fetched_at: OffsetDateTime,
    ) {
        let Some(store) = self.durable.as_ref() else {
            return;
        };
        let ttl = self.config.ttl_for(kind);
        if let Err(err) = store.put(kind, items, fetched_at, ttl).await {
            warn!(dataset = %kind, error = %err, "Durable cache write failed; memory tier unaffected");
        }
    }
}
