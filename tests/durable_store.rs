//! Durable-tier behavior against a real on-disk SQLite database.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bayaz::application::repos::{DocumentStore, ListQuery, RemoteError};
use bayaz::application::{CacheOrchestrator, StateStore};
use bayaz::cache::{CacheConfig, CacheSource};
use bayaz::domain::entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};
use bayaz::domain::filter::FilterCriteria;
use bayaz::domain::types::{DatasetKind, LanguageAvailability};
use bayaz::infra::SqliteCacheStore;
use time::OffsetDateTime;

fn poem(id: &str, category: &str) -> PoemRecord {
    PoemRecord {
        id: id.to_string(),
        title_en: format!("Poem {id}"),
        title_ur: Some("نظم".to_string()),
        content_en: "verse".to_string(),
        content_ur: None,
        category: category.to_string(),
        language: LanguageAvailability::Both,
        featured: false,
        description_en: None,
        description_ur: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

struct CountingRemote {
    poems: Vec<PoemRecord>,
    calls: AtomicUsize,
}

#[async_trait]
impl DocumentStore for CountingRemote {
    async fn list_poems(&self, _query: &ListQuery) -> Result<Vec<PoemRecord>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.poems.clone())
    }

    async fn list_categories(
        &self,
        _query: &ListQuery,
    ) -> Result<Vec<CategoryRecord>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn create_poem(&self, _draft: &NewPoem) -> Result<PoemRecord, RemoteError> {
        Err(RemoteError::transport("read-only fake"))
    }

    async fn create_category(&self, _draft: &NewCategory) -> Result<CategoryRecord, RemoteError> {
        Err(RemoteError::transport("read-only fake"))
    }

    async fn get_poem(&self, _id: &str) -> Result<PoemRecord, RemoteError> {
        Err(RemoteError::NotFound)
    }
}

#[tokio::test]
async fn poems_survive_a_process_restart() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cache.db");

    let remote = Arc::new(CountingRemote {
        poems: vec![poem("p1", "naat"), poem("p2", "hamd")],
        calls: AtomicUsize::new(0),
    });

    {
        let durable = Arc::new(SqliteCacheStore::open(&path).await.expect("open store"));
        let orchestrator = CacheOrchestrator::new(
            Arc::new(StateStore::new()),
            remote.clone(),
            Some(durable),
            CacheConfig::default(),
        );
        orchestrator
            .ensure_poems(&FilterCriteria::default(), false)
            .await
            .expect("initial fetch");
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    // Fresh memory, same database file.
    let durable = Arc::new(SqliteCacheStore::open(&path).await.expect("reopen store"));
    let orchestrator = CacheOrchestrator::new(
        Arc::new(StateStore::new()),
        remote.clone(),
        Some(durable),
        CacheConfig::default(),
    );

    let outcome = orchestrator
        .ensure_poems(&FilterCriteria::category("naat"), false)
        .await
        .expect("restore from disk");

    assert!(outcome.from_cache);
    assert_eq!(outcome.source, CacheSource::Durable);
    assert_eq!(outcome.data.len(), 1);
    assert_eq!(outcome.data[0].id, "p1");
    assert_eq!(
        remote.calls.load(Ordering::SeqCst),
        1,
        "restart served from durable tier"
    );
}

#[tokio::test]
async fn expired_durable_data_forces_a_refetch() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cache.db");

    let store = SqliteCacheStore::open(&path).await.expect("open store");
    store
        .put(
            DatasetKind::Poems,
            &[poem("stale", "naat")],
            OffsetDateTime::now_utc() - time::Duration::hours(2),
            Duration::from_secs(30 * 60),
        )
        .await
        .expect("seed stale dataset");
    drop(store);

    let remote = Arc::new(CountingRemote {
        poems: vec![poem("fresh", "naat")],
        calls: AtomicUsize::new(0),
    });
    let durable = Arc::new(SqliteCacheStore::open(&path).await.expect("reopen store"));
    let orchestrator = CacheOrchestrator::new(
        Arc::new(StateStore::new()),
        remote.clone(),
        Some(durable),
        CacheConfig::default(),
    );

    let outcome = orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("fetch past stale data");

    assert!(!outcome.from_cache);
    assert_eq!(outcome.data[0].id, "fresh");
    assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn urdu_payloads_roundtrip_through_sqlite() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cache.db");
    let store = SqliteCacheStore::open(&path).await.expect("open store");

    let mut original = poem("p1", "naat");
    original.content_ur = Some("رات کے ستارے".to_string());
    store
        .put(
            DatasetKind::Poems,
            std::slice::from_ref(&original),
            OffsetDateTime::now_utc(),
            Duration::from_secs(60),
        )
        .await
        .expect("write");

    let stored = store
        .get::<PoemRecord>(DatasetKind::Poems)
        .await
        .expect("read")
        .expect("dataset present");
    assert_eq!(stored.items[0].title_ur.as_deref(), Some("نظم"));
    assert_eq!(
        stored.items[0].content_ur.as_deref(),
        Some("رات کے ستارے")
    );
}

#[tokio::test]
async fn clear_cache_empties_the_database_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cache.db");

    let remote = Arc::new(CountingRemote {
        poems: vec![poem("p1", "naat")],
        calls: AtomicUsize::new(0),
    });
    let durable = Arc::new(SqliteCacheStore::open(&path).await.expect("open store"));
    let orchestrator = CacheOrchestrator::new(
        Arc::new(StateStore::new()),
        remote,
        Some(durable.clone()),
        CacheConfig::default(),
    );

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");
    assert!(!durable.stats().await.expect("stats").is_empty());

    orchestrator.clear_cache().await;
    assert!(durable.stats().await.expect("stats").is_empty());
    assert!(
        durable
            .get::<PoemRecord>(DatasetKind::Poems)
            .await
            .expect("read after clear")
            .is_none()
    );
}

#[tokio::test]
async fn stats_reflect_each_dataset_independently() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("cache.db");
    let store = SqliteCacheStore::open(&path).await.expect("open store");

    let now = OffsetDateTime::now_utc();
    store
        .put(
            DatasetKind::Poems,
            &[poem("p1", "naat"), poem("p2", "hamd")],
            now,
            Duration::from_secs(60),
        )
        .await
        .expect("write poems");
    store
        .put(
            DatasetKind::Categories,
            &[CategoryRecord {
                id: "c1".to_string(),
                slug: "naat".to_string(),
                name_en: "Naat".to_string(),
                name_ur: None,
            }],
            now,
            Duration::from_secs(60),
        )
        .await
        .expect("write categories");

    let mut stats = store.stats().await.expect("stats");
    stats.sort_by_key(|s| s.dataset);
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].dataset, DatasetKind::Poems);
    assert_eq!(stats[0].count, 2);
    assert_eq!(stats[1].dataset, DatasetKind::Categories);
    assert_eq!(stats[1].count, 1);
    assert!(stats.iter().all(|s| !s.expired));
}
