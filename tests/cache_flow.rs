//! End-to-end cache behavior against a counting in-process remote.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bayaz::application::repos::{DocumentStore, ListQuery, RemoteError};
use bayaz::application::{AppError, CacheOrchestrator, StateStore};
use bayaz::cache::CacheConfig;
use bayaz::domain::entities::{CategoryRecord, NewCategory, NewPoem, PoemRecord};
use bayaz::domain::filter::FilterCriteria;
use bayaz::domain::types::{DatasetKind, LanguageAvailability};
use time::OffsetDateTime;

fn poem(id: &str, title_en: &str, category: &str, featured: bool) -> PoemRecord {
    PoemRecord {
        id: id.to_string(),
        title_en: title_en.to_string(),
        title_ur: None,
        content_en: format!("{title_en} body"),
        content_ur: None,
        category: category.to_string(),
        language: LanguageAvailability::English,
        featured,
        description_en: None,
        description_ur: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[derive(Default)]
struct CountingRemote {
    poems: Vec<PoemRecord>,
    categories: Vec<CategoryRecord>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingRemote {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for CountingRemote {
    async fn list_poems(&self, query: &ListQuery) -> Result<Vec<PoemRecord>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("network unreachable"));
        }
        let mut poems = self.poems.clone();
        if let Some(equals) = query.equals.as_ref() {
            if equals.field == "featured" {
                poems.retain(|p| p.featured);
            }
        }
        if let Some(limit) = query.limit {
            poems.truncate(limit as usize);
        }
        Ok(poems)
    }

    async fn list_categories(
        &self,
        _query: &ListQuery,
    ) -> Result<Vec<CategoryRecord>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::transport("network unreachable"));
        }
        Ok(self.categories.clone())
    }

    async fn create_poem(&self, draft: &NewPoem) -> Result<PoemRecord, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PoemRecord {
            id: "new-poem".to_string(),
            title_en: draft.title_en.clone(),
            title_ur: draft.title_ur.clone(),
            content_en: draft.content_en.clone(),
            content_ur: draft.content_ur.clone(),
            category: draft.category.clone(),
            language: draft.language,
            featured: draft.featured,
            description_en: None,
            description_ur: None,
            created_at: OffsetDateTime::now_utc(),
        })
    }

    async fn create_category(&self, draft: &NewCategory) -> Result<CategoryRecord, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CategoryRecord {
            id: "new-category".to_string(),
            slug: draft.slug.clone().unwrap_or_default(),
            name_en: draft.name_en.clone(),
            name_ur: draft.name_ur.clone(),
        })
    }

    async fn get_poem(&self, id: &str) -> Result<PoemRecord, RemoteError> {
        self.poems
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }
}

fn seeded_remote() -> Arc<CountingRemote> {
    Arc::new(CountingRemote {
        poems: vec![
            poem("p1", "Morning Light", "hamd", true),
            poem("p2", "Desert Rain", "naat", false),
            poem("p3", "Night Caravan", "naat", true),
            poem("p4", "River Song", "ghazal", false),
        ],
        categories: vec![CategoryRecord {
            id: "c1".to_string(),
            slug: "naat".to_string(),
            name_en: "Naat".to_string(),
            name_ur: None,
        }],
        ..Default::default()
    })
}

fn orchestrator(remote: Arc<CountingRemote>) -> CacheOrchestrator {
    CacheOrchestrator::new(
        Arc::new(StateStore::new()),
        remote,
        None,
        CacheConfig::default(),
    )
}

#[tokio::test]
async fn repeated_searches_cost_exactly_one_remote_call() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");
    assert_eq!(remote.calls(), 1);

    for criteria in [
        FilterCriteria::search("rain"),
        FilterCriteria::category("naat"),
        FilterCriteria::new("night", "naat"),
        FilterCriteria::default(),
    ] {
        orchestrator
            .ensure_poems(&criteria, false)
            .await
            .expect("cached search");
    }

    assert_eq!(remote.calls(), 1, "every follow-up was served from memory");
}

#[tokio::test]
async fn search_and_category_compose_conjunctively() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote);

    let outcome = orchestrator
        .ensure_poems(&FilterCriteria::new("night", "naat"), false)
        .await
        .expect("fetch and filter");

    assert_eq!(outcome.data.len(), 1);
    assert_eq!(outcome.data[0].id, "p3");
}

#[tokio::test]
async fn featured_view_derives_from_the_corpus() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");

    let featured = orchestrator.ensure_featured().await.expect("featured");
    assert_eq!(remote.calls(), 1, "derived without a remote call");
    let ids: Vec<&str> = featured.data.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p3"]);
}

#[tokio::test]
async fn warm_preloads_every_dataset_once() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator.warm().await.expect("warmup");
    // Poems and categories each fetch; featured derives from the corpus.
    assert_eq!(remote.calls(), 2);

    orchestrator.warm().await.expect("second warmup");
    assert_eq!(remote.calls(), 2, "warmup is idempotent");
}

#[tokio::test]
async fn creation_is_visible_without_a_refetch() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator
        .ensure_poems(&FilterCriteria::category("naat"), false)
        .await
        .expect("initial fetch");
    let calls_before = remote.calls();

    let created = orchestrator
        .create_poem(NewPoem {
            title_en: "Fresh Verse".to_string(),
            title_ur: None,
            content_en: "new words".to_string(),
            content_ur: None,
            category: "naat".to_string(),
            language: LanguageAvailability::English,
            featured: false,
            description_en: None,
            description_ur: None,
        })
        .await
        .expect("create poem");

    let state = orchestrator.state().snapshot();
    assert_eq!(state.poems.as_ref().unwrap().items[0].id, created.id);
    // Display still honors the active category filter and leads with the
    // new poem.
    assert_eq!(state.display[0].id, created.id);
    assert!(state.display.iter().all(|p| p.category == "naat"));
    assert_eq!(remote.calls(), calls_before + 1, "one create, no refetch");
}

#[tokio::test]
async fn created_off_filter_poem_stays_out_of_the_display() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote);

    orchestrator
        .ensure_poems(&FilterCriteria::category("ghazal"), false)
        .await
        .expect("initial fetch");

    orchestrator
        .create_poem(NewPoem {
            title_en: "Fresh Verse".to_string(),
            title_ur: None,
            content_en: "new words".to_string(),
            content_ur: None,
            category: "naat".to_string(),
            language: LanguageAvailability::English,
            featured: false,
            description_en: None,
            description_ur: None,
        })
        .await
        .expect("create poem");

    let state = orchestrator.state().snapshot();
    assert_eq!(state.poems.as_ref().unwrap().items[0].id, "new-poem");
    assert!(
        state.display.iter().all(|p| p.category == "ghazal"),
        "off-filter creation joins the corpus but not the display"
    );
}

#[tokio::test]
async fn remote_failure_keeps_serving_the_cached_corpus() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");

    remote.fail.store(true, Ordering::SeqCst);
    let err = orchestrator
        .ensure_poems(&FilterCriteria::default(), true)
        .await
        .expect_err("forced refresh against a dead remote");
    assert!(matches!(err, AppError::Remote(_)));

    // The stale corpus still answers local filtering.
    let results = orchestrator
        .filter_locally(&FilterCriteria::category("naat"))
        .expect("local filter on retained corpus");
    assert_eq!(results.len(), 2);

    let state = orchestrator.state().snapshot();
    assert!(state.last_error.is_some());
    assert!(!state.loading);
}

#[tokio::test]
async fn invalidation_drops_freshness_but_keeps_the_payload() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote.clone());

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");

    orchestrator.invalidate(DatasetKind::Poems);
    let state = orchestrator.state().snapshot();
    let record = state.poems.as_ref().unwrap();
    assert!(!record.is_valid());
    assert_eq!(record.items.len(), 4, "payload retained for stale display");

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("refetch after invalidation");
    assert_eq!(remote.calls(), 2);
}

#[tokio::test]
async fn clear_resets_state_and_counters() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote);

    orchestrator.warm().await.expect("warmup");
    orchestrator.clear_cache().await;

    let state = orchestrator.state().snapshot();
    assert!(state.poems.is_none());
    assert!(state.display.is_empty());
    assert!(state.categories.is_none());
    assert!(!state.initialized);

    let metrics = orchestrator.state().metrics().snapshot();
    assert_eq!(metrics.hits + metrics.misses + metrics.remote_calls, 0);
}

#[tokio::test]
async fn state_versions_bump_on_every_action() {
    let remote = seeded_remote();
    let orchestrator = orchestrator(remote);
    let mut version = orchestrator.state().subscribe();
    let initial = *version.borrow_and_update();

    orchestrator
        .ensure_poems(&FilterCriteria::default(), false)
        .await
        .expect("initial fetch");

    assert!(version.has_changed().expect("sender alive"));
    assert!(*version.borrow_and_update() > initial);
}
