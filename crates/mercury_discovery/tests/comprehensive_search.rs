use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercury_core::{
    Article, ArticleStorage, DiscoveryConfig, DiscoveryMethod, Error, PageFetcher, Result,
};
use mercury_discovery::{DiscoveryEngine, WorkerPool};
use mercury_storage::MemoryStorage;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SiteFixture {
    pages: HashMap<String, String>,
}

impl SiteFixture {
    fn new() -> Self {
        Self { pages: HashMap::new() }
    }

    fn story(mut self, config: &DiscoveryConfig, story_id: i64, title: &str, body: &str) -> Self {
        self.pages.insert(
            config.story_url(story_id),
            format!("<html><body><h1>{}</h1><p>{}</p></body></html>", title, body),
        );
        self
    }

    fn feed(mut self, url: &str, base: &str, items: &[(i64, &str)]) -> Self {
        let items: String = items
            .iter()
            .map(|(id, title)| {
                format!(
                    concat!(
                        "<item><title>{}</title><link>{}/story/{}/x/</link>",
                        "<description>local news</description></item>"
                    ),
                    title, base, id
                )
            })
            .collect();
        self.pages
            .insert(url.to_string(), format!("<rss><channel>{}</channel></rss>", items));
        self
    }
}

#[async_trait]
impl PageFetcher for SiteFixture {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Timeout(url.to_string()))
    }
}

/// Wraps memory storage and counts `upsert_all` calls.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    upserts: AtomicUsize,
    fail_upserts: bool,
}

#[async_trait]
impl ArticleStorage for CountingStorage {
    async fn upsert_all(&self, articles: &[Article]) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts {
            return Err(Error::Storage("disk full".to_string()));
        }
        self.inner.upsert_all(articles).await
    }

    async fn find_by_text(&self, query: &str) -> Result<Vec<Article>> {
        self.inner.find_by_text(query).await
    }

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>> {
        self.inner.find_since(since).await
    }

    async fn find_by_story_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Article>> {
        self.inner.find_by_story_id_range(start_id, end_id).await
    }

    async fn find_by_discovery_method(&self, method: DiscoveryMethod) -> Result<Vec<Article>> {
        self.inner.find_by_discovery_method(method).await
    }

    async fn find_max_story_id(&self) -> Result<Option<i64>> {
        self.inner.find_max_story_id().await
    }

    async fn find_min_story_id(&self) -> Result<Option<i64>> {
        self.inner.find_min_story_id().await
    }
}

fn config() -> DiscoveryConfig {
    DiscoveryConfig {
        page_delay_ms: 0,
        ..DiscoveryConfig::default()
    }
}

fn site(config: &DiscoveryConfig) -> SiteFixture {
    let base = config.base_url.clone();
    let feeds = config.feed_urls();
    SiteFixture::new()
        .story(config, 9_002_600, "Council vote on rates", "")
        .story(config, 9_002_650, "Surf report", "council lifeguards")
        .story(config, 9_003_000, "Harbour works", "nothing relevant")
        .story(config, 9_053_200, "Council meets", "")
        .story(config, 9_053_210, "Vote count", "")
        .feed(
            &feeds[0],
            &base,
            &[(9_002_600, "Council vote on rates"), (9_050_000, "Council grants")],
        )
        .feed(&feeds[2], &base, &[(9_051_000, "Vote for sport star"), (9_051_001, "Cricket")])
}

fn ids(articles: &[Article]) -> Vec<i64> {
    articles.iter().map(|a| a.story_id).collect()
}

#[tokio::test]
async fn test_search_dedups_ranks_and_stores_once() {
    let config = config();
    let storage = Arc::new(CountingStorage::default());
    let engine = DiscoveryEngine::new(storage.clone(), Arc::new(site(&config)), config).unwrap();

    let report = engine.comprehensive_search("council vote", 30, 20).await.unwrap();

    let found = ids(&report.articles);
    let mut unique = found.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), found.len());
    assert_eq!(found.len(), 6);
    assert!(report
        .articles
        .windows(2)
        .all(|pair| pair[0].relevance_score >= pair[1].relevance_score));
    assert_eq!(report.articles[0].story_id, 9_002_600);
    assert_eq!(report.articles[0].discovery_method, DiscoveryMethod::SystematicBacktrack);
    assert!(report.articles.iter().all(|a| a.relevance_score > 0.0));
    assert!(report.articles.iter().all(|a| a.source == "illawarra_mercury"));

    assert_eq!(storage.upserts.load(Ordering::SeqCst), 1);
    let mut stored = ids(&storage.inner.find_by_story_id_range(0, i64::MAX).await.unwrap());
    stored.sort();
    assert_eq!(stored, unique);
}

#[tokio::test]
async fn test_results_truncate_to_max_results() {
    let config = config();
    let engine = DiscoveryEngine::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(site(&config)),
        config,
    )
    .unwrap();

    let report = engine.comprehensive_search("council vote", 30, 2).await.unwrap();
    assert_eq!(report.total_found, 2);
    assert_eq!(report.articles[0].story_id, 9_002_600);
    // caps are zero below three, so only the feeds contribute
    assert!(report
        .articles
        .iter()
        .all(|a| matches!(a.discovery_method, DiscoveryMethod::RssDeepScan { .. })));
}

#[tokio::test]
async fn test_unreachable_stories_leave_other_strategies_working() {
    let config = config();
    let base = config.base_url.clone();
    let feeds = config.feed_urls();
    let fixture = SiteFixture::new().feed(&feeds[1], &base, &[(9_052_000, "Council budget")]);
    let storage = Arc::new(CountingStorage::default());
    let engine = DiscoveryEngine::new(storage.clone(), Arc::new(fixture), config).unwrap();

    let report = engine.comprehensive_search("council", 30, 20).await.unwrap();
    assert_eq!(ids(&report.articles), vec![9_052_000]);
    assert!(report.strategies.iter().all(|s| s.error.is_none()));
    assert_eq!(storage.upserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_nothing_found_still_upserts_once() {
    let storage = Arc::new(CountingStorage::default());
    let engine =
        DiscoveryEngine::new(storage.clone(), Arc::new(SiteFixture::new()), config()).unwrap();

    let report = engine.comprehensive_search("council", 30, 20).await.unwrap();
    assert!(report.articles.is_empty());
    assert_eq!(storage.upserts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_storage_failure_propagates() {
    let config = config();
    let storage = Arc::new(CountingStorage {
        fail_upserts: true,
        ..CountingStorage::default()
    });
    let engine = DiscoveryEngine::new(storage, Arc::new(site(&config)), config).unwrap();

    let result = engine.comprehensive_search("council", 30, 20).await;
    assert!(matches!(result, Err(Error::Storage(_))));
}

#[tokio::test]
async fn test_closed_pool_fails_search() {
    let config = config();
    let pool = WorkerPool::new(4);
    let storage = Arc::new(CountingStorage::default());
    let site = Arc::new(site(&config));
    let engine = DiscoveryEngine::with_pool(storage.clone(), site, config, pool.clone()).unwrap();
    pool.close();

    let result = engine.comprehensive_search("council", 30, 20).await;
    assert!(matches!(result, Err(Error::PoolClosed)));
    assert_eq!(storage.upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repeated_searches_find_the_same_set() {
    let config = config();
    let engine = DiscoveryEngine::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(site(&config)),
        config,
    )
    .unwrap();

    let first = engine.comprehensive_search("council vote", 30, 20).await.unwrap();
    let second = engine.comprehensive_search("council vote", 30, 20).await.unwrap();
    let mut first = ids(&first.articles);
    let mut second = ids(&second.articles);
    first.sort();
    second.sort();
    assert_eq!(first, second);
}

/// Serves the same story page for every URL and tracks how many fetches overlap.
#[derive(Default)]
struct SlowSite {
    active: AtomicUsize,
    peak: AtomicUsize,
    fetches: AtomicUsize,
}

#[async_trait]
impl PageFetcher for SlowSite {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok("<html><body><h1>Council news</h1><p>council</p></body></html>".to_string())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_one_pool_bounds_fetches_across_strategies() {
    let config = DiscoveryConfig {
        pool_capacity: 4,
        ..config()
    };
    let site = Arc::new(SlowSite::default());
    let storage = Arc::new(MemoryStorage::new());
    let engine = DiscoveryEngine::new(storage, site.clone(), config).unwrap();

    let report = engine.comprehensive_search("council", 30, 30).await.unwrap();

    let peak = site.peak.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak in-flight fetches was {}", peak);
    assert!(peak > 1);
    assert!(site.fetches.load(Ordering::SeqCst) > 20);
    assert_eq!(engine.pool().available(), 4);
    assert_eq!(report.total_found, 20);
}
