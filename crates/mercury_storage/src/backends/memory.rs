use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercury_core::{Article, ArticleStorage, DiscoveryMethod, Result};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Articles keyed by story id. Upserts replace the whole record.
#[derive(Default)]
struct MemoryStore {
    articles: BTreeMap<i64, Article>,
}

impl MemoryStore {
    fn upsert(&mut self, article: &Article) {
        self.articles.insert(article.story_id, article.clone());
    }

    fn len(&self) -> usize {
        self.articles.len()
    }

    fn collect<F>(&self, filter: F) -> Vec<Article>
    where
        F: Fn(&Article) -> bool,
    {
        self.articles.values().filter(|a| filter(a)).cloned().collect()
    }
}

fn by_score_then_recency(a: &Article, b: &Article) -> Ordering {
    b.relevance_score
        .total_cmp(&a.relevance_score)
        .then_with(|| b.discovered_date.cmp(&a.discovered_date))
}

#[derive(Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl ArticleStorage for MemoryStorage {
    async fn upsert_all(&self, articles: &[Article]) -> Result<()> {
        let mut store = self.store.write().await;
        for article in articles {
            store.upsert(article);
        }
        Ok(())
    }

    async fn find_by_text(&self, query: &str) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut found = store.collect(|a| a.mentions(query));
        found.sort_by(by_score_then_recency);
        Ok(found)
    }

    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        let mut found = store.collect(|a| a.discovered_date >= since);
        found.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        Ok(found)
    }

    async fn find_by_story_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Article>> {
        if start_id > end_id {
            return Ok(Vec::new());
        }
        let store = self.store.read().await;
        Ok(store.articles.range(start_id..=end_id).map(|(_, a)| a.clone()).collect())
    }

    async fn find_by_discovery_method(&self, method: DiscoveryMethod) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.collect(|a| a.discovery_method == method))
    }

    async fn find_max_story_id(&self) -> Result<Option<i64>> {
        let store = self.store.read().await;
        Ok(store.articles.keys().next_back().copied())
    }

    async fn find_min_story_id(&self) -> Result<Option<i64>> {
        let store = self.store.read().await;
        Ok(store.articles.keys().next().copied())
    }
}
