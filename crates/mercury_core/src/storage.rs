use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{Article, DiscoveryMethod};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert or overwrite articles keyed by `story_id`
    async fn upsert_all(&self, articles: &[Article]) -> Result<()>;

    /// Case-insensitive match on title or content, best scores first
    async fn find_by_text(&self, query: &str) -> Result<Vec<Article>>;

    /// Articles discovered at or after `since`, best scores first
    async fn find_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>>;

    /// Articles whose story id lies in `[start_id, end_id]`
    async fn find_by_story_id_range(&self, start_id: i64, end_id: i64) -> Result<Vec<Article>>;

    async fn find_by_discovery_method(&self, method: DiscoveryMethod) -> Result<Vec<Article>>;

    async fn find_max_story_id(&self) -> Result<Option<i64>>;

    async fn find_min_story_id(&self) -> Result<Option<i64>>;
}
