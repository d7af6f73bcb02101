use async_trait::async_trait;
use mercury_core::{Article, Error, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::DiscoveryStrategy;
use crate::fetcher::{extract_feed_entry, ArticleFetcher};
use crate::markup;
use crate::relevance::QueryTerms;

/// Walks each configured feed page by page until it runs dry or fails.
pub struct RssDeepScan {
    fetcher: Arc<ArticleFetcher>,
    max_pages: u32,
}

fn page_url(feed: &str, page: u32) -> String {
    if page <= 1 {
        feed.to_string()
    } else {
        format!("{}?page={}", feed, page)
    }
}

impl RssDeepScan {
    pub fn new(fetcher: Arc<ArticleFetcher>, max_pages: u32) -> Self {
        Self { fetcher, max_pages }
    }
}

#[async_trait]
impl DiscoveryStrategy for RssDeepScan {
    fn name(&self) -> &'static str {
        "rss_deep_scan"
    }

    async fn discover(&self, terms: &QueryTerms) -> Result<Vec<Article>> {
        let config = self.fetcher.config();
        let delay = config.page_delay();
        let mut found = Vec::new();
        let mut attempted = 0;
        let mut refused = 0;

        info!(
            feeds = config.feed_paths.len(),
            max_pages = self.max_pages,
            "📡 Deep scanning feeds"
        );

        for feed in config.feed_urls() {
            for page in 1..=self.max_pages {
                let url = page_url(&feed, page);
                attempted += 1;

                let body = match self.fetcher.fetch_feed(&url).await {
                    Ok(body) => body,
                    Err(Error::PoolClosed) => {
                        refused += 1;
                        break;
                    }
                    Err(e) => {
                        warn!(feed = %feed, page, error = %e, "Feed page failed, moving on");
                        break;
                    }
                };

                let entries = match markup::parse_feed(&body) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!(feed = %feed, page, error = %e, "Unreadable feed page");
                        break;
                    }
                };
                if entries.is_empty() {
                    debug!(feed = %feed, page, "Feed exhausted");
                    break;
                }

                let before = found.len();
                found.extend(entries.iter().filter_map(|entry| {
                    extract_feed_entry(entry, terms, config, page).into_article()
                }));
                debug!(
                    feed = %feed,
                    page,
                    entries = entries.len(),
                    matched = found.len() - before,
                    "Processed feed page"
                );

                tokio::time::sleep(delay).await;
            }
        }

        if attempted > 0 && refused == attempted {
            return Err(Error::PoolClosed);
        }
        info!(count = found.len(), "RSS deep scan finished");
        Ok(found)
    }
}
