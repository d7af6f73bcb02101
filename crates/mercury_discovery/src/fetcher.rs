use lazy_static::lazy_static;
use mercury_core::{truncate_chars, Article, DiscoveryConfig, DiscoveryMethod, PageFetcher, Result};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use crate::markup::{self, FeedEntry};
use crate::pool::WorkerPool;
use crate::relevance::{self, QueryTerms};

lazy_static! {
    static ref STORY_ID: Regex = Regex::new(r"/story/(\d+)/").expect("valid story id pattern");
}

/// Why a probe produced no candidate. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Absence {
    Fetch(String),
    Parse(String),
    Irrelevant,
    MalformedUrl(String),
    Incomplete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Found(Article),
    Absent(Absence),
}

impl ProbeOutcome {
    pub fn into_article(self) -> Option<Article> {
        match self {
            ProbeOutcome::Found(article) => Some(article),
            ProbeOutcome::Absent(_) => None,
        }
    }
}

pub fn story_id_from_url(url: &str) -> Option<i64> {
    STORY_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|id| id.as_str().parse().ok())
}

/// Turn one feed entry into a scored candidate tagged with its feed page.
pub fn extract_feed_entry(
    entry: &FeedEntry,
    terms: &QueryTerms,
    config: &DiscoveryConfig,
    page: u32,
) -> ProbeOutcome {
    let (title, link) = match (&entry.title, &entry.link) {
        (Some(title), Some(link)) => (title, link),
        _ => return ProbeOutcome::Absent(Absence::Incomplete),
    };
    let story_id = match story_id_from_url(link) {
        Some(id) => id,
        None => return ProbeOutcome::Absent(Absence::MalformedUrl(link.clone())),
    };

    let description = entry.description.as_deref().unwrap_or_default();
    let score = relevance::score(title, description, terms);
    if score <= 0.0 {
        return ProbeOutcome::Absent(Absence::Irrelevant);
    }

    let article = Article::new(
        story_id,
        title.as_str(),
        link.as_str(),
        truncate_chars(description, config.excerpt_len),
        config.source.as_str(),
        DiscoveryMethod::RssDeepScan { page },
    )
    .with_score(score)
    .with_publish_date(entry.published.clone().unwrap_or_default());

    ProbeOutcome::Found(article)
}

/// Fetches and scores story pages. Every network call holds one pool permit.
#[derive(Clone)]
pub struct ArticleFetcher {
    pages: Arc<dyn PageFetcher>,
    pool: WorkerPool,
    config: Arc<DiscoveryConfig>,
}

impl ArticleFetcher {
    pub fn new(
        pages: Arc<dyn PageFetcher>,
        pool: WorkerPool,
        config: Arc<DiscoveryConfig>,
    ) -> Self {
        Self { pages, pool, config }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Outer `Err` means no permit could be had; inner is the fetch itself.
    async fn fetch_page(&self, url: &str, timeout: Duration) -> Result<Result<String>> {
        self.pool.run(self.pages.fetch(url, timeout)).await
    }

    /// Fetch one page of a feed. Fails on closed pool or fetch error alike.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        self.fetch_page(url, self.config.feed_timeout()).await?
    }

    /// Probe a story id.
    ///
    /// Returns `Err` only when the pool refuses the probe; anything that goes
    /// wrong once the request has started is an `Absent` outcome.
    pub async fn fetch_by_id(
        &self,
        story_id: i64,
        terms: &QueryTerms,
        method: DiscoveryMethod,
    ) -> Result<ProbeOutcome> {
        let url = self.config.story_url(story_id);
        let body = match self.fetch_page(&url, self.config.article_timeout()).await? {
            Ok(body) => body,
            Err(e) => {
                trace!(story_id, error = %e, "Probe found nothing");
                return Ok(ProbeOutcome::Absent(Absence::Fetch(e.to_string())));
            }
        };

        let page = match markup::parse_article_page(&body) {
            Ok(page) => page,
            Err(e) => return Ok(ProbeOutcome::Absent(Absence::Parse(e.to_string()))),
        };

        let score = relevance::score(&page.title, &page.content, terms);
        if score <= 0.0 {
            trace!(story_id, "Story is not relevant");
            return Ok(ProbeOutcome::Absent(Absence::Irrelevant));
        }

        let article = Article::new(
            story_id,
            page.title,
            url,
            truncate_chars(&page.content, self.config.excerpt_len),
            self.config.source.as_str(),
            method,
        )
        .with_score(score)
        .with_publish_date(page.publish_date);

        Ok(ProbeOutcome::Found(article))
    }
}
