use chrono::Utc;
use futures::future::join_all;
use mercury_core::{
    Article, ArticleStorage, Calibration, DiscoveryConfig, Error, PageFetcher, Result,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::estimator::{self, IdWindow};
use crate::fetcher::ArticleFetcher;
use crate::merge::merge_ranked;
use crate::pool::WorkerPool;
use crate::relevance::QueryTerms;
use crate::strategies::{DiscoveryStrategy, RecentRangeScan, RssDeepScan, SystematicBacktrack};

#[derive(Debug, Clone, Serialize)]
pub struct StrategyReport {
    pub name: &'static str,
    pub found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub days_back: u32,
    pub max_results: usize,
    pub total_found: usize,
    pub duration_ms: u64,
    pub strategies: Vec<StrategyReport>,
    pub articles: Vec<Article>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Runs the discovery strategies against one publication and persists what they find.
pub struct DiscoveryEngine {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<ArticleFetcher>,
    config: Arc<DiscoveryConfig>,
    calibration: Calibration,
}

impl DiscoveryEngine {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        pages: Arc<dyn PageFetcher>,
        config: DiscoveryConfig,
    ) -> Result<Self> {
        let pool = WorkerPool::new(config.pool_capacity);
        Self::with_pool(storage, pages, config, pool)
    }

    pub fn with_pool(
        storage: Arc<dyn ArticleStorage>,
        pages: Arc<dyn PageFetcher>,
        config: DiscoveryConfig,
        pool: WorkerPool,
    ) -> Result<Self> {
        config.validate()?;
        let calibration = config.calibration;
        let config = Arc::new(config);
        let fetcher = Arc::new(ArticleFetcher::new(pages, pool, config.clone()));
        Ok(Self {
            storage,
            fetcher,
            config,
            calibration,
        })
    }

    pub fn pool(&self) -> &WorkerPool {
        self.fetcher.pool()
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }

    pub fn estimate_window(&self, days_back: u32) -> IdWindow {
        estimator::estimate_window(&self.calibration, days_back)
    }

    fn strategies(&self, days_back: u32, max_results: usize) -> Vec<Box<dyn DiscoveryStrategy>> {
        let cap = max_results / 3;
        vec![
            Box::new(SystematicBacktrack::new(
                self.fetcher.clone(),
                self.calibration,
                days_back,
                cap,
            )),
            Box::new(RssDeepScan::new(self.fetcher.clone(), self.config.rss_max_pages)),
            Box::new(RecentRangeScan::new(self.fetcher.clone(), self.calibration, cap)),
        ]
    }

    /// Run all strategies concurrently, merge their candidates and store the result.
    ///
    /// A failing strategy only loses its own candidates. The search fails when
    /// every strategy failed, or when storing the merged list fails.
    pub async fn comprehensive_search(
        &self,
        query: &str,
        days_back: u32,
        max_results: usize,
    ) -> Result<SearchReport> {
        if max_results == 0 {
            return Err(Error::InvalidInput("max_results must be at least 1".to_string()));
        }

        let started = Instant::now();
        let terms = QueryTerms::parse(query);
        info!(
            query,
            terms = terms.len(),
            days_back,
            max_results,
            "🔍 Starting comprehensive search"
        );
        if terms.is_empty() {
            warn!("Query has no terms, nothing will score");
        }

        let strategies = self.strategies(days_back, max_results);
        let names: Vec<&'static str> = strategies.iter().map(|s| s.name()).collect();
        let handles: Vec<_> = strategies
            .into_iter()
            .map(|strategy| {
                let terms = terms.clone();
                tokio::spawn(async move { strategy.discover(&terms).await })
            })
            .collect();

        let mut batches = Vec::with_capacity(names.len());
        let mut reports = Vec::with_capacity(names.len());
        let mut first_error = None;

        for (name, joined) in names.into_iter().zip(join_all(handles).await) {
            let outcome = joined
                .map_err(|e| Error::Task(format!("{} did not complete: {}", name, e)))
                .and_then(|result| result);
            match outcome {
                Ok(articles) => {
                    info!(strategy = name, count = articles.len(), "Strategy finished");
                    reports.push(StrategyReport {
                        name,
                        found: articles.len(),
                        error: None,
                    });
                    batches.push(articles);
                }
                Err(e) => {
                    error!(strategy = name, error = %e, "Strategy failed");
                    reports.push(StrategyReport {
                        name,
                        found: 0,
                        error: Some(e.to_string()),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        if batches.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        let articles = merge_ranked(batches, max_results);
        self.storage.upsert_all(&articles).await?;

        let elapsed = started.elapsed();
        info!(
            total = articles.len(),
            duration_ms = elapsed.as_millis() as u64,
            "✨ Comprehensive search finished"
        );

        Ok(SearchReport {
            query: query.to_string(),
            days_back,
            max_results,
            total_found: articles.len(),
            duration_ms: elapsed.as_millis() as u64,
            strategies: reports,
            articles,
            elapsed,
        })
    }

    pub async fn search_cached(&self, query: &str) -> Result<Vec<Article>> {
        self.storage.find_by_text(query).await
    }

    pub async fn recent_articles(&self, hours: i64) -> Result<Vec<Article>> {
        let since = chrono::Duration::try_hours(hours)
            .and_then(|window| Utc::now().checked_sub_signed(window))
            .ok_or_else(|| Error::InvalidInput(format!("hours out of range: {}", hours)))?;
        self.storage.find_since(since).await
    }

    /// Widen the calibrated id range to cover everything already stored.
    pub async fn recalibrate(&mut self) -> Result<Calibration> {
        if let Some(max_id) = self.storage.find_max_story_id().await? {
            if max_id > self.calibration.current_max_id {
                info!(old = self.calibration.current_max_id, new = max_id, "Raising max story id");
                self.calibration.current_max_id = max_id;
            }
        }
        if let Some(min_id) = self.storage.find_min_story_id().await? {
            if min_id < self.calibration.current_min_id {
                info!(old = self.calibration.current_min_id, new = min_id, "Lowering min story id");
                self.calibration.current_min_id = min_id;
            }
        }
        Ok(self.calibration)
    }
}
