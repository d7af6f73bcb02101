use async_trait::async_trait;
use mercury_core::{Article, Calibration, DiscoveryMethod, Result};
use std::sync::Arc;
use tracing::info;

use super::{probe_ids, DiscoveryStrategy};
use crate::estimator;
use crate::fetcher::ArticleFetcher;
use crate::relevance::QueryTerms;

/// Samples the id range estimated to hold stories from `days_back` days ago.
pub struct SystematicBacktrack {
    fetcher: Arc<ArticleFetcher>,
    calibration: Calibration,
    days_back: u32,
    cap: usize,
}

impl SystematicBacktrack {
    pub fn new(
        fetcher: Arc<ArticleFetcher>,
        calibration: Calibration,
        days_back: u32,
        cap: usize,
    ) -> Self {
        Self {
            fetcher,
            calibration,
            days_back,
            cap,
        }
    }

    pub fn sample_ids(&self) -> Vec<i64> {
        let config = self.fetcher.config();
        estimator::estimate_window(&self.calibration, self.days_back)
            .sample(config.backtrack_step, Some(config.backtrack_sample_limit))
    }
}

#[async_trait]
impl DiscoveryStrategy for SystematicBacktrack {
    fn name(&self) -> &'static str {
        "systematic_backtrack"
    }

    async fn discover(&self, terms: &QueryTerms) -> Result<Vec<Article>> {
        let ids = self.sample_ids();
        info!(
            days_back = self.days_back,
            samples = ids.len(),
            cap = self.cap,
            "⏪ Backtracking through story ids"
        );
        let method = DiscoveryMethod::SystematicBacktrack;
        let found = probe_ids(&self.fetcher, ids, terms, method, self.cap).await?;
        info!(count = found.len(), "Systematic backtrack finished");
        Ok(found)
    }
}
