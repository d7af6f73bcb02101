use async_trait::async_trait;
use mercury_core::{Article, Calibration, DiscoveryMethod, Result};
use std::sync::Arc;
use tracing::info;

use super::{probe_ids, DiscoveryStrategy};
use crate::estimator;
use crate::fetcher::ArticleFetcher;
use crate::relevance::QueryTerms;

/// Dense scan just below the newest known story id.
pub struct RecentRangeScan {
    fetcher: Arc<ArticleFetcher>,
    calibration: Calibration,
    cap: usize,
}

impl RecentRangeScan {
    pub fn new(fetcher: Arc<ArticleFetcher>, calibration: Calibration, cap: usize) -> Self {
        Self {
            fetcher,
            calibration,
            cap,
        }
    }

    pub fn sample_ids(&self) -> Vec<i64> {
        let config = self.fetcher.config();
        estimator::recent_window(&self.calibration, config.recent_span)
            .sample(config.recent_step, None)
    }
}

#[async_trait]
impl DiscoveryStrategy for RecentRangeScan {
    fn name(&self) -> &'static str {
        "recent_range_scan"
    }

    async fn discover(&self, terms: &QueryTerms) -> Result<Vec<Article>> {
        let ids = self.sample_ids();
        info!(samples = ids.len(), cap = self.cap, "🆕 Scanning recent story ids");
        let method = DiscoveryMethod::RecentRangeScan;
        let found = probe_ids(&self.fetcher, ids, terms, method, self.cap).await?;
        info!(count = found.len(), "Recent range scan finished");
        Ok(found)
    }
}
