use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use mercury_core::{Article, DiscoveryMethod, Result};

use crate::fetcher::{ArticleFetcher, ProbeOutcome};
use crate::relevance::QueryTerms;

pub mod backtrack;
pub mod recent;
pub mod rss;

pub use backtrack::SystematicBacktrack;
pub use recent::RecentRangeScan;
pub use rss::RssDeepScan;

/// One independent way of finding candidate stories.
#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates in the order they were found. `Err` means the strategy
    /// could not run at all, not that it came back empty.
    async fn discover(&self, terms: &QueryTerms) -> Result<Vec<Article>>;
}

/// Probe `ids` concurrently and keep up to `cap` candidates in completion order.
///
/// Polling stops once the cap is reached, which drops the probes still in
/// flight. Fails only when no probe could start at all.
pub(crate) async fn probe_ids(
    fetcher: &ArticleFetcher,
    ids: Vec<i64>,
    terms: &QueryTerms,
    method: DiscoveryMethod,
    cap: usize,
) -> Result<Vec<Article>> {
    if cap == 0 || ids.is_empty() {
        return Ok(Vec::new());
    }

    let total = ids.len();
    let mut probes = stream::iter(ids)
        .map(|story_id| fetcher.fetch_by_id(story_id, terms, method))
        .buffer_unordered(fetcher.pool().capacity());

    let mut found = Vec::new();
    let mut refused = 0;
    let mut first_error = None;
    while let Some(result) = probes.next().await {
        match result {
            Ok(ProbeOutcome::Found(article)) => {
                found.push(article);
                if found.len() >= cap {
                    break;
                }
            }
            Ok(ProbeOutcome::Absent(_)) => {}
            Err(e) => {
                refused += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) if refused == total => Err(e),
        _ => Ok(found),
    }
}
