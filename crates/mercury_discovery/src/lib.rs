pub mod cli;
pub mod estimator;
pub mod fetcher;
pub mod http;
pub mod logging;
pub mod markup;
pub mod merge;
pub mod orchestrator;
pub mod pool;
pub mod relevance;
pub mod strategies;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cli::{handle_command, DiscoveryCommands};
pub use fetcher::{Absence, ArticleFetcher, ProbeOutcome};
pub use http::HttpFetcher;
pub use orchestrator::{DiscoveryEngine, SearchReport, StrategyReport};
pub use pool::WorkerPool;
pub use relevance::QueryTerms;

pub mod prelude {
    pub use super::orchestrator::{DiscoveryEngine, SearchReport};
    pub use super::strategies::DiscoveryStrategy;
    pub use mercury_core::{Article, DiscoveryConfig, Error, Result};
}
