use clap::Subcommand;
use mercury_core::Result;
use serde_json::{json, Value};

use crate::orchestrator::DiscoveryEngine;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum DiscoveryCommands {
    /// Run every discovery strategy and store the ranked results
    Search {
        /// Free-text query
        query: String,
        /// How far back the id backtrack should reach
        #[arg(long, default_value_t = 30)]
        days_back: u32,
        #[arg(long, default_value_t = 20)]
        max_results: usize,
        /// Refresh the id calibration from stored articles first
        #[arg(long)]
        recalibrate: bool,
    },
    /// Search previously stored articles
    Cached { query: String },
    /// List articles discovered in the last few hours
    Recent {
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
    /// Show the story id window a backtrack would sample
    Window {
        #[arg(long, default_value_t = 30)]
        days_back: u32,
    },
}

pub async fn handle_command(
    command: DiscoveryCommands,
    engine: &mut DiscoveryEngine,
) -> Result<Value> {
    match command {
        DiscoveryCommands::Search {
            query,
            days_back,
            max_results,
            recalibrate,
        } => {
            if recalibrate {
                engine.recalibrate().await?;
            }
            let report = engine.comprehensive_search(&query, days_back, max_results).await?;
            Ok(serde_json::to_value(report)?)
        }
        DiscoveryCommands::Cached { query } => {
            let articles = engine.search_cached(&query).await?;
            Ok(json!({ "query": query, "total": articles.len(), "articles": articles }))
        }
        DiscoveryCommands::Recent { hours } => {
            let articles = engine.recent_articles(hours).await?;
            Ok(json!({ "hours": hours, "total": articles.len(), "articles": articles }))
        }
        DiscoveryCommands::Window { days_back } => {
            let window = engine.estimate_window(days_back);
            Ok(json!({
                "days_back": days_back,
                "calibration": engine.calibration(),
                "window": window,
                "samples": window.sample(
                    engine.config().backtrack_step,
                    Some(engine.config().backtrack_sample_limit),
                ).len(),
            }))
        }
    }
}
