use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Which discovery pass produced an article. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DiscoveryMethod {
    SystematicBacktrack,
    RecentRangeScan,
    RssDeepScan { page: u32 },
}

const RSS_PAGE_PREFIX: &str = "rss_deep_scan_page_";

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMethod::SystematicBacktrack => f.write_str("systematic_backtrack"),
            DiscoveryMethod::RecentRangeScan => f.write_str("recent_range_scan"),
            DiscoveryMethod::RssDeepScan { page } => write!(f, "{}{}", RSS_PAGE_PREFIX, page),
        }
    }
}

impl FromStr for DiscoveryMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "systematic_backtrack" => Ok(DiscoveryMethod::SystematicBacktrack),
            "recent_range_scan" => Ok(DiscoveryMethod::RecentRangeScan),
            other => other
                .strip_prefix(RSS_PAGE_PREFIX)
                .and_then(|page| page.parse().ok())
                .map(|page| DiscoveryMethod::RssDeepScan { page })
                .ok_or_else(|| Error::Parse(format!("Unknown discovery method: {}", other))),
        }
    }
}

impl From<DiscoveryMethod> for String {
    fn from(method: DiscoveryMethod) -> Self {
        method.to_string()
    }
}

impl TryFrom<String> for DiscoveryMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A discovered story. Candidates and persisted records share this shape;
/// `story_id` is the only identity used for deduplication and upserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub story_id: i64,
    pub title: String,
    pub url: String,
    pub content: String,
    pub publish_date: String,
    pub discovered_date: DateTime<Utc>,
    pub relevance_score: f64,
    pub discovery_method: DiscoveryMethod,
    pub source: String,
}

impl Article {
    /// Creates a candidate stamped with the current time.
    pub fn new(
        story_id: i64,
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
        discovery_method: DiscoveryMethod,
    ) -> Self {
        Self {
            story_id,
            title: title.into(),
            url: url.into(),
            content: content.into(),
            publish_date: String::new(),
            discovered_date: Utc::now(),
            relevance_score: 0.0,
            discovery_method,
            source: source.into(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.relevance_score = score;
        self
    }

    pub fn with_publish_date(mut self, publish_date: impl Into<String>) -> Self {
        self.publish_date = publish_date.into();
        self
    }

    pub fn with_discovery_method(mut self, method: DiscoveryMethod) -> Self {
        self.discovery_method = method;
        self
    }

    /// Case-insensitive substring match on title or content.
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.content.to_lowercase().contains(&needle)
    }
}

/// Truncates to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
