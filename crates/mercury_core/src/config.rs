use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Slow-moving facts about the publication's id space.
///
/// `current_max_id` and `daily_rate` drive the linear id estimate;
/// `absolute_floor` keeps estimated windows away from ids that never existed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub current_max_id: i64,
    pub current_min_id: i64,
    pub daily_rate: f64,
    pub absolute_floor: i64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            current_max_id: 9_053_686,
            current_min_id: 9_003_555,
            daily_rate: 1671.0,
            absolute_floor: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub base_url: String,
    pub source: String,
    pub user_agent: String,
    pub article_timeout_ms: u64,
    pub feed_timeout_ms: u64,
    pub pool_capacity: usize,
    pub feed_paths: Vec<String>,
    pub rss_max_pages: u32,
    pub page_delay_ms: u64,
    pub backtrack_step: i64,
    pub backtrack_sample_limit: usize,
    pub recent_span: i64,
    pub recent_step: i64,
    pub excerpt_len: usize,
    pub calibration: Calibration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.illawarramercury.com.au".to_string(),
            source: "illawarra_mercury".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            article_timeout_ms: 5_000,
            feed_timeout_ms: 10_000,
            pool_capacity: 10,
            feed_paths: vec![
                "/rss.xml".to_string(),
                "/news/rss.xml".to_string(),
                "/sport/rss.xml".to_string(),
            ],
            rss_max_pages: 20,
            page_delay_ms: 300,
            backtrack_step: 50,
            backtrack_sample_limit: 100,
            recent_span: 500,
            recent_step: 10,
            excerpt_len: 500,
            calibration: Calibration::default(),
        }
    }
}

impl DiscoveryConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if self.pool_capacity == 0 {
            return Err(Error::Config("pool_capacity must be at least 1".to_string()));
        }
        if self.backtrack_step <= 0 || self.recent_step <= 0 {
            return Err(Error::Config("sampling steps must be positive".to_string()));
        }
        let calibration = &self.calibration;
        if !(calibration.daily_rate >= 0.0 && calibration.daily_rate.is_finite()) {
            return Err(Error::Config(
                "daily_rate must be a finite, non-negative number".to_string(),
            ));
        }
        if calibration.absolute_floor < 0 {
            return Err(Error::Config("absolute_floor must not be negative".to_string()));
        }
        if calibration.current_max_id < calibration.absolute_floor {
            return Err(Error::Config(format!(
                "current_max_id {} is below absolute_floor {}",
                calibration.current_max_id, calibration.absolute_floor
            )));
        }
        if self.recent_span < 0 {
            return Err(Error::Config("recent_span must not be negative".to_string()));
        }
        Ok(())
    }

    pub fn story_url(&self, story_id: i64) -> String {
        format!("{}/story/{}/", self.base_url.trim_end_matches('/'), story_id)
    }

    pub fn feed_urls(&self) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        self.feed_paths
            .iter()
            .map(|path| format!("{}{}", base, path))
            .collect()
    }

    pub fn article_timeout(&self) -> Duration {
        Duration::from_millis(self.article_timeout_ms)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_millis(self.feed_timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}
