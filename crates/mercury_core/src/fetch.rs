use async_trait::async_trait;
use std::time::Duration;
use crate::Result;

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the body of a successful response.
    ///
    /// Transport failures, timeouts and non-success statuses are all errors;
    /// callers decide whether that means "nothing here" or a real failure.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String>;
}
