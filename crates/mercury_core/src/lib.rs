pub mod config;
pub mod error;
pub mod fetch;
pub mod storage;
pub mod types;

pub use config::{Calibration, DiscoveryConfig};
pub use error::{Error, Result};
pub use fetch::PageFetcher;
pub use storage::ArticleStorage;
pub use types::{truncate_chars, Article, DiscoveryMethod};

pub mod prelude {
    pub use crate::{Article, ArticleStorage, DiscoveryMethod, Error, PageFetcher, Result};
}
