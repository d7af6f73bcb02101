use mercury_core::{ArticleStorage, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

pub mod backends;

pub use backends::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            #[cfg(feature = "sqlite")]
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(Error::Config(format!("Unsupported storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
            #[cfg(feature = "sqlite")]
            StorageKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Build a storage backend by name. `database` is only used by file-backed stores.
pub async fn create_storage(kind: &str, database: Option<&str>) -> Result<Arc<dyn ArticleStorage>> {
    let kind: StorageKind = kind.parse()?;
    let storage: Arc<dyn ArticleStorage> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => {
            let path = std::path::PathBuf::from(database.unwrap_or("articles.db"));
            Arc::new(SQLiteStorage::new_with_path(&path).await?)
        }
    };
    if kind == StorageKind::Memory && database.is_some() {
        info!("Ignoring database path for in-memory storage");
    }
    info!(backend = %kind, "Storage backend ready");
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}
