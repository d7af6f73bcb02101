use mercury_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// The one bounded resource shared by every strategy in a search.
///
/// A permit is held for exactly one outstanding fetch, so the capacity caps
/// concurrent requests against the origin no matter how many strategies run.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.semaphore.acquire().await.map_err(|_| Error::PoolClosed)
    }

    /// Run `work` while holding a permit.
    pub async fn run<F, T>(&self, work: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self.acquire().await?;
        Ok(work.await)
    }

    /// Refuse all further work. Waiters and later callers get `PoolClosed`.
    pub fn close(&self) {
        self.semaphore.close();
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(10)
    }
}
