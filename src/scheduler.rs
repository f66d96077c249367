//! Index job scheduling
//!
//! The administration API never indexes anything itself. It asks a
//! [`JobScheduler`] to rebuild or to push repositories onto the
//! index-pending queue that the indexer drains.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::queue::UniqueWorkQueue;
use crate::repository::{RepositoryCatalog, RepositoryRecord};

/// Downstream job trigger used by the administration API
#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Request a full rebuild of every index. Returns `false` if the rebuild
    /// cannot be started.
    async fn rebuild_all(&self) -> bool;

    /// Queue every registered repository for indexing immediately
    async fn force_enqueue(&self) -> bool;

    /// Queue one repository for indexing immediately
    async fn force_enqueue_repository(&self, record: &RepositoryRecord) -> bool;
}

/// Scheduler feeding the index-pending queue from the catalog
pub struct IndexScheduler {
    catalog: Arc<dyn RepositoryCatalog>,
    index_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    paused: AtomicBool,
    generation: AtomicU64,
}

impl IndexScheduler {
    /// Create a scheduler over a catalog and the index-pending queue
    #[must_use]
    pub fn new(
        catalog: Arc<dyn RepositoryCatalog>,
        index_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    ) -> Self {
        Self {
            catalog,
            index_queue,
            paused: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Pause indexing; rebuilds are refused until [`Self::resume`]
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        info!("Indexing paused");
    }

    /// Resume indexing
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        info!("Indexing resumed");
    }

    /// Whether indexing is paused
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Number of rebuilds started so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The index-pending queue
    #[must_use]
    pub fn index_queue(&self) -> &Arc<UniqueWorkQueue<RepositoryRecord>> {
        &self.index_queue
    }

    /// Hand every pending index job to the indexer
    pub async fn drain_pending(&self) -> Vec<RepositoryRecord> {
        self.index_queue.drain().await
    }
}

#[async_trait]
impl JobScheduler for IndexScheduler {
    async fn rebuild_all(&self) -> bool {
        if self.is_paused() {
            warn!("Rebuild requested while indexing is paused");
            return false;
        }

        self.index_queue.clear().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Started index rebuild (generation {})", generation);
        true
    }

    async fn force_enqueue(&self) -> bool {
        let records = match self.catalog.list().await {
            Ok(records) => records,
            Err(e) => {
                error!("Unable to list repositories for indexing: {}", e);
                return false;
            }
        };

        let total = records.len();
        let mut queued = 0;
        for record in records {
            if self.index_queue.add(record).await {
                queued += 1;
            }
        }

        info!("Force enqueued {} of {} repositories", queued, total);
        true
    }

    async fn force_enqueue_repository(&self, record: &RepositoryRecord) -> bool {
        let queued = self.index_queue.add(record.clone()).await;
        info!("Force enqueued {} (newly queued: {})", record.name(), queued);
        queued
    }
}
