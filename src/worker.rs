//! Background removal of repositories queued for deletion

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tracing::{debug, error, info};

use crate::queue::{QueueIdentity, UniqueWorkQueue};
use crate::repository::{RepositoryCatalog, RepositoryRecord};

/// Consumer of the delete-pending queue
pub struct DeletionWorker {
    catalog: Arc<dyn RepositoryCatalog>,
    delete_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    index_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    running: RwLock<bool>,
}

impl DeletionWorker {
    /// Create a worker draining `delete_queue` into `catalog`.
    ///
    /// Pending index jobs for a removed repository are dropped from
    /// `index_queue`.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn RepositoryCatalog>,
        delete_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
        index_queue: Arc<UniqueWorkQueue<RepositoryRecord>>,
    ) -> Self {
        Self {
            catalog,
            delete_queue,
            index_queue,
            running: RwLock::new(false),
        }
    }

    /// Process everything currently queued. Returns the number of
    /// repositories removed from the catalog.
    ///
    /// An entry stays queued until the catalog has let go of it, so a
    /// failed removal is retried on the next pass and the name keeps
    /// deduplicating new delete requests meanwhile.
    pub async fn run_once(&self) -> usize {
        let pending = self.delete_queue.snapshot().await;
        if pending.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for record in pending {
            let name = record.queue_key();

            match self.catalog.delete_by_name(name).await {
                Ok(true) => {
                    info!("Deleted repository {}", name);
                    removed += 1;
                }
                Ok(false) => debug!("Repository {} was already gone", name),
                Err(e) => {
                    error!("Failed to delete repository {}, will retry: {}", name, e);
                    continue;
                }
            }

            self.delete_queue.remove(name).await;
            self.index_queue.remove(name).await;
        }

        removed
    }

    /// Run until [`Self::stop`] is called, processing the queue on every tick.
    ///
    /// Returns immediately if the worker is already running.
    pub async fn run(&self, every: Duration) {
        {
            let mut running = self.running.write().await;
            if *running {
                return;
            }
            *running = true;
        }

        info!("Starting deletion worker (interval: {:?})", every);

        let mut ticker = interval(every);

        loop {
            ticker.tick().await;

            if !*self.running.read().await {
                break;
            }

            self.run_once().await;
        }

        info!("Deletion worker stopped");
    }

    /// Ask a running worker to stop after its current pass
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// Whether the worker loop is active
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
