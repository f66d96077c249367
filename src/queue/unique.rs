//! FIFO queue that holds at most one pending entry per key

use std::collections::{HashSet, VecDeque};

use tokio::sync::Mutex;
use tracing::debug;

/// Key used to decide whether two queue entries are the same pending work.
pub trait QueueIdentity {
    /// Deduplication key
    fn queue_key(&self) -> &str;
}

#[derive(Debug)]
struct Inner<T> {
    items: VecDeque<T>,
    keys: HashSet<String>,
}

/// Unbounded FIFO queue rejecting items whose key is already pending.
///
/// Membership check and insertion happen under a single lock, so concurrent
/// producers can never leave two entries with the same key in the queue.
/// Once an entry is taken out again its key may be queued anew.
#[derive(Debug)]
pub struct UniqueWorkQueue<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: QueueIdentity> UniqueWorkQueue<T> {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                keys: HashSet::new(),
            }),
        }
    }

    /// Append an item. Returns `false` (and drops the item) if its key is
    /// already pending.
    pub async fn add(&self, item: T) -> bool {
        let mut inner = self.inner.lock().await;
        let key = item.queue_key();

        if inner.keys.contains(key) {
            debug!("{} already queued, skipping", key);
            return false;
        }

        inner.keys.insert(key.to_string());
        inner.items.push_back(item);
        true
    }

    /// Take the oldest pending item
    pub async fn poll(&self) -> Option<T> {
        let mut inner = self.inner.lock().await;
        let item = inner.items.pop_front()?;
        inner.keys.remove(item.queue_key());
        Some(item)
    }

    /// Take every pending item in insertion order
    pub async fn drain(&self) -> Vec<T> {
        let mut inner = self.inner.lock().await;
        inner.keys.clear();
        inner.items.drain(..).collect()
    }

    /// Drop the pending item with the given key, if any
    pub async fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if !inner.keys.remove(key) {
            return false;
        }
        inner.items.retain(|item| item.queue_key() != key);
        true
    }

    /// Whether an item with the given key is pending
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.lock().await.keys.contains(key)
    }

    /// Number of pending items
    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    /// Whether nothing is pending
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    /// Drop every pending item
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.items.clear();
        inner.keys.clear();
    }
}

impl<T: QueueIdentity + Clone> UniqueWorkQueue<T> {
    /// Copy of every pending item in insertion order, leaving them queued
    pub async fn snapshot(&self) -> Vec<T> {
        self.inner.lock().await.items.iter().cloned().collect()
    }
}

impl<T: QueueIdentity> Default for UniqueWorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
