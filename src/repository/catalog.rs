//! Repository catalog storage

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};

use super::record::RepositoryRecord;

/// Storage for registered repositories.
///
/// Names are matched exactly; callers pass names already normalized with
/// [`super::normalize_name`].
#[async_trait]
pub trait RepositoryCatalog: Send + Sync {
    /// Find a repository by its name
    async fn get_by_name(&self, name: &str) -> Result<Option<RepositoryRecord>>;

    /// Find a repository by its clone URL
    async fn get_by_url(&self, url: &str) -> Result<Option<RepositoryRecord>>;

    /// List every repository in registration order
    async fn list(&self) -> Result<Vec<RepositoryRecord>>;

    /// Insert or replace a repository (matched by name).
    ///
    /// Unsaved records are assigned an id. Returns the stored record.
    async fn save(&self, record: RepositoryRecord) -> Result<RepositoryRecord>;

    /// Insert a repository only if no repository has its name.
    ///
    /// Returns the stored record, or `None` when the name is taken. The
    /// check and the insert are one atomic step.
    async fn insert_new(&self, record: RepositoryRecord) -> Result<Option<RepositoryRecord>>;

    /// Remove a repository by name; returns whether one was removed
    async fn delete_by_name(&self, name: &str) -> Result<bool>;
}

/// In-memory catalog with an optional JSON snapshot on disk.
///
/// When a snapshot path is set, the file is loaded on open and rewritten
/// after every mutation.
#[derive(Debug)]
pub struct MemoryCatalog {
    records: RwLock<Vec<RepositoryRecord>>,
    next_id: AtomicI64,
    snapshot_path: Option<PathBuf>,
}

impl MemoryCatalog {
    /// Create an empty catalog that lives only in memory
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            snapshot_path: None,
        }
    }

    /// Open a catalog backed by a JSON snapshot, loading it if it exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = Self::load_snapshot(&path)?;
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0).max(0) + 1;

        if !records.is_empty() {
            info!("Loaded {} repositories from {:?}", records.len(), path);
        }

        Ok(Self {
            records: RwLock::new(records),
            next_id: AtomicI64::new(next_id),
            snapshot_path: Some(path),
        })
    }

    /// Path of the JSON snapshot, if any
    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Number of registered repositories
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether no repositories are registered
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    fn load_snapshot(path: &Path) -> Result<Vec<RepositoryRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content)
            .map_err(|e| Error::catalog(format!("invalid snapshot {:?}: {}", path, e)))
    }

    /// Persist `records`, replacing the snapshot atomically.
    ///
    /// Called before the in-memory list is updated, so a failed write leaves
    /// both memory and disk unchanged.
    fn write_snapshot(&self, records: &[RepositoryRecord]) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            std::fs::remove_file(&tmp).ok();
            return Err(e.into());
        }

        debug!("Wrote catalog snapshot with {} repositories", records.len());
        Ok(())
    }

    fn assign_id(&self, record: &mut RepositoryRecord) {
        if !record.is_saved() {
            record.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryCatalog for MemoryCatalog {
    async fn get_by_name(&self, name: &str) -> Result<Option<RepositoryRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.name() == name).cloned())
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<RepositoryRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.url == url).cloned())
    }

    async fn list(&self) -> Result<Vec<RepositoryRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn save(&self, mut record: RepositoryRecord) -> Result<RepositoryRecord> {
        let mut records = self.records.write().await;
        let mut next = records.clone();

        match next.iter().position(|r| r.name() == record.name()) {
            Some(index) => {
                if !record.is_saved() {
                    record.id = next[index].id;
                }
                next[index] = record.clone();
            }
            None => {
                self.assign_id(&mut record);
                next.push(record.clone());
            }
        }

        self.write_snapshot(&next)?;
        *records = next;
        debug!("Saved repository {} (id {})", record.name(), record.id);
        Ok(record)
    }

    async fn insert_new(&self, mut record: RepositoryRecord) -> Result<Option<RepositoryRecord>> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.name() == record.name()) {
            return Ok(None);
        }

        self.assign_id(&mut record);
        let mut next = records.clone();
        next.push(record.clone());

        self.write_snapshot(&next)?;
        *records = next;
        debug!("Inserted repository {} (id {})", record.name(), record.id);
        Ok(Some(record))
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        if !records.iter().any(|r| r.name() == name) {
            return Ok(false);
        }

        let next: Vec<RepositoryRecord> =
            records.iter().filter(|r| r.name() != name).cloned().collect();
        self.write_snapshot(&next)?;
        *records = next;
        Ok(true)
    }
}
