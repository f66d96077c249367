#![allow(clippy::uninlined_format_args)]
//! Atoll - signed administration API for a code indexing service
//!
//! This crate provides:
//! - **repository**: repository records and the catalog that stores them
//! - **queue**: FIFO work queues holding at most one pending entry per key
//! - **auth**: HMAC request signing, canonical messages and API keys
//! - **scheduler**: index job triggers over the index-pending queue
//! - **worker**: background removal of repositories queued for deletion
//! - **api**: the five administration operations and their HTTP routes
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use atoll::prelude::*;
//!
//! # async fn run() {
//! let catalog: Arc<dyn RepositoryCatalog> = Arc::new(MemoryCatalog::new());
//! let scheduler = Arc::new(IndexScheduler::new(catalog.clone(), Arc::new(UniqueWorkQueue::new())));
//! let verifier = SignedRequestVerifier::new(Arc::new(StaticKeyStore::new()));
//!
//! let service = RepositoryAdminService::new(
//!     ApiSettings { enabled: true, auth_required: false },
//!     verifier,
//!     catalog,
//!     scheduler,
//!     Arc::new(UniqueWorkQueue::new()),
//! );
//!
//! let params = RequestParams::new().with("repoUrl", "https://example.com/repo.git");
//! let response = service.index_one(&params).await;
//! assert!(!response.ok);
//! # }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod queue;
pub mod repository;
pub mod scheduler;
pub mod worker;

pub use api::{ApiError, ApiResponse, RepositoryAdminService, RequestParams};
pub use auth::{ApiKey, HmacType, KeyStore, SignedRequestVerifier, StaticKeyStore};
pub use config::{ApiSettings, Config, ServerSettings};
pub use error::{Error, Result};
pub use queue::{QueueIdentity, UniqueWorkQueue};
pub use repository::{MemoryCatalog, RepositoryCatalog, RepositoryRecord, ScmType};
pub use scheduler::{IndexScheduler, JobScheduler};
pub use worker::DeletionWorker;

/// Commonly used types
pub mod prelude {
    pub use crate::api::{ApiError, ApiResponse, RepositoryAdminService, RequestParams};
    pub use crate::auth::{
        ApiKey, CanonicalMessage, HmacType, KeyStore, SignedRequestVerifier, StaticKeyStore, sign,
    };
    pub use crate::config::{ApiSettings, Config};
    pub use crate::queue::{QueueIdentity, UniqueWorkQueue};
    pub use crate::repository::{MemoryCatalog, RepositoryCatalog, RepositoryRecord, ScmType};
    pub use crate::scheduler::{IndexScheduler, JobScheduler};
    pub use crate::worker::DeletionWorker;
}
