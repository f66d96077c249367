//! Repository records and the catalog that stores them

pub mod catalog;
pub mod record;

pub use catalog::{MemoryCatalog, RepositoryCatalog};
pub use record::{
    DEFAULT_BRANCH, RepoData, RepositoryRecord, ScmType, normalize_branch, normalize_name,
};
