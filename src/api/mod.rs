//! Repository administration API
//!
//! [`RepositoryAdminService`] implements the operations over plain
//! [`RequestParams`]; the optional `http` module exposes them over axum.

pub mod error;
pub mod params;
pub mod response;
pub mod service;

#[cfg(feature = "http")]
pub mod http;

pub use error::ApiError;
pub use params::RequestParams;
pub use response::ApiResponse;
pub use service::RepositoryAdminService;
