//! Failure taxonomy of the administration API

use thiserror::Error;

use super::response::ApiResponse;
use crate::error::Error as CrateError;

/// A failed administration call.
///
/// Every variant is reported to the caller as `{ok: false, message}` with
/// the variant's display text as the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The API is switched off
    #[error("API not enabled")]
    FeatureDisabled,

    /// A required operation parameter is absent or blank
    #[error("{0} is a required parameter")]
    MissingParameter(&'static str),

    /// `pub` or `sig` is absent while authentication is required
    #[error("{0} is a required parameter")]
    AuthRequired(&'static str),

    /// The signature does not match
    #[error("invalid signed url")]
    InvalidSignature,

    /// No repository has the given URL
    #[error("Was unable to find repository {0}")]
    NotFound(String),

    /// A repository with the same name is already registered
    #[error("repository name already exists")]
    Conflict,

    /// The repository to delete is not registered
    #[error("repository already deleted")]
    AlreadyDeleted,

    /// The scheduler refused the request
    #[error("was unable to force the index")]
    DownstreamFailure,

    /// The catalog failed
    #[error("repository storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Whether the failure points at a server-side problem rather than a
    /// caller mistake or a no-op request
    #[must_use]
    pub fn is_alarming(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::DownstreamFailure)
    }
}

impl From<CrateError> for ApiError {
    fn from(err: CrateError) -> Self {
        match err {
            CrateError::Catalog(detail) => Self::Storage(detail),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        ApiResponse::failure(err.to_string())
    }
}
