//! Response envelope returned by every administration call

use serde::{Deserialize, Serialize};

use crate::repository::RepositoryRecord;

/// `{ok, message, data?}` envelope; `data` is only set by `list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Whether the call succeeded
    pub ok: bool,
    /// Human readable outcome
    pub message: String,
    /// Repositories returned by `list`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<RepositoryRecord>>,
}

impl ApiResponse {
    /// A successful response with a message
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            data: None,
        }
    }

    /// A successful response carrying repositories
    #[must_use]
    pub fn with_repositories(repositories: Vec<RepositoryRecord>) -> Self {
        Self {
            ok: true,
            message: String::new(),
            data: Some(repositories),
        }
    }

    /// A failed response
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            data: None,
        }
    }
}
