//! Repository records registered through the administration API

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::queue::QueueIdentity;

/// Branch used when a repository is registered without one
pub const DEFAULT_BRANCH: &str = "master";

/// Source control system of a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScmType {
    /// Git repository
    #[default]
    Git,
    /// Subversion repository
    Svn,
    /// Plain directory on the indexing host
    File,
}

impl ScmType {
    /// Parse a caller supplied type, falling back to git for anything unknown.
    ///
    /// The value is trimmed and lowercased before matching.
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().to_lowercase().parse().ok())
            .unwrap_or_default()
    }

    /// Wire name of the type
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Svn => "svn",
            Self::File => "file",
        }
    }
}

impl fmt::Display for ScmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScmType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "git" => Ok(Self::Git),
            "svn" => Ok(Self::Svn),
            "file" => Ok(Self::File),
            other => Err(Error::InvalidArgument(format!("unknown scm type: {}", other))),
        }
    }
}

/// Opaque per-repository metadata owned by the indexer.
///
/// Stored and returned as a JSON object blob; never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoData(Map<String, Value>);

impl RepoData {
    /// Create empty metadata (`{}`)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse metadata from its serialized form. `null` and blank input are empty.
    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }

        match serde_json::from_str::<Value>(raw)? {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self(map)),
            _ => Err(Error::InvalidArgument(
                "repository data must be a JSON object".to_string(),
            )),
        }
    }

    /// Serialize the metadata blob
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Look up a metadata value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a metadata value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Whether no metadata is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A repository known to the indexing service.
///
/// `name` never contains spaces and `branch` is never blank; both are
/// normalized on every path into the record. The derived `PartialEq`
/// compares every field; queue deduplication goes through
/// [`QueueIdentity`] instead, which only looks at the name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    /// Storage identity, [`RepositoryRecord::UNSAVED_ID`] until persisted
    pub id: i64,
    #[serde(deserialize_with = "deserialize_name")]
    name: String,
    /// Source control type
    #[serde(default, deserialize_with = "deserialize_scm")]
    pub scm: ScmType,
    /// Clone URL or path
    pub url: String,
    /// Username for authenticated clones
    #[serde(default)]
    pub username: String,
    /// Password for authenticated clones
    #[serde(default)]
    pub password: String,
    /// Free-form source tag
    #[serde(default)]
    pub source: String,
    #[serde(
        default = "default_branch",
        deserialize_with = "deserialize_branch"
    )]
    branch: String,
    /// Indexer metadata
    #[serde(default)]
    pub data: RepoData,
}

impl RepositoryRecord {
    /// Id of a record that has not been persisted yet
    pub const UNSAVED_ID: i64 = -1;

    /// Create an unsaved git repository on the default branch
    #[must_use]
    pub fn new(name: impl AsRef<str>, url: impl Into<String>) -> Self {
        Self {
            id: Self::UNSAVED_ID,
            name: normalize_name(name.as_ref()),
            scm: ScmType::Git,
            url: url.into(),
            username: String::new(),
            password: String::new(),
            source: String::new(),
            branch: DEFAULT_BRANCH.to_string(),
            data: RepoData::new(),
        }
    }

    /// Set the storage id
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Set the source control type
    #[must_use]
    pub fn with_scm(mut self, scm: ScmType) -> Self {
        self.scm = scm;
        self
    }

    /// Set clone credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the source tag
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the branch (blank selects the default branch)
    #[must_use]
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.set_branch(branch);
        self
    }

    /// Set the metadata blob
    #[must_use]
    pub fn with_data(mut self, data: RepoData) -> Self {
        self.data = data;
        self
    }

    /// Normalized repository name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the repository
    pub fn set_name(&mut self, name: &str) {
        self.name = normalize_name(name);
    }

    /// Branch to index
    #[must_use]
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Change the branch (blank selects the default branch)
    pub fn set_branch(&mut self, branch: &str) {
        self.branch = normalize_branch(Some(branch));
    }

    /// Whether storage has assigned an id
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.id != Self::UNSAVED_ID
    }

    /// Filesystem-safe handle for the checkout directory.
    ///
    /// Every run of characters outside `[A-Za-z0-9_]` is replaced by the id.
    #[must_use]
    pub fn directory_name(&self) -> String {
        let id = self.id.to_string();
        let mut out = String::with_capacity(self.name.len());
        let mut in_run = false;

        for c in self.name.chars() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
                in_run = false;
            } else if !in_run {
                out.push_str(&id);
                in_run = true;
            }
        }

        out
    }
}

impl QueueIdentity for RepositoryRecord {
    fn queue_key(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepositoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.name, self.scm, self.url, self.username, self.source, self.branch
        )
    }
}

/// Normalize a repository name: spaces become hyphens.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.replace(' ', "-")
}

/// Normalize a branch: absent or blank selects [`DEFAULT_BRANCH`].
#[must_use]
pub fn normalize_branch(branch: Option<&str>) -> String {
    match branch {
        Some(b) if !b.trim().is_empty() => b.to_string(),
        _ => DEFAULT_BRANCH.to_string(),
    }
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn deserialize_name<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|name| normalize_name(&name))
}

fn deserialize_branch<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|branch| normalize_branch(branch.as_deref()))
}

fn deserialize_scm<'de, D>(deserializer: D) -> std::result::Result<ScmType, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|scm| ScmType::parse_lenient(scm.as_deref()))
}
