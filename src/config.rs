//! Configuration management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::{ApiKey, StaticKeyStore};
use crate::error::{Error, Result};

const ENV_PREFIX: &str = "ATOLL_";

/// Switches of the administration API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Whether the API answers at all
    pub enabled: bool,
    /// Whether gated operations require a signed request
    pub auth_required: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            auth_required: true,
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Debug mode
    pub debug: bool,
    /// Log level
    pub log_level: String,
    /// Administration API switches
    pub api: ApiSettings,
    /// HTTP listener
    pub server: ServerSettings,
    /// Key pairs accepted for signed requests
    pub keys: Vec<ApiKey>,
    /// Catalog snapshot file; `None` keeps the catalog in memory only
    pub catalog_path: Option<PathBuf>,
    /// Seconds between deletion worker passes
    pub deletion_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            log_level: "info".to_string(),
            api: ApiSettings::default(),
            server: ServerSettings::default(),
            keys: Vec::new(),
            catalog_path: default_catalog_path(),
            deletion_interval_secs: 5,
        }
    }
}

fn default_catalog_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "atoll").map(|d| d.data_dir().join("catalog.json"))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Apply `ATOLL_*` environment variables over this configuration
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which resolves `ATOLL_*` variable names
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(val) = var("DEBUG") {
            self.debug = parse_bool(&val);
        }

        if let Some(val) = var("LOG_LEVEL") {
            self.log_level = val;
        }

        if let Some(val) = var("API_ENABLED") {
            self.api.enabled = parse_bool(&val);
        }

        if let Some(val) = var("API_AUTH") {
            self.api.auth_required = parse_bool(&val);
        }

        if let Some(val) = var("HOST") {
            self.server.host = val;
        }

        if let Some(val) = var("PORT") {
            self.server.port = val
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid port: {}", val)))?;
        }

        if let Some(val) = var("CATALOG_PATH") {
            self.catalog_path = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        match (var("API_PUBLIC_KEY"), var("API_PRIVATE_KEY")) {
            (Some(public_key), Some(private_key)) => {
                self.keys.push(ApiKey::new(public_key, private_key));
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(format!(
                    "{0}API_PUBLIC_KEY and {0}API_PRIVATE_KEY must be set together",
                    ENV_PREFIX
                )));
            }
        }

        Ok(self)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if is_yaml(path) {
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(Error::Json)
        }
    }

    /// Write configuration to a file, as YAML or JSON by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self).map_err(|e| Error::Config(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self)?
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Key store over the configured key pairs
    #[must_use]
    pub fn key_store(&self) -> StaticKeyStore {
        StaticKeyStore::from_keys(self.keys.iter().cloned())
    }

    /// Copy with every private key masked, for display
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        for key in &mut config.keys {
            key.private_key = "<redacted>".to_string();
        }
        config
    }

    /// Log filter directive for this crate; `debug` wins over `log_level`
    #[must_use]
    pub fn log_directive(&self) -> String {
        if self.debug {
            "atoll=debug".to_string()
        } else {
            format!("atoll={}", self.log_level.trim().to_lowercase())
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
