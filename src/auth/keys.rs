//! API key pairs and secret lookup

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Prefix of generated public and private keys
pub const KEY_PREFIX: &str = "APIK-";

const KEY_RANDOM_LEN: usize = 32;

/// A public key and the shared secret used to sign requests with it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// Identifier sent by callers as `pub`
    pub public_key: String,
    /// HMAC secret
    pub private_key: String,
}

impl ApiKey {
    /// Create a key pair from known values
    #[must_use]
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }

    /// Generate a fresh random key pair
    #[must_use]
    pub fn generate() -> Self {
        Self::new(random_key(), random_key())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

fn random_key() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}{}", KEY_PREFIX, token)
}

/// Resolves the shared secret for a public key
pub trait KeyStore: Send + Sync {
    /// Secret for `public_key`, or `None` if the key is unknown
    fn secret_for(&self, public_key: &str) -> Option<String>;
}

/// Key store over a fixed set of configured key pairs
#[derive(Debug, Clone, Default)]
pub struct StaticKeyStore {
    keys: HashMap<String, ApiKey>,
}

impl StaticKeyStore {
    /// Create an empty key store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key store from key pairs; later duplicates win
    #[must_use]
    pub fn from_keys(keys: impl IntoIterator<Item = ApiKey>) -> Self {
        let mut store = Self::new();
        for key in keys {
            store.insert(key);
        }
        store
    }

    /// Add or replace a key pair
    pub fn insert(&mut self, key: ApiKey) {
        self.keys.insert(key.public_key.clone(), key);
    }

    /// Number of known keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyStore for StaticKeyStore {
    fn secret_for(&self, public_key: &str) -> Option<String> {
        self.keys.get(public_key).map(|k| k.private_key.clone())
    }
}
