//! Named string parameters of an administration call

use std::collections::HashMap;

use serde::Deserialize;

/// Bag of request parameters, as decoded from a query string or form body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RequestParams(HashMap<String, String>);

impl RequestParams {
    /// Create an empty parameter bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a parameter in place
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    /// Raw value of a parameter, `None` when absent
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Value of a parameter that must be present and non-blank
    #[must_use]
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }

    /// Merge `other` over these parameters; its values win
    pub fn merge(&mut self, other: RequestParams) {
        self.0.extend(other.0);
    }

    /// Number of parameters
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no parameters were supplied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
