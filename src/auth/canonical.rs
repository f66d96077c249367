//! Canonical message construction for signed requests
//!
//! Signer and verifier must render exactly the same parameters, in the same
//! order, with the same encoding; any difference fails verification.

use std::fmt;

/// Ordered `name=value` pairs rendered as `a=1&b=2`.
///
/// Values are form-URL-encoded; names are written as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalMessage {
    pairs: Vec<(String, String)>,
}

impl CanonicalMessage {
    /// Start an empty message
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.push(name, value);
        self
    }

    /// Append a parameter in place
    pub fn push(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    /// Whether no parameters were added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render the message that gets signed
    #[must_use]
    pub fn render(&self) -> String {
        self.pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, form_encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for CanonicalMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Encode a value as `application/x-www-form-urlencoded`.
///
/// ASCII alphanumerics and `.-*_` pass through, space becomes `+`, every
/// other byte becomes an uppercase `%XX` escape.
#[must_use]
pub fn form_encode(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%20", "+")
        .replace('~', "%7E")
        .replace("%2A", "*")
}
