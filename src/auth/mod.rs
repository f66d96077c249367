//! Signed request authentication
//!
//! Privileged API calls carry a public key (`pub`), a signature (`sig`) and
//! an optional digest hint (`hmac`). The signature is the hex HMAC of a
//! [`CanonicalMessage`] built from the call's parameters, keyed with the
//! secret that belongs to the public key.
//!
//! ```rust
//! use std::sync::Arc;
//! use atoll::auth::{ApiKey, CanonicalMessage, HmacType, SignedRequestVerifier, StaticKeyStore, sign};
//!
//! let key = ApiKey::new("APIK-public", "APIK-secret");
//! let message = CanonicalMessage::new().param("pub", &key.public_key).render();
//! let signature = sign(&key.private_key, &message, HmacType::Sha512);
//!
//! let verifier = SignedRequestVerifier::new(Arc::new(StaticKeyStore::from_keys([key])));
//! assert!(verifier.verify("APIK-public", &signature, &message, HmacType::Sha512));
//! ```

pub mod canonical;
pub mod keys;
pub mod signature;

pub use canonical::{CanonicalMessage, form_encode};
pub use keys::{ApiKey, KEY_PREFIX, KeyStore, StaticKeyStore};
pub use signature::{HmacType, SignedRequestVerifier, sign};
