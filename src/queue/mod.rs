//! Deduplicating work queues
//!
//! Repository mutations are handed to background consumers through
//! [`UniqueWorkQueue`], which holds at most one pending entry per key.

pub mod unique;

pub use unique::{QueueIdentity, UniqueWorkQueue};
