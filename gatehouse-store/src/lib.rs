//! # Gatehouse Store
//!
//! The shared key-value store behind token revocation and refresh
//! coordination.
//!
//! [`RevocationStore`] is the seam to the external store: plain string
//! values with optional TTLs, small hashes, and one atomic primitive,
//! [`RevocationStore::hset_if_absent_expire_at`], used to publish refresh
//! records. [`MemoryStore`] implements it in process for tests and
//! single-node deployments; a networked backend implements the same trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

mod error;
mod keys;
mod memory;

pub use error::StoreError;
pub use keys::KeySpace;
pub use memory::{MemoryStore, SWEEP_INTERVAL_SECONDS};

/// Outcome of an insert-if-absent hash write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashWrite {
    /// The hash was created and its expiry set
    Written,
    /// Another writer got there first; these are its fields
    Exists(HashMap<String, String>),
}

#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store a string value, replacing whatever the key held.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), StoreError>;

    /// Returns whether a key was removed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Reset the TTL of an existing key. Returns `false` when the key is
    /// missing.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Expire an existing key at an absolute unix timestamp.
    async fn expire_at(&self, key: &str, timestamp: i64) -> Result<bool, StoreError>;

    /// All fields of a hash, empty when the key is missing.
    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Set fields on a hash, creating it if needed.
    async fn hset(&self, key: &str, fields: HashMap<String, String>) -> Result<(), StoreError>;

    /// Create the hash with `fields` and expire it at `timestamp`, only if the
    /// key does not exist. Both steps apply together or not at all.
    async fn hset_if_absent_expire_at(
        &self,
        key: &str,
        fields: HashMap<String, String>,
        timestamp: i64,
    ) -> Result<HashWrite, StoreError>;
}
