//! Typed CRUD over named collections, plus atomic counters.
//!
//! A "collection" is a logical table/bucket (`provider.unverified`,
//! `appointment_by_date.<provider>.<date>`, ...); keys and values are
//! opaque bytes so the repository layer (`kiebitz-core`) owns all
//! (de)serialization. Named collections generalize a flat get/put/delete/
//! prefix-scan keyspace into per-entity buckets, and the atomic counter
//! primitive is the only way the per-user and primary token counters are
//! ever mutated.

use async_trait::async_trait;

use crate::domain::DbError;

/// Abstract interface for the appointments service's key-value database.
///
/// Implementations must be `Send + Sync`: handlers run on arbitrary tokio
/// worker threads.
#[async_trait]
pub trait Database: Send + Sync {
    /// Fetch a value, or `Ok(None)` if the key is absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, DbError>;

    /// Insert or overwrite a value.
    async fn put(&self, collection: &str, key: &str, value: Vec<u8>) -> Result<(), DbError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), DbError>;

    /// Whether a key is present.
    async fn exists(&self, collection: &str, key: &str) -> Result<bool, DbError> {
        Ok(self.get(collection, key).await?.is_some())
    }

    /// List all `(key, value)` pairs in a collection whose key starts with
    /// `prefix` (used for the date/property secondary indexes).
    async fn scan_prefix(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, DbError>;

    /// List every `(key, value)` pair in a collection.
    async fn scan_all(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, DbError> {
        self.scan_prefix(collection, "").await
    }

    /// Atomically increment the named counter by one and return the new
    /// value. Used for the primary priority-token counter and the
    /// per-user token counter. Counters start at 0.
    async fn increment_counter(&self, counter: &str) -> Result<i64, DbError>;

    /// Atomically decrement the named counter by one and return the new
    /// value. Used to roll back a per-user counter increment when the
    /// per-user cap is exceeded.
    async fn decrement_counter(&self, counter: &str) -> Result<i64, DbError>;

    /// Insert a token into the used-token set if and only if it is not
    /// already present. Returns `Err(DbError::TokenUsed)` on a duplicate,
    /// mirroring a unique-key insert.
    async fn insert_used_token(&self, token: &[u8]) -> Result<(), DbError>;

    /// Remove a token from the used-token set (booking cancellation, or
    /// the slot-exclusion rule on republish).
    async fn remove_used_token(&self, token: &[u8]) -> Result<(), DbError>;

    /// Whether a token is currently in the used-token set.
    async fn is_token_used(&self, token: &[u8]) -> Result<bool, DbError>;
}
