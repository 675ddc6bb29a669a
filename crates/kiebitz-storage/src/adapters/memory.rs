//! In-process `Database` + `LockManager` adapter, backed by `DashMap`.
//!
//! This is the default adapter for tests and for small/single-process
//! deployments. Production deployments that need true cross-process
//! linearisability should run `adapters::postgres::PostgresStore` instead —
//! tokens and bookings demand linearisability, which this adapter
//! satisfies in-process via a single `DashMap` shard per collection (no
//! caching layer in front of it).

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::DbError;
use crate::ports::{Database, LockGuard, LockManager};

/// In-memory key-value store, namespaced by collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Vec<u8>>>,
    counters: DashMap<String, i64>,
    used_tokens: DashMap<Vec<u8>, ()>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, name: &str) -> dashmap::mapref::one::Ref<'_, String, DashMap<String, Vec<u8>>> {
        if !self.collections.contains_key(name) {
            self.collections.entry(name.to_string()).or_default();
        }
        self.collections.get(name).expect("just inserted")
    }
}

#[async_trait]
impl Database for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Vec<u8>>, DbError> {
        Ok(self.collection(collection).get(key).map(|v| v.clone()))
    }

    async fn put(&self, collection: &str, key: &str, value: Vec<u8>) -> Result<(), DbError> {
        self.collection(collection).insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), DbError> {
        self.collection(collection).remove(key);
        Ok(())
    }

    async fn scan_prefix(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, DbError> {
        let entries = self
            .collection(collection)
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Ok(entries)
    }

    async fn increment_counter(&self, counter: &str) -> Result<i64, DbError> {
        let mut entry = self.counters.entry(counter.to_string()).or_insert(0);
        *entry += 1;
        Ok(*entry)
    }

    async fn decrement_counter(&self, counter: &str) -> Result<i64, DbError> {
        let mut entry = self.counters.entry(counter.to_string()).or_insert(0);
        *entry -= 1;
        Ok(*entry)
    }

    async fn insert_used_token(&self, token: &[u8]) -> Result<(), DbError> {
        match self.used_tokens.entry(token.to_vec()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(DbError::TokenUsed),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(());
                Ok(())
            }
        }
    }

    async fn remove_used_token(&self, token: &[u8]) -> Result<(), DbError> {
        self.used_tokens.remove(token);
        Ok(())
    }

    async fn is_token_used(&self, token: &[u8]) -> Result<bool, DbError> {
        Ok(self.used_tokens.contains_key(token))
    }
}

#[async_trait]
impl LockManager for MemoryStore {
    async fn acquire(
        &self,
        name: &str,
        _ttl: Duration,
        timeout: Duration,
    ) -> Result<LockGuard, DbError> {
        let mutex = self
            .locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let owned = tokio::time::timeout(timeout, mutex.lock_owned())
            .await
            .map_err(|_| DbError::LockTimeout(name.to_string()))?;

        Ok(LockGuard::new(move || drop(owned)))
    }
}

/// A snapshot helper used only by tests: the set of currently-used tokens.
pub fn used_tokens_snapshot(store: &MemoryStore) -> HashSet<Vec<u8>> {
    store.used_tokens.iter().map(|e| e.key().clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        store.put("provider.unverified", "abc", vec![1, 2, 3]).await.unwrap();
        assert_eq!(
            store.get("provider.unverified", "abc").await.unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn scan_prefix_filters_by_collection_and_prefix() {
        let store = MemoryStore::new();
        store.put("idx", "2025-06-10:a", vec![1]).await.unwrap();
        store.put("idx", "2025-06-10:b", vec![2]).await.unwrap();
        store.put("idx", "2025-06-11:c", vec![3]).await.unwrap();

        let matches = store.scan_prefix("idx", "2025-06-10:").await.unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn used_token_insert_is_single_use() {
        let store = MemoryStore::new();
        store.insert_used_token(b"tok").await.unwrap();
        let err = store.insert_used_token(b"tok").await.unwrap_err();
        assert!(matches!(err, DbError::TokenUsed));
    }

    #[tokio::test]
    async fn concurrent_inserts_of_the_same_token_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.insert_used_token(b"shared").await }));
        }

        let mut ok_count = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok_count += 1;
            }
        }
        assert_eq!(ok_count, 1, "exactly one concurrent insert should win the race");
    }

    #[tokio::test]
    async fn counter_increments_monotonically() {
        let store = MemoryStore::new();
        assert_eq!(store.increment_counter("primary").await.unwrap(), 1);
        assert_eq!(store.increment_counter("primary").await.unwrap(), 2);
        assert_eq!(store.decrement_counter("primary").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn lock_serialises_concurrent_acquirers() {
        use std::sync::atomic::{AtomicU32, Ordering};

        let store = Arc::new(MemoryStore::new());
        let counter = Arc::new(AtomicU32::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let store = store.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = store
                    .acquire("appointment:1", Duration::from_secs(5), Duration::from_secs(5))
                    .await
                    .unwrap();
                let before = counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(before, 0, "lock was not exclusive");
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
