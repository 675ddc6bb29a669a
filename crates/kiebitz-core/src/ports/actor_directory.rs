//! Storage-backed `ActorDirectory`: resolves a caller's public key against
//! the installed mediator and provider key sets.
//!
//! Lookup is a linear scan over the (typically small) installed-key
//! collections rather than a secondary index keyed by public key — simplest
//! thing that works for the scale an appointments-service deployment
//! actually has (tens to low thousands of mediators/providers).

use async_trait::async_trait;
use kiebitz_auth::{ActorDirectory, GateError};
use kiebitz_storage::Database;
use kiebitz_types::ActorKey;
use std::sync::Arc;

/// Collection holding installed mediator `ActorKey`s, keyed by id hex.
pub const MEDIATOR_KEYS: &str = "mediator.actorkey";
/// Collection holding installed, verified provider `ActorKey`s, keyed by id hex.
pub const PROVIDER_KEYS: &str = "provider.actorkey";

/// An `ActorDirectory` backed by a `Database`.
pub struct StorageActorDirectory<D: Database> {
    database: Arc<D>,
}

impl<D: Database> StorageActorDirectory<D> {
    /// Build a directory over the given database.
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    async fn find_in(&self, collection: &str, public_key: &[u8]) -> Result<Option<ActorKey>, GateError> {
        let rows = self
            .database
            .scan_all(collection)
            .await
            .map_err(|e| GateError::LookupFailed(e.to_string()))?;
        for (_, bytes) in rows {
            let key: ActorKey = serde_json::from_slice(&bytes)
                .map_err(|e| GateError::LookupFailed(format!("malformed actor key: {e}")))?;
            if key.public_key.as_slice() == public_key {
                return Ok(Some(key));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<D: Database> ActorDirectory for StorageActorDirectory<D> {
    async fn find_mediator(&self, public_key: &[u8]) -> Result<Option<ActorKey>, GateError> {
        self.find_in(MEDIATOR_KEYS, public_key).await
    }

    async fn find_verified_provider(&self, public_key: &[u8]) -> Result<Option<ActorKey>, GateError> {
        self.find_in(PROVIDER_KEYS, public_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_crypto::KeyPair;
    use kiebitz_storage::adapters::MemoryStore;
    use kiebitz_types::{ActorData, Base64Bytes};

    fn actor_key(pair: &KeyPair) -> ActorKey {
        ActorKey {
            id: [1u8; 32],
            data: ActorData {
                signing: Base64Bytes(pair.public_key().to_sec1_bytes()),
                encryption: None,
                zip_code: None,
            },
            signature: Base64Bytes(vec![]),
            public_key: Base64Bytes(pair.public_key().to_sec1_bytes()),
        }
    }

    #[tokio::test]
    async fn finds_installed_mediator_by_public_key() {
        let store = Arc::new(MemoryStore::new());
        let mediator = KeyPair::generate();
        let key = actor_key(&mediator);
        store
            .put(
                MEDIATOR_KEYS,
                "abc",
                serde_json::to_vec(&key).unwrap(),
            )
            .await
            .unwrap();

        let directory = StorageActorDirectory::new(store);
        let found = directory
            .find_mediator(&mediator.public_key().to_sec1_bytes())
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn returns_none_for_unknown_key() {
        let store = Arc::new(MemoryStore::new());
        let directory = StorageActorDirectory::new(store);
        let stranger = KeyPair::generate();
        let found = directory
            .find_verified_provider(&stranger.public_key().to_sec1_bytes())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
