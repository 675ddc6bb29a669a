//! Provider lifecycle: self-publish, mediator confirmation, discovery.
//!
//! Providers self-publish an encrypted profile, a mediator later vouches
//! for one and installs its signing key, after which the provider can
//! publish appointments and be discovered by zip code. Four buckets track
//! a provider's record through this lifecycle (`ProviderBucket`); which
//! buckets hold a row is itself the provider's derived status.

use std::sync::Arc;
use std::time::Duration;

use kiebitz_crypto::PublicKey;
use kiebitz_storage::ports::lock::names;
use kiebitz_storage::{Database, LockManager, ProviderBucket, ProviderStatus};
use kiebitz_types::{id_to_hex, Id, ServiceError, ServiceResult, SignedEnvelope};

use super::requests::{ConfirmProviderData, StoreProviderData};
use crate::domain::RawProviderData;
use crate::ports::{MEDIATOR_KEYS, PROVIDER_KEYS};

const LOCK_TTL: Duration = Duration::from_secs(10);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider onboarding, confirmation and discovery.
pub struct ProviderService<D> {
    database: Arc<D>,
}

impl<D: Database + LockManager> ProviderService<D> {
    /// Build the service over a storage backend that is both a `Database`
    /// and a `LockManager` (both `MemoryStore` and `PostgresStore` are).
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    async fn read_row(&self, bucket: ProviderBucket, id_hex: &str) -> ServiceResult<Option<RawProviderData>> {
        match self.database.get(bucket.collection(), id_hex).await? {
            Some(bytes) => {
                let row: RawProviderData = serde_json::from_slice(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed provider row: {e}")))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn current_status(&self, id_hex: &str) -> ServiceResult<Option<ProviderStatus>> {
        if let Some(row) = self.read_row(ProviderBucket::Verified, id_hex).await? {
            return Ok(Some(row.status));
        }
        if let Some(row) = self.read_row(ProviderBucket::Unverified, id_hex).await? {
            return Ok(Some(row.status));
        }
        Ok(None)
    }

    /// A provider publishes (or updates) its encrypted profile.
    ///
    /// Checked only against its own embedded signing key: there is no
    /// installed key set to check against until a mediator confirms it.
    /// The provider id is `SHA256` of that signing key.
    pub async fn store_provider_data(
        &self,
        envelope: &SignedEnvelope<StoreProviderData>,
    ) -> ServiceResult<ProviderStatus> {
        PublicKey::from_sec1_bytes(envelope.public_key.as_slice())
            .map_err(|e| ServiceError::BadRequest(format!("malformed public key: {e}")))?
            .verify(envelope.json.as_bytes(), envelope.signature.as_slice())
            .map_err(|_| ServiceError::NotAuthorized("self-signature verification failed".into()))?;

        let data = envelope
            .decode_and_check()
            .map_err(|e| ServiceError::BadRequest(format!("envelope data does not match signed json: {e}")))?;

        let id: Id = kiebitz_crypto::sha256(envelope.public_key.as_slice());
        let id_hex = id_to_hex(&id);

        let status = match self.current_status(&id_hex).await? {
            None | Some(ProviderStatus::Unverified) => ProviderStatus::Unverified,
            Some(_) => ProviderStatus::Changed,
        };

        let row = RawProviderData {
            id,
            encrypted_data: data.encrypted_data,
            verified: false,
            status,
        };
        self.database
            .put(
                ProviderBucket::Unverified.collection(),
                &id_hex,
                serde_json::to_vec(&row).map_err(|e| ServiceError::Internal(e.to_string()))?,
            )
            .await?;
        Ok(status)
    }

    /// A provider polls whether its pending submission has been confirmed.
    pub async fn check_provider_data(&self, id: Id) -> ServiceResult<ProviderStatus> {
        let id_hex = id_to_hex(&id);
        self.current_status(&id_hex)
            .await?
            .ok_or_else(|| ServiceError::NotFound("unknown provider".into()))
    }

    /// A mediator confirms a pending provider, installing its signing key
    /// and moving its record from the unverified bucket to the verified
    /// one. Caller is responsible for having already run the mediator
    /// auth gate; `data` is assumed verified.
    pub async fn confirm_provider(&self, data: &ConfirmProviderData) -> ServiceResult<ProviderStatus> {
        let id_hex = id_to_hex(&data.id);
        let _guard = self
            .database
            .acquire(&names::provider(&id_hex), LOCK_TTL, LOCK_TIMEOUT)
            .await?;

        let pending = self
            .read_row(ProviderBucket::Unverified, &id_hex)
            .await?
            .ok_or_else(|| ServiceError::NotFound("no pending submission for this provider".into()))?;

        let status = if pending.status == ProviderStatus::Unverified {
            ProviderStatus::VerifiedFirst
        } else {
            ProviderStatus::Verified
        };

        self.database
            .put(
                PROVIDER_KEYS,
                &id_hex,
                serde_json::to_vec(&data.key).map_err(|e| ServiceError::Internal(e.to_string()))?,
            )
            .await?;

        let verified_row = RawProviderData {
            id: data.id,
            encrypted_data: pending.encrypted_data,
            verified: true,
            status,
        };
        self.database
            .put(
                ProviderBucket::Verified.collection(),
                &id_hex,
                serde_json::to_vec(&verified_row).map_err(|e| ServiceError::Internal(e.to_string()))?,
            )
            .await?;
        self.database.delete(ProviderBucket::Unverified.collection(), &id_hex).await?;

        tracing::info!(provider = %id_hex, ?status, "provider confirmed");

        self.database
            .put(
                ProviderBucket::Confirmed.collection(),
                &id_hex,
                data.encrypted_confirmation.as_slice().to_vec(),
            )
            .await?;

        if let Some(public_profile) = &data.public_provider {
            self.database
                .put(
                    ProviderBucket::Public.collection(),
                    &id_hex,
                    serde_json::to_vec(public_profile).map_err(|e| ServiceError::Internal(e.to_string()))?,
                )
                .await?;
        }

        Ok(status)
    }

    /// Published providers whose zip code matches, for anonymous discovery.
    ///
    /// Zip codes are matched on a shared prefix, mirroring how postal
    /// codes group nearby areas; exact callers can simply pass a full zip.
    pub async fn get_providers_by_zip_code(
        &self,
        zip_prefix: &str,
    ) -> ServiceResult<Vec<(Id, crate::domain::ProviderProfileData)>> {
        let rows = self.database.scan_all(ProviderBucket::Public.collection()).await?;
        let mut out = Vec::new();
        for (key, bytes) in rows {
            let profile: crate::domain::ProviderProfileData = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Internal(format!("malformed provider profile: {e}")))?;
            if profile.zip_code.starts_with(zip_prefix) {
                let id = kiebitz_types::id_from_hex(&key)
                    .ok_or_else(|| ServiceError::Internal("malformed provider id key".into()))?;
                out.push((id, profile));
            }
        }
        Ok(out)
    }

    /// All providers awaiting confirmation, newest-id first.
    pub async fn get_pending_provider_data(&self) -> ServiceResult<Vec<RawProviderData>> {
        let rows = self.database.scan_all(ProviderBucket::Unverified.collection()).await?;
        let mut out = Vec::with_capacity(rows.len());
        for (_, bytes) in rows {
            out.push(
                serde_json::from_slice::<RawProviderData>(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed provider row: {e}")))?,
            );
        }
        out.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(out)
    }

    /// Every provider record known to the server, verified and
    /// unverified alike, each annotated with its derived status.
    pub async fn get_providers(&self) -> ServiceResult<Vec<RawProviderData>> {
        let mut out = self.get_pending_provider_data().await?;
        let verified = self.database.scan_all(ProviderBucket::Verified.collection()).await?;
        for (_, bytes) in verified {
            out.push(
                serde_json::from_slice::<RawProviderData>(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed provider row: {e}")))?,
            );
        }
        Ok(out)
    }

    /// A single provider's raw record, 404 if the server has never heard
    /// of it.
    pub async fn get_provider_data(&self, id: Id) -> ServiceResult<RawProviderData> {
        let id_hex = id_to_hex(&id);
        if let Some(row) = self.read_row(ProviderBucket::Verified, &id_hex).await? {
            return Ok(row);
        }
        if let Some(row) = self.read_row(ProviderBucket::Unverified, &id_hex).await? {
            return Ok(row);
        }
        Err(ServiceError::NotFound("unknown provider".into()))
    }

    /// The installed `ActorKey` a mediator confirmed for a verified
    /// provider, 404 if the provider was never confirmed.
    pub async fn get_provider_key(&self, id: Id) -> ServiceResult<kiebitz_types::ActorKey> {
        let id_hex = id_to_hex(&id);
        let bytes = self
            .database
            .get(PROVIDER_KEYS, &id_hex)
            .await?
            .ok_or_else(|| ServiceError::NotFound("provider has no installed key".into()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ServiceError::Internal(format!("malformed actor key: {e}")))
    }

    /// Whether a public key is an installed mediator key (used by the
    /// `isValidProvider`/`isValidUser` discovery endpoints' mediator half).
    pub async fn is_known_mediator(&self, public_key: &[u8]) -> ServiceResult<bool> {
        let rows = self.database.scan_all(MEDIATOR_KEYS).await?;
        for (_, bytes) in rows {
            let key: kiebitz_types::ActorKey = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Internal(format!("malformed actor key: {e}")))?;
            if key.public_key.as_slice() == public_key {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether a public key is an installed, verified provider key (the
    /// `isValidProvider` discovery endpoint).
    pub async fn is_known_provider(&self, public_key: &[u8]) -> ServiceResult<bool> {
        let rows = self.database.scan_all(PROVIDER_KEYS).await?;
        for (_, bytes) in rows {
            let key: kiebitz_types::ActorKey = serde_json::from_slice(&bytes)
                .map_err(|e| ServiceError::Internal(format!("malformed actor key: {e}")))?;
            if key.public_key.as_slice() == public_key {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kiebitz_crypto::KeyPair;
    use kiebitz_storage::adapters::MemoryStore;
    use kiebitz_types::{ActorData, ActorKey, Base64Bytes};

    fn envelope(pair: &KeyPair, encrypted_data: Vec<u8>) -> SignedEnvelope<StoreProviderData> {
        let data = StoreProviderData {
            timestamp: Utc::now(),
            encrypted_data: Base64Bytes(encrypted_data),
        };
        let json = serde_json::to_string(&data).unwrap();
        let signature = pair.sign(json.as_bytes());
        SignedEnvelope {
            json,
            signature: Base64Bytes(signature),
            public_key: Base64Bytes(pair.public_key().to_sec1_bytes()),
            data,
        }
    }

    #[tokio::test]
    async fn first_submission_is_unverified() {
        let store = Arc::new(MemoryStore::new());
        let service = ProviderService::new(store);
        let provider = KeyPair::generate();
        let status = service
            .store_provider_data(&envelope(&provider, vec![1, 2, 3]))
            .await
            .unwrap();
        assert_eq!(status, ProviderStatus::Unverified);
    }

    #[tokio::test]
    async fn republish_after_confirmation_is_flagged_changed() {
        let store = Arc::new(MemoryStore::new());
        let service = ProviderService::new(store.clone());
        let provider = KeyPair::generate();
        let mediator = KeyPair::generate();

        service
            .store_provider_data(&envelope(&provider, vec![1]))
            .await
            .unwrap();
        let id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());

        let confirm = ConfirmProviderData {
            timestamp: Utc::now(),
            id,
            key: ActorKey {
                id,
                data: ActorData {
                    signing: Base64Bytes(provider.public_key().to_sec1_bytes()),
                    encryption: None,
                    zip_code: None,
                },
                signature: Base64Bytes(mediator.sign(b"whatever")),
                public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
            },
            encrypted_confirmation: Base64Bytes(vec![9]),
            public_provider: None,
        };
        let first_status = service.confirm_provider(&confirm).await.unwrap();
        assert_eq!(first_status, ProviderStatus::VerifiedFirst);

        service
            .store_provider_data(&envelope(&provider, vec![2]))
            .await
            .unwrap();
        let status = service.check_provider_data(id).await.unwrap();
        assert_eq!(status, ProviderStatus::Changed);
    }

    #[tokio::test]
    async fn confirming_unknown_provider_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let service = ProviderService::new(store);
        let mediator = KeyPair::generate();
        let provider = KeyPair::generate();
        let id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let confirm = ConfirmProviderData {
            timestamp: Utc::now(),
            id,
            key: ActorKey {
                id,
                data: ActorData {
                    signing: Base64Bytes(provider.public_key().to_sec1_bytes()),
                    encryption: None,
                    zip_code: None,
                },
                signature: Base64Bytes(mediator.sign(b"whatever")),
                public_key: Base64Bytes(provider.public_key().to_sec1_bytes()),
            },
            encrypted_confirmation: Base64Bytes(vec![]),
            public_provider: None,
        };
        assert!(matches!(
            service.confirm_provider(&confirm).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pending_list_is_sorted_newest_id_first() {
        let store = Arc::new(MemoryStore::new());
        let service = ProviderService::new(store);
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        service.store_provider_data(&envelope(&a, vec![1])).await.unwrap();
        service.store_provider_data(&envelope(&b, vec![2])).await.unwrap();

        let pending = service.get_pending_provider_data().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending[0].id >= pending[1].id);
    }
}
