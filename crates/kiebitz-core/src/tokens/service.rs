//! The priority-token mint.
//!
//! A token is `HMAC_SHA256(serverSecret, marshal(PriorityToken))` where
//! `PriorityToken.n` is a strictly monotonic, server-wide counter; wrapping
//! it in a `TokenData` signed by the server's token key lets the holder
//! later prove both that this server issued it and which ephemeral key it
//! is bound to, without the server keeping a session. A second, per-caller
//! counter under the `User::<hash>` lock caps how many tokens one caller
//! can mint.

use std::time::Duration;
use std::sync::Arc;

use chrono::Utc;
use kiebitz_crypto::{hmac_sha256, KeyPair, PublicKey};
use kiebitz_storage::ports::lock::names;
use kiebitz_storage::{Database, LockManager};
use kiebitz_types::{Base64Bytes, PriorityToken, ServiceError, ServiceResult, SignedEnvelope, SignedToken, TokenData};

use super::requests::GetTokenData;

const LOCK_TTL: Duration = Duration::from_secs(5);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Tokens minted for the same `hash` beyond this count are refused.
pub const DEFAULT_MAX_TOKENS_PER_USER: i64 = 1;

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Issues and signs priority tokens.
pub struct TokenMint<D> {
    database: Arc<D>,
    token_key: KeyPair,
    server_secret: Vec<u8>,
    max_tokens_per_user: i64,
}

impl<D: Database + LockManager> TokenMint<D> {
    /// Build a mint over a storage backend, the server's token signing
    /// key, and the HMAC secret tokens are derived from.
    pub fn new(database: Arc<D>, token_key: KeyPair, server_secret: Vec<u8>) -> Self {
        Self {
            database,
            token_key,
            server_secret,
            max_tokens_per_user: DEFAULT_MAX_TOKENS_PER_USER,
        }
    }

    /// Override the per-caller issuance cap (default
    /// `DEFAULT_MAX_TOKENS_PER_USER`).
    pub fn with_max_tokens_per_user(mut self, max: i64) -> Self {
        self.max_tokens_per_user = max;
        self
    }

    /// Mint a token bound to `envelope`'s public key, capped per `hash`.
    pub async fn get_token(&self, envelope: &SignedEnvelope<GetTokenData>) -> ServiceResult<SignedToken> {
        PublicKey::from_sec1_bytes(envelope.public_key.as_slice())
            .map_err(|e| ServiceError::BadRequest(format!("malformed public key: {e}")))?
            .verify(envelope.json.as_bytes(), envelope.signature.as_slice())
            .map_err(|_| ServiceError::NotAuthorized("self-signature verification failed".into()))?;

        let data = envelope
            .decode_and_check()
            .map_err(|e| ServiceError::BadRequest(format!("envelope data does not match signed json: {e}")))?;

        let hash_hex = to_hex(data.hash.as_slice());
        let _guard = self
            .database
            .acquire(&names::user(&hash_hex), LOCK_TTL, LOCK_TIMEOUT)
            .await?;

        let per_user_count = self
            .database
            .increment_counter(&format!("user_token:{hash_hex}"))
            .await?;
        if per_user_count > self.max_tokens_per_user {
            self.database
                .decrement_counter(&format!("user_token:{hash_hex}"))
                .await?;
            return Err(ServiceError::NotAuthorized(
                "token issuance cap reached for this caller".into(),
            ));
        }

        let n = self.database.increment_counter("token").await?;
        let priority_token = PriorityToken { n };
        let priority_json =
            serde_json::to_string(&priority_token).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let token_value = hmac_sha256(&self.server_secret, priority_json.as_bytes());

        let token_data = TokenData {
            hash: data.hash,
            token: Base64Bytes(token_value.to_vec()),
            data: priority_token,
            json: priority_json,
            public_key: envelope.public_key.clone(),
            timestamp: Utc::now(),
        };
        let token_json =
            serde_json::to_string(&token_data).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let signature = self.token_key.sign(token_json.as_bytes());

        tracing::debug!(n, "minted priority token");
        Ok(SignedToken {
            json: token_json,
            signature: Base64Bytes(signature),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_storage::adapters::MemoryStore;

    fn envelope(pair: &KeyPair, hash: Vec<u8>) -> SignedEnvelope<GetTokenData> {
        let data = GetTokenData {
            timestamp: Utc::now(),
            hash: Base64Bytes(hash),
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
    async fn mints_a_token_bound_to_the_caller_key() {
        let store = Arc::new(MemoryStore::new());
        let mint = TokenMint::new(store, KeyPair::generate(), b"server-secret".to_vec());
        let caller = KeyPair::generate();

        let signed = mint.get_token(&envelope(&caller, vec![1, 2, 3])).await.unwrap();
        let decoded: TokenData = serde_json::from_str(&signed.json).unwrap();
        assert_eq!(decoded.public_key.as_slice(), caller.public_key().to_sec1_bytes());
        assert_eq!(decoded.data.n, 1);
    }

    #[tokio::test]
    async fn second_token_for_the_same_hash_is_refused_by_default() {
        let store = Arc::new(MemoryStore::new());
        let mint = TokenMint::new(store, KeyPair::generate(), b"server-secret".to_vec());
        let caller = KeyPair::generate();

        mint.get_token(&envelope(&caller, vec![9, 9])).await.unwrap();
        let second = mint.get_token(&envelope(&caller, vec![9, 9])).await;
        assert!(matches!(second, Err(ServiceError::NotAuthorized(_))));
    }

    #[tokio::test]
    async fn distinct_hashes_each_get_their_own_cap() {
        let store = Arc::new(MemoryStore::new());
        let mint = TokenMint::new(store, KeyPair::generate(), b"server-secret".to_vec());
        let a = KeyPair::generate();
        let b = KeyPair::generate();

        assert!(mint.get_token(&envelope(&a, vec![1])).await.is_ok());
        assert!(mint.get_token(&envelope(&b, vec![2])).await.is_ok());
    }

    #[tokio::test]
    async fn successive_tokens_have_strictly_increasing_counters() {
        let store = Arc::new(MemoryStore::new());
        let mint = TokenMint::new(store, KeyPair::generate(), b"server-secret".to_vec())
            .with_max_tokens_per_user(10);
        let caller = KeyPair::generate();

        let first = mint.get_token(&envelope(&caller, vec![1])).await.unwrap();
        let second = mint.get_token(&envelope(&caller, vec![1])).await.unwrap();
        let first_data: TokenData = serde_json::from_str(&first.json).unwrap();
        let second_data: TokenData = serde_json::from_str(&second.json).unwrap();
        assert!(second_data.data.n > first_data.data.n);
    }
}
