//! The four role gates.
//!
//! Every gate verifies a signature and checks the caller's claimed
//! timestamp against the expiry window; `is_mediator` and `is_provider`
//! additionally resolve the signer against an installed key set, and
//! `is_user` additionally checks that a spendable token was issued by this
//! server and is bound to the caller's own keypair.

use chrono::Utc;
use kiebitz_crypto::PublicKey;
use kiebitz_types::{is_within_expiry_window, ActorKey, SignedEnvelope, SignedToken, Timestamped, TokenData};
use serde::de::DeserializeOwned;

use crate::domain::{verify_envelope_signature, GateError};
use crate::ports::ActorDirectory;

/// Implements the four auth gates against a configured root/token key pair
/// and an `ActorDirectory` for mediator/provider lookups.
pub struct AuthGates<D: ActorDirectory> {
    directory: D,
    root_key: PublicKey,
    token_key: PublicKey,
}

impl<D: ActorDirectory> AuthGates<D> {
    /// Build the gate service from the server's bootstrapped key roles.
    pub fn new(directory: D, root_key: PublicKey, token_key: PublicKey) -> Self {
        Self {
            directory,
            root_key,
            token_key,
        }
    }

    /// Re-derive `T` from `envelope.json` (the bytes that were actually
    /// signed) and check its timestamp. Never trust `envelope.data`: it is
    /// only a convenience decoding supplied by the caller and is not
    /// covered by the signature.
    fn decode_checked<T: Timestamped + DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope<T>,
    ) -> Result<T, GateError> {
        let data = envelope
            .decode_and_check()
            .map_err(|e| GateError::NotAuthorized(format!("envelope data does not match signed json: {e}")))?;
        if is_within_expiry_window(data.timestamp(), Utc::now()) {
            Ok(data)
        } else {
            Err(GateError::Expired("envelope timestamp outside the allowed skew window".into()))
        }
    }

    /// Verify `envelope` against the configured root key, rejecting stale
    /// timestamps, and return the signed data it actually carried.
    pub fn is_root<T: Timestamped + DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope<T>,
    ) -> Result<T, GateError> {
        self.root_key
            .verify(envelope.json.as_bytes(), envelope.signature.as_slice())
            .map_err(|_| GateError::NotAuthorized("root signature verification failed".into()))?;
        self.decode_checked(envelope)
    }

    /// Verify `envelope` was signed by some installed mediator key.
    pub async fn is_mediator<T: Timestamped + DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope<T>,
    ) -> Result<(ActorKey, T), GateError> {
        verify_envelope_signature(envelope, &envelope.public_key)?;
        let mediator = self
            .directory
            .find_mediator(envelope.public_key.as_slice())
            .await?
            .ok_or_else(|| GateError::NotAuthorized("unknown mediator key".into()))?;
        let data = self.decode_checked(envelope)?;
        Ok((mediator, data))
    }

    /// Verify `envelope` was signed by some installed, verified provider key.
    pub async fn is_provider<T: Timestamped + DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope<T>,
    ) -> Result<(ActorKey, T), GateError> {
        verify_envelope_signature(envelope, &envelope.public_key)?;
        let provider = self
            .directory
            .find_verified_provider(envelope.public_key.as_slice())
            .await?
            .ok_or_else(|| GateError::NotAuthorized("unknown provider key".into()))?;
        let data = self.decode_checked(envelope)?;
        Ok((provider, data))
    }

    /// Verify that `token` was issued by this server and that `envelope`
    /// was signed by the same keypair the token is bound to.
    pub fn is_user<T: Timestamped + DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope<T>,
        token: &SignedToken,
    ) -> Result<(TokenData, T), GateError> {
        self.token_key
            .verify(token.json.as_bytes(), token.signature.as_slice())
            .map_err(|_| GateError::NotAuthorized("token signature verification failed".into()))?;
        let token_data: TokenData = serde_json::from_str(&token.json)
            .map_err(|e| GateError::NotAuthorized(format!("malformed token data: {e}")))?;

        verify_envelope_signature(envelope, &envelope.public_key)?;
        if envelope.public_key.as_slice() != token_data.public_key.as_slice() {
            return Err(GateError::NotAuthorized(
                "envelope key does not match the token's bound key".into(),
            ));
        }
        let data = self.decode_checked(envelope)?;
        Ok((token_data, data))
    }
}
