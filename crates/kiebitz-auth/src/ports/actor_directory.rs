//! The lookup the mediator/provider gates need: given a caller's public
//! key, find the matching installed actor key, if any.
//!
//! Kept abstract here so this crate never depends on a storage
//! implementation directly; `kiebitz-core` implements it over its
//! provider/mediator repositories.

use async_trait::async_trait;
use kiebitz_types::ActorKey;

use crate::domain::GateError;

/// Looks up installed mediator and (verified) provider signing keys.
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Find a mediator whose signing public key is `public_key`.
    async fn find_mediator(&self, public_key: &[u8]) -> Result<Option<ActorKey>, GateError>;

    /// Find a verified provider whose signing public key is `public_key`.
    async fn find_verified_provider(
        &self,
        public_key: &[u8],
    ) -> Result<Option<ActorKey>, GateError>;
}
