//! The non-SQL booking emulation: a backend without transactional SQL
//! must still emulate per-appointment mutual exclusion (a named lock) plus
//! a set membership probe on `UsedToken` that is atomic with the booking
//! write.
//!
//! Generic over any `Database` + `LockManager` pair, so it works unchanged
//! against `MemoryStore` (tests) or any future KV-only adapter.

use async_trait::async_trait;
use kiebitz_types::{id_from_hex, id_to_hex, Id};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{DbError, SlotRow};
use crate::ports::{BookedSlot, BookingGateway, Database, LockManager};

const LOCK_TTL: Duration = Duration::from_secs(30);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// `slot.<appointment_id hex>` collection name.
fn slots_collection(appointment_id: Id) -> String {
    format!("slot.{}", id_to_hex(&appointment_id))
}

/// `slot_by_token` collection: token hex -> `"<appointment_id hex>:<slot_id hex>"`.
const SLOT_BY_TOKEN: &str = "slot_by_token";

/// Emulates the SQL booking recipe using a per-appointment named lock and
/// the `Database`'s atomic used-token insert.
pub struct LockedBookingGateway<D, L> {
    database: Arc<D>,
    locks: Arc<L>,
}

impl<D, L> LockedBookingGateway<D, L> {
    /// Build a gateway over the given database and lock manager.
    pub fn new(database: Arc<D>, locks: Arc<L>) -> Self {
        Self { database, locks }
    }
}

#[async_trait]
impl<D: Database, L: LockManager> BookingGateway for LockedBookingGateway<D, L> {
    async fn book_slot(
        &self,
        appointment_id: Id,
        token: &[u8],
        public_key: &[u8],
        encrypted_data: &[u8],
    ) -> Result<BookedSlot, DbError> {
        // Lock::Appointment::<id> serialises bookers against the same
        // appointment.
        let lock_name = format!("appointment:{}", id_to_hex(&appointment_id));
        let _guard = self.locks.acquire(&lock_name, LOCK_TTL, LOCK_TIMEOUT).await?;

        // The unique insert serialises concurrent spends of the same token
        // from anywhere, independent of which appointment lock is held.
        self.database.insert_used_token(token).await?;

        let collection = slots_collection(appointment_id);
        let open_slot = self
            .database
            .scan_all(&collection)
            .await?
            .into_iter()
            .filter_map(|(_, bytes)| serde_json::from_slice::<SlotRow>(&bytes).ok())
            .find(|slot| slot.is_open());

        let Some(mut slot) = open_slot else {
            // Roll back the token reservation: no row ever got written.
            self.database.remove_used_token(token).await?;
            return Err(DbError::NotFound);
        };

        slot.token = Some(token.to_vec());
        slot.public_key = Some(public_key.to_vec());
        slot.encrypted_data = Some(encrypted_data.to_vec());

        let slot_id_hex = id_to_hex(&slot.id);
        let encoded = serde_json::to_vec(&slot)
            .map_err(|e| DbError::Internal(format!("encode slot: {e}")))?;
        self.database.put(&collection, &slot_id_hex, encoded).await?;

        let token_hex = id_to_hex(&pad_to_id(token));
        self.database
            .put(
                SLOT_BY_TOKEN,
                &token_hex,
                format!("{}:{}", id_to_hex(&appointment_id), slot_id_hex).into_bytes(),
            )
            .await?;

        Ok(BookedSlot { slot_id: slot.id })
    }

    async fn cancel_booking(&self, token: &[u8]) -> Result<(), DbError> {
        let token_hex = id_to_hex(&pad_to_id(token));
        let Some(pointer) = self.database.get(SLOT_BY_TOKEN, &token_hex).await? else {
            return Err(DbError::NotFound);
        };
        let pointer = String::from_utf8(pointer).map_err(|e| DbError::Internal(e.to_string()))?;
        let (appointment_hex, slot_hex) = pointer
            .split_once(':')
            .ok_or_else(|| DbError::Internal("malformed slot pointer".into()))?;
        let appointment_id =
            id_from_hex(appointment_hex).ok_or_else(|| DbError::Internal("bad id".into()))?;

        let lock_name = format!("appointment:{appointment_hex}");
        let _guard = self.locks.acquire(&lock_name, LOCK_TTL, LOCK_TIMEOUT).await?;

        let collection = slots_collection(appointment_id);
        let Some(bytes) = self.database.get(&collection, slot_hex).await? else {
            return Err(DbError::NotFound);
        };
        let mut slot: SlotRow =
            serde_json::from_slice(&bytes).map_err(|e| DbError::Internal(e.to_string()))?;
        slot.token = None;
        slot.public_key = None;
        slot.encrypted_data = None;
        let encoded =
            serde_json::to_vec(&slot).map_err(|e| DbError::Internal(format!("encode slot: {e}")))?;
        self.database.put(&collection, slot_hex, encoded).await?;
        self.database.delete(SLOT_BY_TOKEN, &token_hex).await?;
        self.database.remove_used_token(token).await?;
        Ok(())
    }
}

/// Tokens are arbitrary-length HMAC tags (32 bytes in practice); pad/truncate
/// them to a fixed `Id`-shaped key for the `slot_by_token` index. This is not
/// a hash: distinct tokens longer than 32 bytes that share a common 32-byte
/// prefix would collide here.
fn pad_to_id(token: &[u8]) -> Id {
    let mut out = [0u8; 32];
    for (i, b) in token.iter().take(32).enumerate() {
        out[i] = *b;
    }
    out
}
