//! The atomic booking/cancellation primitive.
//!
//! *"if the token has not been used and some slot of the appointment is
//! unbooked, attach a new booking and mark the token used; otherwise signal
//! the appropriate error."*
//!
//! Two adapters implement this port: `adapters::postgres::PostgresBookingGateway`
//! runs a transactional SQL recipe (`INSERT ... ON CONFLICT` +
//! `SELECT ... FOR UPDATE`); `adapters::locked_booking::LockedBookingGateway`
//! emulates the same two guarantees — per-appointment mutual exclusion and
//! an atomic used-token set-insert — over the generic `Database`+`LockManager`
//! ports, for deployments without a SQL backend.

use async_trait::async_trait;
use kiebitz_types::Id;

use crate::domain::DbError;

/// The result of a successful booking: which slot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedSlot {
    /// The id of the slot that was booked.
    pub slot_id: Id,
}

/// Atomic booking and cancellation.
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// Attempt to book one open slot of `appointment_id`, spending `token`.
    ///
    /// Returns `Err(DbError::TokenUsed)` if `token` was already spent
    /// (401), `Err(DbError::NotFound)` if no slot is open (404).
    async fn book_slot(
        &self,
        appointment_id: Id,
        token: &[u8],
        public_key: &[u8],
        encrypted_data: &[u8],
    ) -> Result<BookedSlot, DbError>;

    /// Release the booking that spent `token`, freeing both the slot and
    /// the token for reuse.
    async fn cancel_booking(&self, token: &[u8]) -> Result<(), DbError>;
}
