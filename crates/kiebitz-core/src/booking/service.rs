//! Booking and cancellation, layered over the atomic `BookingGateway`
//! primitive with one extra check the gateway itself cannot make: that the
//! appointment is still published at all.

use std::sync::Arc;

use kiebitz_storage::{BookingGateway, Database};
use kiebitz_types::{id_to_hex, Id, ServiceError, ServiceResult};

use crate::domain::BookedSlot;

/// Books and cancels slots against a provider's published appointments.
pub struct BookingService<D, G> {
    database: Arc<D>,
    gateway: Arc<G>,
}

impl<D: Database, G: BookingGateway> BookingService<D, G> {
    /// Build the service over a database (for the appointment-exists
    /// check) and a booking gateway (for the atomic slot/token write).
    pub fn new(database: Arc<D>, gateway: Arc<G>) -> Self {
        Self { database, gateway }
    }

    /// Spend `token` to book one open slot of `appointment_id`.
    pub async fn book_appointment(
        &self,
        appointment_id: Id,
        token: &[u8],
        public_key: &[u8],
        encrypted_data: &[u8],
    ) -> ServiceResult<BookedSlot> {
        let exists = self
            .database
            .get("appointment", &id_to_hex(&appointment_id))
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::NotFound("appointment is no longer published".into()));
        }

        let booked = self
            .gateway
            .book_slot(appointment_id, token, public_key, encrypted_data)
            .await?;
        Ok(BookedSlot { id: booked.slot_id })
    }

    /// Release whichever slot `token` had booked.
    pub async fn cancel_appointment(&self, token: &[u8]) -> ServiceResult<()> {
        self.gateway.cancel_booking(token).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_crypto::KeyPair;
    use kiebitz_storage::adapters::{LockedBookingGateway, MemoryStore};

    async fn seeded_appointment(store: &Arc<MemoryStore>, appointment_id: Id, slot_id: Id) {
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointments = crate::appointments::AppointmentService::new(store.clone());
        let data = crate::domain::SignedAppointmentData {
            id: appointment_id,
            timestamp: chrono::Utc::now(),
            duration: 15,
            vaccine: "biontech".into(),
            properties: Default::default(),
            slot_data: vec![crate::domain::SlotId { id: slot_id }],
        };
        let json = serde_json::to_string(&data).unwrap();
        let signature = provider.sign(json.as_bytes());
        let submission = crate::appointments::AppointmentSubmission {
            json,
            signature: kiebitz_types::Base64Bytes(signature),
            data,
        };
        appointments
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[submission])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn booking_an_unpublished_appointment_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(LockedBookingGateway::new(store.clone(), store.clone()));
        let service = BookingService::new(store, gateway);

        let result = service
            .book_appointment([1u8; 32], b"token", b"user-key", b"enc")
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn books_then_cancels_a_published_slot() {
        let store = Arc::new(MemoryStore::new());
        let appointment_id = [2u8; 32];
        let slot_id = [3u8; 32];
        seeded_appointment(&store, appointment_id, slot_id).await;

        let gateway = Arc::new(LockedBookingGateway::new(store.clone(), store.clone()));
        let service = BookingService::new(store, gateway);

        let booked = service
            .book_appointment(appointment_id, b"token-x", b"user-key", b"enc")
            .await
            .unwrap();
        assert_eq!(booked.id, slot_id);

        service.cancel_appointment(b"token-x").await.unwrap();

        let rebooked = service
            .book_appointment(appointment_id, b"token-y", b"user-key", b"enc")
            .await
            .unwrap();
        assert_eq!(rebooked.id, slot_id);
    }
}
