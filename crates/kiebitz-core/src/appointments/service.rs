//! The appointment engine: publishing, provider/anonymous views, and the
//! zip-code-scoped aggregated discovery feed.
//!
//! Three indexes track the published appointment set, alongside the
//! canonical `appointment` collection and one `slot.<appointment>` bucket
//! per appointment:
//!
//! - `appointment_by_date.<provider>`, keyed `<date>:<appointment>`, lists
//!   a provider's appointments by day.
//! - `date_by_appointment_id`, keyed by appointment id, remembers which
//!   date bucket an appointment currently lives under so a republish (or
//!   date change) can find and remove the stale entry.
//! - `property_index.<provider>`, keyed
//!   `<property key>:<property value>:<date>:<appointment>`, supports the
//!   property-scoped provider view.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use kiebitz_crypto::PublicKey;
use kiebitz_storage::ports::lock::names;
use kiebitz_storage::{Database, LockManager, SlotRow};
use kiebitz_types::{format_date, id_to_hex, Id, ServiceError, ServiceResult};

use super::requests::AppointmentSubmission;
use crate::domain::{
    AnonymousAppointmentView, AppointmentAggregated, AppointmentRecord, BookedSlot, Booking,
    KeyChain, ProviderAppointmentView,
};

/// `publishAppointments` rejects batches larger than this.
pub const MAX_APPOINTMENTS_PER_PUBLISH: usize = 500;
/// `getAppointmentsAggregated` returns at most this many appointments per
/// provider.
pub const MAX_AGGREGATED_PER_PROVIDER: usize = 25;
/// `getAppointmentsAggregated` only looks this many days into the future.
pub const AGGREGATION_WINDOW_DAYS: i64 = 7;

const LOCK_TTL: Duration = Duration::from_secs(10);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const APPOINTMENT_COLLECTION: &str = "appointment";
const DATE_BY_APPOINTMENT_ID: &str = "date_by_appointment_id";

fn slot_collection(appointment_id: &str) -> String {
    format!("slot.{appointment_id}")
}

fn by_date_collection(provider_id: &str) -> String {
    format!("appointment_by_date.{provider_id}")
}

fn property_collection(provider_id: &str) -> String {
    format!("property_index.{provider_id}")
}

fn property_key(prop_key: &str, prop_value: &str, date: &str, appointment_id: &str) -> String {
    format!("{prop_key}:{prop_value}:{date}:{appointment_id}")
}

/// Appointment publishing, retrieval and aggregation.
pub struct AppointmentService<D> {
    database: Arc<D>,
}

impl<D: Database + LockManager> AppointmentService<D> {
    /// Build the service over a storage backend.
    pub fn new(database: Arc<D>) -> Self {
        Self { database }
    }

    async fn read_record(&self, appointment_id_hex: &str) -> ServiceResult<Option<AppointmentRecord>> {
        match self.database.get(APPOINTMENT_COLLECTION, appointment_id_hex).await? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed appointment row: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    async fn read_slot(&self, appointment_id_hex: &str, slot_id_hex: &str) -> ServiceResult<Option<SlotRow>> {
        match self.database.get(&slot_collection(appointment_id_hex), slot_id_hex).await? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed slot row: {e}")))?,
            )),
            None => Ok(None),
        }
    }

    async fn slots_of(&self, appointment_id_hex: &str) -> ServiceResult<Vec<SlotRow>> {
        let rows = self.database.scan_all(&slot_collection(appointment_id_hex)).await?;
        let mut out = Vec::with_capacity(rows.len());
        for (_, bytes) in rows {
            out.push(
                serde_json::from_slice::<SlotRow>(&bytes)
                    .map_err(|e| ServiceError::Internal(format!("malformed slot row: {e}")))?,
            );
        }
        Ok(out)
    }

    /// Replace a provider's published appointment set with `submissions`,
    /// preserving any booking whose slot id survives in the republished
    /// slot list and releasing any whose slot id does not.
    pub async fn publish_appointments(
        &self,
        provider_id: Id,
        provider_public_key: &[u8],
        submissions: &[AppointmentSubmission],
    ) -> ServiceResult<()> {
        if submissions.len() > MAX_APPOINTMENTS_PER_PUBLISH {
            return Err(ServiceError::RateLimited(format!(
                "publishAppointments accepts at most {MAX_APPOINTMENTS_PER_PUBLISH} appointments per call"
            )));
        }

        let signer = PublicKey::from_sec1_bytes(provider_public_key)
            .map_err(|e| ServiceError::BadRequest(format!("malformed public key: {e}")))?;

        let provider_hex = id_to_hex(&provider_id);

        for submission in submissions {
            signer
                .verify(submission.json.as_bytes(), submission.signature.as_slice())
                .map_err(|_| {
                    ServiceError::NotAuthorized(
                        "an appointment in this batch is not signed by the publishing provider".into(),
                    )
                })?;

            let data = submission.decode_and_check().map_err(|e| {
                ServiceError::BadRequest(format!("submission data does not match its signed json: {e}"))
            })?;

            let appointment_hex = id_to_hex(&data.id);
            let _guard = self
                .database
                .acquire(&names::appointment(&appointment_hex), LOCK_TTL, LOCK_TIMEOUT)
                .await?;

            let existing = self.read_record(&appointment_hex).await?;
            let new_slot_ids: HashSet<Id> = data.slot_data.iter().map(|s| s.id).collect();

            if let Some(existing) = &existing {
                let old_slot_ids: HashSet<Id> =
                    existing.data.slot_data.iter().map(|s| s.id).collect();
                for released in old_slot_ids.difference(&new_slot_ids) {
                    let slot_hex = id_to_hex(released);
                    if let Some(slot) = self.read_slot(&appointment_hex, &slot_hex).await? {
                        if let Some(token) = &slot.token {
                            self.database.remove_used_token(token).await?;
                        }
                    }
                    self.database.delete(&slot_collection(&appointment_hex), &slot_hex).await?;
                }
                self.retire_indexes(&provider_hex, &appointment_hex, existing).await?;
            }

            for slot in &data.slot_data {
                let slot_hex = id_to_hex(&slot.id);
                if self.read_slot(&appointment_hex, &slot_hex).await?.is_none() {
                    let row = SlotRow {
                        id: slot.id,
                        appointment_id: data.id,
                        token: None,
                        public_key: None,
                        encrypted_data: None,
                    };
                    self.database
                        .put(
                            &slot_collection(&appointment_hex),
                            &slot_hex,
                            serde_json::to_vec(&row).map_err(|e| ServiceError::Internal(e.to_string()))?,
                        )
                        .await?;
                }
            }

            let record = AppointmentRecord {
                json: submission.json.clone(),
                signature: submission.signature.clone(),
                public_key: kiebitz_types::Base64Bytes(provider_public_key.to_vec()),
                data,
                updated_at: Utc::now(),
                provider_id,
            };
            self.database
                .put(
                    APPOINTMENT_COLLECTION,
                    &appointment_hex,
                    serde_json::to_vec(&record).map_err(|e| ServiceError::Internal(e.to_string()))?,
                )
                .await?;
            self.install_indexes(&provider_hex, &appointment_hex, &record).await?;
        }

        tracing::info!(provider = %provider_hex, count = submissions.len(), "published appointments");
        Ok(())
    }

    async fn retire_indexes(
        &self,
        provider_hex: &str,
        appointment_hex: &str,
        record: AppointmentRecord,
    ) -> ServiceResult<()> {
        let date = format_date(record.data.timestamp);
        self.database
            .delete(&by_date_collection(provider_hex), &format!("{date}:{appointment_hex}"))
            .await?;
        for (key, value) in &record.data.properties {
            self.database
                .delete(&property_collection(provider_hex), &property_key(key, value, &date, appointment_hex))
                .await?;
        }
        Ok(())
    }

    async fn install_indexes(
        &self,
        provider_hex: &str,
        appointment_hex: &str,
        record: &AppointmentRecord,
    ) -> ServiceResult<()> {
        let date = format_date(record.data.timestamp);
        self.database
            .put(
                &by_date_collection(provider_hex),
                &format!("{date}:{appointment_hex}"),
                appointment_hex.as_bytes().to_vec(),
            )
            .await?;
        self.database
            .put(DATE_BY_APPOINTMENT_ID, appointment_hex, date.as_bytes().to_vec())
            .await?;
        for (key, value) in &record.data.properties {
            self.database
                .put(
                    &property_collection(provider_hex),
                    &property_key(key, value, &date, appointment_hex),
                    appointment_hex.as_bytes().to_vec(),
                )
                .await?;
        }
        Ok(())
    }

    async fn bookings_of(&self, appointment_hex: &str) -> ServiceResult<Vec<Booking>> {
        let slots = self.slots_of(appointment_hex).await?;
        Ok(slots
            .into_iter()
            .filter(|s| !s.is_open())
            .map(|s| Booking {
                id: s.id,
                public_key: kiebitz_types::Base64Bytes(s.public_key.unwrap_or_default()),
                token: kiebitz_types::Base64Bytes(s.token.unwrap_or_default()),
                encrypted_data: kiebitz_types::Base64Bytes(s.encrypted_data.unwrap_or_default()),
            })
            .collect())
    }

    /// All of a provider's currently published appointments, bookings
    /// intact.
    pub async fn get_provider_appointments(&self, provider_id: Id) -> ServiceResult<Vec<ProviderAppointmentView>> {
        let provider_hex = id_to_hex(&provider_id);
        let entries = self.database.scan_all(&by_date_collection(&provider_hex)).await?;
        let mut out = Vec::with_capacity(entries.len());
        for (_, value) in entries {
            let appointment_hex =
                String::from_utf8(value).map_err(|e| ServiceError::Internal(e.to_string()))?;
            if let Some(record) = self.read_record(&appointment_hex).await? {
                let bookings = self.bookings_of(&appointment_hex).await?;
                out.push(ProviderAppointmentView {
                    json: record.json,
                    signature: record.signature,
                    public_key: record.public_key,
                    data: record.data,
                    updated_at: record.updated_at,
                    bookings,
                });
            }
        }
        Ok(out)
    }

    /// A provider's appointments whose properties include `key`/`value`.
    pub async fn get_provider_appointments_by_property(
        &self,
        provider_id: Id,
        key: &str,
        value: &str,
    ) -> ServiceResult<Vec<ProviderAppointmentView>> {
        let provider_hex = id_to_hex(&provider_id);
        let prefix = format!("{key}:{value}:");
        let entries = self.database.scan_prefix(&property_collection(&provider_hex), &prefix).await?;
        let mut out = Vec::with_capacity(entries.len());
        for (_, value) in entries {
            let appointment_hex =
                String::from_utf8(value).map_err(|e| ServiceError::Internal(e.to_string()))?;
            if let Some(record) = self.read_record(&appointment_hex).await? {
                let bookings = self.bookings_of(&appointment_hex).await?;
                out.push(ProviderAppointmentView {
                    json: record.json,
                    signature: record.signature,
                    public_key: record.public_key,
                    data: record.data,
                    updated_at: record.updated_at,
                    bookings,
                });
            }
        }
        Ok(out)
    }

    /// A single appointment, redacted to an anonymous caller's view:
    /// which slots are taken, never by whom.
    pub async fn get_appointment(&self, appointment_id: Id, key_chain: KeyChain) -> ServiceResult<AnonymousAppointmentView> {
        let appointment_hex = id_to_hex(&appointment_id);
        let record = self
            .read_record(&appointment_hex)
            .await?
            .ok_or_else(|| ServiceError::NotFound("unknown appointment".into()))?;
        let slots = self.slots_of(&appointment_hex).await?;
        let booked_slots = slots
            .into_iter()
            .filter(|s| !s.is_open())
            .map(|s| BookedSlot { id: s.id })
            .collect();
        Ok(AnonymousAppointmentView {
            json: record.json,
            signature: record.signature,
            public_key: record.public_key,
            data: record.data,
            booked_slots,
            key_chain,
        })
    }

    /// A privacy-preserving feed of upcoming appointments across the given
    /// providers, capped at `MAX_AGGREGATED_PER_PROVIDER` per provider and
    /// `AGGREGATION_WINDOW_DAYS` days out from `now`.
    pub async fn get_appointments_aggregated(
        &self,
        provider_ids: &[Id],
        now: DateTime<Utc>,
    ) -> ServiceResult<Vec<AppointmentAggregated>> {
        let mut out = Vec::new();
        for &provider_id in provider_ids {
            let provider_hex = id_to_hex(&provider_id);
            let mut per_provider = Vec::new();
            for offset in 0..=AGGREGATION_WINDOW_DAYS {
                let date = format_date(now + chrono::Duration::days(offset));
                let entries = self
                    .database
                    .scan_prefix(&by_date_collection(&provider_hex), &format!("{date}:"))
                    .await?;
                for (_, value) in entries {
                    let appointment_hex =
                        String::from_utf8(value).map_err(|e| ServiceError::Internal(e.to_string()))?;
                    if let Some(record) = self.read_record(&appointment_hex).await? {
                        let slot_n = self
                            .slots_of(&appointment_hex)
                            .await?
                            .iter()
                            .filter(|s| s.is_open())
                            .count();
                        per_provider.push(AppointmentAggregated {
                            id: record.data.id,
                            duration: record.data.duration,
                            properties: record.data.properties.clone(),
                            slot_n,
                            timestamp: record.data.timestamp,
                        });
                        if per_provider.len() >= MAX_AGGREGATED_PER_PROVIDER {
                            break;
                        }
                    }
                }
                if per_provider.len() >= MAX_AGGREGATED_PER_PROVIDER {
                    break;
                }
            }
            out.extend(per_provider);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_crypto::KeyPair;
    use kiebitz_storage::adapters::{LockedBookingGateway, MemoryStore};
    use kiebitz_storage::BookingGateway;
    use kiebitz_types::ActorData;
    use std::collections::BTreeMap;

    fn submission(pair: &KeyPair, id: Id, slot_ids: Vec<Id>, properties: BTreeMap<String, String>) -> AppointmentSubmission {
        let data = crate::domain::SignedAppointmentData {
            id,
            timestamp: Utc::now(),
            duration: 15,
            vaccine: "biontech".into(),
            properties,
            slot_data: slot_ids
                .into_iter()
                .map(|id| crate::domain::SlotId { id })
                .collect(),
        };
        let json = serde_json::to_string(&data).unwrap();
        let signature = pair.sign(json.as_bytes());
        AppointmentSubmission {
            json,
            signature: kiebitz_types::Base64Bytes(signature),
            data,
        }
    }

    fn fake_key_chain() -> KeyChain {
        let provider = KeyPair::generate();
        let mediator = KeyPair::generate();
        let make = |pair: &KeyPair| kiebitz_types::ActorKey {
            id: [0u8; 32],
            data: ActorData {
                signing: kiebitz_types::Base64Bytes(pair.public_key().to_sec1_bytes()),
                encryption: None,
                zip_code: None,
            },
            signature: kiebitz_types::Base64Bytes(vec![]),
            public_key: kiebitz_types::Base64Bytes(pair.public_key().to_sec1_bytes()),
        };
        KeyChain {
            provider: make(&provider),
            mediator: make(&mediator),
        }
    }

    #[tokio::test]
    async fn published_appointment_is_visible_to_its_provider() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store);
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointment_id = [5u8; 32];
        let slot_id = [6u8; 32];

        let sub = submission(&provider, appointment_id, vec![slot_id], BTreeMap::new());
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[sub])
            .await
            .unwrap();

        let views = service.get_provider_appointments(provider_id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].data.id, appointment_id);
        assert!(views[0].bookings.is_empty());
    }

    #[tokio::test]
    async fn booking_survives_republish_when_slot_id_is_kept() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store.clone());
        let booking_gateway = LockedBookingGateway::new(store.clone(), store.clone());
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointment_id = [7u8; 32];
        let slot_id = [8u8; 32];
        let other_slot_id = [9u8; 32];

        let sub = submission(
            &provider,
            appointment_id,
            vec![slot_id, other_slot_id],
            BTreeMap::new(),
        );
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[sub])
            .await
            .unwrap();

        booking_gateway
            .book_slot(appointment_id, b"token-a", b"user-key", b"enc")
            .await
            .unwrap();

        let resub = submission(&provider, appointment_id, vec![slot_id], BTreeMap::new());
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[resub])
            .await
            .unwrap();

        let views = service.get_provider_appointments(provider_id).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].data.slot_data.len(), 1);
    }

    #[tokio::test]
    async fn dropping_a_booked_slot_on_republish_releases_its_token() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store.clone());
        let booking_gateway = LockedBookingGateway::new(store.clone(), store.clone());
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointment_id = [1u8; 32];
        let slot_id = [2u8; 32];

        let sub = submission(&provider, appointment_id, vec![slot_id], BTreeMap::new());
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[sub])
            .await
            .unwrap();
        booking_gateway
            .book_slot(appointment_id, b"token-b", b"user-key", b"enc")
            .await
            .unwrap();

        let resub = submission(&provider, appointment_id, vec![], BTreeMap::new());
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[resub])
            .await
            .unwrap();

        assert!(!store.is_token_used(b"token-b").await.unwrap());
    }

    #[tokio::test]
    async fn property_index_finds_matching_appointments() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store);
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointment_id = [3u8; 32];

        let mut properties = BTreeMap::new();
        properties.insert("vaccine".to_string(), "biontech".to_string());
        let sub = submission(&provider, appointment_id, vec![[4u8; 32]], properties);
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[sub])
            .await
            .unwrap();

        let matches = service
            .get_provider_appointments_by_property(provider_id, "vaccine", "biontech")
            .await
            .unwrap();
        assert_eq!(matches.len(), 1);

        let none = service
            .get_provider_appointments_by_property(provider_id, "vaccine", "moderna")
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn anonymous_view_redacts_bookings_to_slot_ids() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store.clone());
        let booking_gateway = LockedBookingGateway::new(store.clone(), store.clone());
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let appointment_id = [11u8; 32];
        let slot_id = [12u8; 32];

        let sub = submission(&provider, appointment_id, vec![slot_id], BTreeMap::new());
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &[sub])
            .await
            .unwrap();
        booking_gateway
            .book_slot(appointment_id, b"token-c", b"user-key", b"enc")
            .await
            .unwrap();

        let view = service
            .get_appointment(appointment_id, fake_key_chain())
            .await
            .unwrap();
        assert_eq!(view.booked_slots.len(), 1);
        assert_eq!(view.booked_slots[0].id, slot_id);
    }

    #[tokio::test]
    async fn aggregated_feed_is_capped_per_provider() {
        let store = Arc::new(MemoryStore::new());
        let service = AppointmentService::new(store);
        let provider = KeyPair::generate();
        let provider_id = kiebitz_crypto::sha256(&provider.public_key().to_sec1_bytes());
        let now = Utc::now();

        let mut submissions = Vec::new();
        for i in 0..(MAX_AGGREGATED_PER_PROVIDER + 5) {
            let mut id = [0u8; 32];
            id[0] = i as u8;
            id[1] = 1;
            submissions.push(submission(&provider, id, vec![], BTreeMap::new()));
        }
        service
            .publish_appointments(provider_id, &provider.public_key().to_sec1_bytes(), &submissions)
            .await
            .unwrap();

        let aggregated = service
            .get_appointments_aggregated(&[provider_id], now)
            .await
            .unwrap();
        assert_eq!(aggregated.len(), MAX_AGGREGATED_PER_PROVIDER);
    }
}
