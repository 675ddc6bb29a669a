//! Wiring: one struct holding every service a handler might need, built
//! once at startup and shared (behind an `Arc`) across every request task.

use std::sync::Arc;

use kiebitz_auth::AuthGates;
use kiebitz_core::ports::{MetricsSink, StorageActorDirectory};
use kiebitz_core::{AppointmentService, BookingService, ProviderService, TokenMint};
use kiebitz_crypto::PublicKey;
use kiebitz_storage::{BookingGateway, Database, LockManager};

/// Everything a dispatch function needs, generic over the storage backend
/// (`D`) and the booking gateway (`G`) — in production both are
/// `PostgresStore`; tests wire `MemoryStore` plus a `LockedBookingGateway`.
pub struct AppState<D, G> {
    /// The raw storage backend, for the handful of read-only checks
    /// (`isValidUser`'s spent-token probe) that have no dedicated service
    /// method of their own.
    pub database: Arc<D>,
    /// Provider onboarding, confirmation and discovery.
    pub providers: ProviderService<D>,
    /// Appointment publishing, views and aggregation.
    pub appointments: AppointmentService<D>,
    /// Booking and cancellation.
    pub booking: BookingService<D, G>,
    /// Priority-token issuance.
    pub tokens: TokenMint<D>,
    /// The four signed-envelope role gates.
    pub gates: AuthGates<StorageActorDirectory<D>>,
    /// The server's root public key, exposed by `getKeys`.
    pub root_key: PublicKey,
    /// The server's token-signing public key, exposed by `getKeys`.
    pub token_key: PublicKey,
    /// Best-effort counter sink for `getStats` and other instrumentation.
    pub metrics: Arc<dyn MetricsSink>,
}

impl<D, G> AppState<D, G>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    /// Assemble the service set over one shared storage backend and
    /// booking gateway, the server's three key roles, and a counter sink.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database: Arc<D>,
        gateway: Arc<G>,
        root_key: PublicKey,
        token_key: PublicKey,
        token_signing_key: kiebitz_crypto::KeyPair,
        server_secret: Vec<u8>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let directory = StorageActorDirectory::new(database.clone());
        Self {
            providers: ProviderService::new(database.clone()),
            appointments: AppointmentService::new(database.clone()),
            booking: BookingService::new(database.clone(), gateway),
            tokens: TokenMint::new(database.clone(), token_signing_key, server_secret),
            gates: AuthGates::new(directory, root_key.clone(), token_key.clone()),
            database,
            root_key,
            token_key,
            metrics,
        }
    }
}
