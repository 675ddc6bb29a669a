//! Database and named-lock capability for the appointments service.
//!
//! Defines the storage ports (`Database`, `LockManager`, `BookingGateway`)
//! the repository layer depends on, plus two adapters: an in-memory one
//! (`adapters::memory::MemoryStore`, used in tests and for small
//! deployments) and a PostgreSQL one (`adapters::postgres::PostgresStore`,
//! used in production). Row shapes in `domain::rows` mirror the relational
//! schema of the appointments service.

#![warn(missing_docs)]

pub mod adapters;
pub mod domain;
pub mod ports;

pub use domain::{
    AppointmentRow, DbError, ProviderBucket, ProviderRow, ProviderStatus, PropertyRow, SlotRow,
    StorageRow, TokenCounterRow, UserTokenRow,
};
pub use ports::{BookedSlot, BookingGateway, Database, LockGuard, LockManager};
