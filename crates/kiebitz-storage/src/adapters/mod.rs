//! Concrete storage backends: an in-memory one for tests and small
//! deployments, a PostgreSQL one for production.

pub mod locked_booking;
pub mod memory;
pub mod postgres;

pub use locked_booking::LockedBookingGateway;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
