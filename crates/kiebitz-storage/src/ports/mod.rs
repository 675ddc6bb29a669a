//! Outbound ports: the capabilities the appointments core requires of its
//! storage backend: typed CRUD over entities, per-key distributed locks,
//! and atomic counters.

pub mod booking;
pub mod database;
pub mod lock;

pub use booking::BookingGateway;
pub use database::Database;
pub use lock::{LockGuard, LockManager};
