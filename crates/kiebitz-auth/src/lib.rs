//! # kiebitz-auth
//!
//! Signed-envelope verification and the four role gates that guard every
//! mutating call: `is_root`, `is_mediator`, `is_provider`, `is_user`.
//! Mediator and provider resolution goes through the abstract
//! `ActorDirectory` port so this crate never depends on a storage
//! implementation; `kiebitz-core` supplies one.

#![warn(missing_docs)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::GateError;
pub use ports::ActorDirectory;
pub use service::AuthGates;
