//! # kiebitz-core
//!
//! The appointments service's domain logic: provider onboarding and
//! confirmation, the appointment engine, booking, and priority-token
//! issuance. Every service here is generic over the storage ports defined
//! in `kiebitz-storage` and leaves signature/role verification to
//! `kiebitz-auth`, whose `ActorDirectory` port this crate implements over
//! its own provider/mediator key storage.

#![warn(missing_docs)]

pub mod appointments;
pub mod booking;
pub mod domain;
pub mod ports;
pub mod provider;
pub mod tokens;

pub use appointments::{AppointmentService, AppointmentSubmission, PublishAppointmentsData};
pub use booking::{BookAppointmentData, BookingService, CancelAppointmentData};
pub use provider::{ConfirmProviderData, ProviderService, StoreProviderData};
pub use tokens::{GetTokenData, TokenMint};
