//! Booking and cancellation.

pub mod requests;
pub mod service;

pub use requests::{BookAppointmentData, CancelAppointmentData};
pub use service::BookingService;
