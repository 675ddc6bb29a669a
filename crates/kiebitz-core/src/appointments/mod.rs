//! Appointment publishing, provider/anonymous views, and aggregation.

pub mod requests;
pub mod service;

pub use requests::{AppointmentSubmission, PublishAppointmentsData};
pub use service::{
    AppointmentService, AGGREGATION_WINDOW_DAYS, MAX_AGGREGATED_PER_PROVIDER,
    MAX_APPOINTMENTS_PER_PUBLISH,
};
