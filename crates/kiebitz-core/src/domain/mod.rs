//! Domain objects the repository layer lifts rows into.

pub mod entities;

pub use entities::{
    AnonymousAppointmentView, AppointmentAggregated, AppointmentRecord, BookedSlot, Booking,
    KeyChain, ProviderAppointmentView, ProviderProfileData, RawProviderData,
    SignedAppointmentData, SlotId,
};
