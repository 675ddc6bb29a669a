//! Row shapes and database-level errors.

pub mod errors;
pub mod rows;

pub use errors::DbError;
pub use rows::{
    AppointmentRow, ProviderBucket, ProviderRow, ProviderStatus, PropertyRow, SlotRow,
    StorageRow, TokenCounterRow, UserTokenRow,
};
