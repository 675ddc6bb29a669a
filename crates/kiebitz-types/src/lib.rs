//! # kiebitz-types
//!
//! Wire-level types shared by every crate: the signed envelope every
//! mutating call arrives in, base64-text binary identifiers, the service
//! error taxonomy, and expiry/date-bucket time helpers.

#![warn(missing_docs)]

pub mod actor;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod time;
pub mod token;

pub use actor::{ActorData, ActorKey};
pub use entities::{id_from_hex, id_to_hex, Base64Bytes, Id};
pub use envelope::{SignedEnvelope, Timestamped};
pub use errors::{ServiceError, ServiceResult};
pub use time::{format_date, is_within_expiry_window, parse_date, EXPIRY_WINDOW_SECONDS};
pub use token::{PriorityToken, SignedToken, TokenData};
