//! Gate errors and the envelope-signature check shared by every gate.

pub mod errors;
pub mod verify;

pub use errors::GateError;
pub use verify::verify_envelope_signature;
