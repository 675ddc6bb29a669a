//! Transport-level middleware: CORS, per-request timeout, and tracing.
//! Request → Cors → Timeout → Tracing → handler.

pub mod cors;

pub use cors::create_cors_layer;
