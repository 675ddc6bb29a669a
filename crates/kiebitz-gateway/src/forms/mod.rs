//! Request-shape decoding shared by the JSON-RPC and REST transports.

pub mod params;

pub use params::{parse_id, parse_param, parse_param_optional};
