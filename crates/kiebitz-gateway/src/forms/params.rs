//! Positional JSON-RPC parameter extraction, and the handful of literal
//! shapes (signed envelopes, hex ids) every handler needs to pull out of
//! `params`/REST query strings.

use kiebitz_types::{id_from_hex, Id};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::GatewayError;

/// Pull the `index`-th positional parameter out of a JSON-RPC `params`
/// array and decode it as `T`.
pub fn parse_param<T: DeserializeOwned>(params: &[Value], index: usize) -> Result<T, GatewayError> {
    let value = params
        .get(index)
        .ok_or_else(|| GatewayError::InvalidParams(format!("missing parameter at index {index}")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| GatewayError::InvalidParams(format!("parameter {index}: {e}")))
}

/// Like [`parse_param`], but a missing index decodes to `None` instead of
/// failing — used for the handful of calls with an optional trailing
/// parameter (e.g. `getProviderAppointments`'s `updatedSince`).
pub fn parse_param_optional<T: DeserializeOwned>(
    params: &[Value],
    index: usize,
) -> Result<Option<T>, GatewayError> {
    match params.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| GatewayError::InvalidParams(format!("parameter {index}: {e}"))),
    }
}

/// Decode a lowercase-hex id, the form every REST path segment and most
/// JSON-RPC id parameters arrive in.
pub fn parse_id(hex: &str) -> Result<Id, GatewayError> {
    id_from_hex(hex).ok_or_else(|| GatewayError::InvalidParams(format!("malformed id: {hex}")))
}
