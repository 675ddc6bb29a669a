//! `getKeys`: the one fully public, unauthenticated call.

use kiebitz_storage::{BookingGateway, Database, LockManager};
use kiebitz_types::Base64Bytes;
use serde::Serialize;
use serde_json::Value;

use crate::domain::GatewayError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeysResponse {
    root_key: Base64Bytes,
    token_key: Base64Bytes,
}

/// Return the public halves of the server's root and token signing keys,
/// so clients can verify server-issued signatures offline.
pub fn get_keys<D, G>(state: &AppState<D, G>) -> Result<Value, GatewayError>
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let response = KeysResponse {
        root_key: Base64Bytes(state.root_key.to_sec1_bytes()),
        token_key: Base64Bytes(state.token_key.to_sec1_bytes()),
    };
    serde_json::to_value(response)
        .map_err(|e| GatewayError::InvalidParams(format!("could not encode keys response: {e}")))
}
