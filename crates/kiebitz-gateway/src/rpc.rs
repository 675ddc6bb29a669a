//! JSON-RPC 2.0 request/response handling: parsing, batch fan-out, id
//! validation, and translating [`GatewayError`] into the wire error shape.

use kiebitz_storage::{BookingGateway, Database, LockManager};
use serde_json::{json, Value};

use crate::dispatch::dispatch;
use crate::state::AppState;

/// Parse a request body (single object or batch array) and produce the
/// matching single object or batch array of responses.
pub async fn handle_json_rpc<D, G>(state: &AppState<D, G>, body: &str) -> Value
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let request: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            return json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": format!("parse error: {e}") },
            });
        }
    };

    match request.as_array() {
        Some(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for req in requests {
                responses.push(process_single_request(state, req).await);
            }
            Value::Array(responses)
        }
        None => process_single_request(state, &request).await,
    }
}

async fn process_single_request<D, G>(state: &AppState<D, G>, request: &Value) -> Value
where
    D: Database + LockManager,
    G: BookingGateway,
{
    let id = request.get("id").cloned();
    if let Err(error_response) = validate_request_id(&id) {
        return error_response;
    }

    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let params: Vec<Value> = match request.get("params") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    };

    match dispatch(state, method, &params).await {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(e) => json!({ "jsonrpc": "2.0", "id": id, "error": e.to_jsonrpc_error() }),
    }
}

/// Reject shapes a JSON-RPC 2.0 server must not answer as a normal call:
/// a null id (we don't support fire-and-forget notifications) and
/// pathologically long or empty string ids.
fn validate_request_id(id: &Option<Value>) -> Result<(), Value> {
    let Some(id_val) = id else { return Ok(()) };

    if id_val.is_null() {
        return Err(json!({
            "jsonrpc": "2.0",
            "id": null,
            "error": { "code": -32600, "message": "invalid request: null id (notifications not supported)" },
        }));
    }
    if let Some(s) = id_val.as_str() {
        if s.is_empty() {
            return Err(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32600, "message": "invalid request: empty string id" },
            }));
        }
        if s.len() > 256 {
            return Err(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32600, "message": "invalid request: id string too long (max 256 chars)" },
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiebitz_crypto::KeyPair;
    use kiebitz_storage::adapters::{LockedBookingGateway, MemoryStore};
    use std::sync::Arc;

    fn test_state() -> AppState<MemoryStore, LockedBookingGateway<MemoryStore, MemoryStore>> {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(LockedBookingGateway::new(store.clone(), store.clone()));
        AppState::new(
            store,
            gateway,
            KeyPair::generate().public_key(),
            KeyPair::generate().public_key(),
            KeyPair::generate(),
            b"secret".to_vec(),
            Arc::new(kiebitz_core::ports::NoopMetricsSink),
        )
    }

    #[tokio::test]
    async fn rejects_null_id() {
        let state = test_state();
        let response = handle_json_rpc(&state, r#"{"jsonrpc":"2.0","id":null,"method":"getKeys"}"#).await;
        assert_eq!(response["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    async fn answers_get_keys_with_a_result() {
        let state = test_state();
        let response = handle_json_rpc(&state, r#"{"jsonrpc":"2.0","id":1,"method":"getKeys"}"#).await;
        assert!(response.get("result").is_some());
    }

    #[tokio::test]
    async fn unknown_method_reports_method_not_found() {
        let state = test_state();
        let response = handle_json_rpc(&state, r#"{"jsonrpc":"2.0","id":1,"method":"nope"}"#).await;
        assert_eq!(response["error"]["code"], json!(-32601));
    }

    #[tokio::test]
    async fn batch_requests_each_get_a_response() {
        let state = test_state();
        let body = r#"[{"jsonrpc":"2.0","id":1,"method":"getKeys"},{"jsonrpc":"2.0","id":2,"method":"getStats"}]"#;
        let response = handle_json_rpc(&state, body).await;
        assert_eq!(response.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let state = test_state();
        let response = handle_json_rpc(&state, "{not json").await;
        assert_eq!(response["error"]["code"], json!(-32700));
    }
}
