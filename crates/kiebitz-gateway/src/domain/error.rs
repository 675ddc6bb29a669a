//! The one error type every handler returns, and its two wire encodings.

use kiebitz_types::ServiceError;
use serde_json::{json, Value};

/// A request-handling failure, transport-independent.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The domain service rejected the call.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// No such JSON-RPC method, or no such REST route.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The request body or params could not be decoded into the shape the
    /// handler expects.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

impl GatewayError {
    /// The JSON-RPC 2.0 error code.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            GatewayError::Service(e) => e.jsonrpc_code(),
            GatewayError::MethodNotFound(_) => -32601,
            GatewayError::InvalidParams(_) => -32602,
        }
    }

    /// The REST/HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::Service(e) => e.http_status(),
            GatewayError::MethodNotFound(_) => 404,
            GatewayError::InvalidParams(_) => 400,
        }
    }

    /// Render as a JSON-RPC 2.0 `error` object.
    pub fn to_jsonrpc_error(&self) -> Value {
        json!({
            "code": self.jsonrpc_code(),
            "message": self.to_string(),
        })
    }
}
