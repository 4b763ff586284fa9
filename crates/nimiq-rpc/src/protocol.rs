//! JSON-RPC 2.0 request and response envelopes.

use crate::error::Error;

#[derive(serde::Serialize)]
pub(crate) struct JsonRpcRequest<'a> {
    pub(crate) jsonrpc: &'static str,
    pub(crate) method: &'a str,
    pub(crate) params: Vec<serde_json::Value>,
    pub(crate) id: u64,
}

/// A decoded response body. A well-formed response carries exactly one of
/// `result` and `error`; the caller checks `error` first.
#[derive(serde::Deserialize)]
pub(crate) struct JsonRpcResponse {
    pub(crate) result: Option<serde_json::Value>,
    pub(crate) error: Option<serde_json::Value>,
}

/// Parse a JSON-RPC error value into a structured [`Error`].
///
/// The spec defines errors as `{"code": <int>, "message": <string>}`. A value
/// of that shape becomes [`Error::Remote`]; anything else is a protocol
/// violation and is surfaced with the raw JSON.
pub(crate) fn parse_jsonrpc_error(err: serde_json::Value) -> Error {
    #[derive(serde::Deserialize)]
    struct JsonRpcError {
        code: i64,
        message: String,
    }

    if let Ok(parsed) = serde_json::from_value::<JsonRpcError>(err.clone()) {
        Error::Remote {
            code: parsed.code,
            message: parsed.message,
        }
    } else {
        Error::Protocol(format!("non-standard JSON-RPC error: {err}"))
    }
}
