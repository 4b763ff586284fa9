/// Errors surfaced by the RPC client.
///
/// Transport faults, remote method errors and malformed responses are kept
/// distinct so callers can tell a dead node apart from a call the node
/// rejected.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP layer failed before a JSON-RPC response was obtained
    /// (connection refused, timeout, TLS failure).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node returned a well-formed JSON-RPC error object.
    #[error("remote method error {code}: {message}")]
    Remote { code: i64, message: String },

    /// The response body was not a valid JSON-RPC 2.0 response.
    #[error("invalid JSON-RPC response: {0}")]
    Protocol(String),

    /// The client could not be constructed from the given configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Remote error code, if this is a [`Error::Remote`].
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            Error::Remote { code, .. } => Some(*code),
            _ => None,
        }
    }
}
