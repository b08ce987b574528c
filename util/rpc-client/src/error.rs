//！The error type for the RPC client.

use thiserror::Error;

/// A list specifying general categories of RPC client error.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The endpoint is not a valid url
    #[error("Invalid url {url}: {reason}")]
    InvalidUrl {
        /// The rejected endpoint
        url: String,
        /// Why it was rejected
        reason: String,
    },
    /// HTTP transport error, including timeouts
    #[error("Transport error {0}")]
    Transport(#[from] reqwest::Error),
    /// The request or the response could not be (de)serialized
    #[error("Serde error {0}")]
    Serde(#[from] serde_json::Error),
    /// The node answered with a JSON-RPC error object
    #[error("Rpc error {0}")]
    Rpc(jsonrpc_core::types::error::Error),
}
