//! Protocol error types.
//!
//! Protocol-level failures (malformed messages, unsupported association
//! types, realm violations) are rendered into direct or indirect error
//! responses by the endpoint handlers and never surface as `Err`. The
//! error type here covers the remaining class: internal failures of the
//! stores or the crypto layer, which the embedder maps to HTTP 500 and
//! its own error channel.

use thiserror::Error;

use op_store::StoreError;

/// Result type for engine operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Internal failures of the protocol engine.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An association or nonce store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Key material could not be decoded or applied.
    #[error("cryptographic error: {0}")]
    Crypto(String),
}
