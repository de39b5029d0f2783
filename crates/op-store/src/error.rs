//! Store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by association and nonce stores.
///
/// The in-memory stores are infallible, but implementations backed by a
/// database or distributed cache are not; the engine maps any store error
/// to an internal (HTTP 500) failure without retrying.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}
