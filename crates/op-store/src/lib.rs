//! # op-store
//!
//! Storage abstractions for the OpenID 2.0 provider.
//!
//! The provider keeps exactly two kinds of shared state: associations
//! (shared MAC keys identified by handle) and response nonces (the replay
//! guard for stateless verification). Both are defined here as async traits
//! with concurrent in-memory implementations; deployments that need
//! persistence or clustering supply their own implementations.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod association;
pub mod error;
pub mod nonce;

pub use association::{Association, AssociationStore, InMemoryAssociationStore};
pub use error::{StoreError, StoreResult};
pub use nonce::{InMemoryNonceStore, Nonce, NonceStore};
