//! # op-protocol
//!
//! The OpenID Authentication 2.0 protocol engine.
//!
//! This crate implements the server side of OpenID 2.0: a single logical
//! endpoint multiplexing discovery, association establishment,
//! authentication assertions, and stateless verification, plus the
//! Attribute Exchange 1.0 fetch extension.
//!
//! The engine is a request-driven library. The embedding HTTP framework
//! adapts its request type into an [`EndpointRequest`], calls
//! [`OpenIdProvider::handle`], and sends the produced response (or passes
//! the request on when the engine declines it). Interactive authentication
//! is delegated to an [`AuthHandler`]; the handler resumes the engine later
//! through [`OpenIdProvider::complete_auth`] or
//! [`OpenIdProvider::reject_auth`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod context;
pub mod error;
pub mod extension;
pub mod message;
pub mod provider;
pub mod realm;

mod endpoints;

pub use context::{AuthContext, AuthHandler, AuthResponse};
pub use error::{ProtocolError, ProtocolResult};
pub use extension::{AxValue, Extension, AX_NS};
pub use message::Message;
pub use provider::{EndpointRequest, HandleOutcome, OpenIdProvider, ProviderConfig};

/// The OpenID Authentication 2.0 namespace URI.
pub const OPENID2_NS: &str = "http://specs.openid.net/auth/2.0";
