//! Auth-handler contract and resumption types.
//!
//! The engine does not authenticate users. When a checkid request passes
//! validation, it packages an [`AuthContext`] and transfers control to the
//! embedder's [`AuthHandler`]. The handler produces whatever interactive
//! response it wants (a login page, a redirect into an SSO flow, an
//! immediate decision) and later resumes the engine with
//! [`OpenIdProvider::complete_auth`] or [`OpenIdProvider::reject_auth`] —
//! typically from a different HTTP request, after the user logged in.
//!
//! [`OpenIdProvider::complete_auth`]: crate::provider::OpenIdProvider::complete_auth
//! [`OpenIdProvider::reject_auth`]: crate::provider::OpenIdProvider::reject_auth

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::extension::{AxValue, Extension};
use crate::message::Message;
use crate::provider::{EndpointRequest, OpenIdProvider};

/// Opaque token carried through the auth-handler round-trip.
///
/// Contexts are serializable so the embedder can park them in a session
/// store; the engine attaches no resources to them and never persists
/// them. A context that is never resumed leaks nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// True for `checkid_setup`, false for `checkid_immediate`.
    pub interactive: bool,

    /// The parsed checkid request.
    pub request: Message,

    /// The AX fetch request, when the relying party sent one.
    pub ax: Option<Extension>,
}

/// What the auth handler supplies on successful authentication.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// The context the engine handed to the auth handler, unchanged.
    pub context: AuthContext,

    /// The authenticated local user identifier (a bare username, not a
    /// URL; the engine derives the claimed identifier from it).
    pub identity: String,

    /// Attribute values keyed by AX type URI.
    pub ax: Option<BTreeMap<String, AxValue>>,
}

/// User-authentication callback supplied at provider construction.
#[async_trait]
pub trait AuthHandler: Send + Sync {
    /// Authenticates the user behind `context.request`.
    ///
    /// The returned response is sent to the user agent as-is. The engine
    /// holds no locks across this call and does not time it out; the
    /// handler resumes the flow whenever it is ready by calling
    /// `complete_auth` or `reject_auth` on `provider`.
    async fn authenticate(
        &self,
        provider: &OpenIdProvider,
        request: &EndpointRequest,
        interactive: bool,
        context: AuthContext,
    ) -> Response;
}
