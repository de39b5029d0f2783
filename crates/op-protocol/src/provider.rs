//! The provider engine: configuration, dispatch, and resumption.

use std::sync::Arc;

use axum::http::Method;
use axum::response::Response;

use op_store::{
    AssociationStore, InMemoryAssociationStore, InMemoryNonceStore, NonceStore,
};

use crate::context::{AuthContext, AuthHandler, AuthResponse};
use crate::endpoints::{self, associate, check_auth, checkid, discovery};
use crate::error::ProtocolResult;
use crate::message::Message;

/// Engine configuration.
///
/// The expiry defaults are deliberately short; deployments typically
/// override them. They live here and nowhere else.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Absolute URL of the provider endpoint as relying parties see it.
    pub endpoint: String,

    /// Lifetime of new associations, in seconds.
    pub association_expiry_secs: i64,

    /// Lifetime of issued response nonces, in seconds.
    pub nonce_expiry_secs: i64,
}

impl ProviderConfig {
    /// Creates a configuration with default expiries.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            association_expiry_secs: 30,
            nonce_expiry_secs: 30,
        }
    }
}

/// The slice of an HTTP request the engine needs.
///
/// The embedding framework adapts its own request type into this; `path`
/// is relative to the engine's mount point.
#[derive(Debug, Clone, Default)]
pub struct EndpointRequest {
    /// HTTP method.
    pub method: Method,

    /// Request path relative to the mount point (`"/"` or `""` for the
    /// mount root).
    pub path: String,

    /// Raw query string, without the leading `?`.
    pub query: Option<String>,

    /// `Content-Type` header value.
    pub content_type: Option<String>,

    /// `Accept` header value.
    pub accept: Option<String>,

    /// Request body.
    pub body: String,

    /// Whether the transport is secure (TLS-terminated). Gates the
    /// `no-encryption` association session.
    pub secure: bool,
}

/// Outcome of [`OpenIdProvider::handle`].
pub enum HandleOutcome {
    /// The engine produced a response to send.
    Handled(Response),

    /// The request is not OpenID traffic; pass it to the next handler.
    Declined,
}

/// The OpenID 2.0 provider engine.
///
/// Owns no state between requests beyond the pluggable association and
/// nonce stores.
pub struct OpenIdProvider {
    config: ProviderConfig,
    associations: Arc<dyn AssociationStore>,
    nonces: Arc<dyn NonceStore>,
    auth_handler: Arc<dyn AuthHandler>,
}

impl OpenIdProvider {
    /// Creates a provider with in-memory stores.
    #[must_use]
    pub fn new(config: ProviderConfig, auth_handler: Arc<dyn AuthHandler>) -> Self {
        Self {
            config,
            associations: Arc::new(InMemoryAssociationStore::new()),
            nonces: Arc::new(InMemoryNonceStore::new()),
            auth_handler,
        }
    }

    /// Replaces the association store.
    #[must_use]
    pub fn with_association_store(mut self, store: Arc<dyn AssociationStore>) -> Self {
        self.associations = store;
        self
    }

    /// Replaces the nonce store.
    #[must_use]
    pub fn with_nonce_store(mut self, store: Arc<dyn NonceStore>) -> Self {
        self.nonces = store;
        self
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn associations(&self) -> &dyn AssociationStore {
        self.associations.as_ref()
    }

    pub(crate) fn nonces(&self) -> &dyn NonceStore {
        self.nonces.as_ref()
    }

    pub(crate) fn auth_handler(&self) -> &dyn AuthHandler {
        self.auth_handler.as_ref()
    }

    /// Main entry point: dispatches one HTTP request.
    ///
    /// Requests on non-root paths, and POSTs without the OpenID 2.0
    /// namespace, are declined for the embedder's next handler. Bare GETs
    /// on the mount root serve discovery. Everything else is dispatched
    /// by `openid.mode`.
    ///
    /// `Err` is reserved for internal failures (stores, key material);
    /// the embedder maps it to HTTP 500 and its own error channel.
    pub async fn handle(&self, request: EndpointRequest) -> ProtocolResult<HandleOutcome> {
        if !request.path.is_empty() && request.path != "/" {
            return Ok(HandleOutcome::Declined);
        }

        let message = if request.method == Method::GET {
            Message::from_query(request.query.as_deref().unwrap_or_default())
        } else if request.method == Method::POST {
            Message::from_body(&request.body, request.content_type.as_deref())
        } else {
            Message::new()
        };

        if !message.has_namespace() {
            if request.method == Method::GET {
                return Ok(HandleOutcome::Handled(discovery::respond(self, &request)));
            }
            return Ok(HandleOutcome::Declined);
        }

        let mode = message.get("mode").map(str::to_string);
        tracing::debug!(mode = mode.as_deref().unwrap_or("-"), "openid request");

        let response = match mode.as_deref() {
            Some("associate") if request.method == Method::POST => {
                associate::handle(self, &request, &message).await?
            }
            Some("check_authentication") if request.method == Method::POST => {
                check_auth::handle(self, &message).await?
            }
            Some("checkid_setup") => checkid::handle(self, &request, message, true).await?,
            Some("checkid_immediate") => checkid::handle(self, &request, message, false).await?,
            other => endpoints::direct_error(&format!(
                "unknown or unsupported openid.mode: {}",
                other.unwrap_or("(missing)")
            )),
        };

        Ok(HandleOutcome::Handled(response))
    }

    /// Resumes a checkid flow after successful authentication, producing
    /// the signed positive assertion redirect.
    pub async fn complete_auth(&self, auth: AuthResponse) -> ProtocolResult<Response> {
        checkid::complete(self, auth).await
    }

    /// Resumes a checkid flow after the user declined (or an immediate
    /// flow that needs interaction), producing the negative assertion
    /// redirect.
    pub async fn reject_auth(&self, context: AuthContext) -> ProtocolResult<Response> {
        Ok(checkid::reject(&context))
    }
}
