//! Application state shared across request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use op_protocol::{AuthContext, OpenIdProvider, ProviderConfig};

use crate::config::ServerConfig;
use crate::ui::LoginFormHandler;

/// Pending login challenges: challenge id to parked auth context.
pub type PendingLogins = Arc<Mutex<HashMap<String, AuthContext>>>;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: ServerConfig,

    /// The protocol engine.
    pub provider: Arc<OpenIdProvider>,

    /// Contexts waiting for a login-form submission.
    pub pending: PendingLogins,
}

impl AppState {
    /// Wires the engine, the login-form auth handler, and the pending
    /// context map together.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        let pending: PendingLogins = Arc::new(Mutex::new(HashMap::new()));

        let handler = LoginFormHandler::new(
            pending.clone(),
            format!("{}/login", config.mount_path),
        );

        let mut provider_config = ProviderConfig::new(config.endpoint_url());
        provider_config.association_expiry_secs = config.association_expiry_secs;
        provider_config.nonce_expiry_secs = config.nonce_expiry_secs;

        let provider = Arc::new(OpenIdProvider::new(provider_config, Arc::new(handler)));

        Self {
            config,
            provider,
            pending,
        }
    }
}
