//! Server configuration.
//!
//! Loaded from the environment; every value has a usable default for
//! local development. The association/nonce expiries override the
//! engine's deliberately short defaults.

use serde::{Deserialize, Serialize};

/// Configuration for the reference server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Public base URL of this server, as relying parties reach it.
    pub public_url: String,

    /// Path the provider endpoint is mounted at.
    pub mount_path: String,

    /// Association lifetime in seconds.
    pub association_expiry_secs: i64,

    /// Response-nonce lifetime in seconds.
    pub nonce_expiry_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: "http://localhost:8080".to_string(),
            mount_path: "/openid".to_string(),
            association_expiry_secs: 3600,
            nonce_expiry_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `OP_*` environment variables, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            host: env_or("OP_HOST", defaults.host),
            port: parsed_env("OP_PORT", defaults.port)?,
            public_url: env_or("OP_PUBLIC_URL", defaults.public_url),
            mount_path: env_or("OP_MOUNT_PATH", defaults.mount_path),
            association_expiry_secs: parsed_env(
                "OP_ASSOCIATION_EXPIRY_SECS",
                defaults.association_expiry_secs,
            )?,
            nonce_expiry_secs: parsed_env("OP_NONCE_EXPIRY_SECS", defaults.nonce_expiry_secs)?,
        })
    }

    /// Configuration for tests: loopback binding on a caller-chosen port.
    #[must_use]
    pub fn for_testing(port: u16) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            public_url: format!("http://127.0.0.1:{port}"),
            ..Self::default()
        }
    }

    /// The provider endpoint URL relying parties discover and sign over.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}{}",
            self.public_url.trim_end_matches('/'),
            self.mount_path
        )
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|error| anyhow::anyhow!("invalid {key}: {error}")),
        Err(_) => Ok(default),
    }
}
