//! Response nonces and the nonce store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// A response nonce issued alongside a positive assertion.
///
/// The id is a UTC timestamp (`YYYY-MM-DDThh:mm:ssZ`) followed by random
/// entropy; the whole string stays within the protocol's 255-character
/// limit. A nonce is consumed at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nonce {
    /// The nonce string as sent in `openid.response_nonce`.
    pub id: String,

    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl Nonce {
    /// Whether this nonce has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Storage for issued-but-unconsumed response nonces.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Records a freshly issued nonce.
    async fn put(&self, nonce: Nonce) -> StoreResult<()>;

    /// Atomically removes and returns the nonce with the given id.
    ///
    /// This is the replay guard: at most one caller ever observes a
    /// non-`None` result for any id, even under concurrency.
    async fn get_and_delete(&self, id: &str) -> StoreResult<Option<Nonce>>;
}

/// Concurrent in-memory nonce store.
///
/// A single mutex makes `get_and_delete` an atomic test-and-remove.
#[derive(Debug, Default)]
pub struct InMemoryNonceStore {
    entries: Mutex<HashMap<String, Nonce>>,
}

impl InMemoryNonceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NonceStore for InMemoryNonceStore {
    async fn put(&self, nonce: Nonce) -> StoreResult<()> {
        let now = Utc::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, existing| !existing.is_expired(now));
        entries.insert(nonce.id.clone(), nonce);
        Ok(())
    }

    async fn get_and_delete(&self, id: &str) -> StoreResult<Option<Nonce>> {
        Ok(self.entries.lock().remove(id))
    }
}
