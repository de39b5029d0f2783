//! Association records and the association store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use op_crypto::HmacAlgorithm;

use crate::error::StoreResult;

/// A shared (or provider-private) MAC key identified by handle.
///
/// Private associations are generated unilaterally by the provider to sign
/// an assertion for a relying party without an established association.
/// They are only ever used to verify a later `check_authentication` call
/// and are never returned from the associate endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Association {
    /// Opaque unique handle.
    pub handle: String,

    /// HMAC algorithm this association signs with.
    pub algorithm: HmacAlgorithm,

    /// Base64-encoded MAC key.
    pub secret: String,

    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,

    /// Whether the provider created this association unilaterally.
    pub private: bool,
}

impl Association {
    /// Creates an association with a fresh random handle and MAC key.
    #[must_use]
    pub fn generate(algorithm: HmacAlgorithm, lifetime_secs: i64, private: bool) -> Self {
        use base64::Engine;

        let secret = base64::engine::general_purpose::STANDARD
            .encode(op_crypto::generate_mac_key(algorithm));

        Self {
            handle: op_crypto::generate_handle(),
            algorithm,
            secret,
            expires_at: Utc::now() + Duration::seconds(lifetime_secs),
            private,
        }
    }

    /// Whether this association has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Seconds until expiry as of `now`, clamped to zero.
    #[must_use]
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Storage for associations, keyed by handle.
///
/// Implementations must tolerate concurrent callers. `get` may return
/// expired records; the engine checks `expires_at` and issues a `delete`.
/// Get-then-delete is not assumed atomic.
#[async_trait]
pub trait AssociationStore: Send + Sync {
    /// Stores an association, replacing any record with the same handle.
    async fn put(&self, association: Association) -> StoreResult<()>;

    /// Looks up an association by handle.
    async fn get(&self, handle: &str) -> StoreResult<Option<Association>>;

    /// Removes an association. Removing an absent handle is not an error.
    async fn delete(&self, handle: &str) -> StoreResult<()>;
}

/// Concurrent in-memory association store.
///
/// Expiry is lazy; `put` opportunistically sweeps expired records so an
/// idle provider does not accumulate dead associations.
#[derive(Debug, Default)]
pub struct InMemoryAssociationStore {
    entries: RwLock<HashMap<String, Association>>,
}

impl InMemoryAssociationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssociationStore for InMemoryAssociationStore {
    async fn put(&self, association: Association) -> StoreResult<()> {
        let now = Utc::now();
        let mut entries = self.entries.write();
        entries.retain(|_, existing| !existing.is_expired(now));
        entries.insert(association.handle.clone(), association);
        Ok(())
    }

    async fn get(&self, handle: &str) -> StoreResult<Option<Association>> {
        Ok(self.entries.read().get(handle).cloned())
    }

    async fn delete(&self, handle: &str) -> StoreResult<()> {
        self.entries.write().remove(handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = InMemoryAssociationStore::new();
        let assoc = Association::generate(HmacAlgorithm::Sha256, 60, false);
        let handle = assoc.handle.clone();

        store.put(assoc).await.unwrap();
        let loaded = store.get(&handle).await.unwrap().unwrap();
        assert_eq!(loaded.handle, handle);
        assert_eq!(loaded.algorithm, HmacAlgorithm::Sha256);
        assert!(!loaded.private);

        store.delete(&handle).await.unwrap();
        assert!(store.get(&handle).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_of_absent_handle_is_ok() {
        let store = InMemoryAssociationStore::new();
        store.delete("no-such-handle").await.unwrap();
    }

    #[tokio::test]
    async fn expired_records_may_still_be_returned() {
        // Lazy expiry: the engine, not the store, enforces expires_at.
        let store = InMemoryAssociationStore::new();
        let assoc = Association::generate(HmacAlgorithm::Sha1, -10, true);
        let handle = assoc.handle.clone();

        store.put(assoc).await.unwrap();
        let loaded = store.get(&handle).await.unwrap().unwrap();
        assert!(loaded.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn put_sweeps_expired_records() {
        let store = InMemoryAssociationStore::new();
        let stale = Association::generate(HmacAlgorithm::Sha256, -10, false);
        let stale_handle = stale.handle.clone();
        store.put(stale).await.unwrap();

        store
            .put(Association::generate(HmacAlgorithm::Sha256, 60, false))
            .await
            .unwrap();
        assert!(store.get(&stale_handle).await.unwrap().is_none());
    }

    #[test]
    fn expires_in_is_clamped_to_zero() {
        let assoc = Association::generate(HmacAlgorithm::Sha256, -100, false);
        assert_eq!(assoc.expires_in(Utc::now()), 0);
    }

    #[test]
    fn generated_secret_has_mac_key_length() {
        use base64::Engine;

        let assoc = Association::generate(HmacAlgorithm::Sha1, 60, false);
        let key = base64::engine::general_purpose::STANDARD
            .decode(&assoc.secret)
            .unwrap();
        assert_eq!(key.len(), 20);
    }
}
