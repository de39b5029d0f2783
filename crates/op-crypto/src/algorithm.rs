//! HMAC algorithms used by OpenID 2.0 associations.
//!
//! An association's `assoc_type` selects the HMAC hash and with it the
//! length of the MAC key: 20 bytes for `HMAC-SHA1`, 32 for `HMAC-SHA256`.
//! The matching DH session types (`DH-SHA1`, `DH-SHA256`) hash the shared
//! secret with the same function, so the digest helpers live here too.

use aws_lc_rs::{digest, hmac};
use serde::{Deserialize, Serialize};

/// HMAC algorithm negotiated for an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HmacAlgorithm {
    /// HMAC-SHA1 (20-byte MAC key). Legacy, kept for wire compatibility.
    Sha1,
    /// HMAC-SHA256 (32-byte MAC key). Preferred.
    Sha256,
}

impl HmacAlgorithm {
    /// Length in bytes of the MAC key (equal to the hash output length).
    #[must_use]
    pub const fn mac_key_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// The `assoc_type` value naming this algorithm on the wire.
    #[must_use]
    pub const fn assoc_type(self) -> &'static str {
        match self {
            Self::Sha1 => "HMAC-SHA1",
            Self::Sha256 => "HMAC-SHA256",
        }
    }

    /// The `session_type` value for the DH session using this hash.
    #[must_use]
    pub const fn session_type(self) -> &'static str {
        match self {
            Self::Sha1 => "DH-SHA1",
            Self::Sha256 => "DH-SHA256",
        }
    }

    /// Parses an `assoc_type` parameter.
    #[must_use]
    pub fn from_assoc_type(value: &str) -> Option<Self> {
        match value {
            "HMAC-SHA1" => Some(Self::Sha1),
            "HMAC-SHA256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Parses a DH `session_type` parameter.
    #[must_use]
    pub fn from_session_type(value: &str) -> Option<Self> {
        match value {
            "DH-SHA1" => Some(Self::Sha1),
            "DH-SHA256" => Some(Self::Sha256),
            _ => None,
        }
    }

    /// Computes the HMAC of `data` under `key`.
    #[must_use]
    pub fn sign(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        let algorithm = match self {
            Self::Sha1 => hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => hmac::HMAC_SHA256,
        };
        let signing_key = hmac::Key::new(algorithm, key);
        hmac::sign(&signing_key, data).as_ref().to_vec()
    }

    /// Computes the plain digest used to mask the MAC key in a DH exchange.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        let algorithm = match self {
            Self::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => &digest::SHA256,
        };
        digest::digest(algorithm, data).as_ref().to_vec()
    }
}

/// Constant-time comparison of two byte slices.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
