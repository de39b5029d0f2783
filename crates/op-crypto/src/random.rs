//! Cryptographically secure random generation.
//!
//! Sources of randomness in the provider:
//! - MAC keys for new associations
//! - Association handles
//! - The entropy suffix of response nonces
//! - Ephemeral Diffie–Hellman private keys

use base64::Engine;
use rand::Rng;

use crate::algorithm::HmacAlgorithm;

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a fresh MAC key of the length `algorithm` requires.
#[must_use]
pub fn generate_mac_key(algorithm: HmacAlgorithm) -> Vec<u8> {
    random_bytes(algorithm.mac_key_len())
}

/// Generates a fresh association handle.
///
/// Handles are opaque, unguessable strings; base64 of 24 random bytes gives
/// 192 bits of entropy and stays well inside the protocol's 255-character
/// handle limit.
#[must_use]
pub fn generate_handle() -> String {
    base64::engine::general_purpose::STANDARD.encode(random_bytes(24))
}

/// Generates `byte_len` random bytes rendered as lowercase hex.
///
/// Response nonces append `random_hex(4)` (eight hex characters) to their
/// UTC timestamp.
#[must_use]
pub fn random_hex(byte_len: usize) -> String {
    random_bytes(byte_len)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
