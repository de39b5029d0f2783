//! # op-crypto
//!
//! Cryptographic primitives for the OpenID Authentication 2.0 provider,
//! backed by aws-lc-rs.
//!
//! This crate covers:
//! - HMAC signing (SHA-1 and SHA-256) for association secrets
//! - Secure random generation for MAC keys, handles, and nonce entropy
//! - Diffie–Hellman key agreement over the protocol's fixed 1024-bit modulus
//! - btwoc big-endian integer encoding and byte-wise XOR
//!
//! SHA-1 support exists solely because `HMAC-SHA1` associations and the
//! `DH-SHA1` session type are part of the OpenID 2.0 wire protocol. New
//! deployments should prefer the SHA-256 variants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod dh;
pub mod random;

pub use algorithm::{constant_time_eq, HmacAlgorithm};
pub use dh::{btwoc, xor_bytes, DhExchange};
pub use random::{generate_handle, generate_mac_key, random_bytes, random_hex};
