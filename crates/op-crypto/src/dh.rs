//! Diffie–Hellman key agreement for association sessions.
//!
//! OpenID 2.0 fixes a 1024-bit prime modulus with generator 2 as the
//! default group. Integers travel on the wire as base64 of their btwoc
//! encoding: big-endian two's complement of a nonnegative value, so a
//! leading zero byte is prepended whenever the high bit of the first
//! byte is set.

use num_bigint::BigUint;

use crate::random::random_bytes;

/// The default 1024-bit DH modulus from the OpenID 2.0 specification.
pub const DEFAULT_DH_MODULUS_HEX: &str = "DCF93A0B883972EC0E19989AC5A2CE310E1D37717E8D9571BB7623731866E61EF75A2E27898B057F9891C2E27A639C3F29B60814581CD3B2CA3986D2683705577D45C2E7E52DC81C7A171876E5CEA74B1448BFDFAF18828EFD2519F14E45E3826634AF1949E5B535CC829A483B8A76223E5D490A257F05BDFF16F2FB22C583AB";

/// The default DH generator.
pub const DEFAULT_DH_GENERATOR: u32 = 2;

/// Encodes bytes as btwoc: prepend a zero byte when the high bit of the
/// first byte is set. Leading zeros in the input are preserved.
#[must_use]
pub fn btwoc(bytes: &[u8]) -> Vec<u8> {
    match bytes.first() {
        None => vec![0],
        Some(first) if first & 0x80 != 0 => {
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(0);
            out.extend_from_slice(bytes);
            out
        }
        Some(_) => bytes.to_vec(),
    }
}

/// XORs two byte slices of equal length.
///
/// The output is truncated to the shorter input if the lengths differ;
/// callers are expected to pass equal-length slices.
#[must_use]
pub fn xor_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b.iter()).map(|(x, y)| x ^ y).collect()
}

/// One side of a Diffie–Hellman exchange with a freshly generated
/// ephemeral keypair.
#[derive(Debug)]
pub struct DhExchange {
    modulus: BigUint,
    private_key: BigUint,
    public_key: BigUint,
}

impl DhExchange {
    /// Creates an exchange over the group `(modulus, generator)`,
    /// generating an ephemeral private key in `[1, modulus - 2]`.
    ///
    /// Returns `None` when the parameters cannot form a usable group
    /// (modulus below 3 or generator below 2).
    #[must_use]
    pub fn new(modulus: BigUint, generator: BigUint) -> Option<Self> {
        if modulus < BigUint::from(3u32) || generator < BigUint::from(2u32) {
            return None;
        }

        let byte_len = ((modulus.bits() + 7) / 8) as usize;
        let raw = BigUint::from_bytes_be(&random_bytes(byte_len));
        let private_key = raw % (&modulus - BigUint::from(2u32)) + BigUint::from(1u32);
        let public_key = generator.modpow(&private_key, &modulus);

        Some(Self {
            modulus,
            private_key,
            public_key,
        })
    }

    /// Creates an exchange from optional btwoc-encoded wire parameters,
    /// falling back to the protocol defaults when a parameter is absent.
    #[must_use]
    pub fn from_parameters(modulus: Option<&[u8]>, generator: Option<&[u8]>) -> Option<Self> {
        let modulus = modulus.map_or_else(default_modulus, BigUint::from_bytes_be);
        let generator = generator.map_or_else(
            || BigUint::from(DEFAULT_DH_GENERATOR),
            BigUint::from_bytes_be,
        );
        Self::new(modulus, generator)
    }

    /// The public key of this side, btwoc-encoded for the wire.
    #[must_use]
    pub fn public_key_btwoc(&self) -> Vec<u8> {
        btwoc(&self.public_key.to_bytes_be())
    }

    /// Computes the btwoc-encoded shared secret from the peer's
    /// btwoc-encoded public key.
    #[must_use]
    pub fn shared_secret_btwoc(&self, peer_public: &[u8]) -> Vec<u8> {
        let peer = BigUint::from_bytes_be(peer_public);
        let secret = peer.modpow(&self.private_key, &self.modulus);
        btwoc(&secret.to_bytes_be())
    }
}

/// The default modulus as a big integer.
#[must_use]
pub fn default_modulus() -> BigUint {
    BigUint::parse_bytes(DEFAULT_DH_MODULUS_HEX.as_bytes(), 16)
        .expect("default modulus constant is valid hex")
}
