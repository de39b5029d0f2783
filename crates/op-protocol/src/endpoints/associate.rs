//! Association establishment (`openid.mode=associate`).
//!
//! Negotiates a shared MAC key with the relying party. The plaintext
//! `no-encryption` session is only permitted on a secure transport; the
//! DH sessions mask the key with the hash of a Diffie–Hellman shared
//! secret. The session hash length must equal the MAC key length, so
//! `DH-SHA1` pairs with `HMAC-SHA1` and `DH-SHA256` with `HMAC-SHA256`.

use axum::http::StatusCode;
use axum::response::Response;
use base64::Engine;
use chrono::{Duration, Utc};

use op_crypto::{DhExchange, HmacAlgorithm};
use op_store::Association;

use crate::error::ProtocolResult;
use crate::message::Message;
use crate::provider::{EndpointRequest, OpenIdProvider};
use crate::OPENID2_NS;

use super::{direct_error, kv_response, unsupported_type_error};

pub(crate) async fn handle(
    provider: &OpenIdProvider,
    request: &EndpointRequest,
    message: &Message,
) -> ProtocolResult<Response> {
    let assoc_type = message.get("assoc_type").unwrap_or_default();
    let session_type = message.get("session_type").unwrap_or_default();

    let Some(algorithm) = HmacAlgorithm::from_assoc_type(assoc_type) else {
        return Ok(unsupported_type_error(&format!(
            "unsupported assoc_type: {assoc_type}"
        )));
    };

    let mut response = Message::new();
    response.set("ns", OPENID2_NS);
    response.set("assoc_type", assoc_type);
    response.set("session_type", session_type);

    let mac_key = op_crypto::generate_mac_key(algorithm);
    let encoder = &base64::engine::general_purpose::STANDARD;

    match session_type {
        "no-encryption" => {
            if !request.secure {
                return Ok(unsupported_type_error(
                    "no-encryption sessions require a secure transport",
                ));
            }
            response.set("mac_key", encoder.encode(&mac_key));
        }
        "DH-SHA1" | "DH-SHA256" => {
            let Some(session_hash) = HmacAlgorithm::from_session_type(session_type) else {
                return Ok(unsupported_type_error("unsupported session_type"));
            };
            if session_hash.mac_key_len() != algorithm.mac_key_len() {
                return Ok(unsupported_type_error(&format!(
                    "session_type {session_type} does not match assoc_type {assoc_type}"
                )));
            }

            let Some(consumer_public) = message.get("dh_consumer_public") else {
                return Ok(direct_error(
                    "dh_consumer_public is required for DH sessions",
                ));
            };
            let Ok(consumer_public) = encoder.decode(consumer_public) else {
                return Ok(direct_error("dh_consumer_public is not valid base64"));
            };

            let modulus = match decode_optional(message, "dh_modulus") {
                Ok(value) => value,
                Err(response) => return Ok(response),
            };
            let generator = match decode_optional(message, "dh_gen") {
                Ok(value) => value,
                Err(response) => return Ok(response),
            };

            let Some(exchange) =
                DhExchange::from_parameters(modulus.as_deref(), generator.as_deref())
            else {
                return Ok(direct_error("unusable Diffie-Hellman parameters"));
            };

            let shared_secret = exchange.shared_secret_btwoc(&consumer_public);
            let mask = session_hash.digest(&shared_secret);
            let enc_mac_key = op_crypto::xor_bytes(&mask, &mac_key);

            response.set("dh_server_public", encoder.encode(exchange.public_key_btwoc()));
            response.set("enc_mac_key", encoder.encode(enc_mac_key));
        }
        other => {
            return Ok(unsupported_type_error(&format!(
                "unsupported session_type: {other}"
            )));
        }
    }

    let association = Association {
        handle: op_crypto::generate_handle(),
        algorithm,
        secret: encoder.encode(&mac_key),
        expires_at: Utc::now() + Duration::seconds(provider.config().association_expiry_secs),
        private: false,
    };

    response.set("assoc_handle", association.handle.clone());
    response.set(
        "expires_in",
        provider.config().association_expiry_secs.to_string(),
    );

    tracing::debug!(
        handle = %association.handle,
        assoc_type,
        session_type,
        "association established"
    );
    provider.associations().put(association).await?;

    Ok(kv_response(StatusCode::OK, &response))
}

/// Decodes an optional base64 DH parameter, turning a decode failure into
/// a direct error response.
fn decode_optional(message: &Message, key: &str) -> Result<Option<Vec<u8>>, Response> {
    match message.get(key) {
        None => Ok(None),
        Some(value) => base64::engine::general_purpose::STANDARD
            .decode(value)
            .map(Some)
            .map_err(|_| direct_error(&format!("{key} is not valid base64"))),
    }
}
