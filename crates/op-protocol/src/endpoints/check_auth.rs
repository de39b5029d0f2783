//! Stateless assertion verification (`openid.mode=check_authentication`).
//!
//! A relying party without a shared association posts the assertion back
//! and asks the provider to verify its own signature. The response nonce
//! is consumed atomically first; whatever else happens, a given assertion
//! verifies at most once.

use axum::http::StatusCode;
use axum::response::Response;
use base64::Engine;
use chrono::Utc;

use crate::error::ProtocolResult;
use crate::message::Message;
use crate::provider::OpenIdProvider;
use crate::OPENID2_NS;

use super::{decode_secret, kv_response};

pub(crate) async fn handle(
    provider: &OpenIdProvider,
    message: &Message,
) -> ProtocolResult<Response> {
    let valid = verify(provider, message).await?;
    if !valid {
        tracing::debug!("check_authentication verification failed");
    }

    let mut response = Message::new();
    response.set("ns", OPENID2_NS);
    response.set("is_valid", if valid { "true" } else { "false" });
    Ok(kv_response(StatusCode::OK, &response))
}

async fn verify(provider: &OpenIdProvider, message: &Message) -> ProtocolResult<bool> {
    let (Some(handle), Some(nonce_id)) =
        (message.get("assoc_handle"), message.get("response_nonce"))
    else {
        return Ok(false);
    };

    // The replay guard: consume the nonce before anything else can fail.
    let Some(nonce) = provider.nonces().get_and_delete(nonce_id).await? else {
        return Ok(false);
    };
    let now = Utc::now();
    if nonce.is_expired(now) {
        return Ok(false);
    }

    let Some(association) = provider.associations().get(handle).await? else {
        return Ok(false);
    };
    if !association.private {
        return Ok(false);
    }
    if association.is_expired(now) {
        provider.associations().delete(handle).await?;
        return Ok(false);
    }

    let (Some(signed), Some(signature)) = (message.get("signed"), message.get("sig")) else {
        return Ok(false);
    };

    // Reconstruct what was signed: the echoed fields with the mode the
    // assertion originally carried.
    let field_order: Vec<String> = signed.split(',').map(str::to_string).collect();
    let mut asserted = message.clone();
    asserted.set("mode", "id_res");
    let (signature_base, _) = asserted.to_kv_form(Some(&field_order));

    let mac_key = decode_secret(&association)?;
    let expected = base64::engine::general_purpose::STANDARD
        .encode(association.algorithm.sign(&mac_key, signature_base.as_bytes()));

    Ok(op_crypto::constant_time_eq(
        expected.as_bytes(),
        signature.as_bytes(),
    ))
}
