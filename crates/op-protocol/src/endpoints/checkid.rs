//! Authentication assertions: `checkid_setup`, `checkid_immediate`, and
//! the `complete_auth` / `reject_auth` resumption paths.

use axum::response::Response;
use chrono::{Duration, Utc};
use base64::Engine;

use op_crypto::HmacAlgorithm;
use op_store::{Association, Nonce};

use crate::context::{AuthContext, AuthResponse};
use crate::error::ProtocolResult;
use crate::extension::{self, AX_NS};
use crate::message::Message;
use crate::provider::{EndpointRequest, OpenIdProvider};
use crate::realm;
use crate::OPENID2_NS;

use super::{decode_secret, direct_error, found_redirect, indirect_error, is_web_url};

/// Assertion fields always present and signed, in canonical order.
const ASSERTION_FIELDS: [&str; 6] = [
    "op_endpoint",
    "claimed_id",
    "identity",
    "return_to",
    "response_nonce",
    "assoc_handle",
];

/// Handles a checkid request: validate, package a context, and transfer
/// control to the auth handler.
pub(crate) async fn handle(
    provider: &OpenIdProvider,
    request: &EndpointRequest,
    message: Message,
    interactive: bool,
) -> ProtocolResult<Response> {
    let return_to = message.get("return_to").map(str::to_string);
    let realm_param = message.get("realm").map(str::to_string);

    if return_to.is_none() && realm_param.is_none() {
        return Ok(indirect_error(
            None,
            "checkid requests need openid.return_to or openid.realm",
        ));
    }

    // With no explicit realm, return_to stands in for it.
    let effective_realm = realm_param.or_else(|| return_to.clone());
    if let Some(realm_value) = &effective_realm {
        if let Err(reason) = realm::validate(realm_value, return_to.as_deref()) {
            tracing::debug!(realm = %realm_value, %reason, "rejected checkid request");
            return Ok(indirect_error(return_to.as_deref(), &reason.to_string()));
        }
    }

    let ax = match message.extension(AX_NS) {
        Some(fetch) => {
            if fetch.field("mode") != Some("fetch_request") {
                return Ok(indirect_error(
                    return_to.as_deref(),
                    "only attribute exchange fetch_request is supported",
                ));
            }
            Some(fetch)
        }
        None => None,
    };

    let context = AuthContext {
        interactive,
        request: message,
        ax,
    };

    Ok(provider
        .auth_handler()
        .authenticate(provider, request, interactive, context)
        .await)
}

/// Assembles, signs, and sends the positive assertion.
pub(crate) async fn complete(
    provider: &OpenIdProvider,
    auth: AuthResponse,
) -> ProtocolResult<Response> {
    let request = &auth.context.request;
    let Some(return_to) = request.get("return_to") else {
        return Ok(direct_error(
            "cannot send an assertion without openid.return_to",
        ));
    };
    if !is_web_url(return_to) {
        return Ok(direct_error("openid.return_to is not a web URL"));
    }

    let endpoint = provider.config().endpoint.clone();
    let local_id = format!("{endpoint}?u={}", urlencoding::encode(&auth.identity));
    let nonce_id = format!(
        "{}{}",
        Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
        op_crypto::random_hex(4)
    );

    let mut response = Message::new();
    response.set("ns", OPENID2_NS);
    response.set("mode", "id_res");
    response.set("op_endpoint", endpoint);
    response.set("claimed_id", local_id.clone());
    response.set("identity", local_id);
    response.set("return_to", return_to);
    response.set("response_nonce", nonce_id.clone());

    let mut signed: Vec<String> = ASSERTION_FIELDS.iter().map(ToString::to_string).collect();
    if let Some(fetch) = &auth.context.ax {
        for (key, value) in extension::fetch_response_fields(fetch, auth.ax.as_ref()) {
            signed.push(key.clone());
            response.set(key, value);
        }
    }

    let association =
        resolve_association(provider, request.get("assoc_handle"), &mut response).await?;
    response.set("assoc_handle", association.handle.clone());

    let mac_key = decode_secret(&association)?;
    let (signature_base, emitted) = response.to_kv_form(Some(&signed));
    let signature = base64::engine::general_purpose::STANDARD
        .encode(association.algorithm.sign(&mac_key, signature_base.as_bytes()));
    response.set("signed", emitted.join(","));
    response.set("sig", signature);

    provider
        .nonces()
        .put(Nonce {
            id: nonce_id,
            expires_at: Utc::now() + Duration::seconds(provider.config().nonce_expiry_secs),
        })
        .await?;

    match response.to_indirect_url(return_to) {
        Ok(target) => Ok(found_redirect(target.as_str())),
        Err(_) => Ok(direct_error("openid.return_to is not a web URL")),
    }
}

/// Sends the negative assertion: `cancel` for interactive flows,
/// `setup_needed` for immediate ones.
pub(crate) fn reject(context: &AuthContext) -> Response {
    let Some(return_to) = context.request.get("return_to") else {
        return direct_error("cannot send a negative assertion without openid.return_to");
    };
    if !is_web_url(return_to) {
        return direct_error("openid.return_to is not a web URL");
    }

    let mut response = Message::new();
    response.set("ns", OPENID2_NS);
    response.set(
        "mode",
        if context.interactive {
            "cancel"
        } else {
            "setup_needed"
        },
    );

    match response.to_indirect_url(return_to) {
        Ok(target) => found_redirect(target.as_str()),
        Err(_) => direct_error("openid.return_to is not a web URL"),
    }
}

/// Picks the association to sign with.
///
/// A valid supplied handle is used as-is. An unknown or expired handle is
/// flagged through `invalidate_handle`, and the provider falls back to a
/// fresh private association that only the later `check_authentication`
/// call will ever use.
async fn resolve_association(
    provider: &OpenIdProvider,
    supplied: Option<&str>,
    response: &mut Message,
) -> ProtocolResult<Association> {
    let now = Utc::now();

    if let Some(handle) = supplied {
        match provider.associations().get(handle).await? {
            Some(association) if !association.is_expired(now) => return Ok(association),
            Some(_) => {
                provider.associations().delete(handle).await?;
                response.set("invalidate_handle", handle);
            }
            None => response.set("invalidate_handle", handle),
        }
    }

    let association = Association::generate(
        HmacAlgorithm::Sha256,
        provider.config().association_expiry_secs,
        true,
    );
    tracing::debug!(handle = %association.handle, "issued private association");
    provider.associations().put(association.clone()).await?;
    Ok(association)
}
