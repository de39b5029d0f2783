//! Mode handlers and shared response builders for the protocol endpoint.

pub(crate) mod associate;
pub(crate) mod check_auth;
pub(crate) mod checkid;
pub(crate) mod discovery;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use base64::Engine;

use op_store::Association;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Message;
use crate::OPENID2_NS;

/// Renders a message as a direct key-value-form response.
pub(crate) fn kv_response(status: StatusCode, message: &Message) -> Response {
    let (body, _) = message.to_kv_form(None);
    (status, [(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

/// Direct protocol error: HTTP 400 with an `error` field.
pub(crate) fn direct_error(reason: &str) -> Response {
    let mut body = Message::new();
    body.set("ns", OPENID2_NS);
    body.set("error", reason);
    kv_response(StatusCode::BAD_REQUEST, &body)
}

/// Direct associate error advertising the preferred fallback types.
pub(crate) fn unsupported_type_error(reason: &str) -> Response {
    let mut body = Message::new();
    body.set("ns", OPENID2_NS);
    body.set("error", reason);
    body.set("error_code", "unsupported-type");
    body.set("session_type", "DH-SHA256");
    body.set("assoc_type", "HMAC-SHA256");
    kv_response(StatusCode::BAD_REQUEST, &body)
}

/// Indirect protocol error: redirect to `return_to` with `mode=error`.
///
/// Falls back to a direct 400 when there is no usable web `return_to` to
/// redirect to.
pub(crate) fn indirect_error(return_to: Option<&str>, reason: &str) -> Response {
    let Some(return_to) = return_to.filter(|target| is_web_url(target)) else {
        return direct_error(reason);
    };

    let mut message = Message::new();
    message.set("ns", OPENID2_NS);
    message.set("mode", "error");
    message.set("error", reason);

    match message.to_indirect_url(return_to) {
        Ok(target) => found_redirect(target.as_str()),
        Err(_) => direct_error(reason),
    }
}

/// A 302 Found redirect.
pub(crate) fn found_redirect(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
        (),
    )
        .into_response()
}

/// Whether a string parses as an absolute http or https URL.
pub(crate) fn is_web_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Decodes an association's base64 MAC key.
pub(crate) fn decode_secret(association: &Association) -> ProtocolResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(&association.secret)
        .map_err(|error| {
            ProtocolError::Crypto(format!("association secret is not valid base64: {error}"))
        })
}
