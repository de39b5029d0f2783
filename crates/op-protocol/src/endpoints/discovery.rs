//! Discovery documents for the provider endpoint.
//!
//! A GET on the mount root with no OpenID message is a discovery request.
//! Content negotiation picks between an XRDS document and an HTML page
//! with `openid2.*` link relations; a `u` query parameter switches from
//! OP-wide discovery to user-specific (claimed-identifier) discovery.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::provider::{EndpointRequest, OpenIdProvider};

/// XRDS service type for OP-wide discovery.
const SERVER_TYPE: &str = "http://specs.openid.net/auth/2.0/server";

/// XRDS service type for user-specific discovery.
const SIGNON_TYPE: &str = "http://specs.openid.net/auth/2.0/signon";

/// Advertised extension namespace.
const AX_TYPE: &str = "http://openid.net/srv/ax/1.0";

enum Representation {
    Xrds,
    Html,
}

pub(crate) fn respond(provider: &OpenIdProvider, request: &EndpointRequest) -> Response {
    let identity = request.query.as_deref().and_then(user_param);

    match negotiate(request.accept.as_deref()) {
        Some(Representation::Xrds) => xrds_document(provider, identity.as_deref()),
        Some(Representation::Html) => html_document(provider, identity.as_deref()),
        None => StatusCode::NOT_ACCEPTABLE.into_response(),
    }
}

/// Extracts the `u` query parameter naming the identity being discovered.
fn user_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.into_owned())
}

/// Picks the discovery representation.
///
/// XRDS is the provider's preferred document, so a client that accepts
/// anything (`*/*` or no Accept header) gets XRDS.
fn negotiate(accept: Option<&str>) -> Option<Representation> {
    let Some(accept) = accept else {
        return Some(Representation::Xrds);
    };

    if accept.contains("application/xrds+xml") {
        Some(Representation::Xrds)
    } else if accept.contains("text/html") || accept.contains("application/xhtml+xml") {
        Some(Representation::Html)
    } else if accept.contains("*/*") {
        Some(Representation::Xrds)
    } else {
        None
    }
}

fn xrds_document(provider: &OpenIdProvider, identity: Option<&str>) -> Response {
    let endpoint = &provider.config().endpoint;
    let service_type = if identity.is_some() {
        SIGNON_TYPE
    } else {
        SERVER_TYPE
    };

    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<xrds:XRDS xmlns:xrds="xri://$xrds" xmlns="xri://$xrd*($v*2.0)">
  <XRD>
    <Service priority="0">
      <Type>{service_type}</Type>
      <Type>{AX_TYPE}</Type>
      <URI>{endpoint}</URI>
    </Service>
  </XRD>
</xrds:XRDS>
"#
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xrds+xml")],
        body,
    )
        .into_response()
}

fn html_document(provider: &OpenIdProvider, identity: Option<&str>) -> Response {
    let endpoint = &provider.config().endpoint;
    let local_id = identity
        .map(|user| {
            format!(
                "\n<link rel=\"openid2.local_id\" href=\"{endpoint}?u={}\">",
                urlencoding::encode(user)
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<link rel="openid2.provider" href="{endpoint}">{local_id}
<title>OpenID Provider</title>
</head>
<body>
<p>This is an OpenID Authentication 2.0 provider endpoint.</p>
</body>
</html>
"#
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        body,
    )
        .into_response()
}
