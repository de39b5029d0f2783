//! HTTP routing: adapts axum requests into the engine contract.

use std::collections::BTreeMap;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::{Form, Router};
use serde::Deserialize;

use op_protocol::{AuthResponse, AxValue, EndpointRequest, HandleOutcome};

use crate::state::AppState;
use crate::ui;

/// Maximum accepted request-body size for direct requests.
const BODY_LIMIT: usize = 64 * 1024;

/// AX type URI the built-in login form can supply.
const AX_EMAIL_TYPE: &str = "http://axschema.org/contact/email";

/// Builds the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(&state.config.mount_path, any(openid_endpoint))
        .route(&format!("{}/login", state.config.mount_path), post(login))
        .with_state(state)
}

/// The provider endpoint: every method, every mode.
async fn openid_endpoint(State(state): State<AppState>, request: Request) -> Response {
    let endpoint_request = match adapt_request(&state, request).await {
        Ok(adapted) => adapted,
        Err(response) => return response,
    };

    match state.provider.handle(endpoint_request).await {
        Ok(HandleOutcome::Handled(response)) => response,
        // Not OpenID traffic; nothing else is mounted here.
        Ok(HandleOutcome::Declined) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => {
            tracing::error!(%error, "provider engine failure");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}

/// Converts an axum request into the engine's transport-neutral form.
async fn adapt_request(state: &AppState, request: Request) -> Result<EndpointRequest, Response> {
    let (parts, body) = request.into_parts();

    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response())?;

    Ok(EndpointRequest {
        method: parts.method,
        // The route matches the mount root exactly.
        path: "/".to_string(),
        query: parts.uri.query().map(str::to_string),
        content_type: header_value(&parts.headers, header::CONTENT_TYPE),
        accept: header_value(&parts.headers, header::ACCEPT),
        body: String::from_utf8_lossy(&bytes).into_owned(),
        secure: state.config.public_url.starts_with("https://"),
    })
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Login-form submission.
#[derive(Debug, Deserialize)]
struct LoginForm {
    challenge: String,
    username: Option<String>,
    email: Option<String>,
    cancel: Option<String>,
}

/// Resumes a parked checkid flow from the login form.
async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let Some(context) = state.pending.lock().remove(&form.challenge) else {
        return (StatusCode::BAD_REQUEST, "unknown or expired login challenge").into_response();
    };

    if form.cancel.is_some() {
        return resumed(state.provider.reject_auth(context).await);
    }

    let Some(username) = form.username.filter(|name| !name.is_empty()) else {
        // Re-park the context and ask again.
        let wants_email = context.ax.is_some();
        state
            .pending
            .lock()
            .insert(form.challenge.clone(), context);
        let action = format!("{}/login", state.config.mount_path);
        return axum::response::Html(ui::login_page(&action, &form.challenge, wants_email))
            .into_response();
    };

    let ax = context.ax.as_ref().map(|_| {
        let mut values = BTreeMap::new();
        if let Some(email) = form.email.filter(|value| !value.is_empty()) {
            values.insert(AX_EMAIL_TYPE.to_string(), AxValue::Single(email));
        }
        values
    });

    resumed(
        state
            .provider
            .complete_auth(AuthResponse {
                context,
                identity: username,
                ax,
            })
            .await,
    )
}

fn resumed(result: Result<Response, op_protocol::ProtocolError>) -> Response {
    match result {
        Ok(response) => response,
        Err(error) => {
            tracing::error!(%error, "failed to resume checkid flow");
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()).into_response()
        }
    }
}
