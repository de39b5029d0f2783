//! Login form and the auth handler backing it.
//!
//! The engine transfers control here for every checkid request. The
//! handler parks the context under a random challenge id and renders a
//! minimal login form; submitting the form resumes the engine. This
//! server keeps no login session, so `checkid_immediate` flows resolve
//! straight to `setup_needed`.

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use op_protocol::{AuthContext, AuthHandler, EndpointRequest, OpenIdProvider};

use crate::state::PendingLogins;

/// Auth handler that drives the built-in login form.
pub struct LoginFormHandler {
    pending: PendingLogins,
    login_action: String,
}

impl LoginFormHandler {
    /// Creates a handler posting its form to `login_action`.
    #[must_use]
    pub fn new(pending: PendingLogins, login_action: String) -> Self {
        Self {
            pending,
            login_action,
        }
    }
}

#[async_trait]
impl AuthHandler for LoginFormHandler {
    async fn authenticate(
        &self,
        provider: &OpenIdProvider,
        _request: &EndpointRequest,
        interactive: bool,
        context: AuthContext,
    ) -> Response {
        if !interactive {
            // No session store here, so an immediate flow can never
            // succeed; answer setup_needed right away.
            return match provider.reject_auth(context).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::error!(%error, "failed to reject immediate checkid");
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            };
        }

        let challenge = op_crypto::random_hex(16);
        let wants_email = context
            .ax
            .as_ref()
            .is_some_and(|fetch| fetch.fields.keys().any(|key| key.starts_with("type.")));
        self.pending.lock().insert(challenge.clone(), context);

        Html(login_page(&self.login_action, &challenge, wants_email)).into_response()
    }
}

/// Renders the login form.
pub fn login_page(action: &str, challenge: &str, with_email: bool) -> String {
    let email_field = if with_email {
        "\n<label>Email <input type=\"email\" name=\"email\"></label>"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
<form method="post" action="{action}">
<input type="hidden" name="challenge" value="{challenge}">
<label>Username <input type="text" name="username" autofocus></label>{email_field}
<button type="submit">Sign in</button>
<button type="submit" name="cancel" value="1">Cancel</button>
</form>
</body>
</html>
"#
    )
}
