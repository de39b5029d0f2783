//! Assertion flows end-to-end: login form, signed redirects, stateless
//! verification, replay rejection, and realm enforcement.

use std::collections::HashMap;

use integration_tests::{form_input_value, parse_kv, TestEnv};

const NS: &str = "http://specs.openid.net/auth/2.0";
const REALM: &str = "http://rp.example/";
const RETURN_TO: &str = "http://rp.example/here";

/// Sends a checkid request with the standard realm/return_to pair.
async fn start_checkid(
    env: &TestEnv,
    mode: &str,
    extra: &[(&str, &str)],
) -> anyhow::Result<reqwest::Response> {
    let mut params = vec![
        ("openid.ns", NS),
        ("openid.mode", mode),
        ("openid.realm", REALM),
        ("openid.return_to", RETURN_TO),
    ];
    params.extend_from_slice(extra);

    Ok(env.client.get(env.endpoint()).query(&params).send().await?)
}

/// Reads the `Location` header and its decoded query parameters.
fn redirect_target(response: &reqwest::Response) -> (String, HashMap<String, String>) {
    let location = response
        .headers()
        .get("location")
        .expect("redirect should carry Location")
        .to_str()
        .expect("Location should be ASCII")
        .to_string();

    let parsed = url::Url::parse(&location).expect("Location should be a URL");
    let params = parsed
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    (location, params)
}

/// Drives the login form for a pending checkid flow.
async fn submit_login(
    env: &TestEnv,
    login_html: &str,
    fields: &[(&str, &str)],
) -> anyhow::Result<reqwest::Response> {
    let challenge = form_input_value(login_html, "challenge").expect("login form challenge");
    let mut form: Vec<(&str, &str)> = vec![("challenge", challenge.as_str())];
    form.extend_from_slice(fields);

    Ok(env.client.post(env.login_url()).form(&form).send().await?)
}

#[tokio::test]
async fn checkid_setup_presents_login_not_an_assertion() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = start_checkid(&env, "checkid_setup", &[]).await?;
    assert_eq!(response.status(), 200);

    let body = response.text().await?;
    assert!(body.contains("<form"));
    assert!(form_input_value(&body, "challenge").is_some());
    Ok(())
}

#[tokio::test]
async fn positive_assertion_round_trip_with_replay_rejection() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    // 1. checkid_setup parks the flow behind the login form.
    let login_html = start_checkid(&env, "checkid_setup", &[]).await?.text().await?;

    // 2. Logging in resumes the engine into a signed 302.
    let response = submit_login(&env, &login_html, &[("username", "bob@example.com")]).await?;
    assert_eq!(response.status(), 302);

    let (location, assertion) = redirect_target(&response);
    assert!(location.starts_with(&format!("{RETURN_TO}?")));
    assert_eq!(assertion["openid.ns"], NS);
    assert_eq!(assertion["openid.mode"], "id_res");
    assert_eq!(assertion["openid.op_endpoint"], env.endpoint());
    assert_eq!(
        assertion["openid.claimed_id"],
        format!("{}?u=bob%40example.com", env.endpoint())
    );
    assert_eq!(assertion["openid.identity"], assertion["openid.claimed_id"]);
    assert_eq!(assertion["openid.return_to"], RETURN_TO);
    assert!(!assertion["openid.sig"].is_empty());
    assert!(assertion["openid.signed"].contains("response_nonce"));

    // 3. Stateless verification consumes the nonce.
    let mut check: Vec<(String, String)> = assertion
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (key, value) in &mut check {
        if key == "openid.mode" {
            *value = "check_authentication".to_string();
        }
    }

    let verify = env.client.post(env.endpoint()).form(&check).send().await?;
    assert_eq!(verify.status(), 200);
    let fields = parse_kv(&verify.text().await?);
    assert_eq!(fields["is_valid"], "true");

    // 4. Replaying the same assertion must fail.
    let replay = env.client.post(env.endpoint()).form(&check).send().await?;
    let fields = parse_kv(&replay.text().await?);
    assert_eq!(fields["is_valid"], "false");
    Ok(())
}

#[tokio::test]
async fn cancelled_login_redirects_with_cancel() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let login_html = start_checkid(&env, "checkid_setup", &[]).await?.text().await?;
    let response = submit_login(&env, &login_html, &[("cancel", "1")]).await?;

    assert_eq!(response.status(), 302);
    let (_, params) = redirect_target(&response);
    assert_eq!(params["openid.mode"], "cancel");
    Ok(())
}

#[tokio::test]
async fn checkid_immediate_needs_setup() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = start_checkid(&env, "checkid_immediate", &[]).await?;
    assert_eq!(response.status(), 302);

    let (_, params) = redirect_target(&response);
    assert_eq!(params["openid.mode"], "setup_needed");
    Ok(())
}

#[tokio::test]
async fn wildcard_realm_is_enforced() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;
    let realm = "http://*.example.com/app";

    // Subdomain return_to: accepted, login form shown.
    let accepted = env
        .client
        .get(env.endpoint())
        .query(&[
            ("openid.ns", NS),
            ("openid.mode", "checkid_setup"),
            ("openid.realm", realm),
            ("openid.return_to", "http://a.example.com/app/cb"),
        ])
        .send()
        .await?;
    assert_eq!(accepted.status(), 200);

    // Apex domain and foreign hosts: indirect error.
    for return_to in ["http://example.com/app/cb", "http://evil.com/app/cb"] {
        let rejected = env
            .client
            .get(env.endpoint())
            .query(&[
                ("openid.ns", NS),
                ("openid.mode", "checkid_setup"),
                ("openid.realm", realm),
                ("openid.return_to", return_to),
            ])
            .send()
            .await?;
        assert_eq!(rejected.status(), 302);
        let (_, params) = redirect_target(&rejected);
        assert_eq!(params["openid.mode"], "error");
    }
    Ok(())
}

#[tokio::test]
async fn ax_fetch_response_preserves_aliases() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let login_html = start_checkid(
        &env,
        "checkid_setup",
        &[
            ("openid.ns.ax2", "http://openid.net/srv/ax/1.0"),
            ("openid.ax2.mode", "fetch_request"),
            ("openid.ax2.type.email", "http://axschema.org/contact/email"),
        ],
    )
    .await?
    .text()
    .await?;
    assert!(login_html.contains("name=\"email\""));

    let response = submit_login(
        &env,
        &login_html,
        &[("username", "bob"), ("email", "bob@example.com")],
    )
    .await?;
    assert_eq!(response.status(), 302);

    let (_, assertion) = redirect_target(&response);
    assert_eq!(assertion["openid.ns.ax2"], "http://openid.net/srv/ax/1.0");
    assert_eq!(assertion["openid.ax2.mode"], "fetch_response");
    assert_eq!(
        assertion["openid.ax2.type.email"],
        "http://axschema.org/contact/email"
    );
    assert_eq!(assertion["openid.ax2.value.email"], "bob@example.com");
    assert!(assertion["openid.signed"].contains("ax2.value.email"));
    Ok(())
}

#[tokio::test]
async fn non_openid_traffic_is_declined() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .post(env.endpoint())
        .form(&[("grant_type", "password")])
        .send()
        .await?;

    assert_eq!(response.status(), 404);
    Ok(())
}
