//! Association endpoint end-to-end tests.

use base64::Engine;

use integration_tests::{parse_kv, TestEnv};
use op_crypto::{DhExchange, HmacAlgorithm};

const NS: &str = "http://specs.openid.net/auth/2.0";

#[tokio::test]
async fn dh_sha256_association_key_recovery() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;
    let encoder = base64::engine::general_purpose::STANDARD;

    let rp = DhExchange::from_parameters(None, None).expect("default DH group");
    let consumer_public = encoder.encode(rp.public_key_btwoc());

    let response = env
        .client
        .post(env.endpoint())
        .form(&[
            ("openid.ns", NS),
            ("openid.mode", "associate"),
            ("openid.assoc_type", "HMAC-SHA256"),
            ("openid.session_type", "DH-SHA256"),
            ("openid.dh_consumer_public", consumer_public.as_str()),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let fields = parse_kv(&response.text().await?);

    assert_eq!(fields["ns"], NS);
    assert_eq!(fields["assoc_type"], "HMAC-SHA256");
    assert_eq!(fields["session_type"], "DH-SHA256");
    assert!(!fields["assoc_handle"].is_empty());
    assert!(fields["expires_in"].parse::<u64>()? > 0);
    // The key only ever travels masked.
    assert!(!fields.contains_key("mac_key"));

    let server_public = encoder.decode(&fields["dh_server_public"])?;
    let enc_mac_key = encoder.decode(&fields["enc_mac_key"])?;
    let shared_secret = rp.shared_secret_btwoc(&server_public);
    let mac_key = op_crypto::xor_bytes(&HmacAlgorithm::Sha256.digest(&shared_secret), &enc_mac_key);
    assert_eq!(mac_key.len(), 32);
    Ok(())
}

#[tokio::test]
async fn no_encryption_over_plain_http_advertises_fallback() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .post(env.endpoint())
        .form(&[
            ("openid.ns", NS),
            ("openid.mode", "associate"),
            ("openid.assoc_type", "HMAC-SHA256"),
            ("openid.session_type", "no-encryption"),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let fields = parse_kv(&response.text().await?);
    assert_eq!(fields["error_code"], "unsupported-type");
    assert_eq!(fields["session_type"], "DH-SHA256");
    assert_eq!(fields["assoc_type"], "HMAC-SHA256");
    Ok(())
}

#[tokio::test]
async fn unknown_association_type_is_unsupported() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .post(env.endpoint())
        .form(&[
            ("openid.ns", NS),
            ("openid.mode", "associate"),
            ("openid.assoc_type", "HMAC-MD5"),
            ("openid.session_type", "DH-SHA256"),
        ])
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let fields = parse_kv(&response.text().await?);
    assert_eq!(fields["error_code"], "unsupported-type");
    Ok(())
}
