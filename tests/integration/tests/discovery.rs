//! Discovery end-to-end tests.

use integration_tests::TestEnv;

#[tokio::test]
async fn server_xrds_discovery() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .get(env.endpoint())
        .header("Accept", "application/xrds+xml")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/xrds+xml"
    );

    let body = response.text().await?;
    assert!(body.contains("<Type>http://specs.openid.net/auth/2.0/server</Type>"));
    assert!(body.contains("<Type>http://openid.net/srv/ax/1.0</Type>"));
    assert!(body.contains(&format!("<URI>{}</URI>", env.endpoint())));
    Ok(())
}

#[tokio::test]
async fn signon_xrds_discovery() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .get(env.endpoint())
        .query(&[("u", "charlie")])
        .header("Accept", "application/xrds+xml")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body = response.text().await?;
    assert!(body.contains("<Type>http://specs.openid.net/auth/2.0/signon</Type>"));
    assert!(body.contains(&format!("<URI>{}</URI>", env.endpoint())));
    Ok(())
}

#[tokio::test]
async fn html_discovery_carries_provider_links() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .get(env.endpoint())
        .query(&[("u", "charlie")])
        .header("Accept", "text/html")
        .send()
        .await?;

    assert_eq!(response.status(), 200);
    let body = response.text().await?;
    assert!(body.contains(&format!(
        "<link rel=\"openid2.provider\" href=\"{}\">",
        env.endpoint()
    )));
    assert!(body.contains(&format!(
        "<link rel=\"openid2.local_id\" href=\"{}?u=charlie\">",
        env.endpoint()
    )));
    Ok(())
}

#[tokio::test]
async fn unacceptable_representation_is_406() -> anyhow::Result<()> {
    let env = TestEnv::start().await?;

    let response = env
        .client
        .get(env.endpoint())
        .header("Accept", "application/json")
        .send()
        .await?;

    assert_eq!(response.status(), 406);
    Ok(())
}
