//! Shared harness for the end-to-end tests.
//!
//! Boots the real server on an ephemeral loopback port and talks to it
//! over HTTP. Redirects are never followed so tests can assert on the
//! `Location` of indirect responses.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Client;

use op_server::{Server, ServerConfig};

/// A running provider instance plus an HTTP client for it.
pub struct TestEnv {
    /// Base URL of the running server.
    pub base_url: String,

    /// HTTP client with redirect following disabled.
    pub client: Client,
}

impl TestEnv {
    /// Starts a server on a free port and waits until it answers.
    pub async fn start() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("op_server=debug,op_protocol=debug")
            .try_init();

        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let server = Server::new(ServerConfig::for_testing(port));
        tokio::spawn(async move {
            if let Err(error) = server.run().await {
                tracing::error!(%error, "test server exited");
            }
        });

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(10))
            .build()?;

        let env = Self {
            base_url: format!("http://127.0.0.1:{port}"),
            client,
        };
        env.wait_until_ready().await?;
        Ok(env)
    }

    /// The provider endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}/openid", self.base_url)
    }

    /// The login-form submission URL.
    pub fn login_url(&self) -> String {
        format!("{}/openid/login", self.base_url)
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..50 {
            if self.client.get(self.endpoint()).send().await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready")
    }
}

/// Parses a direct-response key-value body into a map.
pub fn parse_kv(body: &str) -> HashMap<String, String> {
    body.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Extracts the `value` attribute of the form input named `name`.
pub fn form_input_value(html: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{name}\"");
    let tag_start = html.find(&marker)?;
    let tag = &html[tag_start..tag_start + html[tag_start..].find('>')?];

    let value_start = tag.find("value=\"")? + "value=\"".len();
    let value_len = tag[value_start..].find('"')?;
    Some(tag[value_start..value_start + value_len].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_parsing() {
        let fields = parse_kv("ns:http://specs.openid.net/auth/2.0\nis_valid:true\n");
        assert_eq!(fields["is_valid"], "true");
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn form_value_extraction() {
        let html = r#"<input type="hidden" name="challenge" value="abc"><input name="username">"#;
        assert_eq!(form_input_value(html, "challenge").as_deref(), Some("abc"));
        assert_eq!(form_input_value(html, "username"), None);
        assert_eq!(form_input_value(html, "missing"), None);
    }
}
