//! OpenID message codec.
//!
//! An OpenID message is a flat mapping from bare parameter names (no
//! `openid.` prefix) to string values. The same mapping travels in three
//! encodings:
//!
//! - direct requests: `application/x-www-form-urlencoded` POST bodies with
//!   `openid.`-prefixed keys
//! - direct responses: key-value form, one `<key>:<value>\n` per line,
//!   keys unprefixed
//! - indirect requests/responses: `openid.*` query parameters on a GET or
//!   redirect URL
//!
//! Extension parameters keep their dotted sub-keys (`ns.ax2`,
//! `ax2.type.email`, ...).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extension::Extension;
use crate::OPENID2_NS;

/// A parsed OpenID message (request or response).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    fields: BTreeMap<String, String>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a direct-request POST body.
    ///
    /// Form-urlencoded bodies are decoded with their `openid.` prefixes
    /// stripped; `text/plain` bodies are read as key-value form. Any other
    /// content type yields an empty message with no recognized namespace,
    /// which the engine declines.
    #[must_use]
    pub fn from_body(body: &str, content_type: Option<&str>) -> Self {
        let media_type = content_type
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .unwrap_or_default();

        match media_type {
            "application/x-www-form-urlencoded" => Self::from_urlencoded(body),
            "text/plain" => Self::from_kv_form(body),
            _ => Self::new(),
        }
    }

    /// Parses the `openid.*` parameters of a query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        Self::from_urlencoded(query)
    }

    /// Parses key-value form: one `<key>:<value>` per line.
    ///
    /// Lines without a colon are ignored; an `openid.` key prefix is
    /// accepted and stripped.
    #[must_use]
    pub fn from_kv_form(body: &str) -> Self {
        let mut fields = BTreeMap::new();
        for line in body.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.strip_prefix("openid.").unwrap_or(key);
            fields.insert(key.to_string(), value.to_string());
        }
        Self { fields }
    }

    fn from_urlencoded(input: &str) -> Self {
        let mut fields = BTreeMap::new();
        for (key, value) in url::form_urlencoded::parse(input.as_bytes()) {
            if let Some(bare) = key.strip_prefix("openid.") {
                fields.insert(bare.to_string(), value.into_owned());
            }
        }
        Self { fields }
    }

    /// Looks up a field by bare name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Sets a field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Whether the message declares the OpenID 2.0 namespace.
    #[must_use]
    pub fn has_namespace(&self) -> bool {
        self.get("ns") == Some(OPENID2_NS)
    }

    /// Iterates over all fields in lexical key order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serializes to key-value form.
    ///
    /// With `order`, exactly those fields are emitted in exactly that
    /// order; a named field missing from the message is emitted with an
    /// empty value. The signing and verification paths both serialize
    /// through here, so they cannot diverge on missing fields. Returns the
    /// body and the list of field names emitted (the `signed` list).
    #[must_use]
    pub fn to_kv_form(&self, order: Option<&[String]>) -> (String, Vec<String>) {
        let mut body = String::new();
        let mut emitted = Vec::new();

        match order {
            Some(names) => {
                for name in names {
                    body.push_str(name);
                    body.push(':');
                    body.push_str(self.get(name).unwrap_or_default());
                    body.push('\n');
                    emitted.push(name.clone());
                }
            }
            None => {
                for (key, value) in &self.fields {
                    body.push_str(key);
                    body.push(':');
                    body.push_str(value);
                    body.push('\n');
                    emitted.push(key.clone());
                }
            }
        }

        (body, emitted)
    }

    /// Builds the indirect-response URL: every field appended to
    /// `return_to` as an `openid.`-prefixed query parameter.
    pub fn to_indirect_url(&self, return_to: &str) -> Result<url::Url, url::ParseError> {
        let mut target = url::Url::parse(return_to)?;
        {
            let mut pairs = target.query_pairs_mut();
            for (key, value) in &self.fields {
                pairs.append_pair(&format!("openid.{key}"), value);
            }
        }
        Ok(target)
    }

    /// Extracts the extension registered under `ns_uri`, if any.
    ///
    /// Finds an alias `a` with `ns.<a> == ns_uri` and collects every
    /// `<a>.`-prefixed field with the prefix stripped.
    #[must_use]
    pub fn extension(&self, ns_uri: &str) -> Option<Extension> {
        let alias = self.fields.iter().find_map(|(key, value)| {
            key.strip_prefix("ns.")
                .filter(|_| value.as_str() == ns_uri)
                .map(str::to_string)
        })?;

        let prefix = format!("{alias}.");
        let fields = self
            .fields
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect();

        Some(Extension { alias, fields })
    }
}
