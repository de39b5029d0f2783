//! Attribute Exchange 1.0 fetch extension.
//!
//! A relying party picks an arbitrary namespace alias for AX
//! (`openid.ns.<alias> = http://openid.net/srv/ax/1.0`) and per-attribute
//! aliases (`<alias>.type.<attr> = <type URI>`). The fetch response must
//! echo both alias layers verbatim. The echo is redundant per the
//! extension spec, but widely deployed relying-party libraries key their
//! lookups on it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The Attribute Exchange 1.0 namespace URI.
pub const AX_NS: &str = "http://openid.net/srv/ax/1.0";

/// A namespaced extension extracted from a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    /// The namespace alias the relying party chose.
    pub alias: String,

    /// Extension fields with the `<alias>.` prefix stripped.
    pub fields: BTreeMap<String, String>,
}

impl Extension {
    /// Looks up an extension field by its bare (alias-stripped) key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// An attribute value supplied by the auth handler for a fetch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AxValue {
    /// A single value.
    Single(String),
    /// An ordered list of values, emitted as `count.<attr>` plus
    /// `value.<attr>.<i>` for i in 1..=count.
    List(Vec<String>),
}

/// Builds the fetch-response fields for a fetch request.
///
/// Every attribute type the relying party requested is re-declared under
/// its original alias; a value is attached when the auth handler supplied
/// one for that type URI. Supplied values for types the request did not
/// declare are dropped.
pub(crate) fn fetch_response_fields(
    request: &Extension,
    values: Option<&BTreeMap<String, AxValue>>,
) -> Vec<(String, String)> {
    let alias = &request.alias;
    let mut fields = vec![
        (format!("ns.{alias}"), AX_NS.to_string()),
        (format!("{alias}.mode"), "fetch_response".to_string()),
    ];

    for (key, type_uri) in &request.fields {
        let Some(attr) = key.strip_prefix("type.") else {
            continue;
        };
        fields.push((format!("{alias}.type.{attr}"), type_uri.clone()));

        let Some(value) = values.and_then(|map| map.get(type_uri)) else {
            continue;
        };
        match value {
            AxValue::Single(single) => {
                fields.push((format!("{alias}.value.{attr}"), single.clone()));
            }
            AxValue::List(items) => {
                fields.push((format!("{alias}.count.{attr}"), items.len().to_string()));
                for (index, item) in items.iter().enumerate() {
                    fields.push((format!("{alias}.value.{attr}.{}", index + 1), item.clone()));
                }
            }
        }
    }

    fields
}
