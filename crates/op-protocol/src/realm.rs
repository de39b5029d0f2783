//! Realm and return_to validation.
//!
//! A realm is the URL pattern identifying the relying party. The host may
//! carry a single leading `*.` wildcard. A `return_to` URL is acceptable
//! only when its scheme and port equal the realm's, its path sits at or
//! below the realm path, and its host matches exactly (or, for a wildcard
//! realm, is a subdomain of the realm host).

use thiserror::Error;
use url::Url;

/// Reasons a realm / return_to pair is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RealmError {
    /// The realm did not parse as a URL.
    #[error("realm is not a valid URL: {0}")]
    InvalidRealm(String),

    /// Realms must not carry a fragment.
    #[error("realm must not contain a fragment")]
    FragmentInRealm,

    /// Only web realms are supported.
    #[error("realm scheme must be http or https")]
    UnsupportedScheme,

    /// The return_to URL did not parse.
    #[error("return_to is not a valid URL: {0}")]
    InvalidReturnTo(String),

    /// The return_to URL falls outside the realm.
    #[error("return_to does not match the realm")]
    ReturnToOutsideRealm,
}

/// Validates a realm and, when present, a return_to URL against it.
pub fn validate(realm: &str, return_to: Option<&str>) -> Result<(), RealmError> {
    let (candidate, wildcard) = strip_wildcard(realm);

    let realm_url =
        Url::parse(&candidate).map_err(|error| RealmError::InvalidRealm(error.to_string()))?;
    if realm_url.fragment().is_some() {
        return Err(RealmError::FragmentInRealm);
    }
    if !matches!(realm_url.scheme(), "http" | "https") {
        return Err(RealmError::UnsupportedScheme);
    }

    let Some(return_to) = return_to else {
        return Ok(());
    };
    let return_url =
        Url::parse(return_to).map_err(|error| RealmError::InvalidReturnTo(error.to_string()))?;

    if return_url.scheme() != realm_url.scheme()
        || return_url.port_or_known_default() != realm_url.port_or_known_default()
    {
        return Err(RealmError::ReturnToOutsideRealm);
    }

    let realm_path = realm_url.path();
    let return_path = return_url.path();
    let below_realm = if realm_path.ends_with('/') {
        return_path.starts_with(realm_path)
    } else {
        return_path.starts_with(&format!("{realm_path}/"))
    };
    if return_path != realm_path && !below_realm {
        return Err(RealmError::ReturnToOutsideRealm);
    }

    let realm_host = realm_url.host_str().unwrap_or_default();
    let return_host = return_url.host_str().unwrap_or_default();
    let host_matches = return_host == realm_host
        || (wildcard && return_host.ends_with(&format!(".{realm_host}")));
    if !host_matches {
        return Err(RealmError::ReturnToOutsideRealm);
    }

    Ok(())
}

/// Splits a `*.` host wildcard off the realm, returning the realm with
/// the wildcard removed and whether one was present.
fn strip_wildcard(realm: &str) -> (String, bool) {
    match realm.find("://") {
        Some(index) if realm[index + 3..].starts_with("*.") => {
            let mut stripped = String::with_capacity(realm.len());
            stripped.push_str(&realm[..index + 3]);
            stripped.push_str(&realm[index + 5..]);
            (stripped, true)
        }
        _ => (realm.to_string(), false),
    }
}
