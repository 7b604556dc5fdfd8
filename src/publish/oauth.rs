//! OAuth 1.0a HMAC-SHA1 request signing (RFC 5849).

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode};
use rand::Rng;
use sha1::Sha1;

use crate::error::{AppError, Result};

/// OAuth unreserved characters: A-Z a-z 0-9 - . _ ~
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Environment variables holding the four credential values.
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_API_SECRET_KEY: &str = "API_SECRET_KEY";
pub const ENV_ACCESS_TOKEN: &str = "ACCESS_TOKEN";
pub const ENV_ACCESS_TOKEN_SECRET: &str = "ACCESS_TOKEN_SECRET";

/// User-context OAuth 1.0a credentials.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Read all four values from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup; missing values are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::config(format!("environment variable {name} is not set")))
        };

        Ok(Self {
            consumer_key: get(ENV_API_KEY)?,
            consumer_secret: get(ENV_API_SECRET_KEY)?,
            access_token: get(ENV_ACCESS_TOKEN)?,
            access_token_secret: get(ENV_ACCESS_TOKEN_SECRET)?,
        })
    }
}

/// Percent-encode string per RFC 3986.
pub fn oauth_encode(input: &str) -> String {
    percent_encode(input.as_bytes(), OAUTH_ENCODE_SET).to_string()
}

/// Generate random nonce (32 hex characters).
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}

/// Generate Unix timestamp.
fn generate_timestamp() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
        .to_string()
}

/// Build OAuth signature base string per RFC 5849 Section 3.4.1.
///
/// Format: `HTTP_METHOD&encoded_base_url&encoded_parameters`
pub fn build_signature_base_string(
    method: &str,
    base_url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    // Keys are unique here, so sorting by key is sufficient
    let param_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", oauth_encode(k), oauth_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        oauth_encode(base_url),
        oauth_encode(&param_string)
    )
}

/// Sign a base string with HMAC-SHA1 and return the base64 signature.
pub fn sign_hmac_sha1(consumer_secret: &str, token_secret: &str, base_string: &str) -> String {
    let key = format!(
        "{}&{}",
        oauth_encode(consumer_secret),
        oauth_encode(token_secret)
    );
    // HMAC accepts keys of any length
    let mut mac = match Hmac::<Sha1>::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(base_string.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

/// Build OAuth Authorization header from OAuth params.
fn build_authorization_header(oauth_params: &BTreeMap<String, String>) -> String {
    let header_parts: Vec<String> = oauth_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, oauth_encode(v)))
        .collect();
    format!("OAuth {}", header_parts.join(", "))
}

/// Create the Authorization header with explicit nonce and timestamp.
///
/// `request_params` are query or form parameters that take part in the
/// signature. JSON and multipart bodies are not signed.
pub fn authorization_header_with(
    method: &str,
    base_url: &str,
    request_params: &[(String, String)],
    credentials: &Credentials,
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut oauth_params = BTreeMap::new();
    oauth_params.insert(
        "oauth_consumer_key".to_string(),
        credentials.consumer_key.clone(),
    );
    oauth_params.insert("oauth_nonce".to_string(), nonce.to_string());
    oauth_params.insert(
        "oauth_signature_method".to_string(),
        "HMAC-SHA1".to_string(),
    );
    oauth_params.insert("oauth_timestamp".to_string(), timestamp.to_string());
    oauth_params.insert("oauth_token".to_string(), credentials.access_token.clone());
    oauth_params.insert("oauth_version".to_string(), "1.0".to_string());

    let mut signature_params = oauth_params.clone();
    for (key, value) in request_params {
        signature_params.insert(key.clone(), value.clone());
    }

    let base_string = build_signature_base_string(method, base_url, &signature_params);
    let signature = sign_hmac_sha1(
        &credentials.consumer_secret,
        &credentials.access_token_secret,
        &base_string,
    );
    oauth_params.insert("oauth_signature".to_string(), signature);

    build_authorization_header(&oauth_params)
}

/// Create an Authorization header with a fresh nonce and timestamp.
pub fn authorization_header(
    method: &str,
    base_url: &str,
    request_params: &[(String, String)],
    credentials: &Credentials,
) -> String {
    authorization_header_with(
        method,
        base_url,
        request_params,
        credentials,
        &generate_nonce(),
        &generate_timestamp(),
    )
}
