//! 2-legged OAuth request signing
//!
//! OAuth 1.0a signatures (RFC 5849) computed from the consumer credentials
//! alone: there is no user token, so the token secret half of the signing key
//! is empty and no `oauth_token` parameter is sent.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Url;

use super::{AuthKind, Authenticator, SignatureMethod};
use crate::client::{ApiRequest, Endpoint, RequestBody};
use crate::error::{ConfigError, Error, Result};

/// RFC 3986 unreserved characters are the only ones left as-is
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const NONCE_LEN: usize = 32;

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Consumer key and secret used to sign each request
pub struct OAuth {
    consumer_key: String,
    consumer_secret: String,
    signature_method: SignatureMethod,
    endpoint: Option<Endpoint>,
}

impl OAuth {
    /// Create an OAuth authenticator; both fields must be non-empty
    pub fn new(consumer_key: &str, consumer_secret: &str) -> Result<Self> {
        if consumer_key.is_empty() {
            return Err(ConfigError::EmptyCredential("consumer key").into());
        }
        if consumer_secret.is_empty() {
            return Err(ConfigError::EmptyCredential("consumer secret").into());
        }

        Ok(Self {
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            signature_method: SignatureMethod::default(),
            endpoint: None,
        })
    }

    /// Use a different signature algorithm
    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }

    /// Sign with an explicit nonce and timestamp
    pub fn sign_with(&self, request: ApiRequest, nonce: &str, timestamp: i64) -> Result<ApiRequest> {
        if self.endpoint.is_none() {
            return Err(ConfigError::EndpointNotSet.into());
        }

        let mut oauth_params = vec![
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                self.signature_method.as_str().to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let base = self.base_string(&request, &oauth_params)?;
        let signature = self.signature(&base)?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(request.with_header("Authorization", format!("OAuth {}", header)))
    }

    /// Signature base string (RFC 5849 section 3.4.1)
    fn base_string(&self, request: &ApiRequest, oauth_params: &[(String, String)]) -> Result<String> {
        let url = Url::parse(&request.url).map_err(|e| {
            ConfigError::Invalid(format!("Invalid request URL '{}': {}", request.url, e))
        })?;
        let host = url.host_str().ok_or_else(|| {
            ConfigError::Invalid(format!("Request URL '{}' has no host", request.url))
        })?;
        let base_uri = match url.port() {
            Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
            None => format!("{}://{}{}", url.scheme(), host, url.path()),
        };

        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (encode(&k), encode(&v)))
            .collect();
        params.extend(request.query.iter().map(|(k, v)| (encode(k), encode(v))));
        if let RequestBody::Form(fields) = &request.body {
            params.extend(fields.iter().map(|(k, v)| (encode(k), encode(v))));
        }
        params.extend(oauth_params.iter().map(|(k, v)| (encode(k), encode(v))));
        params.sort();

        let normalized = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}&{}&{}",
            request.method.as_str().to_ascii_uppercase(),
            encode(&base_uri),
            encode(&normalized)
        ))
    }

    fn signature(&self, base: &str) -> Result<String> {
        // Empty token secret: 2-legged
        let key = format!("{}&", encode(&self.consumer_secret));
        let digest = match self.signature_method {
            SignatureMethod::HmacSha1 => {
                let mut mac = Hmac::<sha1::Sha1>::new_from_slice(key.as_bytes())
                    .map_err(|e| Error::Other(format!("HMAC key rejected: {}", e)))?;
                mac.update(base.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
            SignatureMethod::HmacSha256 => {
                let mut mac = Hmac::<sha2::Sha256>::new_from_slice(key.as_bytes())
                    .map_err(|e| Error::Other(format!("HMAC key rejected: {}", e)))?;
                mac.update(base.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(general_purpose::STANDARD.encode(digest))
    }
}

fn nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

impl fmt::Debug for OAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("signature_method", &self.signature_method)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Authenticator for OAuth {
    fn kind(&self) -> AuthKind {
        AuthKind::OAuth
    }

    fn configure(&mut self, endpoint: &Endpoint) {
        self.endpoint = Some(endpoint.clone());
    }

    fn sign(&self, request: ApiRequest) -> Result<ApiRequest> {
        self.sign_with(request, &nonce(), chrono::Utc::now().timestamp())
    }
}
