//! Request authentication strategies
//!
//! Exactly one [`Authenticator`] is active per invocation. It is chosen once,
//! up front, from whichever credential pair was supplied:
//!
//! 1. [`Basic`] when a username and password are given
//! 2. [`OAuth`] (2-legged) when a consumer key and secret are given
//! 3. [`Anonymous`] otherwise, with an [`AuthWarning`] for the caller to show
//!
//! A complete higher-priority pair always wins. A half-supplied pair that is
//! not overridden is a configuration error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::client::{ApiRequest, Endpoint};
use crate::error::{ConfigError, Result};

mod anonymous;
mod basic;
mod oauth;

pub use anonymous::Anonymous;
pub use basic::Basic;
pub use oauth::OAuth;

/// Signs outgoing requests for one credential scheme
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Which scheme this is
    fn kind(&self) -> AuthKind;

    /// Bind the authenticator to the endpoint it will sign requests for.
    ///
    /// Must be called before [`sign`](Self::sign).
    fn configure(&mut self, endpoint: &Endpoint);

    /// Attach credentials to a request
    fn sign(&self, request: ApiRequest) -> Result<ApiRequest>;
}

/// Credential scheme of an authenticator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Anonymous,
    Basic,
    OAuth,
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::Anonymous => f.write_str("anonymous"),
            AuthKind::Basic => f.write_str("basic HTTP"),
            AuthKind::OAuth => f.write_str("2-legged OAuth"),
        }
    }
}

/// OAuth signature algorithm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureMethod {
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
}

impl SignatureMethod {
    /// Value of the `oauth_signature_method` parameter
    pub fn as_str(self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
            SignatureMethod::HmacSha256 => "HMAC-SHA256",
        }
    }
}

/// Credential fields exactly as supplied by the user
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub signature_method: SignatureMethod,
}

/// Non-fatal notice produced while choosing an authenticator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthWarning {
    /// One-line summary
    pub message: String,
    /// Flags that would enable authenticated access
    pub hints: Vec<String>,
}

impl AuthWarning {
    fn anonymous_session() -> Self {
        Self {
            message: "Authentication not set, using anonymous session (most endpoints will not work)."
                .to_string(),
            hints: vec![
                "Use the -u and -p flags for basic HTTP authentication.".to_string(),
                "Use the -k and -s flags for 2-legged OAuth authentication.".to_string(),
            ],
        }
    }
}

impl fmt::Display for AuthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for hint in &self.hints {
            write!(f, "\n  {}", hint)?;
        }
        Ok(())
    }
}

/// The chosen authenticator and the endpoint it must be used with
#[derive(Debug)]
pub struct AuthSelection {
    pub authenticator: Box<dyn Authenticator>,
    pub endpoint: Endpoint,
    pub warning: Option<AuthWarning>,
}

/// Which half of a pair is present
fn pair_state(first: &Option<String>, second: &Option<String>) -> (bool, bool) {
    (first.is_some(), second.is_some())
}

/// Choose and construct the single active authenticator.
///
/// `endpoint` is the API base; OAuth rewrites it to the OAuth sub-path.
pub fn select(credentials: &Credentials, endpoint: Endpoint) -> Result<AuthSelection> {
    match pair_state(&credentials.username, &credentials.password) {
        (true, true) => {
            let basic = Basic::new(
                credentials.username.as_deref().unwrap_or_default(),
                credentials.password.as_deref().unwrap_or_default(),
            )?;
            return Ok(AuthSelection {
                authenticator: Box::new(basic),
                endpoint,
                warning: None,
            });
        }
        (true, false) => {
            return Err(ConfigError::IncompleteCredentials {
                given: "username",
                missing: "password",
            }
            .into());
        }
        (false, true) => {
            return Err(ConfigError::IncompleteCredentials {
                given: "password",
                missing: "username",
            }
            .into());
        }
        (false, false) => {}
    }

    match pair_state(&credentials.consumer_key, &credentials.consumer_secret) {
        (true, true) => {
            let oauth = OAuth::new(
                credentials.consumer_key.as_deref().unwrap_or_default(),
                credentials.consumer_secret.as_deref().unwrap_or_default(),
            )?
            .with_signature_method(credentials.signature_method);
            Ok(AuthSelection {
                authenticator: Box::new(oauth),
                endpoint: endpoint.oauth(),
                warning: None,
            })
        }
        (true, false) => Err(ConfigError::IncompleteCredentials {
            given: "consumer key",
            missing: "consumer secret",
        }
        .into()),
        (false, true) => Err(ConfigError::IncompleteCredentials {
            given: "consumer secret",
            missing: "consumer key",
        }
        .into()),
        (false, false) => Ok(AuthSelection {
            authenticator: Box::new(Anonymous::new()),
            endpoint,
            warning: Some(AuthWarning::anonymous_session()),
        }),
    }
}
