//! Basic HTTP authentication

use std::fmt;

use base64::{Engine as _, engine::general_purpose};

use super::{AuthKind, Authenticator};
use crate::client::{ApiRequest, Endpoint};
use crate::error::{ConfigError, Result};

/// Drupal user name and password sent with every request
pub struct Basic {
    username: String,
    password: String,
    endpoint: Option<Endpoint>,
}

impl Basic {
    /// Create a basic authenticator; both fields must be non-empty
    pub fn new(username: &str, password: &str) -> Result<Self> {
        if username.is_empty() {
            return Err(ConfigError::EmptyCredential("username").into());
        }
        if password.is_empty() {
            return Err(ConfigError::EmptyCredential("password").into());
        }

        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
            endpoint: None,
        })
    }

    fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(raw))
    }
}

impl fmt::Debug for Basic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Basic")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Authenticator for Basic {
    fn kind(&self) -> AuthKind {
        AuthKind::Basic
    }

    fn configure(&mut self, endpoint: &Endpoint) {
        self.endpoint = Some(endpoint.clone());
    }

    fn sign(&self, request: ApiRequest) -> Result<ApiRequest> {
        if self.endpoint.is_none() {
            return Err(ConfigError::EndpointNotSet.into());
        }
        Ok(request.with_header("Authorization", self.header_value()))
    }
}
