//! Anonymous session

use super::{AuthKind, Authenticator};
use crate::client::{ApiRequest, Endpoint};
use crate::error::{ConfigError, Result};

/// Sends requests without credentials
#[derive(Debug, Default)]
pub struct Anonymous {
    endpoint: Option<Endpoint>,
}

impl Anonymous {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Authenticator for Anonymous {
    fn kind(&self) -> AuthKind {
        AuthKind::Anonymous
    }

    fn configure(&mut self, endpoint: &Endpoint) {
        self.endpoint = Some(endpoint.clone());
    }

    fn sign(&self, request: ApiRequest) -> Result<ApiRequest> {
        if self.endpoint.is_none() {
            return Err(ConfigError::EndpointNotSet.into());
        }
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    #[test]
    fn test_sign_is_identity() {
        let mut auth = Anonymous::new();
        auth.configure(&Endpoint::api("https://walkhub.example.com"));

        let request = ApiRequest::new(Method::GET, "https://walkhub.example.com/api/v2/x")
            .with_query("page", "1");
        let signed = auth.sign(request).unwrap();

        assert!(signed.headers.is_empty());
        assert_eq!(signed.query, vec![("page".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_sign_requires_configure() {
        let auth = Anonymous::new();
        let request = ApiRequest::new(Method::GET, "https://walkhub.example.com/api/v2/x");
        assert!(auth.sign(request).is_err());
    }
}
