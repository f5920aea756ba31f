//! Walkhub API client

use std::fmt;
use std::sync::Arc;

use log::debug;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::auth::{AuthKind, Authenticator};
use crate::error::{ApiError, ConfigError, Result};

#[cfg(test)]
pub mod mock;
pub mod models;
pub mod request;
pub mod transport;
pub mod walkhub;

#[cfg(test)]
pub use mock::MockTransport;
pub use models::{ConnectInfo, EntityType, ExecutionStatus, QueueItem, Screenshot};
pub use request::{ApiRequest, ApiResponse, FormPart, RequestBody};
pub use transport::{HttpTransport, Transport};
pub use walkhub::{ResultSubmission, WalkhubApi};

/// API path below the site URL
const API_PATH: &str = "/api/v2";

/// Sub-path that OAuth-signed requests are served from
const OAUTH_PATH: &str = "/oauth";

/// Base URL that request paths are appended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// API endpoint for a Walkhub site URL
    pub fn api(walkhub_url: &str) -> Self {
        Self(format!("{}{}", walkhub_url.trim_end_matches('/'), API_PATH))
    }

    /// The OAuth variant of this endpoint
    pub fn oauth(&self) -> Self {
        Self(format!("{}{}", self.0, OAUTH_PATH))
    }

    /// Absolute URL for a request path
    pub fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            self.0.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.0, path)
        } else {
            format!("{}/{}", self.0, path)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated connection to one Walkhub endpoint.
///
/// Owns the active authenticator. Every request is signed by it and then
/// handed to the transport; responses are not cached.
pub struct Connection {
    authenticator: Box<dyn Authenticator>,
    transport: Arc<dyn Transport>,
    endpoint: Option<Endpoint>,
}

impl Connection {
    /// Create a connection around an authenticator
    pub fn new(authenticator: Box<dyn Authenticator>, transport: Arc<dyn Transport>) -> Self {
        Self {
            authenticator,
            transport,
            endpoint: None,
        }
    }

    /// Attach the endpoint to this connection and its authenticator
    pub fn set_endpoint(&mut self, endpoint: Endpoint) {
        self.authenticator.configure(&endpoint);
        self.endpoint = Some(endpoint);
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Scheme of the active authenticator
    pub fn auth_kind(&self) -> AuthKind {
        self.authenticator.kind()
    }

    /// Issue a GET request
    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, RequestBody::Empty).await
    }

    /// Issue a POST request
    pub async fn post(&self, path: &str, body: RequestBody) -> Result<ApiResponse> {
        self.send(Method::POST, path, body).await
    }

    /// GET a path and decode the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path).await?.json()
    }

    /// Sign and send a request.
    ///
    /// Transport failures surface as [`ApiError::Transport`] and non-2xx
    /// responses as [`ApiError::Remote`]; neither is retried here.
    pub async fn send(&self, method: Method, path: &str, body: RequestBody) -> Result<ApiResponse> {
        let endpoint = self.endpoint.as_ref().ok_or(ConfigError::EndpointNotSet)?;
        let request = ApiRequest::new(method, endpoint.url_for(path)).with_body(body);
        let request = self.authenticator.sign(request)?;

        debug!("{} {}", request.method, request.url);
        let response = self.transport.send(request).await?;
        debug!("-> HTTP {} ({} bytes)", response.status, response.body.len());

        if !response.is_success() {
            return Err(ApiError::Remote {
                status: response.status,
                body: response.text(),
            }
            .into());
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Anonymous, Basic};
    use crate::error::Error;

    #[test]
    fn test_endpoint_paths() {
        let endpoint = Endpoint::api("https://walkhub.example.com/");
        assert_eq!(endpoint.as_str(), "https://walkhub.example.com/api/v2");
        assert_eq!(
            endpoint.oauth().as_str(),
            "https://walkhub.example.com/api/v2/oauth"
        );
        assert_eq!(
            endpoint.url_for("/screening_queue"),
            "https://walkhub.example.com/api/v2/screening_queue"
        );
        assert_eq!(
            endpoint.url_for("screening_queue"),
            "https://walkhub.example.com/api/v2/screening_queue"
        );
    }

    #[tokio::test]
    async fn test_request_without_endpoint_fails_before_transport() {
        let mock = Arc::new(MockTransport::new());
        let conn = Connection::new(Box::new(Anonymous::new()), mock.clone());

        let err = conn.get("/screening_queue").await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::EndpointNotSet)));
        assert_eq!(mock.request_count().await, 0);
    }

    #[tokio::test]
    async fn test_every_request_is_signed() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, "[]").await;
        mock.respond(200, "{}").await;

        let mut conn = Connection::new(
            Box::new(Basic::new("robot", "pw").unwrap()),
            mock.clone(),
        );
        conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));

        conn.get("/screening_queue").await.unwrap();
        conn.post("/system/connect", RequestBody::Json(serde_json::json!({})))
            .await
            .unwrap();

        let requests = mock.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(
            requests
                .iter()
                .all(|r| r.header("Authorization").is_some_and(|v| v.starts_with("Basic ")))
        );
        assert_eq!(requests[1].method, Method::POST);
        assert_eq!(
            requests[1].url,
            "https://walkhub.example.com/api/v2/system/connect"
        );
    }

    #[tokio::test]
    async fn test_non_success_is_remote_error_with_body() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(401, "Unauthorized: wrong password").await;

        let mut conn = Connection::new(Box::new(Anonymous::new()), mock.clone());
        conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));

        match conn.get("/screening_queue").await {
            Err(Error::Api(ApiError::Remote { status, body })) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized: wrong password");
            }
            other => panic!("Expected remote error, got {:?}", other.map(|r| r.status)),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_passes_through() {
        let mock = Arc::new(MockTransport::new());
        mock.fail_next(ApiError::Transport("Connection refused".to_string()))
            .await;

        let mut conn = Connection::new(Box::new(Anonymous::new()), mock.clone());
        conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));

        let err = conn.get("/screening_queue").await.unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::Transport(_))));
        // Not retried
        assert_eq!(mock.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_get_json_decodes() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, r#"{"uuid":"abc123","type":"walkthrough"}"#)
            .await;

        let mut conn = Connection::new(Box::new(Anonymous::new()), mock.clone());
        conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));

        let item: QueueItem = conn.get_json("/screening_queue/next").await.unwrap();
        assert_eq!(item.uuid, "abc123");
    }
}
