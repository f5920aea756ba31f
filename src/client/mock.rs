//! Recording transport for testing
//!
//! Replays scripted responses in order and captures every request it is
//! handed, so tests can assert on what would have gone over the wire.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::request::{ApiRequest, ApiResponse, FormPart, RequestBody};
use super::transport::Transport;
use crate::error::ApiError;

/// Mock transport for testing.
///
/// # Example
/// ```ignore
/// let mock = Arc::new(MockTransport::new());
/// mock.respond(200, r#"{"uuid":"abc123"}"#).await;
///
/// let mut conn = Connection::new(Box::new(Anonymous::new()), mock.clone());
/// conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));
/// conn.get("/screening_queue/next").await?;
///
/// assert_eq!(mock.request_count().await, 1);
/// ```
#[derive(Default)]
pub struct MockTransport {
    /// Responses handed out in FIFO order
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, ApiError>>>>,
    /// Every request received
    captured: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body
    pub async fn respond(&self, status: u16, body: &str) {
        self.responses.lock().await.push_back(Ok(ApiResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    /// Queue a transport-level failure
    pub async fn fail_next(&self, error: ApiError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// All captured requests
    pub async fn requests(&self) -> Vec<ApiRequest> {
        self.captured.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.captured.lock().await.len()
    }

    /// Captured POST requests only
    pub async fn posts(&self) -> Vec<ApiRequest> {
        self.captured
            .lock()
            .await
            .iter()
            .filter(|r| r.method == reqwest::Method::POST)
            .cloned()
            .collect()
    }
}

/// Names of multipart fields and files in a captured request
pub fn part_names(request: &ApiRequest) -> Vec<String> {
    match &request.body {
        RequestBody::Multipart(parts) => parts.iter().map(|p| p.name().to_string()).collect(),
        _ => Vec::new(),
    }
}

/// Value of a text field in a captured multipart request
pub fn text_part<'a>(request: &'a ApiRequest, name: &str) -> Option<&'a str> {
    match &request.body {
        RequestBody::Multipart(parts) => parts.iter().find_map(|p| match p {
            FormPart::Text { name: n, value } if n == name => Some(value.as_str()),
            _ => None,
        }),
        _ => None,
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.captured.lock().await.push(request);
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
    }
}
