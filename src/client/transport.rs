//! HTTP transport
//!
//! The [`Transport`] trait is the only place bytes leave the process. The
//! production implementation wraps `reqwest`; tests substitute
//! [`MockTransport`](super::mock::MockTransport).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::multipart::{Form, Part};

use super::request::{ApiRequest, ApiResponse, FormPart, RequestBody};
use crate::error::ApiError;

/// Connect timeout; total request time is bounded by the process supervisor
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Sends signed requests over the wire
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response, whatever its status.
    ///
    /// Only failures to complete the exchange are errors here.
    async fn send(&self, request: ApiRequest) -> std::result::Result<ApiResponse, ApiError>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    http: HttpClient,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new() -> std::result::Result<Self, ApiError> {
        let http = HttpClient::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("walkhub-screening/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self { http })
    }
}

fn multipart_form(parts: Vec<FormPart>) -> std::result::Result<Form, ApiError> {
    let mut form = Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                filename,
                content_type,
                data,
            } => {
                let part = Part::bytes(data)
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| {
                        ApiError::Transport(format!("Invalid content type '{}': {}", content_type, e))
                    })?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> std::result::Result<ApiResponse, ApiError> {
        let mut builder = self.http.request(request.method, &request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)?),
        };

        let response = builder.send().await.map_err(ApiError::from)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(ApiError::from)?.to_vec();

        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_multipart_rejects_bad_content_type() {
        let parts = vec![FormPart::File {
            name: "screenshots[s1]".to_string(),
            filename: "s1.png".to_string(),
            content_type: "not a mime".to_string(),
            data: vec![1, 2, 3],
        }];
        assert!(matches!(
            multipart_form(parts),
            Err(ApiError::Transport(_))
        ));
    }

    #[cfg_attr(not(feature = "http-tests"), ignore)]
    #[tokio::test]
    async fn test_send_returns_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/api/v2/screening_queue")
            .with_status(403)
            .with_body("Access denied")
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let request = ApiRequest::new(
            reqwest::Method::GET,
            format!("{}/api/v2/screening_queue", server.url()),
        );
        let response = transport.send(request).await.unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.text(), "Access denied");
    }
}
