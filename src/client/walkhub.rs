//! Walkhub API operations
//!
//! Request and response shapes for the screening endpoints. Everything
//! here goes through [`Connection`], so it is signed by the active
//! authenticator.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};

use super::models::{ConnectInfo, EntityType, ExecutionStatus, QueueItem, Screenshot};
use super::request::{ApiResponse, FormPart, RequestBody};
use super::Connection;
use crate::error::{ApiError, Result};

const CONNECT_PATH: &str = "/system/connect";
const QUEUE_PATH: &str = "/screening_queue";
const QUEUE_NEXT_PATH: &str = "/screening_queue/next";

const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_ENCODE_SET).to_string()
}

/// A test result on its way to the service
#[derive(Debug, Clone)]
pub struct ResultSubmission {
    pub status: ExecutionStatus,
    /// Test output or failure diagnostic
    pub log: String,
    pub screenshots: Vec<Screenshot>,
}

impl ResultSubmission {
    /// Multipart body keyed to a queue item
    fn into_body(self, uuid: &str) -> RequestBody {
        let mut parts = vec![
            FormPart::Text {
                name: "uuid".to_string(),
                value: uuid.to_string(),
            },
            FormPart::Text {
                name: "status".to_string(),
                value: self.status.as_str().to_string(),
            },
            FormPart::Text {
                name: "log".to_string(),
                value: self.log,
            },
        ];
        parts.extend(self.screenshots.into_iter().map(|shot| FormPart::File {
            name: format!("screenshots[{}]", shot.name),
            filename: shot.name,
            content_type: shot.content_type,
            data: shot.data,
        }));
        RequestBody::Multipart(parts)
    }
}

/// Screening operations of the Walkhub API
#[async_trait]
pub trait WalkhubApi: Send + Sync {
    /// Open a session and report who we are authenticated as
    async fn connect(&self) -> Result<ConnectInfo>;

    /// List the whole screening queue
    async fn list_queue(&self) -> Result<Vec<QueueItem>>;

    /// Take the next queue item, `None` when the queue is empty
    async fn next_queue_item(&self) -> Result<Option<QueueItem>>;

    /// Fetch the PHPUnit export of a walkthrough or walkthrough set
    async fn phpunit_export(&self, entity_type: EntityType, uuid: &str) -> Result<String>;

    /// Record the result of a queue item
    async fn submit_result(&self, uuid: &str, submission: ResultSubmission) -> Result<()>;

    /// Set or clear the flag on a walkthrough or walkthrough set
    async fn set_flag(&self, entity_type: EntityType, uuid: &str, flag: bool) -> Result<()>;
}

/// Interpret the next-item response; several shapes mean "empty"
fn parse_next_item(response: &ApiResponse) -> Result<Option<QueueItem>> {
    if response.status == 204 || response.text().trim().is_empty() {
        return Ok(None);
    }

    let value: Value = response.json()?;
    let item = match value {
        Value::Null | Value::Bool(false) => return Ok(None),
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        Value::Object(ref map) if map.is_empty() => return Ok(None),
        other => other,
    };

    let item: QueueItem = serde_json::from_value(item)
        .map_err(|e| ApiError::InvalidResponse(format!("Malformed queue item: {}", e)))?;
    if item.uuid.trim().is_empty() {
        return Err(ApiError::InvalidResponse("Queue item has an empty uuid".to_string()).into());
    }
    Ok(Some(item))
}

#[async_trait]
impl WalkhubApi for Connection {
    async fn connect(&self) -> Result<ConnectInfo> {
        self.post(CONNECT_PATH, RequestBody::Json(json!({})))
            .await?
            .json()
    }

    async fn list_queue(&self) -> Result<Vec<QueueItem>> {
        let value: Value = self.get_json(QUEUE_PATH).await?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed queue: {}", e)).into())
    }

    async fn next_queue_item(&self) -> Result<Option<QueueItem>> {
        let response = self.get(QUEUE_NEXT_PATH).await?;
        parse_next_item(&response)
    }

    async fn phpunit_export(&self, entity_type: EntityType, uuid: &str) -> Result<String> {
        let path = format!("/{}/{}/phpunit", entity_type.as_str(), segment(uuid));
        let source = self.get(&path).await?.text();
        if source.trim().is_empty() {
            return Err(ApiError::InvalidResponse(format!(
                "Empty PHPUnit export for {} {}",
                entity_type, uuid
            ))
            .into());
        }
        Ok(source)
    }

    async fn submit_result(&self, uuid: &str, submission: ResultSubmission) -> Result<()> {
        let path = format!("{}/{}/result", QUEUE_PATH, segment(uuid));
        self.post(&path, submission.into_body(uuid)).await?;
        Ok(())
    }

    async fn set_flag(&self, entity_type: EntityType, uuid: &str, flag: bool) -> Result<()> {
        let path = format!("/{}/{}/flag", entity_type.as_str(), segment(uuid));
        self.post(&path, RequestBody::Json(json!({ "flag": u8::from(flag) })))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::Anonymous;
    use crate::client::mock::{part_names, text_part};
    use crate::client::{Endpoint, MockTransport};

    fn connection(mock: &Arc<MockTransport>) -> Connection {
        let mut conn = Connection::new(Box::new(Anonymous::new()), mock.clone());
        conn.set_endpoint(Endpoint::api("https://walkhub.example.com"));
        conn
    }

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_parse_next_item_empty_shapes() {
        for (status, body) in [
            (204, ""),
            (200, ""),
            (200, "  \n"),
            (200, "null"),
            (200, "false"),
            (200, "[]"),
            (200, "{}"),
        ] {
            assert!(
                parse_next_item(&response(status, body)).unwrap().is_none(),
                "{} {:?} should be empty",
                status,
                body
            );
        }
    }

    #[test]
    fn test_parse_next_item_object_and_array() {
        let item = parse_next_item(&response(200, r#"{"uuid":"abc123"}"#))
            .unwrap()
            .unwrap();
        assert_eq!(item.uuid, "abc123");

        let item = parse_next_item(&response(
            200,
            r#"[{"uuid":"first","type":"walkthrough_set"},{"uuid":"second"}]"#,
        ))
        .unwrap()
        .unwrap();
        assert_eq!(item.uuid, "first");
        assert_eq!(item.entity_type, EntityType::WalkthroughSet);
    }

    #[test]
    fn test_parse_next_item_malformed() {
        assert!(parse_next_item(&response(200, r#"{"title":"no uuid"}"#)).is_err());
        assert!(parse_next_item(&response(200, "<html>")).is_err());
    }

    #[test]
    fn test_parse_next_item_rejects_empty_uuid() {
        for body in [r#"{"uuid":""}"#, r#"[{"uuid":"  ","type":"walkthrough"}]"#] {
            let err = parse_next_item(&response(200, body)).unwrap_err();
            assert!(
                matches!(err, crate::error::Error::Api(ApiError::InvalidResponse(_))),
                "{body}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_list_queue() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, r#"[{"uuid":"a"},{"uuid":"b","type":"walkthrough_set"}]"#)
            .await;

        let items = connection(&mock).list_queue().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(
            mock.requests().await[0].url,
            "https://walkhub.example.com/api/v2/screening_queue"
        );
    }

    #[tokio::test]
    async fn test_phpunit_export_path() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, "<?php class WalkhubTest {}").await;

        let source = connection(&mock)
            .phpunit_export(EntityType::WalkthroughSet, "abc123")
            .await
            .unwrap();

        assert!(source.contains("WalkhubTest"));
        assert_eq!(
            mock.requests().await[0].url,
            "https://walkhub.example.com/api/v2/walkthrough_set/abc123/phpunit"
        );
    }

    #[tokio::test]
    async fn test_submit_result_body() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, "").await;

        connection(&mock)
            .submit_result(
                "abc123",
                ResultSubmission {
                    status: ExecutionStatus::Passed,
                    log: "OK (1 test)".to_string(),
                    screenshots: vec![Screenshot::png("s1.png", vec![0x89, 0x50])],
                },
            )
            .await
            .unwrap();

        let posts = mock.posts().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(
            posts[0].url,
            "https://walkhub.example.com/api/v2/screening_queue/abc123/result"
        );
        assert_eq!(text_part(&posts[0], "uuid"), Some("abc123"));
        assert_eq!(text_part(&posts[0], "status"), Some("passed"));
        assert_eq!(text_part(&posts[0], "log"), Some("OK (1 test)"));
        assert!(part_names(&posts[0]).contains(&"screenshots[s1.png]".to_string()));
    }

    #[tokio::test]
    async fn test_set_flag() {
        let mock = Arc::new(MockTransport::new());
        mock.respond(200, "{}").await;

        connection(&mock)
            .set_flag(EntityType::Walkthrough, "abc123", true)
            .await
            .unwrap();

        let posts = mock.posts().await;
        assert_eq!(
            posts[0].url,
            "https://walkhub.example.com/api/v2/walkthrough/abc123/flag"
        );
        match &posts[0].body {
            RequestBody::Json(v) => assert_eq!(v, &json!({"flag": 1})),
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_segment_encoding() {
        assert_eq!(segment("abc-123"), "abc-123");
        assert_eq!(segment("../admin"), "..%2Fadmin");
    }
}
