//! Walkhub API resource types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of testable entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// A single recorded walkthrough
    #[default]
    Walkthrough,
    /// A named collection of walkthroughs
    #[value(name = "walkthrough_set")]
    WalkthroughSet,
}

impl EntityType {
    /// API path segment and wire name
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Walkthrough => "walkthrough",
            EntityType::WalkthroughSet => "walkthrough_set",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "walkthrough" => Ok(EntityType::Walkthrough),
            "walkthrough_set" => Ok(EntityType::WalkthroughSet),
            other => Err(format!(
                "unknown entity type '{}', expected walkthrough or walkthrough_set",
                other
            )),
        }
    }
}

/// An item of the screening queue, owned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Entity UUID; results are submitted against it
    pub uuid: String,

    /// Entity kind
    #[serde(rename = "type", default)]
    pub entity_type: EntityType,

    /// Human readable title (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Inline PHPUnit export; fetched separately when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phpunit: Option<String>,

    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
impl QueueItem {
    /// Create an item with only the identifying fields set
    pub fn new(uuid: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            uuid: uuid.into(),
            entity_type,
            title: None,
            phpunit: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Response of the session connect call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectInfo {
    /// Session id, when the service created one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessid: Option<String>,

    /// Account the request was authenticated as
    pub user: ConnectUser,
}

/// Account details from the connect call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectUser {
    /// Numeric user id (Drupal sends either a number or a string)
    #[serde(default)]
    pub uid: Value,

    /// Account name; absent for anonymous sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConnectUser {
    /// Whether the service treated us as the anonymous user
    pub fn is_anonymous(&self) -> bool {
        match &self.uid {
            Value::Null => true,
            Value::Number(n) => n.as_u64() == Some(0),
            Value::String(s) => s.is_empty() || s == "0",
            _ => false,
        }
    }
}

/// Outcome of one test run, as reported to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// The test ran and every assertion held
    Passed,
    /// The test ran and an assertion failed
    Failed,
    /// The test could not be run to completion
    Error,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Passed => "passed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured screenshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// Identifier, unique within one run (the file name)
    pub name: String,
    /// MIME type
    pub content_type: String,
    /// Image bytes
    pub data: Vec<u8>,
}

#[cfg(test)]
impl Screenshot {
    /// A PNG screenshot
    pub fn png(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: "image/png".to_string(),
            data,
        }
    }
}
