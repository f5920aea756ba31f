//! JSON output formatting

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope for machine-readable output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T> {
    pub data: T,
    pub meta: Metadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Metadata {
    /// Action that produced the data
    pub action: String,

    /// RFC 3339 time the output was produced
    pub timestamp: String,

    /// Client version
    pub version: String,
}

impl<T> JsonOutput<T> {
    pub fn new(action: &str, data: T) -> Self {
        Self {
            data,
            meta: Metadata {
                action: action.to_string(),
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

/// Format data as pretty-printed JSON inside the envelope
pub fn format_json<T: Serialize + ?Sized>(
    action: &str,
    data: &T,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(action, data))
}
