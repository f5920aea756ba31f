//! Test execution capability

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{EntityType, ExecutionStatus, QueueItem, ResultSubmission, Screenshot};

/// A test ready to run
#[derive(Debug, Clone)]
pub struct TestCase {
    pub uuid: String,
    pub entity_type: EntityType,
    pub title: Option<String>,
    /// PHPUnit test source
    pub source: String,
}

impl TestCase {
    pub fn new(item: &QueueItem, source: String) -> Self {
        Self {
            uuid: item.uuid.clone(),
            entity_type: item.entity_type,
            title: item.title.clone(),
            source,
        }
    }
}

/// What a completed test run produced
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub screenshots: Vec<Screenshot>,
    /// Test runner output
    pub log: String,
}

impl ExecutionResult {
    pub fn passed(&self) -> bool {
        self.status == ExecutionStatus::Passed
    }
}

impl From<ExecutionResult> for ResultSubmission {
    fn from(result: ExecutionResult) -> Self {
        Self {
            status: result.status,
            log: result.log,
            screenshots: result.screenshots,
        }
    }
}

/// The test could not be run at all (browser, runner or sandbox failure)
#[derive(Debug, Clone, Error)]
#[error("Test execution failed: {diagnostic}")]
pub struct ExecutionFailure {
    pub diagnostic: String,
}

impl ExecutionFailure {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<ExecutionFailure> for ResultSubmission {
    fn from(failure: ExecutionFailure) -> Self {
        Self {
            status: ExecutionStatus::Error,
            log: failure.diagnostic,
            screenshots: Vec::new(),
        }
    }
}

/// Runs one walkthrough or walkthrough-set test
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn execute(&self, case: &TestCase) -> Result<ExecutionResult, ExecutionFailure>;
}
