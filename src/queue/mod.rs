//! Queue processing
//!
//! Takes one item off the screening queue, runs its test and reports the
//! result. One item per invocation: an external scheduler drains the queue by
//! calling repeatedly, and the service decides which item each call receives.
//!
//! ```text
//! Idle -> Fetching -> Empty
//!                  -> Ready -> Executing -> Succeeded -> Reporting -> Done
//!                                        -> Failed    ->
//! (any) -> Error
//! ```

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use crate::client::{ExecutionStatus, ResultSubmission, WalkhubApi};
use crate::error::{Error, Result};

pub mod executor;
pub mod phpunit;

pub use executor::{ExecutionFailure, ExecutionResult, TestCase, TestExecutor};
pub use phpunit::PhpunitExecutor;

/// Processor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Fetching,
    Empty,
    Ready,
    Executing,
    Succeeded,
    Failed,
    Reporting,
    Done,
    Error,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a processing run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueueOutcome {
    /// Nothing was queued
    Empty,
    /// An item was executed and its result recorded
    Reported {
        uuid: String,
        status: ExecutionStatus,
    },
}

/// Processes a single queue item
pub struct QueueProcessor<'a> {
    api: &'a dyn WalkhubApi,
    executor: &'a dyn TestExecutor,
    state: QueueState,
    history: Vec<QueueState>,
}

impl<'a> QueueProcessor<'a> {
    pub fn new(api: &'a dyn WalkhubApi, executor: &'a dyn TestExecutor) -> Self {
        Self {
            api,
            executor,
            state: QueueState::Idle,
            history: vec![QueueState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> QueueState {
        self.state
    }

    /// Every state visited, in order
    pub fn history(&self) -> &[QueueState] {
        &self.history
    }

    fn transition(&mut self, next: QueueState) {
        debug!("queue: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    fn fail(&mut self, err: Error) -> Error {
        self.transition(QueueState::Error);
        err
    }

    /// Run the workflow once.
    ///
    /// Fetch and export failures are returned as they are (transport, remote
    /// or configuration errors). A test that fails or cannot run is still
    /// reported and is not an error. A failed submission is
    /// [`Error::Reporting`].
    pub async fn run(&mut self) -> Result<QueueOutcome> {
        self.transition(QueueState::Fetching);
        let item = match self.api.next_queue_item().await {
            Ok(Some(item)) => item,
            Ok(None) => {
                self.transition(QueueState::Empty);
                info!("Screening queue is empty");
                return Ok(QueueOutcome::Empty);
            }
            Err(err) => return Err(self.fail(err)),
        };
        self.transition(QueueState::Ready);
        info!("Processing {} {}", item.entity_type, item.uuid);

        let source = match item.phpunit.clone() {
            Some(source) => source,
            None => match self.api.phpunit_export(item.entity_type, &item.uuid).await {
                Ok(source) => source,
                Err(err) => return Err(self.fail(err)),
            },
        };
        let case = TestCase::new(&item, source);

        self.transition(QueueState::Executing);
        let submission = match self.executor.execute(&case).await {
            Ok(result) if result.passed() => {
                self.transition(QueueState::Succeeded);
                ResultSubmission::from(result)
            }
            Ok(result) => {
                self.transition(QueueState::Failed);
                ResultSubmission::from(result)
            }
            Err(failure) => {
                warn!("{}", failure);
                self.transition(QueueState::Failed);
                ResultSubmission::from(failure)
            }
        };
        let status = submission.status;

        self.transition(QueueState::Reporting);
        if let Err(source) = self.api.submit_result(&item.uuid, submission).await {
            return Err(self.fail(Error::Reporting {
                uuid: item.uuid,
                source: Box::new(source),
            }));
        }
        self.transition(QueueState::Done);

        Ok(QueueOutcome::Reported {
            uuid: item.uuid,
            status,
        })
    }
}
