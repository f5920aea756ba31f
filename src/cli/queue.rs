//! `get_queue` and `process_queue`

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use tabled::Tabled;

use crate::cli::{Handler, Invocation, OutputFormat, Outcome};
use crate::client::{Connection, ExecutionStatus, QueueItem, WalkhubApi};
use crate::error::Result;
use crate::output::{self, json};
use crate::queue::{PhpunitExecutor, QueueOutcome, QueueProcessor, TestExecutor};

/// Queue entry for table display
#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "TYPE")]
    entity_type: String,
    #[tabled(rename = "TITLE")]
    title: String,
}

impl From<&QueueItem> for QueueRow {
    fn from(item: &QueueItem) -> Self {
        Self {
            uuid: item.uuid.clone(),
            entity_type: item.entity_type.to_string(),
            title: item.title.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Lists the screening queue
pub struct GetQueueHandler;

#[async_trait]
impl Handler for GetQueueHandler {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome> {
        let items = connection.list_queue().await?;
        debug!("Fetched {} queue item(s)", items.len());

        let out = output::format_list::<QueueItem, QueueRow>(
            "get_queue",
            &items,
            invocation.format,
            "Screening queue is empty.",
        )?;
        println!("{}", out);
        Ok(Outcome::Done)
    }
}

/// Runs the next queued test and reports its result
pub struct ProcessQueueHandler {
    /// Fixed executor; PHPUnit from the invocation's config when unset
    executor: Option<Arc<dyn TestExecutor>>,
}

impl ProcessQueueHandler {
    /// Run tests with PHPUnit as configured for each invocation
    pub fn phpunit() -> Self {
        Self { executor: None }
    }

    pub fn with_executor(executor: Arc<dyn TestExecutor>) -> Self {
        Self {
            executor: Some(executor),
        }
    }

    fn executor(&self, invocation: &Invocation) -> Arc<dyn TestExecutor> {
        match &self.executor {
            Some(executor) => executor.clone(),
            None => Arc::new(PhpunitExecutor::new(invocation.config.executor.clone())),
        }
    }
}

#[async_trait]
impl Handler for ProcessQueueHandler {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome> {
        let spinner = (invocation.format == OutputFormat::Table && std::io::stderr().is_terminal())
            .then(|| spinner("Processing screening queue..."));

        let executor = self.executor(invocation);
        let mut processor = QueueProcessor::new(connection, executor.as_ref());
        let result = processor.run().await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        debug!("Queue states: {:?}", processor.history());

        let outcome = result?;
        println!("{}", render(&outcome, invocation.format)?);
        Ok(outcome_for(&outcome))
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn outcome_for(outcome: &QueueOutcome) -> Outcome {
    match outcome {
        QueueOutcome::Empty => Outcome::NothingToDo,
        QueueOutcome::Reported {
            status: ExecutionStatus::Passed,
            ..
        } => Outcome::Done,
        QueueOutcome::Reported { .. } => Outcome::TestFailed,
    }
}

fn render(outcome: &QueueOutcome, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(json::format_json("process_queue", outcome)?);
    }

    Ok(match outcome {
        QueueOutcome::Empty => "Screening queue is empty.".to_string(),
        QueueOutcome::Reported { uuid, status } => {
            let status = match status {
                ExecutionStatus::Passed => status.as_str().green(),
                ExecutionStatus::Failed => status.as_str().red(),
                ExecutionStatus::Error => status.as_str().yellow(),
            };
            format!("{}: {} (result reported)", uuid, status)
        }
    })
}
