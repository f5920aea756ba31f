//! Action routing
//!
//! Maps action names to handlers. Before a handler runs the router resolves
//! the endpoint, picks the single active authenticator and hands the handler
//! a ready [`Connection`]. Unknown actions are rejected before any of that
//! happens; the router itself needs no configuration, so `main` validates the
//! action before loading any.

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};

use crate::auth;
use crate::cli::Invocation;
use crate::client::{Connection, Endpoint, Transport};
use crate::error::{ConfigError, Result, exit};

/// How a successful action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action completed
    Done,
    /// There was nothing to do (empty queue)
    NothingToDo,
    /// A test failed or errored and its result was reported
    TestFailed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(match self {
            Outcome::Done => exit::SUCCESS,
            Outcome::NothingToDo => exit::NOTHING_TO_DO,
            Outcome::TestFailed => exit::TEST_FAILED,
        })
    }
}

/// An action implementation
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome>;
}

/// Explicit action name to handler mapping
#[derive(Default)]
pub struct Router {
    routes: BTreeMap<&'static str, Box<dyn Handler>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Router with every built-in action registered
    pub fn standard() -> Self {
        Self::new()
            .route("status", Box::new(super::status::StatusHandler))
            .route("get_queue", Box::new(super::queue::GetQueueHandler))
            .route("get_phpunit", Box::new(super::phpunit::GetPhpunitHandler))
            .route(
                "process_queue",
                Box::new(super::queue::ProcessQueueHandler::phpunit()),
            )
            .route("flag", Box::new(super::flag::FlagHandler))
    }

    /// Register a handler
    pub fn route(mut self, action: &'static str, handler: Box<dyn Handler>) -> Self {
        self.routes.insert(action, handler);
        self
    }

    /// Registered action names, sorted
    pub fn actions(&self) -> Vec<&'static str> {
        self.routes.keys().copied().collect()
    }

    /// Fail with a configuration error if `action` has no handler
    pub fn validate(&self, action: &str) -> Result<()> {
        if self.routes.contains_key(action) {
            Ok(())
        } else {
            Err(ConfigError::UnknownAction(action.to_string(), self.actions().join(", ")).into())
        }
    }

    /// Build the connection for an invocation.
    ///
    /// All credential checks happen here, before any request is made.
    pub fn connect(
        &self,
        invocation: &Invocation,
        transport: Arc<dyn Transport>,
    ) -> Result<Connection> {
        let endpoint = Endpoint::api(&invocation.config.require_walkhub_url()?);
        let selection = auth::select(&invocation.config.credentials(), endpoint)?;

        if let Some(warning) = &selection.warning {
            warn!("{}", warning);
        }
        debug!("Using {} authentication", selection.authenticator.kind());
        debug!("Endpoint set to: {}", selection.endpoint);

        let mut connection = Connection::new(selection.authenticator, transport);
        connection.set_endpoint(selection.endpoint);
        Ok(connection)
    }

    /// Run one action
    pub async fn dispatch(
        &self,
        action: &str,
        invocation: &Invocation,
        transport: Arc<dyn Transport>,
    ) -> Result<Outcome> {
        self.validate(action)?;
        let handler = &self.routes[action];

        let connection = self.connect(invocation, transport)?;
        handler.handle(&connection, invocation).await
    }
}
