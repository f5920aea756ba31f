//! Error types for the Walkhub screening client

use std::process::ExitCode;

use thiserror::Error;

/// Result type alias for screening operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A test result existed (or a failure diagnostic did) but the service
    /// refused or never received it.
    #[error("Failed to report result for queue item {uuid}: {source}")]
    Reporting {
        uuid: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

/// Error classes operators act on differently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing local configuration, detected before any request
    Configuration,
    /// The service could not be reached
    Transport,
    /// The service answered with a non-success status
    Remote,
    /// A result could not be recorded after execution
    Reporting,
    /// Anything else (local I/O, malformed payloads)
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Configuration,
            Error::Api(ApiError::Transport(_)) => ErrorKind::Transport,
            Error::Api(ApiError::Remote { .. }) => ErrorKind::Remote,
            Error::Api(ApiError::InvalidResponse(_)) => ErrorKind::Internal,
            Error::Reporting { .. } => ErrorKind::Reporting,
            Error::Io(_) | Error::Json(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        self.kind().exit_code()
    }
}

impl ErrorKind {
    /// Numeric exit status for this class of error
    pub fn code(self) -> u8 {
        match self {
            ErrorKind::Configuration => exit::CONFIG,
            ErrorKind::Reporting => exit::REPORTING,
            ErrorKind::Transport | ErrorKind::Remote | ErrorKind::Internal => exit::FAILURE,
        }
    }

    /// Process exit code for this class of error
    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Exit codes shared by every action
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
    pub const CONFIG: u8 = 2;
    pub const NOTHING_TO_DO: u8 = 3;
    pub const TEST_FAILED: u8 = 4;
    pub const REPORTING: u8 = 5;
}

/// API-related errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Walkhub responded with HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status of a remote failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport("Request timed out".to_string())
        } else if err.is_connect() {
            ApiError::Transport("Failed to connect to Walkhub".to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Walkhub URL not configured. Pass -w/--walkhub_url or set walkhub_url in the config file.")]
    MissingWalkhubUrl,

    #[error("{0} must not be empty")]
    EmptyCredential(&'static str),

    #[error("{given} was given without {missing}")]
    IncompleteCredentials {
        given: &'static str,
        missing: &'static str,
    },

    #[error("Unknown action '{0}'. Available actions: {1}")]
    UnknownAction(String, String),

    #[error("Missing argument <{arg}> for '{action}'")]
    MissingArgument {
        action: &'static str,
        arg: &'static str,
    },

    #[error("Invalid argument for '{action}': {message}")]
    InvalidArgument {
        action: &'static str,
        message: String,
    },

    #[error("Endpoint not set before the first request")]
    EndpointNotSet,
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
