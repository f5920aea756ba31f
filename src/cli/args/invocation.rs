//! The resolved option set handed to every action handler
//!
//! Built once in `main.rs` after parsing: loads the config file and layers
//! CLI/environment values over it, so handlers never look at raw flags.
//!
//! # Precedence
//!
//! CLI flag > environment variable > config file > default.

use crate::cli::{Cli, OutputFormat};
use crate::client::EntityType;
use crate::config::{Config, Overrides};
use crate::error::{ConfigError, Result};

/// Options and positional arguments for one action
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Merged configuration
    pub config: Config,

    /// Positional arguments following the action name
    pub args: Vec<String>,

    /// Output format
    pub format: OutputFormat,

    /// Entity type for actions that take one as an option
    pub entity_type: EntityType,
}

impl Invocation {
    /// Create an Invocation from a parsed CLI struct, loading the config file
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = Config::load_at(cli.config.as_deref())?;
        config.apply(Overrides {
            walkhub_url: cli.walkhub_url.clone(),
            username: cli.username.clone(),
            password: cli.password.clone(),
            consumer_key: cli.consumer_key.clone(),
            consumer_secret: cli.consumer_secret.clone(),
        });

        Ok(Self {
            config,
            args: cli.args.clone(),
            format: cli.format,
            entity_type: cli.entity_type,
        })
    }

    /// Positional argument `index`, or a configuration error naming it
    pub fn arg(&self, index: usize, action: &'static str, name: &'static str) -> Result<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingArgument { action, arg: name }.into())
    }
}
