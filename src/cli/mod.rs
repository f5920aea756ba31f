//! CLI definition and action handlers

use clap::Parser;

pub mod args;
pub mod flag;
pub mod phpunit;
pub mod queue;
pub mod router;
pub mod status;

pub use args::{Invocation, OutputFormat};
pub use router::{Handler, Outcome, Router};

use crate::client::EntityType;

/// Walkhub screening client - runs queued walkthrough tests and reports results
#[derive(Parser, Debug)]
#[command(name = "walkhub-screening")]
#[command(version, about, long_about = None)]
#[command(after_help = "\
Actions:
  status
      Test connection to the walkhub.
  get_queue
      Get the screenshot queue.
  get_phpunit <walkthrough|walkthrough_set> <uuid>
      Get the phpunit export for a walkthrough.
  process_queue
      Gets the first item of the queue and executes the phpunit test, when
      ready posts back the results and the screenshots to the screening.
  flag <uuid> <0|1>
      Flags/unflags a walkthrough or walkthrough set (see --type).

Exit codes: 0 success, 1 failure, 2 configuration error, 3 queue empty,
4 test failed (result reported), 5 result could not be reported.")]
pub struct Cli {
    /// Action to perform
    #[arg(value_name = "ACTION")]
    pub action: String,

    /// Action arguments
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    /// Walkhub url
    #[arg(short = 'w', long = "walkhub_url", env = "WALKHUB_URL", hide_env = true)]
    pub walkhub_url: Option<String>,

    /// Drupal user name
    #[arg(short = 'u', long, env = "WALKHUB_USERNAME", hide_env = true)]
    pub username: Option<String>,

    /// Drupal password
    #[arg(
        short = 'p',
        long,
        env = "WALKHUB_PASSWORD",
        hide_env = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// OAuth Consumer Key
    #[arg(short = 'k', long = "consumer_key", env = "WALKHUB_CONSUMER_KEY", hide_env = true)]
    pub consumer_key: Option<String>,

    /// OAuth Consumer Secret
    #[arg(
        short = 's',
        long = "consumer_secret",
        env = "WALKHUB_CONSUMER_SECRET",
        hide_env = true,
        hide_env_values = true
    )]
    pub consumer_secret: Option<String>,

    /// Debug mode
    #[arg(short = 'd', long, env = "WALKHUB_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Override config file location
    #[arg(long, env = "WALKHUB_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Output format (table, json)
    #[arg(long, default_value = "table", hide_possible_values = true)]
    pub format: OutputFormat,

    /// Entity type for `flag`
    #[arg(long = "type", value_enum, default_value = "walkthrough")]
    pub entity_type: EntityType,
}
