//! walkhub-screening - runs queued Walkhub walkthrough tests and reports the results

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use log::debug;

mod auth;
mod cli;
mod client;
mod config;
mod error;
mod output;
mod queue;

use cli::{Cli, Invocation, Outcome, Router};
use client::HttpTransport;
use error::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(&cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("{} {}", "Error:".red().bold(), err);
            err.exit_code()
        }
    }
}

/// `warn` by default, `debug` for this crate with `--debug`; `RUST_LOG` wins
fn init_logging(debug: bool) {
    let default = if debug {
        concat!("warn,", env!("CARGO_CRATE_NAME"), "=debug")
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

async fn run(cli: &Cli) -> Result<Outcome> {
    // Unknown actions fail before config, transport or credential work
    let router = Router::standard();
    router.validate(&cli.action)?;

    let invocation = Invocation::from_cli(cli)?;
    let transport = Arc::new(HttpTransport::new()?);
    debug!("Dispatching {}", cli.action);
    router.dispatch(&cli.action, &invocation, transport).await
}
