//! `flag <uuid> <0|1>`

use async_trait::async_trait;
use colored::Colorize;

use crate::cli::{Handler, Invocation, Outcome};
use crate::client::{Connection, WalkhubApi};
use crate::error::{ConfigError, Result};

const ACTION: &str = "flag";

/// Flags or unflags a walkthrough (or, with `--type`, a walkthrough set)
pub struct FlagHandler;

#[async_trait]
impl Handler for FlagHandler {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome> {
        let uuid = invocation.arg(0, ACTION, "uuid")?;
        let flag = parse_flag(invocation.arg(1, ACTION, "value")?)?;

        connection
            .set_flag(invocation.entity_type, uuid, flag)
            .await?;

        let verb = if flag { "Flagged" } else { "Unflagged" };
        println!(
            "{} {} {} {}",
            "✓".green(),
            verb,
            invocation.entity_type,
            uuid.bold()
        );
        Ok(Outcome::Done)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(ConfigError::InvalidArgument {
            action: ACTION,
            message: format!("flag value must be 0 or 1, got '{}'", other),
        }
        .into()),
    }
}
