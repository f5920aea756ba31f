//! `get_phpunit <walkthrough|walkthrough_set> <uuid>`

use async_trait::async_trait;

use crate::cli::{Handler, Invocation, Outcome};
use crate::client::{Connection, EntityType, WalkhubApi};
use crate::error::{ConfigError, Result};

const ACTION: &str = "get_phpunit";

/// Prints the PHPUnit export of a walkthrough or walkthrough set
pub struct GetPhpunitHandler;

#[async_trait]
impl Handler for GetPhpunitHandler {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome> {
        let (entity_type, uuid) = parse_args(invocation)?;
        let source = connection.phpunit_export(entity_type, uuid).await?;

        // Raw source, so it can be redirected into a file
        print!("{}", source);
        if !source.ends_with('\n') {
            println!();
        }
        Ok(Outcome::Done)
    }
}

fn parse_args(invocation: &Invocation) -> Result<(EntityType, &str)> {
    let entity_type = invocation
        .arg(0, ACTION, "type")?
        .parse::<EntityType>()
        .map_err(|message| ConfigError::InvalidArgument {
            action: ACTION,
            message,
        })?;
    let uuid = invocation.arg(1, ACTION, "uuid")?;
    Ok((entity_type, uuid))
}
