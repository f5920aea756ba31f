//! `status`: test the connection to the walkhub

use async_trait::async_trait;
use colored::Colorize;

use crate::cli::{Handler, Invocation, OutputFormat, Outcome};
use crate::client::{ConnectInfo, Connection, WalkhubApi};
use crate::error::Result;
use crate::output::json;

pub struct StatusHandler;

#[async_trait]
impl Handler for StatusHandler {
    async fn handle(&self, connection: &Connection, invocation: &Invocation) -> Result<Outcome> {
        let info = connection.connect().await?;
        println!("{}", render(&info, connection, invocation.format)?);
        Ok(Outcome::Done)
    }
}

fn render(info: &ConnectInfo, connection: &Connection, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(json::format_json("status", info)?);
    }

    let endpoint = connection
        .endpoint()
        .map(|e| e.to_string())
        .unwrap_or_default();
    let who = match (&info.user.name, info.user.is_anonymous()) {
        (Some(name), false) => format!("Connected as {}", name.bold()),
        _ => "Connected anonymously".to_string(),
    };
    Ok(format!(
        "{} {}\nEndpoint: {}\nAuthentication: {}",
        "✓".green(),
        who,
        endpoint.cyan(),
        connection.auth_kind()
    ))
}
