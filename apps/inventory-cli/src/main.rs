//! Inventory CLI
//!
//! Runs one inventory store operation per invocation and prints the JSON
//! result on stdout. Credentials come from `INVENTORY_API_*` environment
//! variables.

use clap::Parser;
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::Result;
use inventory_client::{HttpTransport, InventoryClient};
use tracing::info;

mod commands;
mod config;

use commands::Commands;
use config::Config;

#[derive(Parser)]
#[command(name = "inventory-cli")]
#[command(about = "Query and modify the inventory store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();

    let environment = Environment::from_env();
    init_tracing(&environment);

    let config = Config::from_env()?;
    info!(base_url = %config.client.base_url(), "Using inventory store");

    let client = match config.timeout {
        Some(timeout) => {
            InventoryClient::with_transport(config.client, HttpTransport::with_timeout(timeout)?)?
        }
        None => InventoryClient::new(config.client)?,
    };

    let output = commands::run(&client, cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_find_with_options() {
        let cli = Cli::try_parse_from([
            "inventory-cli",
            "find",
            r#"{"category":"tools"}"#,
            "--limit",
            "5",
            "--sort",
            "price:desc,sku",
        ])
        .unwrap();
        match cli.command {
            Commands::Find { query, find } => {
                assert_eq!(query["category"], "tools");
                assert_eq!(find.limit, Some(5));
                assert_eq!(find.sort, vec!["price:desc", "sku"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_invalid_json_argument() {
        let result = Cli::try_parse_from(["inventory-cli", "delete-one", "{sku:"]);
        assert!(result.is_err());
    }
}
