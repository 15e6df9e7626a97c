//! kvgatectl entry point
//!
//! Runs a single key client operation and prints the result as JSON.

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod commands;

use commands::Command;
use kvgate::telemetry::init_tracing;
use kvgate::{ClientConfig, ErrorMessage, KeyClientError, ResourceScope};

//-----------------------------------------------------------------------------
// Command Definition
//-----------------------------------------------------------------------------

/// Key/value operations against a Consul-style KV store
#[derive(Debug, Parser)]
#[command(name = "kvgatectl", version, about)]
struct Cli {
    /// TOML configuration file; CONSUL_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Datacenter for this invocation
    #[arg(long, global = true)]
    datacenter: Option<String>,

    /// ACL token for this invocation
    #[arg(long, global = true)]
    token: Option<String>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

async fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides();
    debug!(command = ?cli.command, address = %config.address, "running command");

    let scope = ResourceScope {
        datacenter: cli.datacenter,
        token: cli.token,
        ..Default::default()
    };
    let client = config.key_client(&scope)?;

    let outcome = commands::execute(&client, &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    Ok(outcome.exit_code)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(Some(&cli.log_level), Some(cli.json_logs)) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(err) => {
            match err.downcast_ref::<KeyClientError>() {
                Some(client_err) => {
                    let message = ErrorMessage::from_error(client_err);
                    eprintln!(
                        "{}",
                        serde_json::to_string(&message).unwrap_or_else(|_| client_err.to_string())
                    );
                }
                None => eprintln!("Error: {:#}", err),
            }
            process::exit(1);
        }
    }
}
