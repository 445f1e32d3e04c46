// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # SEWAS Intake CLI
//!
//! The `sewas` binary runs the applicant intake API and drives the
//! application form from the terminal.
//!
//! ## Commands
//!
//! - `sewas serve` - Run the intake HTTP API
//! - `sewas apply <answers>` - Fill, upload and submit an application
//! - `sewas draft show|set|clear` - Inspect the saved form draft
//! - `sewas config show|validate|generate` - Configuration management
//! - `sewas update` - Apply database migrations

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use sewas_intake::commands::{self, ApplyCommand, ConfigCommand, DraftCommand, UpdateCommand};
use sewas_intake::server;
use sewas_intake_core::domain::intake_config::IntakeConfigManifest;

/// SEWAS City housing application intake
#[derive(Parser)]
#[command(name = "sewas")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SEWAS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: from configuration, 3000)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// HTTP API host (default: from configuration)
    #[arg(long, global = true, env = "SEWAS_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SEWAS_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the intake HTTP API
    #[command(name = "serve")]
    Serve,

    /// Fill in, upload and submit an application from an answers file
    #[command(name = "apply")]
    Apply {
        #[command(flatten)]
        command: ApplyCommand,
    },

    /// Inspect or edit the saved form draft
    #[command(name = "draft")]
    Draft {
        #[command(subcommand)]
        command: DraftCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Apply database migrations
    #[command(name = "update")]
    Update {
        #[command(flatten)]
        command: UpdateCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logging(&cli)?;

    match cli.command {
        Some(Commands::Serve) => {
            let mut config = IntakeConfigManifest::load_or_default(cli.config)
                .context("Failed to load configuration")?;
            if let Some(port) = cli.port {
                config.spec.server.port = port;
            }
            if let Some(host) = cli.host {
                config.spec.server.bind_address = host;
            }
            server::start_server(config).await
        }
        Some(Commands::Apply { command }) => {
            commands::apply::handle_command(command, cli.config, cli.host.as_deref(), cli.port).await
        }
        Some(Commands::Draft { command }) => commands::draft::handle_command(command, cli.config).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        Some(Commands::Update { command }) => commands::update::execute(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging.
///
/// Level: `RUST_LOG`, then `--log-level`, then the manifest. Format comes from
/// `spec.observability.logging.format` ("json" or "text").
fn init_logging(cli: &Cli) -> Result<()> {
    let logging = IntakeConfigManifest::load_or_default(cli.config.clone())
        .ok()
        .and_then(|config| config.spec.observability)
        .and_then(|observability| observability.logging);

    let level = cli
        .log_level
        .clone()
        .or_else(|| logging.as_ref().map(|l| l.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let json = logging.as_ref().is_some_and(|l| l.format.eq_ignore_ascii_case("json"));

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
