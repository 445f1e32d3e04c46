// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use sewas_intake_core::domain::intake_config::{
    resolve_secret, IntakeConfigManifest, ObjectStoreKind, RepositoryKind, CONFIG_PATH_ENV,
};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./sewas-config.yaml)
        #[arg(short, long, default_value = "./sewas-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

fn presence(value: Option<&str>) -> colored::ColoredString {
    match (value, resolve_secret(value)) {
        (None, _) => "(not set)".dimmed(),
        (Some(reference), None) => format!("{} (unresolved)", reference).yellow(),
        (Some(reference), Some(_)) if reference.starts_with("env:") => {
            format!("{} (set)", reference).green()
        }
        (Some(_), Some(_)) => "(inline)".green(),
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = IntakeConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./sewas-config.yaml");
        println!("  4. ~/.sewas/config.yaml");
        println!("  5. /etc/sewas/config.yaml");
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Deployment:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!();

    let server = &config.spec.server;
    println!("{}", "Server:".bold());
    println!("  Listen: {}:{}", server.bind_address, server.port);
    if server.cors_allowed_origins.is_empty() {
        println!("  CORS origins: {}", "(none)".dimmed());
    } else {
        println!("  CORS origins: {}", server.cors_allowed_origins.join(", "));
    }
    println!();

    let storage = &config.spec.storage;
    println!("{}", "Storage:".bold());
    match storage.backend {
        RepositoryKind::InMemory => println!("  Backend: in-memory {}", "(not durable)".yellow()),
        RepositoryKind::Postgres => {
            println!("  Backend: postgres");
            println!("  Database URL: {}", presence(storage.database_url.as_deref()));
            println!("  Max connections: {}", storage.max_connections);
        }
    }
    println!();

    let store = &config.spec.object_store;
    println!("{}", "Object store:".bold());
    match store.backend {
        ObjectStoreKind::Mock => println!("  Backend: mock {}", "(upload URLs are not writable)".yellow()),
        ObjectStoreKind::S3 => {
            println!("  Backend: s3");
            println!("  Bucket: {}", store.bucket);
            println!("  Region: {}", store.region);
            if let Some(endpoint) = &store.endpoint {
                println!("  Endpoint: {}", endpoint);
            }
            println!("  Access key id: {}", presence(store.access_key_id.as_deref()));
            println!("  Secret access key: {}", presence(store.secret_access_key.as_deref()));
        }
    }
    println!("  Upload URL TTL: {}s", store.upload_url_ttl().as_secs());
    println!();

    println!("{}", "Draft:".bold());
    println!("  Directory: {}", config.spec.draft.resolve_directory().display());
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = IntakeConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
