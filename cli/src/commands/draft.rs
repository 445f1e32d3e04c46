// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Draft commands
//!
//! Commands: show, set, clear

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use sewas_intake_core::domain::application::IncomeBracket;
use sewas_intake_core::domain::draft::{ApplicationDraft, DraftField, DraftStore, FieldValue};
use sewas_intake_core::domain::intake_config::IntakeConfigManifest;
use sewas_intake_core::domain::step::FormStep;
use sewas_intake_core::domain::validation::validate_step;
use sewas_intake_core::infrastructure::draft_store::FileDraftStore;

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Show the saved draft and which steps are complete
    Show {
        /// Draft directory (default: spec.draft.directory)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Set one form field, e.g. `sewas draft set mobileNumber 9876543210`
    Set {
        /// Field name as it appears in the form payload
        field: String,

        /// New value ("true"/"false" for consent fields)
        value: String,

        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Discard the saved draft
    Clear {
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

pub async fn handle_command(command: DraftCommand, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        DraftCommand::Show { dir } => show(&open_store(config_path, dir)?),
        DraftCommand::Set { field, value, dir } => set(&open_store(config_path, dir)?, &field, &value),
        DraftCommand::Clear { dir } => {
            let store = open_store(config_path, dir)?;
            store.clear().context("Failed to clear draft")?;
            println!("{}", "✓ Draft cleared".green());
            Ok(())
        }
    }
}

/// File draft store in `dir`, or in the configured draft directory.
pub fn open_store(config_path: Option<PathBuf>, dir: Option<PathBuf>) -> Result<FileDraftStore> {
    let dir = match dir {
        Some(dir) => dir,
        None => IntakeConfigManifest::load_or_default(config_path)
            .context("Failed to load configuration")?
            .spec
            .draft
            .resolve_directory(),
    };
    Ok(FileDraftStore::new(dir))
}

/// Parses a command-line value for `field`.
pub fn field_value(field: DraftField, raw: &str) -> Result<FieldValue> {
    if !field.is_flag() {
        return Ok(FieldValue::Text(raw.to_string()));
    }
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(FieldValue::Flag(true)),
        "false" | "no" | "0" => Ok(FieldValue::Flag(false)),
        other => anyhow::bail!("{} expects true or false, got '{}'", field.key(), other),
    }
}

fn set(store: &FileDraftStore, field: &str, raw: &str) -> Result<()> {
    let field: DraftField = field.parse()?;
    let mut draft = store.load().context("Failed to load draft")?;
    draft.set(field, field_value(field, raw)?)?;
    store.save(&draft).context("Failed to save draft")?;

    println!("{}", format!("✓ {} updated", field.key()).green());
    Ok(())
}

/// Field value as shown by `draft show`. Income buckets get their label.
fn display_value(field: DraftField, value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if s.is_empty() => "(empty)".dimmed().to_string(),
        serde_json::Value::String(s) => match IncomeBracket::from_value(s) {
            Some(bracket) if field == DraftField::MonthlyIncome => format!("{} ({})", s, bracket.label()),
            _ => s.clone(),
        },
        other => other.to_string(),
    }
}

/// Last step of the unbroken run of complete steps from the start.
fn completed_through(draft: &ApplicationDraft) -> Option<FormStep> {
    let mut completed = None;
    let mut step = Some(FormStep::FIRST);
    while let Some(current) = step {
        if !validate_step(current, draft).is_empty() {
            break;
        }
        completed = Some(current);
        step = current.next();
    }
    completed
}

fn show(store: &FileDraftStore) -> Result<()> {
    let draft = store.load().context("Failed to load draft")?;
    if draft == ApplicationDraft::default() {
        println!("{}", format!("No saved draft at {}", store.path().display()).dimmed());
        return Ok(());
    }

    println!("{}", format!("Draft: {}", store.path().display()).bold());
    println!();

    let values = serde_json::to_value(&draft)?;
    for field in DraftField::ALL {
        println!("  {:<20} {}", field.key(), display_value(field, &values[field.key()]));
    }

    println!();
    println!("{}", "Documents:".bold());
    if draft.documents.is_empty() {
        println!("  {}", "(none attached)".dimmed());
    }
    for (slot, selection) in &draft.documents {
        let status = match &selection.uploaded_key {
            Some(key) => format!("uploaded as {}", key).green(),
            None => "must be re-attached".yellow(),
        };
        println!(
            "  {:<12} {} ({}, {} bytes) {}",
            slot.as_str(),
            selection.file_name,
            selection.content_type,
            selection.size_bytes,
            status
        );
    }

    println!();
    let percent = completed_through(&draft).map_or(0, |step| step.progress_percent());
    println!("{}", format!("Steps ({}% complete):", percent).bold());
    let mut step = Some(FormStep::FIRST);
    while let Some(current) = step {
        let errors = validate_step(current, &draft);
        if errors.is_empty() {
            println!("  {} {}", "✓".green(), current);
        } else {
            println!("  {} {}", "✗".red(), current);
            for (field, message) in errors.iter() {
                println!("      {}: {}", field, message);
            }
        }
        step = current.next();
    }

    Ok(())
}
