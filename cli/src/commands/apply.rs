// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sewas apply` - fill in and submit an application from an answers file
//!
//! The answers file (YAML or JSON) carries the form fields by their payload
//! names and a local path per document slot:
//!
//! ```yaml
//! fields:
//!   fullName: Asha Verma
//!   mobileNumber: "9876543210"
//!   legalAcknowledgment: true
//! documents:
//!   aadhar: ./scans/aadhar.pdf
//!   photo: ./scans/photo.jpg
//! ```
//!
//! Text fields must be quoted when they look like numbers. A bare
//! `mobileNumber: 9876543210` is read as an integer and rejected, since its
//! rendering (`1e3`, `0x1F`, `+91...`) would not match what was typed.
//!
//! The form is walked page by page with the same checks as the web form. The
//! draft is checkpointed after each page, so a failed run can be fixed with
//! `sewas draft set` and re-run. Documents are uploaded through pre-signed URLs
//! before the final submit so the created record already references them.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use sewas_intake_core::application::{StepController, SubmitError, SubmitFailure};
use sewas_intake_core::domain::application::{CreatedApplication, DocumentSlot};
use sewas_intake_core::domain::draft::{DocumentSelection, DraftField, DraftFieldError, FieldValue};
use sewas_intake_core::domain::step::FormStep;
use sewas_intake_core::domain::validation::ValidationErrors;
use sewas_intake_sdk::{ClientError, IntakeClient};

use super::draft::open_store;

#[derive(Args)]
pub struct ApplyCommand {
    /// Answers file (YAML or JSON)
    #[arg(value_name = "FILE")]
    answers: PathBuf,

    /// Intake API base URL (default: http://<host>:<port>)
    #[arg(long, env = "SEWAS_API_URL")]
    api_url: Option<String>,

    /// Bearer token for deployments behind an API gateway
    #[arg(long, env = "SEWAS_API_KEY")]
    api_key: Option<String>,

    /// Draft directory (default: spec.draft.directory)
    #[arg(long, value_name = "DIR")]
    draft_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationAnswers {
    pub fields: BTreeMap<String, serde_yaml::Value>,
    pub documents: BTreeMap<DocumentSlot, PathBuf>,
}

impl ApplicationAnswers {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read answers file {:?}", path))?;
        // JSON is a subset of YAML
        serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse answers file {:?}", path))
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Unsupported value for {field}: {value}")]
    UnsupportedValue { field: String, value: String },

    #[error("{field} must be quoted text, got the number {value}")]
    UnquotedNumber { field: String, value: String },

    #[error(transparent)]
    Field(#[from] DraftFieldError),

    #[error("Cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{slot} was rejected")]
    Document {
        slot: DocumentSlot,
        errors: ValidationErrors,
    },

    #[error("Step {step} is incomplete")]
    Step {
        step: FormStep,
        errors: ValidationErrors,
    },

    #[error("Upload of {slot} failed: {source}")]
    Upload {
        slot: DocumentSlot,
        source: ClientError,
    },

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

impl ApplyError {
    /// Field-keyed messages carried by the error, if any.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ApplyError::Document { errors, .. } | ApplyError::Step { errors, .. } => Some(errors),
            ApplyError::Submit(SubmitError::Invalid(errors))
            | ApplyError::Submit(SubmitError::Failed(SubmitFailure::Validation(errors))) => Some(errors),
            _ => None,
        }
    }
}

/// MIME type of a document, sniffed from its leading bytes. The extension is
/// only consulted when the bytes are unreadable or unrecognised.
pub fn content_type_for(path: &Path) -> &'static str {
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        return kind.mime_type();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn selection_for(path: &Path) -> Result<DocumentSelection, ApplyError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|source| ApplyError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(DocumentSelection {
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content_type: content_type_for(path).to_string(),
        size_bytes: metadata.len(),
        local_path: Some(path.to_path_buf()),
        uploaded_key: None,
    })
}

fn field_value(field: DraftField, value: &serde_yaml::Value) -> Result<FieldValue, ApplyError> {
    let unsupported = || ApplyError::UnsupportedValue {
        field: field.key().to_string(),
        value: format!("{:?}", value),
    };
    match value {
        serde_yaml::Value::Bool(flag) if field.is_flag() => Ok(FieldValue::Flag(*flag)),
        serde_yaml::Value::String(text) if !field.is_flag() => Ok(FieldValue::Text(text.clone())),
        serde_yaml::Value::Number(number) if !field.is_flag() => Err(ApplyError::UnquotedNumber {
            field: field.key().to_string(),
            value: number.to_string(),
        }),
        serde_yaml::Value::Null if !field.is_flag() => Ok(FieldValue::Text(String::new())),
        _ => Err(unsupported()),
    }
}

/// Walks the form to the end and submits it.
pub async fn run_application(
    controller: &mut StepController,
    client: &IntakeClient,
    answers: &ApplicationAnswers,
) -> Result<CreatedApplication, ApplyError> {
    for (name, value) in &answers.fields {
        let field: DraftField = name.parse()?;
        controller.set_field(field, field_value(field, value)?)?;
    }

    for (slot, path) in &answers.documents {
        let selection = selection_for(path).await?;
        controller
            .attach_document(*slot, selection)
            .map_err(|errors| ApplyError::Document { slot: *slot, errors })?;
    }

    while controller.step() < FormStep::Documents {
        let step = controller.step();
        controller
            .next()
            .map_err(|errors| ApplyError::Step { step, errors })?;
    }

    let owner = controller.draft().mobile_number.trim().to_string();
    let pending: Vec<(DocumentSlot, DocumentSelection)> = controller
        .pending_uploads()
        .into_iter()
        .map(|(slot, selection)| (slot, selection.clone()))
        .collect();

    for (slot, selection) in pending {
        let key = client
            .upload_document(&owner, &selection)
            .await
            .map_err(|source| ApplyError::Upload { slot, source })?;
        info!(slot = %slot, key = %key, "Document stored");
        controller.record_upload(slot, key);
    }
    controller.save_progress();

    controller.next().map_err(|errors| ApplyError::Step {
        step: FormStep::Documents,
        errors,
    })?;

    Ok(controller.submit().await?)
}

pub async fn handle_command(
    command: ApplyCommand,
    config_path: Option<PathBuf>,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<()> {
    let answers = ApplicationAnswers::from_file(&command.answers)?;

    let base_url = command.api_url.unwrap_or_else(|| {
        format!("http://{}:{}", host.unwrap_or("127.0.0.1"), port.unwrap_or(3000))
    });
    let mut client = IntakeClient::new(base_url);
    if let Some(key) = command.api_key {
        client = client.with_api_key(key);
    }
    let client = Arc::new(client);

    let store = Arc::new(open_store(config_path, command.draft_dir)?);
    let mut controller = StepController::restore(store, client.clone());

    let result = run_application(&mut controller, &client, &answers).await;

    for notice in controller.take_notices() {
        eprintln!("{}", format!("⚠ Draft {:?}: {}", notice.operation, notice.message).yellow());
    }

    match result {
        Ok(created) => {
            println!("{}", "✓ Application submitted".green());
            println!("  ID: {}", created.id);
            println!("  Created at: {}", created.created_at);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("✗ {}", e).red());
            if let Some(errors) = e.field_errors() {
                for (field, message) in errors.iter() {
                    eprintln!("    {}: {}", field, message);
                }
            }
            eprintln!(
                "{}",
                format!(
                    "Progress saved at step {} ({}%); fix the answers and run again.",
                    controller.step(),
                    controller.step().progress_percent()
                )
                .dimmed()
            );
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("scan.PDF")), "application/pdf");
        assert_eq!(content_type_for(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.png")), "image/png");
        assert_eq!(content_type_for(Path::new("a.gif")), "application/octet-stream");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_content_type_comes_from_file_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("aadhar.pdf");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR").unwrap();
        assert_eq!(content_type_for(&path), "image/png");

        let unknown = dir.path().join("scan.pdf");
        std::fs::write(&unknown, b"plain text").unwrap();
        assert_eq!(content_type_for(&unknown), "application/pdf");
    }

    #[test]
    fn test_answers_accept_json() {
        let answers: ApplicationAnswers = serde_yaml::from_str(
            r#"{"fields": {"mobileNumber": "0123456789", "termsAgreement": true}, "documents": {"panCard": "/tmp/pan.pdf"}}"#,
        )
        .unwrap();
        assert_eq!(
            field_value(DraftField::MobileNumber, &answers.fields["mobileNumber"]).unwrap(),
            FieldValue::Text("0123456789".to_string())
        );
        assert_eq!(
            field_value(DraftField::TermsAgreement, &answers.fields["termsAgreement"]).unwrap(),
            FieldValue::Flag(true)
        );
        assert_eq!(answers.documents[&DocumentSlot::PanCard], PathBuf::from("/tmp/pan.pdf"));
    }

    #[test]
    fn test_text_fields_reject_unquoted_numbers() {
        let answers: ApplicationAnswers =
            serde_yaml::from_str("fields:\n  mobileNumber: 9876543210\n  occupation: 0x1F\n").unwrap();
        match field_value(DraftField::MobileNumber, &answers.fields["mobileNumber"]) {
            Err(ApplyError::UnquotedNumber { field, .. }) => assert_eq!(field, "mobileNumber"),
            other => panic!("expected unquoted number error, got {:?}", other),
        }
        assert!(matches!(
            field_value(DraftField::Occupation, &answers.fields["occupation"]),
            Err(ApplyError::UnquotedNumber { .. })
        ));
    }

    #[test]
    fn test_flag_fields_reject_text() {
        let value = serde_yaml::Value::String("yes".to_string());
        assert!(matches!(
            field_value(DraftField::LegalAcknowledgment, &value),
            Err(ApplyError::UnsupportedValue { .. })
        ));
    }
}
