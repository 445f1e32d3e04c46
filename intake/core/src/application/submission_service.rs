// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Submission Service
//!
//! Application service behind the inquiry routes.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Create application records, attach document references, look records up
//! - **Collaborators:**
//!   - Domain: `ApplicationRecord` (mapping + full re-validation)
//!   - Infrastructure: `ApplicationRepository` (PostgreSQL or in-memory)
//!
//! # Flow (create)
//!
//! 1. Re-validate the full payload (the route can be called without the form)
//! 2. Assign a UUID v4 and a millisecond-precision creation timestamp
//! 3. Map the wire payload onto the persisted record
//! 4. Write it and hand back `{id, createdAt}`
//!
//! Records are addressed by id **and** createdAt. Identical payloads submitted
//! twice produce two records; nothing here deduplicates.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::submitter::{ApplicationSubmitter, SubmitFailure};
use crate::domain::application::{
    document_references_from_json, format_timestamp, parse_timestamp, truncate_to_millis,
    ApplicationId, ApplicationSubmission, CreatedApplication,
};
use crate::domain::record::{ApplicationRecord, ApplicationView, RecordKey};
use crate::domain::repository::{ApplicationRepository, RepositoryError};
use crate::domain::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(ValidationErrors),

    #[error("createdAt is required for {0}")]
    MissingSortKey(&'static str),

    #[error("Invalid application id: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid createdAt timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown document slot(s): {}", .0.join(", "))]
    UnknownDocumentSlots(Vec<String>),

    #[error("Application not found")]
    NotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SubmissionError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => SubmissionError::NotFound,
            other => SubmissionError::Repository(other),
        }
    }
}

pub struct SubmissionService {
    repository: Arc<dyn ApplicationRepository>,
}

impl SubmissionService {
    pub fn new(repository: Arc<dyn ApplicationRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<CreatedApplication, SubmissionError> {
        let key = RecordKey {
            id: ApplicationId::new(),
            created_at: truncate_to_millis(Utc::now()),
        };

        let record = ApplicationRecord::from_submission(key, submission).map_err(|errors| {
            metrics::counter!("sewas_requests_rejected_total", "reason" => "validation").increment(1);
            warn!(
                fields = ?errors.fields().collect::<Vec<_>>(),
                "Rejected application payload"
            );
            SubmissionError::Validation(errors)
        })?;

        self.repository.create(&record).await.map_err(|e| {
            error!(application_id = %key.id, "Failed to persist application: {}", e);
            SubmissionError::from(e)
        })?;

        metrics::counter!("sewas_applications_created_total").increment(1);
        info!(
            application_id = %key.id,
            housing_preference = record.housing_preference.as_str(),
            documents = record.documents.len(),
            "Application created"
        );

        Ok(CreatedApplication {
            id: key.id,
            created_at: format_timestamp(&key.created_at),
        })
    }

    /// Replaces the document references of one record. Nothing is read or
    /// written when `created_at` is missing.
    pub async fn patch_documents(
        &self,
        id: &str,
        created_at: Option<&str>,
        documents: &Map<String, Value>,
    ) -> Result<(), SubmissionError> {
        let key = parse_key(id, created_at, "document update")?;

        let references = document_references_from_json(documents).map_err(|unknown| {
            metrics::counter!("sewas_requests_rejected_total", "reason" => "unknown_slot").increment(1);
            warn!(application_id = %key.id, slots = ?unknown, "Rejected unknown document slots");
            SubmissionError::UnknownDocumentSlots(unknown)
        })?;

        self.repository
            .update_documents(&key, &references)
            .await
            .map_err(|e| {
                if !matches!(e, RepositoryError::NotFound(_)) {
                    error!(application_id = %key.id, "Failed to update documents: {}", e);
                }
                SubmissionError::from(e)
            })?;

        metrics::counter!("sewas_documents_patched_total").increment(1);
        info!(
            application_id = %key.id,
            slots = ?references.keys().map(|s| s.as_str()).collect::<Vec<_>>(),
            "Application documents updated"
        );
        Ok(())
    }

    pub async fn get(
        &self,
        id: &str,
        created_at: Option<&str>,
    ) -> Result<ApplicationView, SubmissionError> {
        let key = parse_key(id, created_at, "application lookup")?;
        self.repository
            .find(&key)
            .await?
            .map(|record| record.to_view())
            .ok_or(SubmissionError::NotFound)
    }
}

fn parse_key(
    id: &str,
    created_at: Option<&str>,
    operation: &'static str,
) -> Result<RecordKey, SubmissionError> {
    let created_at = created_at
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(SubmissionError::MissingSortKey(operation))?;

    let id = ApplicationId::from_string(id.trim())
        .map_err(|_| SubmissionError::InvalidIdentifier(id.to_string()))?;
    let created_at = parse_timestamp(created_at)
        .map_err(|_| SubmissionError::InvalidTimestamp(created_at.to_string()))?;

    Ok(RecordKey { id, created_at })
}

#[async_trait]
impl ApplicationSubmitter for SubmissionService {
    async fn submit(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<CreatedApplication, SubmitFailure> {
        self.create(submission.clone()).await.map_err(|e| match e {
            SubmissionError::Validation(errors) => SubmitFailure::Validation(errors),
            other => SubmitFailure::Rejected {
                status: 500,
                message: other.to_string(),
            },
        })
    }
}
