// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application Submitter
//!
//! The seam between the step controller and whatever actually creates the
//! application record. The SDK's HTTP client implements it for remote
//! submission; [`SubmissionService`](super::submission_service::SubmissionService)
//! implements it for in-process use.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::application::{ApplicationSubmission, CreatedApplication};
use crate::domain::validation::ValidationErrors;

#[derive(Debug, Clone, Error)]
pub enum SubmitFailure {
    /// The receiving side rejected individual fields
    #[error("Submission rejected: {} invalid field(s)", .0.len())]
    Validation(ValidationErrors),

    /// The receiving side refused the request as a whole
    #[error("Submission rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response
    #[error("Submission transport failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ApplicationSubmitter: Send + Sync {
    async fn submit(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<CreatedApplication, SubmitFailure>;
}
