// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod repository_factory;
pub mod step_controller;
pub mod submission_service;
pub mod submitter;
pub mod upload_service;

// Re-export services for convenience
pub use step_controller::{DraftNotice, DraftOperation, StepController, SubmitError};
pub use submission_service::{SubmissionError, SubmissionService};
pub use submitter::{ApplicationSubmitter, SubmitFailure};
pub use upload_service::{IssuedUpload, UploadError, UploadService, UploadUrlRequest};
