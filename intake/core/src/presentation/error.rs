// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP error envelope
//!
//! Every failure leaves the API as `{ "success": false, "message": ... }`,
//! with a field-keyed `errors` map for validation failures. Downstream
//! failures carry a generic message; the detail goes to the log only.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::application::submission_service::SubmissionError;
use crate::application::upload_service::UploadError;
use crate::domain::validation::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: ValidationErrors,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::NotFound(_) => "not_found",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(reason = self.reason(), "Request rejected: {}", self);
        }

        let body = match self {
            ApiError::Validation { message, errors } => json!({
                "success": false,
                "message": message,
                "errors": errors,
            }),
            other => json!({
                "success": false,
                "message": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        metrics::counter!("sewas_requests_rejected_total", "reason" => "malformed_body").increment(1);
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(errors) => ApiError::Validation {
                message: "Validation failed".to_string(),
                errors,
            },
            SubmissionError::MissingSortKey(_)
            | SubmissionError::InvalidIdentifier(_)
            | SubmissionError::InvalidTimestamp(_)
            | SubmissionError::UnknownDocumentSlots(_) => ApiError::BadRequest(err.to_string()),
            SubmissionError::NotFound => ApiError::NotFound(err.to_string()),
            SubmissionError::Repository(_) => ApiError::Internal("Failed to process application".to_string()),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFields(_) => ApiError::BadRequest("Missing required fields".to_string()),
            UploadError::DisallowedContentType(_) => ApiError::BadRequest("File type not allowed".to_string()),
            UploadError::TooLarge { .. } => ApiError::BadRequest("File too large".to_string()),
            UploadError::InvalidOwner(_) => ApiError::BadRequest("Invalid userId".to_string()),
            UploadError::Signer(_) => ApiError::Internal("Failed to generate upload URL".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::object_store::ObjectStoreError;
    use crate::domain::repository::RepositoryError;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(ApiError, StatusCode)> = vec![
            (SubmissionError::MissingSortKey("document update").into(), StatusCode::BAD_REQUEST),
            (SubmissionError::NotFound.into(), StatusCode::NOT_FOUND),
            (
                SubmissionError::Repository(RepositoryError::Database("down".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (UploadError::DisallowedContentType("image/gif".into()).into(), StatusCode::BAD_REQUEST),
            (
                UploadError::Signer(ObjectStoreError::Unavailable("timeout".into())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.status(), status, "{:?}", error);
        }
    }

    #[test]
    fn test_downstream_detail_is_not_exposed() {
        let error: ApiError = SubmissionError::Repository(RepositoryError::Database(
            "password authentication failed for user sewas".into(),
        ))
        .into();
        assert!(!error.to_string().contains("password"));
    }

    #[test]
    fn test_missing_sort_key_message() {
        let error: ApiError = SubmissionError::MissingSortKey("document update").into();
        assert_eq!(error.to_string(), "createdAt is required for document update");
    }
}
