// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use sewas_intake_core::application::submitter::{ApplicationSubmitter, SubmitFailure};
use sewas_intake_core::application::upload_service::{IssuedUpload, UploadUrlRequest};
use sewas_intake_core::domain::application::{
    ApplicationId, ApplicationSubmission, CreatedApplication, DocumentReferences,
};
use sewas_intake_core::domain::draft::DocumentSelection;
use sewas_intake_core::domain::record::ApplicationView;
use sewas_intake_core::domain::validation::{ValidationErrors, MAX_DOCUMENT_BYTES};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        errors: Option<ValidationErrors>,
    },

    #[error("Object store refused upload with status {0}")]
    UploadRejected(u16),

    #[error("Document is not usable: {0}")]
    Document(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error envelope returned by every intake route.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<ValidationErrors>,
}

#[derive(Debug, Deserialize)]
struct ApplicationEnvelope {
    application: ApplicationView,
}

/// Client for the SEWAS intake API.
pub struct IntakeClient {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl IntakeClient {
    /// Create a new intake client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
            api_key: None,
        }
    }

    /// Set the API key sent as a bearer token (for deployments behind a gateway).
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    /// Create an application record.
    pub async fn create_application(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<CreatedApplication, ClientError> {
        let url = format!("{}/api/inquiry", self.base_url);
        let response = self.authorize(self.client.post(&url).json(submission)).send().await?;
        decode(response).await
    }

    /// Replace the document references of an application.
    pub async fn patch_documents(
        &self,
        id: &ApplicationId,
        created_at: &str,
        documents: &DocumentReferences,
    ) -> Result<(), ClientError> {
        let url = format!("{}/api/inquiry/{}", self.base_url, id);
        let body = json!({ "documents": documents, "createdAt": created_at });
        let response = self.authorize(self.client.put(&url).json(&body)).send().await?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Fetch an application by its id and creation timestamp.
    pub async fn get_application(
        &self,
        id: &ApplicationId,
        created_at: &str,
    ) -> Result<ApplicationView, ClientError> {
        let url = Url::parse_with_params(
            &format!("{}/api/inquiry/{}", self.base_url, id),
            &[("createdAt", created_at)],
        )
        .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        let response = self.authorize(self.client.get(url)).send().await?;
        let envelope: ApplicationEnvelope = decode(response).await?;
        Ok(envelope.application)
    }

    /// Ask the service for a pre-signed upload URL.
    pub async fn request_upload_url(
        &self,
        request: &UploadUrlRequest,
    ) -> Result<IssuedUpload, ClientError> {
        let url = format!("{}/api/upload", self.base_url);
        let response = self.authorize(self.client.post(&url).json(request)).send().await?;
        decode(response).await
    }

    /// PUT the document bytes to a pre-signed URL with the headers it was
    /// signed with. The content type must be the one the URL was issued for.
    pub async fn upload_bytes(
        &self,
        issued: &IssuedUpload,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), ClientError> {
        let mut request = self.client.put(&issued.upload_url).header("Content-Type", content_type);
        for (name, value) in &issued.headers {
            // set above, or by reqwest
            if name.eq_ignore_ascii_case("content-type") || name.eq_ignore_ascii_case("host") {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }
        let response = request.body(bytes).send().await?;

        if !response.status().is_success() {
            return Err(ClientError::UploadRejected(response.status().as_u16()));
        }
        Ok(())
    }

    /// Reads a selected document from disk, obtains an upload URL for it and
    /// transfers it. Returns the object key to store as the document reference.
    pub async fn upload_document(
        &self,
        user_id: &str,
        selection: &DocumentSelection,
    ) -> Result<String, ClientError> {
        let path = selection
            .local_path
            .as_ref()
            .ok_or_else(|| ClientError::Document(format!("{} has no local file", selection.file_name)))?;

        let bytes = tokio::fs::read(path).await?;
        if bytes.len() as u64 > MAX_DOCUMENT_BYTES {
            return Err(ClientError::Document(format!(
                "{} is larger than 5MB",
                selection.file_name
            )));
        }

        let issued = self
            .request_upload_url(&UploadUrlRequest {
                file_name: selection.file_name.clone(),
                file_type: selection.content_type.clone(),
                user_id: user_id.to_string(),
                content_length: Some(bytes.len() as u64),
            })
            .await?;

        self.upload_bytes(&issued, &selection.content_type, bytes).await?;
        tracing::debug!(key = %issued.key, "Document uploaded");
        Ok(issued.key)
    }

    /// Liveness probe.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let envelope = response.json::<ErrorEnvelope>().await.ok();
    let (message, errors) = match envelope {
        Some(envelope) => (
            envelope
                .message
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
            envelope.errors,
        ),
        None => (status.canonical_reason().unwrap_or("error").to_string(), None),
    };

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        errors,
    })
}

#[async_trait]
impl ApplicationSubmitter for IntakeClient {
    async fn submit(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<CreatedApplication, SubmitFailure> {
        match self.create_application(submission).await {
            Ok(created) => Ok(created),
            Err(ClientError::Api {
                status,
                errors: Some(errors),
                ..
            }) if status == StatusCode::BAD_REQUEST.as_u16() && !errors.is_empty() => {
                Err(SubmitFailure::Validation(errors))
            }
            Err(ClientError::Api { status, message, .. }) => {
                Err(SubmitFailure::Rejected { status, message })
            }
            Err(other) => Err(SubmitFailure::Transport(other.to_string())),
        }
    }
}
