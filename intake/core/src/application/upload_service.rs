// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Upload Request Service
//!
//! Issues short-lived write URLs so the applicant's client can send a
//! document straight to the object store. No document bytes pass through
//! this service.
//!
//! Keys have the shape `documents/<owner>/<unix-millis>-<8 hex>.<ext>`; the
//! millisecond timestamp plus a UUID fragment keeps concurrent uploads from
//! the same owner apart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::object_store::{
    ObjectStoreError, PresignRequest, UploadUrlSigner, MAX_UPLOAD_URL_TTL,
};
use crate::domain::validation::{is_allowed_content_type, MAX_DOCUMENT_BYTES};

/// Prefix every document key lives under.
pub const DOCUMENT_PREFIX: &str = "documents";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub file_type: String,
    pub user_id: String,
    /// Size the client says it will upload. Advisory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedUpload {
    pub upload_url: String,
    pub key: String,
    /// Seconds the URL stays valid
    pub expires_in: u64,
    /// Signed headers the PUT must carry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("File type not allowed: {0}")]
    DisallowedContentType(String),

    #[error("File too large: {declared} bytes declared, limit is {limit}")]
    TooLarge { declared: u64, limit: u64 },

    #[error("Invalid userId: {0}")]
    InvalidOwner(String),

    #[error("Failed to generate upload URL: {0}")]
    Signer(#[from] ObjectStoreError),
}

pub struct UploadService {
    signer: Arc<dyn UploadUrlSigner>,
    expires_in: Duration,
}

impl UploadService {
    /// `expires_in` is capped at one hour.
    pub fn new(signer: Arc<dyn UploadUrlSigner>, expires_in: Duration) -> Self {
        Self {
            signer,
            expires_in: expires_in.min(MAX_UPLOAD_URL_TTL),
        }
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// `declared_length` is any size hint seen outside the body (e.g. a
    /// Content-Length header); the larger of it and the body's hint is checked.
    pub async fn issue(
        &self,
        request: &UploadUrlRequest,
        declared_length: Option<u64>,
    ) -> Result<IssuedUpload, UploadError> {
        let mut missing = Vec::new();
        if request.file_name.trim().is_empty() {
            missing.push("fileName");
        }
        if request.file_type.trim().is_empty() {
            missing.push("fileType");
        }
        if request.user_id.trim().is_empty() {
            missing.push("userId");
        }
        if !missing.is_empty() {
            metrics::counter!("sewas_requests_rejected_total", "reason" => "missing_fields").increment(1);
            warn!(missing = ?missing, "Upload URL request is missing fields");
            return Err(UploadError::MissingFields(missing));
        }

        let content_type = request.file_type.trim();
        if !is_allowed_content_type(content_type) {
            metrics::counter!("sewas_requests_rejected_total", "reason" => "content_type").increment(1);
            warn!(file_type = content_type, "Upload URL request for disallowed type");
            return Err(UploadError::DisallowedContentType(content_type.to_string()));
        }

        if let Some(declared) = request.content_length.into_iter().chain(declared_length).max() {
            if declared > MAX_DOCUMENT_BYTES {
                metrics::counter!("sewas_requests_rejected_total", "reason" => "too_large").increment(1);
                warn!(declared, "Upload URL request exceeds size limit");
                return Err(UploadError::TooLarge {
                    declared,
                    limit: MAX_DOCUMENT_BYTES,
                });
            }
        }

        let owner = sanitize_owner(&request.user_id)?;
        let issued_at = Utc::now();
        let key = object_key(owner, &request.file_name, issued_at, &Uuid::new_v4());

        let presign = PresignRequest {
            key: key.clone(),
            content_type: content_type.to_string(),
            expires_in: self.expires_in,
        };

        let signed = self.signer.presign_put(&presign).await.map_err(|e| {
            error!(key = %key, file_type = content_type, "Upload URL signing failed: {}", e);
            UploadError::from(e)
        })?;

        metrics::counter!("sewas_upload_urls_issued_total").increment(1);
        info!(
            key = %key,
            user_id = owner,
            original_filename = %request.file_name,
            upload_timestamp = issued_at.timestamp_millis(),
            "Issued upload URL"
        );

        Ok(IssuedUpload {
            upload_url: signed.url,
            key,
            expires_in: self.expires_in.as_secs(),
            headers: signed.headers,
        })
    }
}

/// Owner ids become a single path segment of the key.
fn sanitize_owner(user_id: &str) -> Result<&str, UploadError> {
    let owner = user_id.trim();
    let invalid = owner.is_empty()
        || owner == "."
        || owner.contains("..")
        || owner.contains('/')
        || owner.contains('\\')
        || owner.chars().any(char::is_control);
    if invalid {
        metrics::counter!("sewas_requests_rejected_total", "reason" => "invalid_owner").increment(1);
        warn!("Upload URL request with unusable userId");
        return Err(UploadError::InvalidOwner(owner.to_string()));
    }
    Ok(owner)
}

/// Extension taken from the text after the last `.`, lower-cased and reduced
/// to `[a-z0-9]`. Names without one get `bin`.
pub fn file_extension(file_name: &str) -> String {
    let ext: String = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or_default()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if ext.is_empty() {
        "bin".to_string()
    } else {
        ext
    }
}

pub fn object_key(owner: &str, file_name: &str, at: DateTime<Utc>, nonce: &Uuid) -> String {
    let nonce = nonce.simple().to_string();
    format!(
        "{}/{}/{}-{}.{}",
        DOCUMENT_PREFIX,
        owner,
        at.timestamp_millis(),
        &nonce[..8],
        file_extension(file_name)
    )
}
