// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Upload URL Signer - Anti-Corruption Layer for the object store
//!
//! The service never moves document bytes itself. It asks the object store
//! for a short-lived, write-only URL bound to one key and one content type,
//! and the applicant's client transfers the file directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Longest validity the service will ever request for a write URL.
pub const MAX_UPLOAD_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    /// Object key, e.g. `documents/u1/1736930000000-1a2b3c4d.pdf`
    pub key: String,
    /// Content type the upload must be sent with
    pub content_type: String,
    pub expires_in: Duration,
}

/// A signed PUT the client replays to upload exactly one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedUpload {
    pub url: String,
    /// Headers that are part of the signature and must be sent verbatim
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[async_trait]
pub trait UploadUrlSigner: Send + Sync {
    /// Issue a write-capable URL for `request.key` valid for `request.expires_in`
    async fn presign_put(&self, request: &PresignRequest) -> Result<PresignedUpload, ObjectStoreError>;
}

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object store rejected the signing request: {0}")]
    Rejected(String),

    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    #[error("Object store misconfigured: {0}")]
    Configuration(String),
}
