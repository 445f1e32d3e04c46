// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! S3 Upload Signer
//!
//! Presigns PUT requests against an S3-compatible bucket through `opendal`.
//! Signing happens locally from the configured credentials; no request
//! reaches the bucket until the client replays the URL.

use async_trait::async_trait;
use opendal::services::S3;
use opendal::Operator;
use tracing::debug;

use crate::domain::object_store::{
    ObjectStoreError, PresignRequest, PresignedUpload, UploadUrlSigner,
};

#[derive(Debug, Clone)]
pub struct S3SignerConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

pub struct OpenDalS3Signer {
    operator: Operator,
    bucket: String,
}

impl OpenDalS3Signer {
    pub fn new(config: S3SignerConfig) -> Result<Self, ObjectStoreError> {
        let mut builder = S3::default()
            .bucket(&config.bucket)
            .region(&config.region)
            .access_key_id(&config.access_key_id)
            .secret_access_key(&config.secret_access_key);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint(endpoint);
        }

        let operator = Operator::new(builder)
            .map_err(|e| ObjectStoreError::Configuration(e.to_string()))?
            .finish();

        Ok(Self {
            operator,
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl UploadUrlSigner for OpenDalS3Signer {
    async fn presign_put(&self, request: &PresignRequest) -> Result<PresignedUpload, ObjectStoreError> {
        debug!(bucket = %self.bucket, key = %request.key, "Presigning upload");

        let signed = self
            .operator
            .presign_write_with(&request.key, request.expires_in)
            .content_type(&request.content_type)
            .await
            .map_err(|e| match e.kind() {
                opendal::ErrorKind::ConfigInvalid | opendal::ErrorKind::PermissionDenied => {
                    ObjectStoreError::Rejected(e.to_string())
                }
                _ => ObjectStoreError::Unavailable(e.to_string()),
            })?;

        let headers = signed
            .header()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        Ok(PresignedUpload {
            url: signed.uri().to_string(),
            headers,
        })
    }
}
