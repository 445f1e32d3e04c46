// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Object Store Adapters
//!
//! Implementations of [`UploadUrlSigner`] and the factory that picks one
//! from `spec.object_store`.
//!
//! - **OpenDalS3Signer** - production, S3-compatible buckets
//! - **MockUploadSigner** - deterministic URLs for development and tests

pub mod s3;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::domain::intake_config::{resolve_secret, ObjectStoreConfig, ObjectStoreKind};
use crate::domain::object_store::{
    ObjectStoreError, PresignRequest, PresignedUpload, UploadUrlSigner,
};

pub use s3::{OpenDalS3Signer, S3SignerConfig};

/// Builds the signer selected by configuration. Missing S3 settings are a
/// configuration error here, before any request is served.
pub fn create_upload_signer(
    config: &ObjectStoreConfig,
) -> Result<Arc<dyn UploadUrlSigner>, ObjectStoreError> {
    match config.backend {
        ObjectStoreKind::Mock => {
            tracing::warn!("Using mock object store: issued upload URLs are not writable");
            Ok(Arc::new(MockUploadSigner::new("http://localhost:9000/mock-bucket")))
        }
        ObjectStoreKind::S3 => {
            let required = |value: &str, name: &str| {
                if value.trim().is_empty() {
                    Err(ObjectStoreError::Configuration(format!("{} is not set", name)))
                } else {
                    Ok(value.trim().to_string())
                }
            };

            let signer_config = S3SignerConfig {
                bucket: required(&config.bucket, "bucket")?,
                region: required(&config.region, "region")?,
                endpoint: config.endpoint.clone(),
                access_key_id: resolve_secret(config.access_key_id.as_deref()).ok_or_else(|| {
                    ObjectStoreError::Configuration("access key id is not set".to_string())
                })?,
                secret_access_key: resolve_secret(config.secret_access_key.as_deref())
                    .ok_or_else(|| {
                        ObjectStoreError::Configuration("secret access key is not set".to_string())
                    })?,
            };

            tracing::info!(
                bucket = %signer_config.bucket,
                region = %signer_config.region,
                "Initialized S3 upload signer"
            );
            Ok(Arc::new(OpenDalS3Signer::new(signer_config)?))
        }
    }
}

/// Signer that fabricates URLs under a fixed base and remembers every request.
pub struct MockUploadSigner {
    base_url: String,
    failure: Option<String>,
    requests: Mutex<Vec<PresignRequest>>,
}

impl MockUploadSigner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Signer whose every call fails as if the store were unreachable.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new("http://localhost")
        }
    }

    pub fn requests(&self) -> Vec<PresignRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UploadUrlSigner for MockUploadSigner {
    async fn presign_put(&self, request: &PresignRequest) -> Result<PresignedUpload, ObjectStoreError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(message) = &self.failure {
            return Err(ObjectStoreError::Unavailable(message.clone()));
        }

        Ok(PresignedUpload {
            url: format!(
                "{}/{}?X-Mock-Expires={}",
                self.base_url,
                request.key,
                request.expires_in.as_secs()
            ),
            headers: BTreeMap::from([("content-type".to_string(), request.content_type.clone())]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn s3_config() -> ObjectStoreConfig {
        ObjectStoreConfig {
            backend: ObjectStoreKind::S3,
            bucket: "sewas-documents".into(),
            region: "ap-south-1".into(),
            endpoint: None,
            access_key_id: Some("AKIAEXAMPLE".into()),
            secret_access_key: Some("secret".into()),
            upload_url_ttl_seconds: 3600,
        }
    }

    #[test]
    fn test_s3_signer_requires_bucket() {
        let mut config = s3_config();
        config.bucket = String::new();
        assert!(matches!(
            create_upload_signer(&config),
            Err(ObjectStoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_s3_signer_requires_credentials() {
        let mut config = s3_config();
        config.secret_access_key = None;
        assert!(matches!(
            create_upload_signer(&config),
            Err(ObjectStoreError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_s3_signer_presigns_locally() {
        let signer = create_upload_signer(&s3_config()).unwrap();
        let signed = signer
            .presign_put(&PresignRequest {
                key: "documents/u1/1736930000000-1a2b3c4d.pdf".into(),
                content_type: "application/pdf".into(),
                expires_in: Duration::from_secs(3600),
            })
            .await
            .unwrap();

        assert!(signed.url.contains("documents/u1/1736930000000-1a2b3c4d.pdf"));
        assert!(signed.url.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    async fn test_mock_signer_records_requests() {
        let signer = MockUploadSigner::new("https://uploads.test/");
        let request = PresignRequest {
            key: "documents/u1/1-abcd1234.png".into(),
            content_type: "image/png".into(),
            expires_in: Duration::from_secs(60),
        };
        let signed = signer.presign_put(&request).await.unwrap();
        assert_eq!(
            signed.url,
            "https://uploads.test/documents/u1/1-abcd1234.png?X-Mock-Expires=60"
        );
        assert_eq!(signed.headers["content-type"], "image/png");
        assert_eq!(signer.requests(), vec![request]);
    }
}
