// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interface
//!
//! Persistence contract for the application aggregate, following the DDD
//! Repository pattern: interface defined here, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `ApplicationRepository` | `ApplicationRecord` | `InMemoryApplicationRepository`, `PostgresApplicationRepository` |
//!
//! Records are addressed by the composite [`RecordKey`] (id + creation
//! timestamp). There is no delete and no update of personal fields; the only
//! mutation after create is replacing the document references.

use async_trait::async_trait;

use crate::domain::application::DocumentReferences;
use crate::domain::record::{ApplicationRecord, RecordKey};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Write a new record. Fails with `Conflict` if the key already exists.
    async fn create(&self, record: &ApplicationRecord) -> Result<(), RepositoryError>;

    /// Replace the document references of an existing record.
    /// Fails with `NotFound` when no record matches `key`.
    async fn update_documents(
        &self,
        key: &RecordKey,
        documents: &DocumentReferences,
    ) -> Result<(), RepositoryError>;

    /// Find a record by its full key
    async fn find(&self, key: &RecordKey) -> Result<Option<ApplicationRecord>, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
