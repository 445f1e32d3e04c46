// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the `ApplicationRepository` contract
//! defined in the domain layer.
//!
//! - **PostgresApplicationRepository** - `applications` table, composite key `(id, created_at)`
//! - **InMemoryApplicationRepository** - HashMap-backed storage for development and tests

pub mod postgres_application;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::application::DocumentReferences;
use crate::domain::record::{ApplicationRecord, RecordKey};
use crate::domain::repository::{ApplicationRepository, RepositoryError};

pub use postgres_application::PostgresApplicationRepository;

#[derive(Clone, Default)]
pub struct InMemoryApplicationRepository {
    records: Arc<RwLock<HashMap<RecordKey, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> RepositoryError {
    RepositoryError::Database("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn create(&self, record: &ApplicationRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let key = record.key();
        if records.contains_key(&key) {
            return Err(RepositoryError::Conflict(format!("application {}", key.id)));
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn update_documents(
        &self,
        key: &RecordKey,
        documents: &DocumentReferences,
    ) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .get_mut(key)
            .ok_or_else(|| RepositoryError::NotFound(format!("application {}", key.id)))?;
        record.documents = documents.clone();
        Ok(())
    }

    async fn find(&self, key: &RecordKey) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::{truncate_to_millis, ApplicationId, ApplicationSubmission, DocumentSlot};
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn record() -> ApplicationRecord {
        let submission: ApplicationSubmission = serde_json::from_value(json!({
            "fullName": "Asha Verma",
            "fatherName": "Ramesh Verma",
            "dateOfBirth": "1990-04-12",
            "gender": "female",
            "mobileNumber": "9876543210",
            "emailAddress": "asha@example.in",
            "permanentAddress": "12 Station Road, Indore",
            "occupation": "Teacher",
            "monthlyIncome": "below-25000",
            "housingPreference": "2bhk",
            "preferredCity": "Indore",
            "legalAcknowledgment": true,
            "termsAgreement": true
        }))
        .unwrap();
        let key = RecordKey {
            id: ApplicationId::new(),
            created_at: truncate_to_millis(Utc::now()),
        };
        ApplicationRecord::from_submission(key, submission).unwrap()
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_key() {
        let repo = InMemoryApplicationRepository::new();
        let record = record();
        repo.create(&record).await.unwrap();
        assert!(matches!(repo.create(&record).await, Err(RepositoryError::Conflict(_))));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_needs_both_key_parts() {
        let repo = InMemoryApplicationRepository::new();
        let record = record();
        repo.create(&record).await.unwrap();

        let wrong_time = RecordKey {
            id: record.id,
            created_at: record.created_at + Duration::milliseconds(1),
        };
        assert!(repo.find(&wrong_time).await.unwrap().is_none());
        assert!(matches!(
            repo.update_documents(&wrong_time, &DocumentReferences::new()).await,
            Err(RepositoryError::NotFound(_))
        ));
        assert!(repo.find(&record.key()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_documents_replaces_map() {
        let repo = InMemoryApplicationRepository::new();
        let record = record();
        repo.create(&record).await.unwrap();

        let mut documents = DocumentReferences::new();
        documents.insert(DocumentSlot::IncomeProof, "documents/u1/1-abcd1234.pdf".into());
        repo.update_documents(&record.key(), &documents).await.unwrap();

        let stored = repo.find(&record.key()).await.unwrap().unwrap();
        assert_eq!(stored.documents, documents);
        assert_eq!(stored.full_name, record.full_name);
    }
}
