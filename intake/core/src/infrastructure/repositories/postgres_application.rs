// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Postgres Application
//!
//! PostgreSQL persistence for application records.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** Implements `ApplicationRepository` over the `applications` table
//!
//! Rows are keyed by `(id, created_at)`. `documents` is a JSONB object of
//! slot name to key/URL.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::domain::application::{ApplicationId, DocumentReferences, Gender, HousingPreference};
use crate::domain::record::{ApplicationRecord, RecordKey};
use crate::domain::repository::{ApplicationRepository, RepositoryError};

const SELECT_COLUMNS: &str = r#"
    id, created_at, full_name, father_name, date_of_birth, gender,
    mobile_number, email_address, permanent_address, current_address,
    occupation, monthly_income, housing_preference, preferred_city,
    documents, legal_acknowledgment, terms_agreement, marketing_consent
"#;

pub struct PostgresApplicationRepository {
    pool: PgPool,
}

impl PostgresApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    async fn create(&self, record: &ApplicationRecord) -> Result<(), RepositoryError> {
        let documents_json = serde_json::to_value(&record.documents)?;

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, created_at, full_name, father_name, date_of_birth, gender,
                mobile_number, email_address, permanent_address, current_address,
                occupation, monthly_income, housing_preference, preferred_city,
                documents, legal_acknowledgment, terms_agreement, marketing_consent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(record.id.0)
        .bind(record.created_at)
        .bind(&record.full_name)
        .bind(&record.father_name)
        .bind(record.date_of_birth)
        .bind(record.gender.as_str())
        .bind(&record.mobile_number)
        .bind(&record.email_address)
        .bind(&record.permanent_address)
        .bind(&record.current_address)
        .bind(&record.occupation)
        .bind(&record.monthly_income)
        .bind(record.housing_preference.as_str())
        .bind(&record.preferred_city)
        .bind(documents_json)
        .bind(record.legal_acknowledgment)
        .bind(record.terms_agreement)
        .bind(record.marketing_consent)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("application {}", record.id))
            }
            _ => RepositoryError::Database(format!("Failed to insert application: {}", e)),
        })?;

        Ok(())
    }

    async fn update_documents(
        &self,
        key: &RecordKey,
        documents: &DocumentReferences,
    ) -> Result<(), RepositoryError> {
        let documents_json = serde_json::to_value(documents)?;

        let result = sqlx::query(
            r#"
            UPDATE applications
            SET documents = $3
            WHERE id = $1 AND created_at = $2
            "#,
        )
        .bind(key.id.0)
        .bind(key.created_at)
        .bind(documents_json)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to update documents: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("application {}", key.id)));
        }
        Ok(())
    }

    async fn find(&self, key: &RecordKey) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let query = format!(
            "SELECT {} FROM applications WHERE id = $1 AND created_at = $2",
            SELECT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(key.id.0)
            .bind(key.created_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(parse_application_row).transpose()
    }
}

fn parse_application_row(row: PgRow) -> Result<ApplicationRecord, RepositoryError> {
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let date_of_birth: NaiveDate = row.try_get("date_of_birth")?;
    let gender: String = row.try_get("gender")?;
    let housing_preference: String = row.try_get("housing_preference")?;
    let documents_json: serde_json::Value = row.try_get("documents")?;

    Ok(ApplicationRecord {
        id: ApplicationId(id),
        created_at,
        full_name: row.try_get("full_name")?,
        father_name: row.try_get("father_name")?,
        date_of_birth,
        gender: gender
            .parse::<Gender>()
            .map_err(RepositoryError::Serialization)?,
        mobile_number: row.try_get("mobile_number")?,
        email_address: row.try_get("email_address")?,
        permanent_address: row.try_get("permanent_address")?,
        current_address: row.try_get("current_address")?,
        occupation: row.try_get("occupation")?,
        monthly_income: row.try_get("monthly_income")?,
        housing_preference: housing_preference
            .parse::<HousingPreference>()
            .map_err(RepositoryError::Serialization)?,
        preferred_city: row.try_get("preferred_city")?,
        documents: serde_json::from_value(documents_json)?,
        legal_acknowledgment: row.try_get("legal_acknowledgment")?,
        terms_agreement: row.try_get("terms_agreement")?,
        marketing_consent: row.try_get("marketing_consent")?,
    })
}
