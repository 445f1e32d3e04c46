// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Persisted Application Record
//!
//! The one canonical shape an application takes inside the document store,
//! and the two total mapping functions between it and the camelCase wire
//! schema:
//!
//! - [`ApplicationRecord::from_submission`]: wire payload → record
//! - [`ApplicationRecord::to_view`]: record → wire view
//!
//! Record attributes are snake_case. `documents` is always a nested mapping
//! of slot name to key/URL, never a serialized string. An absent current
//! address is stored as an empty string and an absent marketing consent as
//! `false`, so every attribute is always present.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::application::{
    format_timestamp, ApplicationId, ApplicationSubmission, DocumentReferences, Gender,
    HousingPreference,
};
use crate::domain::validation::{validate_submission, ValidationErrors};

/// Composite address of a record: partition key + sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub id: ApplicationId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub created_at: DateTime<Utc>,
    pub full_name: String,
    pub father_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub mobile_number: String,
    pub email_address: String,
    pub permanent_address: String,
    pub current_address: String,
    pub occupation: String,
    pub monthly_income: String,
    pub housing_preference: HousingPreference,
    pub preferred_city: String,
    pub documents: DocumentReferences,
    pub legal_acknowledgment: bool,
    pub terms_agreement: bool,
    pub marketing_consent: bool,
}

impl ApplicationRecord {
    /// Maps a wire payload onto a record. Runs the full submission rule set
    /// first, so a successful return is always a valid record.
    pub fn from_submission(
        key: RecordKey,
        submission: ApplicationSubmission,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = validate_submission(&submission);
        if !errors.is_empty() {
            return Err(errors);
        }

        let date_of_birth = NaiveDate::parse_from_str(submission.date_of_birth.trim(), "%Y-%m-%d");
        let gender = submission.gender.parse::<Gender>();
        let housing_preference = submission.housing_preference.parse::<HousingPreference>();

        let (Ok(date_of_birth), Ok(gender), Ok(housing_preference)) =
            (date_of_birth, gender, housing_preference)
        else {
            errors.add("payload", "Payload failed typed conversion");
            return Err(errors);
        };

        Ok(Self {
            id: key.id,
            created_at: key.created_at,
            full_name: submission.full_name.trim().to_string(),
            father_name: submission.father_name.trim().to_string(),
            date_of_birth,
            gender,
            mobile_number: submission.mobile_number.trim().to_string(),
            email_address: submission.email_address.trim().to_string(),
            permanent_address: submission.permanent_address.trim().to_string(),
            current_address: submission
                .current_address
                .map(|a| a.trim().to_string())
                .unwrap_or_default(),
            occupation: submission.occupation.trim().to_string(),
            monthly_income: submission.monthly_income.trim().to_string(),
            housing_preference,
            preferred_city: submission.preferred_city.trim().to_string(),
            documents: submission
                .documents
                .into_iter()
                .filter_map(|(slot, url)| {
                    let url = url.trim();
                    (!url.is_empty()).then(|| (slot, url.to_string()))
                })
                .collect(),
            legal_acknowledgment: submission.legal_acknowledgment,
            terms_agreement: submission.terms_agreement,
            marketing_consent: submission.marketing_consent.unwrap_or(false),
        })
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            id: self.id,
            created_at: self.created_at,
        }
    }

    pub fn to_view(&self) -> ApplicationView {
        ApplicationView {
            id: self.id,
            created_at: format_timestamp(&self.created_at),
            full_name: self.full_name.clone(),
            father_name: self.father_name.clone(),
            date_of_birth: self.date_of_birth.format("%Y-%m-%d").to_string(),
            gender: self.gender,
            mobile_number: self.mobile_number.clone(),
            email_address: self.email_address.clone(),
            permanent_address: self.permanent_address.clone(),
            current_address: self.current_address.clone(),
            occupation: self.occupation.clone(),
            monthly_income: self.monthly_income.clone(),
            housing_preference: self.housing_preference,
            preferred_city: self.preferred_city.clone(),
            documents: self.documents.clone(),
            legal_acknowledgment: self.legal_acknowledgment,
            terms_agreement: self.terms_agreement,
            marketing_consent: self.marketing_consent,
        }
    }
}

/// Read-side wire rendering of a record (camelCase, timestamps as strings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: ApplicationId,
    pub created_at: String,
    pub full_name: String,
    pub father_name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    pub mobile_number: String,
    pub email_address: String,
    pub permanent_address: String,
    pub current_address: String,
    pub occupation: String,
    pub monthly_income: String,
    pub housing_preference: HousingPreference,
    pub preferred_city: String,
    pub documents: DocumentReferences,
    pub legal_acknowledgment: bool,
    pub terms_agreement: bool,
    pub marketing_consent: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::application::{truncate_to_millis, DocumentSlot};
    use serde_json::json;

    fn submission() -> ApplicationSubmission {
        serde_json::from_value(json!({
            "fullName": "  Asha Verma ",
            "fatherName": "Ramesh Verma",
            "dateOfBirth": "1990-04-12",
            "gender": "female",
            "mobileNumber": "9876543210",
            "emailAddress": "asha@example.in",
            "permanentAddress": "12 Station Road, Indore",
            "occupation": "Teacher",
            "monthlyIncome": "25000-50000",
            "housingPreference": "3bhk",
            "preferredCity": "Indore — Madhya Pradesh",
            "legalAcknowledgment": true,
            "termsAgreement": true
        }))
        .unwrap()
    }

    fn key() -> RecordKey {
        RecordKey {
            id: ApplicationId::new(),
            created_at: truncate_to_millis(Utc::now()),
        }
    }

    #[test]
    fn test_from_submission_fills_every_attribute() {
        let key = key();
        let record = ApplicationRecord::from_submission(key, submission()).unwrap();
        assert_eq!(record.key(), key);
        assert_eq!(record.full_name, "Asha Verma");
        assert_eq!(record.current_address, "");
        assert!(!record.marketing_consent);
        assert_eq!(record.housing_preference, HousingPreference::ThreeRoom);
        assert!(record.documents.is_empty());
    }

    #[test]
    fn test_from_submission_rejects_invalid_payload() {
        let mut payload = submission();
        payload.terms_agreement = false;
        let errors = ApplicationRecord::from_submission(key(), payload).unwrap_err();
        assert!(errors.contains("termsAgreement"));
    }

    #[test]
    fn test_persisted_schema_is_snake_case_with_nested_documents() {
        let mut payload = submission();
        payload.documents.insert(DocumentSlot::Photo, "documents/u1/1-ab.jpg".into());
        let record = ApplicationRecord::from_submission(key(), payload).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("full_name").is_some());
        assert!(value.get("fullName").is_none());
        assert_eq!(value["documents"]["photo"], "documents/u1/1-ab.jpg");
    }

    #[test]
    fn test_from_submission_drops_blank_document_references() {
        let mut payload = submission();
        payload.documents.insert(DocumentSlot::Aadhar, "".into());
        payload.documents.insert(DocumentSlot::Photo, "   ".into());
        payload.documents.insert(DocumentSlot::PanCard, " documents/u1/1-pan.pdf ".into());
        let record = ApplicationRecord::from_submission(key(), payload).unwrap();
        assert_eq!(record.documents.len(), 1);
        assert_eq!(record.documents[&DocumentSlot::PanCard], "documents/u1/1-pan.pdf");
    }

    #[test]
    fn test_view_uses_wire_names() {
        let record = ApplicationRecord::from_submission(key(), submission()).unwrap();
        let value = serde_json::to_value(record.to_view()).unwrap();
        assert_eq!(value["fullName"], "Asha Verma");
        assert_eq!(value["housingPreference"], "3bhk");
        assert_eq!(value["dateOfBirth"], "1990-04-12");
        assert!(value["createdAt"].as_str().unwrap().ends_with('Z'));
    }
}
