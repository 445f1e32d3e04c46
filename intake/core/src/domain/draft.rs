// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Draft
//!
//! In-progress form state and the checkpoint contract used to persist it
//! between sessions.
//!
//! A draft holds the same fields as [`ApplicationSubmission`] in their raw,
//! as-typed form, plus the documents the applicant has selected. Local file
//! handles are transient: they are never written to a checkpoint, so a
//! restored draft keeps the selection metadata but must re-attach any file
//! that was not uploaded yet.
//!
//! The [`DraftStore`] trait is a key/value checkpoint slot. Implementations
//! live in `crate::infrastructure::draft_store`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::application::{ApplicationSubmission, DocumentReferences, DocumentSlot};

/// Fixed slot name every draft store writes under.
pub const DRAFT_KEY: &str = "sewas-application-draft";

/// A file chosen for one document slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSelection {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    /// Handle to the file on the applicant's machine. Never checkpointed.
    #[serde(skip)]
    pub local_path: Option<PathBuf>,
    /// Object-store key once the upload has completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded_key: Option<String>,
}

impl DocumentSelection {
    /// True when the selection still points at something usable: either a
    /// live file handle or a completed upload.
    pub fn is_selected(&self) -> bool {
        self.local_path.is_some() || self.uploaded_key.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationDraft {
    pub full_name: String,
    pub father_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub mobile_number: String,
    pub email_address: String,
    pub permanent_address: String,
    pub current_address: String,
    pub occupation: String,
    pub monthly_income: String,
    pub housing_preference: String,
    pub preferred_city: String,
    pub documents: BTreeMap<DocumentSlot, DocumentSelection>,
    pub legal_acknowledgment: bool,
    pub terms_agreement: bool,
    pub marketing_consent: bool,
}

/// Scalar form fields addressable by their wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    FullName,
    FatherName,
    DateOfBirth,
    Gender,
    MobileNumber,
    EmailAddress,
    PermanentAddress,
    CurrentAddress,
    Occupation,
    MonthlyIncome,
    HousingPreference,
    PreferredCity,
    LegalAcknowledgment,
    TermsAgreement,
    MarketingConsent,
}

impl DraftField {
    pub const ALL: [DraftField; 15] = [
        DraftField::FullName,
        DraftField::FatherName,
        DraftField::DateOfBirth,
        DraftField::Gender,
        DraftField::MobileNumber,
        DraftField::EmailAddress,
        DraftField::PermanentAddress,
        DraftField::CurrentAddress,
        DraftField::Occupation,
        DraftField::MonthlyIncome,
        DraftField::HousingPreference,
        DraftField::PreferredCity,
        DraftField::LegalAcknowledgment,
        DraftField::TermsAgreement,
        DraftField::MarketingConsent,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DraftField::FullName => "fullName",
            DraftField::FatherName => "fatherName",
            DraftField::DateOfBirth => "dateOfBirth",
            DraftField::Gender => "gender",
            DraftField::MobileNumber => "mobileNumber",
            DraftField::EmailAddress => "emailAddress",
            DraftField::PermanentAddress => "permanentAddress",
            DraftField::CurrentAddress => "currentAddress",
            DraftField::Occupation => "occupation",
            DraftField::MonthlyIncome => "monthlyIncome",
            DraftField::HousingPreference => "housingPreference",
            DraftField::PreferredCity => "preferredCity",
            DraftField::LegalAcknowledgment => "legalAcknowledgment",
            DraftField::TermsAgreement => "termsAgreement",
            DraftField::MarketingConsent => "marketingConsent",
        }
    }

    pub fn is_flag(&self) -> bool {
        matches!(
            self,
            DraftField::LegalAcknowledgment | DraftField::TermsAgreement | DraftField::MarketingConsent
        )
    }
}

impl FromStr for DraftField {
    type Err = DraftFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| DraftFieldError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftFieldError {
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects {expected}")]
    TypeMismatch { field: &'static str, expected: &'static str },
}

impl ApplicationDraft {
    pub fn set(&mut self, field: DraftField, value: FieldValue) -> Result<(), DraftFieldError> {
        match value {
            FieldValue::Text(text) => {
                let slot = self.text_mut(field).ok_or(DraftFieldError::TypeMismatch {
                    field: field.key(),
                    expected: "a boolean",
                })?;
                *slot = text;
            }
            FieldValue::Flag(flag) => {
                let slot = self.flag_mut(field).ok_or(DraftFieldError::TypeMismatch {
                    field: field.key(),
                    expected: "text",
                })?;
                *slot = flag;
            }
        }
        Ok(())
    }

    fn text_mut(&mut self, field: DraftField) -> Option<&mut String> {
        let slot = match field {
            DraftField::FullName => &mut self.full_name,
            DraftField::FatherName => &mut self.father_name,
            DraftField::DateOfBirth => &mut self.date_of_birth,
            DraftField::Gender => &mut self.gender,
            DraftField::MobileNumber => &mut self.mobile_number,
            DraftField::EmailAddress => &mut self.email_address,
            DraftField::PermanentAddress => &mut self.permanent_address,
            DraftField::CurrentAddress => &mut self.current_address,
            DraftField::Occupation => &mut self.occupation,
            DraftField::MonthlyIncome => &mut self.monthly_income,
            DraftField::HousingPreference => &mut self.housing_preference,
            DraftField::PreferredCity => &mut self.preferred_city,
            DraftField::LegalAcknowledgment
            | DraftField::TermsAgreement
            | DraftField::MarketingConsent => return None,
        };
        Some(slot)
    }

    fn flag_mut(&mut self, field: DraftField) -> Option<&mut bool> {
        match field {
            DraftField::LegalAcknowledgment => Some(&mut self.legal_acknowledgment),
            DraftField::TermsAgreement => Some(&mut self.terms_agreement),
            DraftField::MarketingConsent => Some(&mut self.marketing_consent),
            _ => None,
        }
    }

    /// References of every document that has finished uploading.
    pub fn uploaded_documents(&self) -> DocumentReferences {
        self.documents
            .iter()
            .filter_map(|(slot, selection)| selection.uploaded_key.clone().map(|key| (*slot, key)))
            .collect()
    }

    /// Assembles the create-application payload from the current form state.
    pub fn to_submission(&self) -> ApplicationSubmission {
        let current_address = self.current_address.trim();
        ApplicationSubmission {
            full_name: self.full_name.trim().to_string(),
            father_name: self.father_name.trim().to_string(),
            date_of_birth: self.date_of_birth.trim().to_string(),
            gender: self.gender.clone(),
            mobile_number: self.mobile_number.trim().to_string(),
            email_address: self.email_address.trim().to_string(),
            permanent_address: self.permanent_address.trim().to_string(),
            current_address: (!current_address.is_empty()).then(|| current_address.to_string()),
            occupation: self.occupation.trim().to_string(),
            monthly_income: self.monthly_income.clone(),
            housing_preference: self.housing_preference.clone(),
            preferred_city: self.preferred_city.trim().to_string(),
            documents: self.uploaded_documents(),
            legal_acknowledgment: self.legal_acknowledgment,
            terms_agreement: self.terms_agreement,
            marketing_consent: Some(self.marketing_consent),
        }
    }
}

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode draft: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Key/value checkpoint for one applicant's in-progress form.
///
/// `load` merges whatever the slot holds over the default draft. A missing or
/// unreadable-as-JSON slot yields the default draft, not an error; only a
/// failure to reach the slot at all is reported.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: &ApplicationDraft) -> Result<(), DraftError>;

    fn load(&self) -> Result<ApplicationDraft, DraftError>;

    fn clear(&self) -> Result<(), DraftError>;
}

pub fn encode_draft(draft: &ApplicationDraft) -> Result<String, DraftError> {
    Ok(serde_json::to_string(draft)?)
}

/// Field-wise merge of a stored slot over defaults. Corrupt content degrades
/// to the default draft.
pub fn decode_draft(raw: &str) -> ApplicationDraft {
    match serde_json::from_str::<ApplicationDraft>(raw) {
        Ok(draft) => draft,
        Err(e) => {
            tracing::warn!("Stored draft is corrupt, starting from defaults: {}", e);
            ApplicationDraft::default()
        }
    }
}
