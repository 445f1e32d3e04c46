// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Field Validation
//!
//! Pure rule sets for the application form. Nothing here performs I/O or
//! panics; every check reports into a [`ValidationErrors`] map keyed by the
//! wire field name, and an empty map means "valid".
//!
//! | Function | Caller | Rules |
//! |----------|--------|-------|
//! | [`validate_step`] | step controller | required fields + mobile/email format for one page |
//! | [`validate_submission`] | submission service | every page again, plus length, date and enum checks |
//! | [`validate_document_selection`] | step controller | MIME allow-list + 5 MiB cap for an attached file |

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::domain::application::{ApplicationSubmission, DocumentSlot, Gender, HousingPreference};
use crate::domain::draft::{ApplicationDraft, DocumentSelection};
use crate::domain::step::FormStep;

/// Upper bound on an uploaded document.
pub const MAX_DOCUMENT_BYTES: u64 = 5 * 1024 * 1024;

/// MIME types accepted for document uploads.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "application/pdf",
];

static MOBILE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("valid mobile regex"));

static EMAIL_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn is_valid_mobile_number(value: &str) -> bool {
    MOBILE_NUMBER.is_match(value)
}

pub fn is_valid_email_address(value: &str) -> bool {
    EMAIL_ADDRESS.is_match(value)
}

pub fn is_allowed_content_type(content_type: &str) -> bool {
    ALLOWED_CONTENT_TYPES.contains(&content_type)
}

/// Field name to human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has one; the
    /// first failing rule wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, message);
        false
    } else {
        true
    }
}

fn check_mobile(errors: &mut ValidationErrors, value: &str) {
    if require(errors, "mobileNumber", value, "Mobile number is required")
        && !is_valid_mobile_number(value.trim())
    {
        errors.add("mobileNumber", "Invalid mobile number");
    }
}

fn check_email(errors: &mut ValidationErrors, value: &str) {
    if require(errors, "emailAddress", value, "Email is required")
        && !is_valid_email_address(value.trim())
    {
        errors.add("emailAddress", "Invalid email format");
    }
}

fn check_min_chars(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, message: &str) {
    if value.trim().chars().count() < min {
        errors.add(field, message);
    }
}

/// Checks one page of the form.
pub fn validate_step(step: FormStep, draft: &ApplicationDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    match step {
        FormStep::PersonalDetails => {
            require(&mut errors, "fullName", &draft.full_name, "Full name is required");
            require(&mut errors, "fatherName", &draft.father_name, "Father's name is required");
            require(&mut errors, "dateOfBirth", &draft.date_of_birth, "Date of birth is required");
            require(&mut errors, "gender", &draft.gender, "Gender is required");
        }
        FormStep::ContactAndIncome => {
            check_mobile(&mut errors, &draft.mobile_number);
            check_email(&mut errors, &draft.email_address);
            require(&mut errors, "permanentAddress", &draft.permanent_address, "Permanent address is required");
            require(&mut errors, "occupation", &draft.occupation, "Occupation is required");
            require(&mut errors, "monthlyIncome", &draft.monthly_income, "Monthly income is required");
        }
        FormStep::HousingPreference => {
            require(&mut errors, "housingPreference", &draft.housing_preference, "Housing preference is required");
            require(&mut errors, "preferredCity", &draft.preferred_city, "Preferred city is required");
        }
        FormStep::Documents => {
            for slot in DocumentSlot::ALL {
                let selected = draft.documents.get(&slot).is_some_and(DocumentSelection::is_selected);
                if !selected {
                    errors.add(slot.field_key(), format!("{} is required", slot.label()));
                }
            }
        }
        FormStep::ReviewAndSubmit => {
            if !draft.legal_acknowledgment {
                errors.add("legalAcknowledgment", "Legal acknowledgment is required");
            }
            if !draft.terms_agreement {
                errors.add("termsAgreement", "Terms agreement is required");
            }
        }
    }

    errors
}

/// Server-side re-validation of a complete payload. Independent of the
/// per-step rules because the create route can be called directly.
pub fn validate_submission(submission: &ApplicationSubmission) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if require(&mut errors, "fullName", &submission.full_name, "Full name is required") {
        check_min_chars(&mut errors, "fullName", &submission.full_name, 3, "Full name must be at least 3 characters");
    }
    if require(&mut errors, "fatherName", &submission.father_name, "Father's name is required") {
        check_min_chars(&mut errors, "fatherName", &submission.father_name, 3, "Father's name must be at least 3 characters");
    }
    if require(&mut errors, "dateOfBirth", &submission.date_of_birth, "Date of birth is required") {
        match NaiveDate::parse_from_str(submission.date_of_birth.trim(), "%Y-%m-%d") {
            Ok(date) if date > Utc::now().date_naive() => {
                errors.add("dateOfBirth", "Date of birth cannot be in the future");
            }
            Ok(_) => {}
            Err(_) => errors.add("dateOfBirth", "Date of birth must be a date (YYYY-MM-DD)"),
        }
    }
    if require(&mut errors, "gender", &submission.gender, "Gender is required")
        && submission.gender.parse::<Gender>().is_err()
    {
        errors.add("gender", "Gender must be male, female or other");
    }

    check_mobile(&mut errors, &submission.mobile_number);
    check_email(&mut errors, &submission.email_address);

    if require(&mut errors, "permanentAddress", &submission.permanent_address, "Permanent address is required") {
        check_min_chars(&mut errors, "permanentAddress", &submission.permanent_address, 10, "Permanent address must be at least 10 characters");
    }
    if require(&mut errors, "occupation", &submission.occupation, "Occupation is required") {
        check_min_chars(&mut errors, "occupation", &submission.occupation, 2, "Occupation must be at least 2 characters");
    }
    require(&mut errors, "monthlyIncome", &submission.monthly_income, "Monthly income is required");

    if require(&mut errors, "housingPreference", &submission.housing_preference, "Housing preference is required")
        && submission.housing_preference.parse::<HousingPreference>().is_err()
    {
        errors.add("housingPreference", "Housing preference must be 2bhk or 3bhk");
    }
    if require(&mut errors, "preferredCity", &submission.preferred_city, "Preferred city is required") {
        check_min_chars(&mut errors, "preferredCity", &submission.preferred_city, 2, "Preferred city must be at least 2 characters");
    }

    if !submission.legal_acknowledgment {
        errors.add("legalAcknowledgment", "Legal acknowledgment is required");
    }
    if !submission.terms_agreement {
        errors.add("termsAgreement", "Terms agreement is required");
    }

    errors
}

/// Client-side check run when a file is attached to a slot.
pub fn validate_document_selection(slot: DocumentSlot, selection: &DocumentSelection) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if selection.size_bytes > MAX_DOCUMENT_BYTES {
        errors.add(slot.field_key(), "Please select a file smaller than 5MB");
    } else if !is_allowed_content_type(&selection.content_type) {
        errors.add(slot.field_key(), "File type not allowed (JPEG, PNG, WebP or PDF)");
    }
    errors
}
