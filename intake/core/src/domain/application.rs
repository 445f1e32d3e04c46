// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Aggregate
//!
//! Wire-level types for a housing application: the identifier assigned at
//! persistence time, the closed vocabularies used by the form (gender,
//! housing preference, income bracket, document slot), and the camelCase
//! submission payload accepted at the HTTP boundary.
//!
//! The persisted shape lives in [`crate::domain::record`]; the in-progress
//! form state lives in [`crate::domain::draft`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Creation timestamps travel as RFC 3339 strings with millisecond precision
/// (`2026-01-15T09:30:00.000Z`). They are also the record's sort key, so the
/// value handed back to the client must round-trip exactly.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s.trim())?.with_timezone(&Utc))
}

/// Truncates to whole milliseconds so the stored sort key equals the value
/// rendered by [`format_timestamp`].
pub fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Unit type on offer: two-room or three-room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HousingPreference {
    #[serde(rename = "2bhk")]
    TwoRoom,
    #[serde(rename = "3bhk")]
    ThreeRoom,
}

impl HousingPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            HousingPreference::TwoRoom => "2bhk",
            HousingPreference::ThreeRoom => "3bhk",
        }
    }
}

impl FromStr for HousingPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "2bhk" => Ok(HousingPreference::TwoRoom),
            "3bhk" => Ok(HousingPreference::ThreeRoom),
            other => Err(format!("unknown housing preference '{}'", other)),
        }
    }
}

/// Income buckets offered by the form's select box. Monthly income is stored
/// as free text; a value that matches one of these is rendered with its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeBracket {
    #[serde(rename = "below-25000")]
    Below25k,
    #[serde(rename = "25000-50000")]
    From25kTo50k,
    #[serde(rename = "50000-100000")]
    From50kTo100k,
    #[serde(rename = "above-100000")]
    Above100k,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 4] = [
        IncomeBracket::Below25k,
        IncomeBracket::From25kTo50k,
        IncomeBracket::From50kTo100k,
        IncomeBracket::Above100k,
    ];

    pub fn value(&self) -> &'static str {
        match self {
            IncomeBracket::Below25k => "below-25000",
            IncomeBracket::From25kTo50k => "25000-50000",
            IncomeBracket::From50kTo100k => "50000-100000",
            IncomeBracket::Above100k => "above-100000",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IncomeBracket::Below25k => "Below ₹25,000",
            IncomeBracket::From25kTo50k => "₹25,000 - ₹50,000",
            IncomeBracket::From50kTo100k => "₹50,000 - ₹1,00,000",
            IncomeBracket::Above100k => "Above ₹1,00,000",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.value() == value.trim())
    }
}

/// The four identity documents collected in step 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentSlot {
    Aadhar,
    PanCard,
    IncomeProof,
    Photo,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 4] = [
        DocumentSlot::Aadhar,
        DocumentSlot::PanCard,
        DocumentSlot::IncomeProof,
        DocumentSlot::Photo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSlot::Aadhar => "aadhar",
            DocumentSlot::PanCard => "panCard",
            DocumentSlot::IncomeProof => "incomeProof",
            DocumentSlot::Photo => "photo",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentSlot::Aadhar => "Aadhar card",
            DocumentSlot::PanCard => "PAN card",
            DocumentSlot::IncomeProof => "Income proof",
            DocumentSlot::Photo => "Photo",
        }
    }

    /// Error-map key used by the step validator (`documents.panCard`).
    pub fn field_key(&self) -> String {
        format!("documents.{}", self.as_str())
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| format!("unknown document slot '{}'", s))
    }
}

/// Slot name to object-store key or URL.
pub type DocumentReferences = BTreeMap<DocumentSlot, String>;

/// Builds document references from an untyped JSON object the way the patch
/// route always has: non-string and empty values are dropped, unknown slot
/// names are reported.
pub fn document_references_from_json(
    documents: &serde_json::Map<String, serde_json::Value>,
) -> Result<DocumentReferences, Vec<String>> {
    let mut references = DocumentReferences::new();
    let mut unknown = Vec::new();

    for (name, value) in documents {
        let slot = match name.parse::<DocumentSlot>() {
            Ok(slot) => slot,
            Err(_) => {
                unknown.push(name.clone());
                continue;
            }
        };
        if let Some(url) = value.as_str().map(str::trim).filter(|url| !url.is_empty()) {
            references.insert(slot, url.to_string());
        }
    }

    if unknown.is_empty() {
        Ok(references)
    } else {
        Err(unknown)
    }
}

/// Create-application request body.
///
/// Every field defaults so that a missing value surfaces as a field-keyed
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub father_name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub mobile_number: String,
    pub email_address: String,
    pub permanent_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_address: Option<String>,
    pub occupation: String,
    pub monthly_income: String,
    pub housing_preference: String,
    pub preferred_city: String,
    pub documents: DocumentReferences,
    pub legal_acknowledgment: bool,
    pub terms_agreement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_consent: Option<bool>,
}

/// Identifier and sort key handed back after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApplication {
    pub id: ApplicationId,
    pub created_at: String,
}
