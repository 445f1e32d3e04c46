// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five pages of the application form, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FormStep {
    PersonalDetails = 1,
    ContactAndIncome = 2,
    HousingPreference = 3,
    Documents = 4,
    ReviewAndSubmit = 5,
}

impl FormStep {
    pub const FIRST: FormStep = FormStep::PersonalDetails;
    pub const LAST: FormStep = FormStep::ReviewAndSubmit;
    pub const COUNT: u8 = 5;

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(FormStep::PersonalDetails),
            2 => Some(FormStep::ContactAndIncome),
            3 => Some(FormStep::HousingPreference),
            4 => Some(FormStep::Documents),
            5 => Some(FormStep::ReviewAndSubmit),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn title(&self) -> &'static str {
        match self {
            FormStep::PersonalDetails => "Personal Details",
            FormStep::ContactAndIncome => "Contact & Income",
            FormStep::HousingPreference => "Housing Preference",
            FormStep::Documents => "Documents",
            FormStep::ReviewAndSubmit => "Review & Submit",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        Self::from_number(self.number().saturating_sub(1))
    }

    /// Completion percentage shown on the progress bar.
    pub fn progress_percent(&self) -> u8 {
        self.number() * 100 / Self::COUNT
    }
}

impl TryFrom<u8> for FormStep {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_number(value).ok_or_else(|| format!("form step must be 1-5, got {}", value))
    }
}

impl From<FormStep> for u8 {
    fn from(step: FormStep) -> Self {
        step.number()
    }
}

impl fmt::Display for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.number(), self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_navigation_bounds() {
        assert_eq!(FormStep::FIRST.previous(), None);
        assert_eq!(FormStep::LAST.next(), None);
        assert_eq!(FormStep::Documents.next(), Some(FormStep::ReviewAndSubmit));
        assert_eq!(FormStep::ContactAndIncome.previous(), Some(FormStep::PersonalDetails));
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(FormStep::PersonalDetails.progress_percent(), 20);
        assert_eq!(FormStep::ReviewAndSubmit.progress_percent(), 100);
    }

    #[test]
    fn test_serde_uses_step_number() {
        assert_eq!(serde_json::to_string(&FormStep::Documents).unwrap(), "4");
        assert!(serde_json::from_str::<FormStep>("6").is_err());
    }
}
