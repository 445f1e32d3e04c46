// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Step Controller
//!
//! Drives one applicant through the five form pages.
//!
//! - `next` validates the current page, advances, and checkpoints the draft
//! - `previous` moves back without validating
//! - `submit` re-validates the last page and hands the assembled payload to
//!   an [`ApplicationSubmitter`]; success clears the draft
//!
//! Draft store failures never abort an operation. They are logged and kept
//! as [`DraftNotice`]s for the caller to display.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::submitter::{ApplicationSubmitter, SubmitFailure};
use crate::domain::application::{CreatedApplication, DocumentSlot};
use crate::domain::draft::{
    ApplicationDraft, DocumentSelection, DraftError, DraftField, DraftFieldError, DraftStore,
    FieldValue,
};
use crate::domain::step::FormStep;
use crate::domain::validation::{validate_document_selection, validate_step, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOperation {
    Restore,
    Save,
    Clear,
}

/// A draft store call that failed without stopping the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftNotice {
    pub operation: DraftOperation,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Submission is only possible from the last step (currently on step {0})")]
    NotAtFinalStep(FormStep),

    #[error("Application already submitted")]
    AlreadySubmitted,

    #[error("Form has {} invalid field(s)", .0.len())]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Failed(SubmitFailure),
}

pub struct StepController {
    step: FormStep,
    draft: ApplicationDraft,
    errors: ValidationErrors,
    notices: Vec<DraftNotice>,
    submitted: Option<CreatedApplication>,
    store: Arc<dyn DraftStore>,
    submitter: Arc<dyn ApplicationSubmitter>,
}

impl StepController {
    /// Fresh form at step 1 with an empty draft.
    pub fn new(store: Arc<dyn DraftStore>, submitter: Arc<dyn ApplicationSubmitter>) -> Self {
        Self {
            step: FormStep::FIRST,
            draft: ApplicationDraft::default(),
            errors: ValidationErrors::new(),
            notices: Vec::new(),
            submitted: None,
            store,
            submitter,
        }
    }

    /// Form at step 1 with whatever the draft store holds.
    pub fn restore(store: Arc<dyn DraftStore>, submitter: Arc<dyn ApplicationSubmitter>) -> Self {
        let mut controller = Self::new(store, submitter);
        match controller.store.load() {
            Ok(draft) => controller.draft = draft,
            Err(e) => controller.record_notice(DraftOperation::Restore, e),
        }
        controller
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// Errors from the most recent validation, minus fields edited since.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn notices(&self) -> &[DraftNotice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<DraftNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn submitted(&self) -> Option<&CreatedApplication> {
        self.submitted.as_ref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn set_field(&mut self, field: DraftField, value: FieldValue) -> Result<(), DraftFieldError> {
        self.draft.set(field, value)?;
        self.errors.remove(field.key());
        Ok(())
    }

    /// Attaches a file to a slot after the size and type checks. A rejected
    /// file leaves the slot as it was and records the error against it.
    pub fn attach_document(
        &mut self,
        slot: DocumentSlot,
        selection: DocumentSelection,
    ) -> Result<(), ValidationErrors> {
        let errors = validate_document_selection(slot, &selection);
        if !errors.is_empty() {
            for (field, message) in errors.iter() {
                self.errors.remove(field);
                self.errors.add(field, message);
            }
            return Err(errors);
        }

        self.draft.documents.insert(slot, selection);
        self.errors.remove(&slot.field_key());
        Ok(())
    }

    /// Marks a slot's file as transferred to the object store under `key`.
    /// Returns false when nothing is attached to the slot.
    pub fn record_upload(&mut self, slot: DocumentSlot, key: impl Into<String>) -> bool {
        match self.draft.documents.get_mut(&slot) {
            Some(selection) => {
                selection.uploaded_key = Some(key.into());
                true
            }
            None => false,
        }
    }

    /// Slots holding a local file that has not been uploaded yet.
    pub fn pending_uploads(&self) -> Vec<(DocumentSlot, &DocumentSelection)> {
        self.draft
            .documents
            .iter()
            .filter(|(_, selection)| selection.local_path.is_some() && selection.uploaded_key.is_none())
            .map(|(slot, selection)| (*slot, selection))
            .collect()
    }

    /// Validates the current step and advances on success. Returns the step
    /// the form is on afterwards. The last step validates but stays put.
    pub fn next(&mut self) -> Result<FormStep, ValidationErrors> {
        let errors = validate_step(self.step, &self.draft);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(errors);
        }

        self.errors.clear();
        if let Some(next) = self.step.next() {
            self.step = next;
            self.save_progress();
        }
        Ok(self.step)
    }

    pub fn previous(&mut self) -> Option<FormStep> {
        let previous = self.step.previous()?;
        self.step = previous;
        Some(previous)
    }

    /// Checkpoints the draft. Returns whether the write succeeded.
    pub fn save_progress(&mut self) -> bool {
        match self.store.save(&self.draft) {
            Ok(()) => true,
            Err(e) => {
                self.record_notice(DraftOperation::Save, e);
                false
            }
        }
    }

    pub async fn submit(&mut self) -> Result<CreatedApplication, SubmitError> {
        if self.submitted.is_some() {
            return Err(SubmitError::AlreadySubmitted);
        }
        if self.step != FormStep::LAST {
            return Err(SubmitError::NotAtFinalStep(self.step));
        }

        let errors = validate_step(FormStep::LAST, &self.draft);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(SubmitError::Invalid(errors));
        }

        let submission = self.draft.to_submission();
        let created = match self.submitter.submit(&submission).await {
            Ok(created) => created,
            Err(failure) => {
                warn!("Application submission failed: {}", failure);
                if let SubmitFailure::Validation(errors) = &failure {
                    self.errors = errors.clone();
                }
                return Err(SubmitError::Failed(failure));
            }
        };

        info!(application_id = %created.id, "Application submitted");
        if let Err(e) = self.store.clear() {
            self.record_notice(DraftOperation::Clear, e);
        }
        self.errors.clear();
        self.submitted = Some(created.clone());
        Ok(created)
    }

    fn record_notice(&mut self, operation: DraftOperation, error: DraftError) {
        warn!(?operation, "Draft store unavailable: {}", error);
        self.notices.push(DraftNotice {
            operation,
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::draft_store::InMemoryDraftStore;
    use async_trait::async_trait;
    use crate::domain::application::{ApplicationId, ApplicationSubmission};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSubmitter {
        calls: Mutex<Vec<ApplicationSubmission>>,
        failure: Option<SubmitFailure>,
    }

    #[async_trait]
    impl ApplicationSubmitter for RecordingSubmitter {
        async fn submit(
            &self,
            submission: &ApplicationSubmission,
        ) -> Result<CreatedApplication, SubmitFailure> {
            self.calls.lock().unwrap().push(submission.clone());
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok(CreatedApplication {
                    id: ApplicationId::new(),
                    created_at: "2026-01-15T09:30:00.000Z".to_string(),
                }),
            }
        }
    }

    struct BrokenStore;

    impl DraftStore for BrokenStore {
        fn save(&self, _draft: &ApplicationDraft) -> Result<(), DraftError> {
            Err(DraftError::Unavailable("quota exceeded".into()))
        }

        fn load(&self) -> Result<ApplicationDraft, DraftError> {
            Err(DraftError::Unavailable("storage disabled".into()))
        }

        fn clear(&self) -> Result<(), DraftError> {
            Err(DraftError::Unavailable("storage disabled".into()))
        }
    }

    fn text(controller: &mut StepController, field: DraftField, value: &str) {
        controller.set_field(field, FieldValue::Text(value.to_string())).unwrap();
    }

    fn fill_through_step_three(controller: &mut StepController) {
        text(controller, DraftField::FullName, "Asha Verma");
        text(controller, DraftField::FatherName, "Ramesh Verma");
        text(controller, DraftField::DateOfBirth, "1990-04-12");
        text(controller, DraftField::Gender, "female");
        text(controller, DraftField::MobileNumber, "9876543210");
        text(controller, DraftField::EmailAddress, "asha@example.in");
        text(controller, DraftField::PermanentAddress, "12 Station Road, Indore");
        text(controller, DraftField::Occupation, "Teacher");
        text(controller, DraftField::MonthlyIncome, "25000-50000");
        text(controller, DraftField::HousingPreference, "2bhk");
        text(controller, DraftField::PreferredCity, "Indore — Madhya Pradesh");
    }

    fn attach_all(controller: &mut StepController) {
        for slot in DocumentSlot::ALL {
            controller
                .attach_document(
                    slot,
                    DocumentSelection {
                        file_name: format!("{}.pdf", slot),
                        content_type: "application/pdf".into(),
                        size_bytes: 2048,
                        local_path: Some(PathBuf::from(format!("/tmp/{}.pdf", slot))),
                        uploaded_key: None,
                    },
                )
                .unwrap();
            controller.record_upload(slot, format!("documents/u1/1-abcd1234-{}.pdf", slot));
        }
    }

    fn controller_at_last_step(
        store: Arc<dyn DraftStore>,
        submitter: Arc<dyn ApplicationSubmitter>,
    ) -> StepController {
        let mut controller = StepController::new(store, submitter);
        fill_through_step_three(&mut controller);
        attach_all(&mut controller);
        for _ in 0..4 {
            controller.next().unwrap();
        }
        assert_eq!(controller.step(), FormStep::ReviewAndSubmit);
        controller
    }

    #[test]
    fn test_next_blocks_on_invalid_step() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store.clone(), Arc::new(RecordingSubmitter::default()));

        let errors = controller.next().unwrap_err();
        assert!(errors.contains("fullName"));
        assert_eq!(controller.step(), FormStep::PersonalDetails);
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_short_mobile_number_blocks_step_two() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store, Arc::new(RecordingSubmitter::default()));
        fill_through_step_three(&mut controller);
        controller.next().unwrap();

        text(&mut controller, DraftField::MobileNumber, "12345");
        let errors = controller.next().unwrap_err();
        assert_eq!(errors.get("mobileNumber"), Some("Invalid mobile number"));
        assert_eq!(controller.step(), FormStep::ContactAndIncome);
    }

    #[test]
    fn test_next_checkpoints_draft() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store.clone(), Arc::new(RecordingSubmitter::default()));
        fill_through_step_three(&mut controller);

        assert_eq!(controller.next().unwrap(), FormStep::ContactAndIncome);
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.full_name, "Asha Verma");
    }

    #[test]
    fn test_editing_a_field_clears_its_error() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store, Arc::new(RecordingSubmitter::default()));
        controller.next().unwrap_err();
        assert!(controller.errors().contains("fullName"));

        text(&mut controller, DraftField::FullName, "Asha");
        assert!(!controller.errors().contains("fullName"));
        assert!(controller.errors().contains("fatherName"));
    }

    #[test]
    fn test_previous_does_not_validate() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store, Arc::new(RecordingSubmitter::default()));
        assert_eq!(controller.previous(), None);

        fill_through_step_three(&mut controller);
        controller.next().unwrap();
        text(&mut controller, DraftField::FullName, "");
        assert_eq!(controller.previous(), Some(FormStep::PersonalDetails));
    }

    #[test]
    fn test_oversized_attachment_is_rejected() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store, Arc::new(RecordingSubmitter::default()));
        let err = controller
            .attach_document(
                DocumentSlot::Photo,
                DocumentSelection {
                    file_name: "huge.png".into(),
                    content_type: "image/png".into(),
                    size_bytes: 6 * 1024 * 1024,
                    local_path: Some(PathBuf::from("/tmp/huge.png")),
                    uploaded_key: None,
                },
            )
            .unwrap_err();
        assert!(err.contains("documents.photo"));
        assert!(controller.draft().documents.is_empty());
        assert!(controller.errors().contains("documents.photo"));
    }

    #[test]
    fn test_pending_uploads_lists_untransferred_files() {
        let store = Arc::new(InMemoryDraftStore::new());
        let mut controller = StepController::new(store, Arc::new(RecordingSubmitter::default()));
        attach_all(&mut controller);
        assert!(controller.pending_uploads().is_empty());

        controller
            .attach_document(
                DocumentSlot::Photo,
                DocumentSelection {
                    file_name: "me.jpg".into(),
                    content_type: "image/jpeg".into(),
                    size_bytes: 100,
                    local_path: Some(PathBuf::from("/tmp/me.jpg")),
                    uploaded_key: None,
                },
            )
            .unwrap();
        let pending = controller.pending_uploads();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, DocumentSlot::Photo);
    }

    #[tokio::test]
    async fn test_submit_without_acknowledgment_never_reaches_submitter() {
        let store = Arc::new(InMemoryDraftStore::new());
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut controller = controller_at_last_step(store, submitter.clone());

        controller
            .set_field(DraftField::TermsAgreement, FieldValue::Flag(true))
            .unwrap();
        let err = controller.submit().await.unwrap_err();
        match err {
            SubmitError::Invalid(errors) => assert!(errors.contains("legalAcknowledgment")),
            other => panic!("expected invalid form, got {:?}", other),
        }
        assert!(submitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_before_last_step_is_rejected() {
        let store = Arc::new(InMemoryDraftStore::new());
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut controller = StepController::new(store, submitter.clone());
        assert!(matches!(
            controller.submit().await,
            Err(SubmitError::NotAtFinalStep(FormStep::PersonalDetails))
        ));
        assert!(submitter.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_draft_and_locks() {
        let store = Arc::new(InMemoryDraftStore::new());
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut controller = controller_at_last_step(store.clone(), submitter.clone());
        controller.set_field(DraftField::LegalAcknowledgment, FieldValue::Flag(true)).unwrap();
        controller.set_field(DraftField::TermsAgreement, FieldValue::Flag(true)).unwrap();
        assert!(store.snapshot().is_some());

        let created = controller.submit().await.unwrap();
        assert_eq!(controller.submitted(), Some(&created));
        assert!(store.snapshot().is_none());

        let calls = submitter.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].documents.len(), 4);

        assert!(matches!(controller.submit().await, Err(SubmitError::AlreadySubmitted)));
        assert_eq!(submitter.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_form_state() {
        let store = Arc::new(InMemoryDraftStore::new());
        let submitter = Arc::new(RecordingSubmitter {
            failure: Some(SubmitFailure::Rejected {
                status: 500,
                message: "Failed to submit application".into(),
            }),
            ..Default::default()
        });
        let mut controller = controller_at_last_step(store.clone(), submitter);
        controller.set_field(DraftField::LegalAcknowledgment, FieldValue::Flag(true)).unwrap();
        controller.set_field(DraftField::TermsAgreement, FieldValue::Flag(true)).unwrap();
        let before = controller.draft().clone();

        assert!(matches!(controller.submit().await, Err(SubmitError::Failed(_))));
        assert_eq!(controller.step(), FormStep::ReviewAndSubmit);
        assert_eq!(controller.draft(), &before);
        assert!(!controller.is_submitted());
        assert!(store.snapshot().is_some());
    }

    #[tokio::test]
    async fn test_draft_store_failures_become_notices() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let mut controller = StepController::restore(Arc::new(BrokenStore), submitter);
        assert_eq!(controller.notices().len(), 1);
        assert_eq!(controller.notices()[0].operation, DraftOperation::Restore);

        fill_through_step_three(&mut controller);
        assert_eq!(controller.next().unwrap(), FormStep::ContactAndIncome);
        assert!(!controller.save_progress());

        let notices = controller.take_notices();
        assert_eq!(notices.len(), 3);
        assert!(controller.notices().is_empty());
    }

    #[test]
    fn test_restore_resumes_saved_fields_at_step_one() {
        let store = Arc::new(InMemoryDraftStore::new());
        let submitter: Arc<dyn ApplicationSubmitter> = Arc::new(RecordingSubmitter::default());
        let mut first = StepController::new(store.clone(), submitter.clone());
        fill_through_step_three(&mut first);
        first.next().unwrap();

        let restored = StepController::restore(store, submitter);
        assert_eq!(restored.step(), FormStep::PersonalDetails);
        assert_eq!(restored.draft().preferred_city, "Indore — Madhya Pradesh");
        assert!(restored.notices().is_empty());
    }
}
