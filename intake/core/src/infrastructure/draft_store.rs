// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Draft Store Adapters
//!
//! - **FileDraftStore** - one JSON file per applicant profile,
//!   `<dir>/sewas-application-draft.json`
//! - **InMemoryDraftStore** - a single in-process slot for tests and
//!   throwaway sessions
//!
//! Both store the encoded draft, so transient fields are dropped the same way.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::draft::{decode_draft, encode_draft, ApplicationDraft, DraftError, DraftStore, DRAFT_KEY};

pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(directory: impl AsRef<Path>) -> Self {
        Self {
            path: directory.as_ref().join(format!("{}.json", DRAFT_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, draft: &ApplicationDraft) -> Result<(), DraftError> {
        let encoded = encode_draft(draft)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Readers never see a partially written slot
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, encoded)?;
        std::fs::rename(&staging, &self.path)?;
        tracing::debug!(path = %self.path.display(), "Draft saved");
        Ok(())
    }

    fn load(&self) -> Result<ApplicationDraft, DraftError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(decode_draft(&raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ApplicationDraft::default()),
            Err(e) => Err(DraftError::Io(e)),
        }
    }

    fn clear(&self) -> Result<(), DraftError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DraftError::Io(e)),
        }
    }
}

#[derive(Default)]
pub struct InMemoryDraftStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw slot content, as if written by an older client.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    /// Decoded slot content, `None` when nothing is stored.
    pub fn snapshot(&self) -> Option<ApplicationDraft> {
        self.slot
            .lock()
            .ok()
            .and_then(|slot| slot.as_deref().map(decode_draft))
    }
}

impl DraftStore for InMemoryDraftStore {
    fn save(&self, draft: &ApplicationDraft) -> Result<(), DraftError> {
        let encoded = encode_draft(draft)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| DraftError::Unavailable("draft slot lock poisoned".to_string()))?;
        *slot = Some(encoded);
        Ok(())
    }

    fn load(&self) -> Result<ApplicationDraft, DraftError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| DraftError::Unavailable("draft slot lock poisoned".to_string()))?;
        Ok(slot.as_deref().map(decode_draft).unwrap_or_default())
    }

    fn clear(&self) -> Result<(), DraftError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| DraftError::Unavailable("draft slot lock poisoned".to_string()))?;
        *slot = None;
        Ok(())
    }
}
