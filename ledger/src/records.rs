//! Per-identity verification records.
//!
//! A record exists exactly from the first successful submission until an
//! owner-issued reset. Presence in the store *is* the `submitted` flag.
//! The encrypted age and the derived adult flag are immutable for the
//! record's lifetime. Only `completed` ever changes, and only from false
//! to true.

use crate::errors::LedgerError;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use fhe_engine::handle::CiphertextHandle;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct VerificationRecord {
    pub encrypted_age: CiphertextHandle,
    /// Encrypted `age >= 18` flag, derived at submission time.
    pub is_adult: CiphertextHandle,
    pub submitted_at: DateTime<Utc>,
    pub completed: bool,
}

/// Cleartext status view. Safe to disclose to anyone: it carries no
/// ciphertext handles and no outcome.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RecordStatus {
    pub submitted: bool,
    pub completed: bool,
    /// Unix seconds; 0 when no record exists.
    pub submitted_at: i64,
}

pub struct RecordStore {
    records: HashMap<Identity, VerificationRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Rebuild the store from persisted state.
    pub fn restore(records: impl IntoIterator<Item = (Identity, VerificationRecord)>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn get(&self, id: Identity) -> Option<&VerificationRecord> {
        self.records.get(&id)
    }

    /// Insert a freshly submitted record. One-shot per identity.
    pub fn insert_submitted(
        &mut self,
        id: Identity,
        record: VerificationRecord,
    ) -> Result<(), LedgerError> {
        if self.records.contains_key(&id) {
            return Err(LedgerError::AlreadyVerified);
        }
        self.records.insert(id, record);
        Ok(())
    }

    /// Flip `completed`. Fails before mutating on a missing or
    /// already-completed record.
    pub fn complete(&mut self, id: Identity) -> Result<(), LedgerError> {
        let record = self.records.get_mut(&id).ok_or(LedgerError::NotSubmitted)?;
        if record.completed {
            return Err(LedgerError::AlreadyCompleted);
        }
        record.completed = true;
        Ok(())
    }

    /// Erase a record back to the absent state. No-op if already absent.
    pub fn remove(&mut self, id: Identity) {
        self.records.remove(&id);
    }

    pub fn status(&self, id: Identity) -> RecordStatus {
        match self.records.get(&id) {
            Some(record) => RecordStatus {
                submitted: true,
                completed: record.completed,
                submitted_at: record.submitted_at.timestamp(),
            },
            None => RecordStatus {
                submitted: false,
                completed: false,
                submitted_at: 0,
            },
        }
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
