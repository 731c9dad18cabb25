//! Append-only history of completed verifications plus aggregate counters.
//!
//! Entries are immutable once appended and ordered by completion time.
//! An entry's index is permanent and drives pagination. Counters are
//! maintained incrementally, so appends and stat reads stay cheap.

use crate::errors::LedgerError;
use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    pub subject: Identity,
    /// Verifier-attested adult/minor determination, in cleartext.
    pub is_adult: bool,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct Stats {
    pub total_submissions: u64,
    pub completed: u64,
    pub pending: u64,
}

pub struct HistoryLedger {
    entries: Vec<HistoryEntry>,
    total_submissions: u64,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            total_submissions: 0,
        }
    }

    /// Rebuild the log from persisted state, keeping append order.
    ///
    /// Every appended entry implies a prior submission, so a journal that
    /// reports fewer submissions than entries is incomplete. The counter is
    /// clamped up to the entry count to keep `stats()` consistent.
    pub fn restore(entries: Vec<HistoryEntry>, total_submissions: u64) -> Self {
        let total_submissions = total_submissions.max(entries.len() as u64);
        Self {
            entries,
            total_submissions,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_submission(&mut self) {
        self.total_submissions += 1;
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Half-open, clamped page `[start, min(start + count, len))` in
    /// original append order.
    pub fn page(&self, start: usize, count: usize) -> Result<&[HistoryEntry], LedgerError> {
        if start >= self.entries.len() {
            return Err(LedgerError::InvalidStart {
                start,
                len: self.entries.len(),
            });
        }
        let end = start.saturating_add(count).min(self.entries.len());
        Ok(&self.entries[start..end])
    }

    /// Most recent entry for `subject`, so the latest attested outcome wins
    /// when an identity is re-verified after a reset.
    pub fn latest_for(&self, subject: Identity) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.subject == subject)
    }

    pub fn stats(&self) -> Stats {
        let completed = self.entries.len() as u64;
        Stats {
            total_submissions: self.total_submissions,
            completed,
            // Completion requires a prior submission, and restore() clamps
            // the counter, so this never underflows.
            pending: self.total_submissions - completed,
        }
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new()
    }
}
