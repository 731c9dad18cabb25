use chrono::{DateTime, Utc};
use fhe_engine::handle::CiphertextHandle;
use ledger::history::{HistoryEntry, Stats};
use ledger::identity::Identity;
use ledger::records::RecordStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub caller: Identity,
    /// Handle minted by the pre-encryption input stage (`/engine/encrypt`
    /// in this deployment, a client-side SDK in production).
    pub encrypted_age: CiphertextHandle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub identity: Identity,
    pub submitted: bool,
    pub completed: bool,
    /// Unix seconds; 0 when no record exists.
    pub submitted_at: i64,
}

impl StatusResponse {
    pub fn new(identity: Identity, status: RecordStatus) -> Self {
        Self {
            identity,
            submitted: status.submitted,
            completed: status.completed,
            submitted_at: status.submitted_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CallerRequest {
    pub caller: Identity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HandleResponse {
    pub handle: CiphertextHandle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RangeRequest {
    pub caller: Identity,
    pub min_age: u8,
    pub max_age: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompareRequest {
    pub caller: Identity,
    pub other: Identity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub caller: Identity,
    /// Verifier-attested cleartext outcome entering the public history.
    pub is_adult: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteResponse {
    pub identity: Identity,
    pub is_adult: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdultResponse {
    pub identity: Identity,
    /// False when the identity has no currently-completed record.
    pub known: bool,
    pub is_adult: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub caller: Identity,
    pub start: Option<usize>,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryItem {
    pub index: usize,
    pub subject: Identity,
    pub is_adult: bool,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
}

impl HistoryItem {
    pub fn new(index: usize, entry: &HistoryEntry) -> Self {
        Self {
            index,
            subject: entry.subject,
            is_adult: entry.is_adult,
            timestamp: entry.timestamp,
            success: entry.success,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub start: usize,
    pub total: usize,
    pub entries: Vec<HistoryItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_submissions: u64,
    pub completed: u64,
    pub pending: u64,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            total_submissions: stats.total_submissions,
            completed: stats.completed,
            pending: stats.pending,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifierRequest {
    pub caller: Identity,
    pub target: Identity,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifierStatusResponse {
    pub identity: Identity,
    pub is_verifier: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PausedResponse {
    pub paused: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptRequest {
    pub value: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevealRequest {
    pub handle: CiphertextHandle,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevealResponse {
    pub value: u8,
}
