//! Failure taxonomy for the verification ledger.
//!
//! Every error aborts the enclosing operation before any state is written,
//! so there is never partial mutation to clean up. Errors are surfaced
//! verbatim to the caller. Retries are a caller concern.

use fhe_engine::engine::EngineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("caller lacks the required capability")]
    Unauthorized,

    #[error("system is paused")]
    SystemPaused,

    #[error("identity already has a submitted verification")]
    AlreadyVerified,

    #[error("verification is already completed")]
    AlreadyCompleted,

    #[error("no submitted verification for this identity")]
    NotSubmitted,

    #[error("invalid age range {min}..={max}")]
    InvalidRange { min: u8, max: u8 },

    #[error("history start {start} is past the end of the log ({len} entries)")]
    InvalidStart { start: usize, len: usize },

    #[error("target identity is invalid")]
    InvalidTarget,

    #[error("the owner's verifier capability cannot be revoked")]
    CannotRemoveOwner,

    #[error("computation engine rejected the request: {0}")]
    Engine(#[from] EngineError),
}
