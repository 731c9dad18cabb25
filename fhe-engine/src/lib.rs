//! FHE layer for the Confidential Age-Verification Ledger.
//!
//! This crate contains:
//! - The opaque ciphertext handle type the ledger passes around.
//! - The computation-engine contract (comparisons + boolean AND over ciphertexts).
//! - A process-local engine used by the backend binary and by tests.

pub mod engine;
pub mod handle;
pub mod local;
