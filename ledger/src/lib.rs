//! Confidential Verification Ledger.
//!
//! This crate is the core of the system: the per-identity verification
//! record lifecycle, the authorization model governing who may finalize or
//! read a verification, the derived-predicate orchestration over the
//! computation engine, and the append-only history/statistics subsystem.
//!
//! Encrypted ages are carried as opaque [`fhe_engine::handle::CiphertextHandle`]
//! values; the ledger never sees plaintext. Every operation is a serialized,
//! all-or-nothing transaction: it validates (including any engine calls)
//! before it writes, so a failure leaves records, history and counters
//! untouched.

pub mod authz;
pub mod constants;
pub mod errors;
pub mod events;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod pause;
pub mod predicates;
pub mod records;

pub use crate::ledger::{Ledger, LedgerSnapshot};
