//! Notifications produced by mutating operations.
//!
//! The ledger returns the emitted notification from each mutating call;
//! observers (the backend's log, a UI feed) decide how to fan it out.

use crate::identity::Identity;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    AgeSubmitted {
        identity: Identity,
        timestamp: DateTime<Utc>,
    },
    VerificationCompleted {
        identity: Identity,
        is_adult: bool,
        timestamp: DateTime<Utc>,
    },
    VerifierAdded {
        identity: Identity,
    },
    VerifierRemoved {
        identity: Identity,
    },
}
