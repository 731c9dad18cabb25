//! Crate-wide constants for the verification ledger.

/// Age at which a subject counts as an adult.
///
/// Fixed threshold for the adult predicate derived at submission time.
pub const ADULT_AGE: u8 = 18;

/// Smallest cleartext bound accepted by a range query.
pub const MIN_RANGE_BOUND: u8 = 1;

/// Largest cleartext bound accepted by a range query.
pub const MAX_RANGE_BOUND: u8 = 120;
