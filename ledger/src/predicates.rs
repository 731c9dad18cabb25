//! Derived encrypted predicates.
//!
//! Thin orchestration over the computation engine. Each function turns a
//! stored age ciphertext into a derived boolean ciphertext. Nothing here
//! ever sees plaintext, and an engine failure propagates before any ledger
//! state could change.

use crate::constants::{ADULT_AGE, MAX_RANGE_BOUND, MIN_RANGE_BOUND};
use crate::errors::LedgerError;
use fhe_engine::engine::ComputationEngine;
use fhe_engine::handle::{CiphertextHandle, DeriveOp, Operand};

/// `encrypted_age >= 18`, against a freshly encoded threshold ciphertext.
pub fn derive_adult_flag(
    engine: &dyn ComputationEngine,
    encrypted_age: &CiphertextHandle,
) -> Result<CiphertextHandle, LedgerError> {
    let threshold = engine.encode(ADULT_AGE)?;
    let flag = engine.derive(DeriveOp::Ge, encrypted_age, Operand::Handle(&threshold))?;
    Ok(flag)
}

/// `(encrypted_age >= min) AND (encrypted_age <= max)`.
///
/// The bounds arrive in the clear, so they are validated here; the age
/// itself is not.
pub fn derive_range_flag(
    engine: &dyn ComputationEngine,
    encrypted_age: &CiphertextHandle,
    min: u8,
    max: u8,
) -> Result<CiphertextHandle, LedgerError> {
    if min < MIN_RANGE_BOUND || max > MAX_RANGE_BOUND || min > max {
        return Err(LedgerError::InvalidRange { min, max });
    }

    let ge_min = engine.derive(DeriveOp::Ge, encrypted_age, Operand::Clear(min))?;
    let le_max = engine.derive(DeriveOp::Le, encrypted_age, Operand::Clear(max))?;
    let flag = engine.derive(DeriveOp::And, &ge_min, Operand::Handle(&le_max))?;
    Ok(flag)
}

/// `lhs_age > rhs_age`. Reveals neither age, only an encrypted outcome.
pub fn derive_older_flag(
    engine: &dyn ComputationEngine,
    lhs_age: &CiphertextHandle,
    rhs_age: &CiphertextHandle,
) -> Result<CiphertextHandle, LedgerError> {
    let flag = engine.derive(DeriveOp::Gt, lhs_age, Operand::Handle(rhs_age))?;
    Ok(flag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhe_engine::local::LocalEngine;

    #[test]
    fn adult_flag_matches_threshold() {
        let engine = LocalEngine::new();

        let adult = engine.encode(18).unwrap();
        let minor = engine.encode(17).unwrap();

        let adult_flag = derive_adult_flag(&engine, &adult).unwrap();
        let minor_flag = derive_adult_flag(&engine, &minor).unwrap();

        assert_eq!(engine.reveal(&adult_flag).unwrap(), 1);
        assert_eq!(engine.reveal(&minor_flag).unwrap(), 0);
    }

    #[test]
    fn range_flag_checks_both_bounds() {
        let engine = LocalEngine::new();
        let age = engine.encode(30).unwrap();

        let inside = derive_range_flag(&engine, &age, 18, 65).unwrap();
        assert_eq!(engine.reveal(&inside).unwrap(), 1);

        let below = derive_range_flag(&engine, &age, 40, 65).unwrap();
        assert_eq!(engine.reveal(&below).unwrap(), 0);

        let above = derive_range_flag(&engine, &age, 1, 29).unwrap();
        assert_eq!(engine.reveal(&above).unwrap(), 0);

        // Inclusive at both ends.
        let exact = derive_range_flag(&engine, &age, 30, 30).unwrap();
        assert_eq!(engine.reveal(&exact).unwrap(), 1);
    }

    #[test]
    fn range_bounds_are_validated_in_the_clear() {
        let engine = LocalEngine::new();
        let age = engine.encode(30).unwrap();

        assert!(matches!(
            derive_range_flag(&engine, &age, 40, 20),
            Err(LedgerError::InvalidRange { min: 40, max: 20 })
        ));
        assert!(matches!(
            derive_range_flag(&engine, &age, 0, 20),
            Err(LedgerError::InvalidRange { .. })
        ));
        assert!(matches!(
            derive_range_flag(&engine, &age, 18, 121),
            Err(LedgerError::InvalidRange { .. })
        ));
    }

    #[test]
    fn older_flag_is_strict() {
        let engine = LocalEngine::new();
        let a = engine.encode(40).unwrap();
        let b = engine.encode(40).unwrap();
        let c = engine.encode(39).unwrap();

        let tie = derive_older_flag(&engine, &a, &b).unwrap();
        assert_eq!(engine.reveal(&tie).unwrap(), 0);

        let older = derive_older_flag(&engine, &a, &c).unwrap();
        assert_eq!(engine.reveal(&older).unwrap(), 1);
    }
}
