//! Computation-engine contract consumed by the ledger.

use crate::handle::{CiphertextHandle, DeriveOp, Operand};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown or uninitialized ciphertext handle {token}")]
    UnknownHandle { token: Uuid },

    #[error("unsupported bit width: expected {expected}, got {got}")]
    BitWidth { expected: u8, got: u8 },
}

/// Homomorphic computation engine.
///
/// Implementations evaluate comparisons and boolean AND over encrypted
/// values and return fresh ciphertexts; plaintext never crosses this
/// boundary in either direction. Calls fail only on malformed or
/// uninitialized handles.
pub trait ComputationEngine: Send + Sync {
    /// Encrypt a public scalar under the deployment key.
    fn encode(&self, clear: u8) -> Result<CiphertextHandle, EngineError>;

    /// Evaluate `op` over `lhs` and `rhs`, returning a new ciphertext.
    ///
    /// Comparison results are encrypted booleans (0/1).
    fn derive(
        &self,
        op: DeriveOp,
        lhs: &CiphertextHandle,
        rhs: Operand<'_>,
    ) -> Result<CiphertextHandle, EngineError>;
}
