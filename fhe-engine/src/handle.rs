//! Opaque ciphertext handles shared between the engine and the ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declared bit width of every age ciphertext in this deployment.
///
/// Boolean results are carried at the same width, normalized to 0/1.
pub const AGE_BIT_WIDTH: u8 = 8;

/// Opaque reference to an encrypted value held by the computation engine.
///
/// The ledger never looks inside a handle: two handles are "the same value"
/// only if they are the same handle, never by plaintext equality. This type
/// deliberately implements neither `PartialEq` nor `Ord`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CiphertextHandle {
    /// Declared bit width of the encrypted integer.
    pub bit_width: u8,
    /// Engine-issued token identifying the ciphertext.
    pub token: Uuid,
}

impl CiphertextHandle {
    pub fn new(token: Uuid) -> Self {
        Self { bit_width: AGE_BIT_WIDTH, token }
    }
}

/// Right-hand operand of a derive call.
///
/// Comparison bounds may arrive either as another ciphertext or as a
/// cleartext scalar (scalars are public by definition, e.g. a range bound).
#[derive(Clone, Copy, Debug)]
pub enum Operand<'a> {
    Handle(&'a CiphertextHandle),
    Clear(u8),
}

/// Operator set the ledger is allowed to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeriveOp {
    /// Greater-or-equal comparison.
    Ge,
    /// Less-or-equal comparison.
    Le,
    /// Strictly-greater comparison.
    Gt,
    /// Boolean AND of two 0/1 ciphertexts.
    And,
}
