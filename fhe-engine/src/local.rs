//! Process-local engine used by the backend binary and by tests.
//!
//! NOTE: This is a stand-in for an external FHE coprocessor. Values live in
//! a table in process memory and are never serialized. Handles minted by a
//! previous process are therefore unknown to a fresh engine, which is the
//! one failure mode the engine contract permits.
//!
//! IMPORTANT: The XOR mask on stored values marks the table as not being a
//! plaintext store. It is not a security mechanism. A real deployment swaps
//! this type for an FHE coprocessor client behind the same trait.

use crate::engine::{ComputationEngine, EngineError};
use crate::handle::{CiphertextHandle, DeriveOp, Operand, AGE_BIT_WIDTH};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

pub struct LocalEngine {
    mask: u8,
    values: Mutex<HashMap<Uuid, u8>>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self {
            mask: rand::random(),
            values: Mutex::new(HashMap::new()),
        }
    }

    fn store(&self, clear: u8) -> CiphertextHandle {
        let handle = CiphertextHandle::new(Uuid::new_v4());
        let mut table = self.values.lock().unwrap_or_else(|e| e.into_inner());
        table.insert(handle.token, clear ^ self.mask);
        handle
    }

    fn load(&self, handle: &CiphertextHandle) -> Result<u8, EngineError> {
        if handle.bit_width != AGE_BIT_WIDTH {
            return Err(EngineError::BitWidth {
                expected: AGE_BIT_WIDTH,
                got: handle.bit_width,
            });
        }

        let table = self.values.lock().unwrap_or_else(|e| e.into_inner());
        table
            .get(&handle.token)
            .map(|masked| masked ^ self.mask)
            .ok_or(EngineError::UnknownHandle { token: handle.token })
    }

    /// Local stand-in for the external decryption gateway.
    ///
    /// Not part of the `ComputationEngine` contract: the ledger never calls
    /// this. Exposed for the backend's gateway endpoint and for tests.
    pub fn reveal(&self, handle: &CiphertextHandle) -> Result<u8, EngineError> {
        self.load(handle)
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputationEngine for LocalEngine {
    fn encode(&self, clear: u8) -> Result<CiphertextHandle, EngineError> {
        Ok(self.store(clear))
    }

    fn derive(
        &self,
        op: DeriveOp,
        lhs: &CiphertextHandle,
        rhs: Operand<'_>,
    ) -> Result<CiphertextHandle, EngineError> {
        let l = self.load(lhs)?;
        let r = match rhs {
            Operand::Handle(h) => self.load(h)?,
            Operand::Clear(v) => v,
        };

        let out = match op {
            DeriveOp::Ge => (l >= r) as u8,
            DeriveOp::Le => (l <= r) as u8,
            DeriveOp::Gt => (l > r) as u8,
            DeriveOp::And => (l != 0 && r != 0) as u8,
        };

        Ok(self.store(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_reveal_roundtrip() {
        let engine = LocalEngine::new();
        let h = engine.encode(42).unwrap();
        assert_eq!(h.bit_width, AGE_BIT_WIDTH);
        assert_eq!(engine.reveal(&h).unwrap(), 42);
    }

    #[test]
    fn comparisons_return_encrypted_booleans() {
        let engine = LocalEngine::new();
        let age = engine.encode(21).unwrap();
        let threshold = engine.encode(18).unwrap();

        let ge = engine
            .derive(DeriveOp::Ge, &age, Operand::Handle(&threshold))
            .unwrap();
        assert_eq!(engine.reveal(&ge).unwrap(), 1);

        let le = engine.derive(DeriveOp::Le, &age, Operand::Clear(20)).unwrap();
        assert_eq!(engine.reveal(&le).unwrap(), 0);

        let gt = engine.derive(DeriveOp::Gt, &age, Operand::Clear(21)).unwrap();
        assert_eq!(engine.reveal(&gt).unwrap(), 0);
    }

    #[test]
    fn and_combines_boolean_flags() {
        let engine = LocalEngine::new();
        let yes = engine.encode(1).unwrap();
        let no = engine.encode(0).unwrap();

        let both = engine
            .derive(DeriveOp::And, &yes, Operand::Handle(&yes))
            .unwrap();
        assert_eq!(engine.reveal(&both).unwrap(), 1);

        let mixed = engine
            .derive(DeriveOp::And, &yes, Operand::Handle(&no))
            .unwrap();
        assert_eq!(engine.reveal(&mixed).unwrap(), 0);
    }

    #[test]
    fn derive_mints_a_fresh_token() {
        let engine = LocalEngine::new();
        let age = engine.encode(30).unwrap();
        let flag = engine.derive(DeriveOp::Ge, &age, Operand::Clear(18)).unwrap();
        assert_ne!(flag.token, age.token);
    }

    #[test]
    fn unknown_handle_is_rejected() {
        let engine = LocalEngine::new();
        let foreign = CiphertextHandle::new(Uuid::new_v4());

        let err = engine.derive(DeriveOp::Ge, &foreign, Operand::Clear(18));
        assert!(matches!(err, Err(EngineError::UnknownHandle { .. })));
        assert!(matches!(
            engine.reveal(&foreign),
            Err(EngineError::UnknownHandle { .. })
        ));
    }

    #[test]
    fn wrong_bit_width_is_rejected() {
        let engine = LocalEngine::new();
        let mut h = engine.encode(5).unwrap();
        h.bit_width = 16;

        assert!(matches!(
            engine.derive(DeriveOp::Ge, &h, Operand::Clear(1)),
            Err(EngineError::BitWidth { expected: 8, got: 16 })
        ));
    }
}
