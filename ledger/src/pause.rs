//! Global circuit breaker for mutating operations.

use crate::errors::LedgerError;

pub struct PauseGate {
    paused: bool,
}

impl PauseGate {
    pub fn new() -> Self {
        Self { paused: false }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fail fast when the gate is engaged. Called at the top of every
    /// mutating operation and every predicate derivation; plain reads
    /// never consult the gate.
    pub fn ensure_open(&self) -> Result<(), LedgerError> {
        if self.paused {
            return Err(LedgerError::SystemPaused);
        }
        Ok(())
    }

    pub fn set(&mut self, paused: bool) {
        self.paused = paused;
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}
