use crate::db::Db;
use fhe_engine::local::LocalEngine;
use ledger::Ledger;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared service state.
///
/// The single `RwLock` realizes the ledger's transaction model: mutating
/// handlers take the write lock (no two mutations interleave), read handlers
/// take the read lock and observe only committed state.
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub engine: Arc<LocalEngine>,
    pub ledger: Arc<RwLock<Ledger>>,
}

impl AppState {
    pub fn new(db: Db, engine: Arc<LocalEngine>, ledger: Ledger) -> Self {
        Self {
            db,
            engine,
            ledger: Arc::new(RwLock::new(ledger)),
        }
    }
}
