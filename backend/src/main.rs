mod api;
mod db;
mod errors;
mod models;
mod state;

use crate::errors::ApiError;
use crate::state::AppState;
use fhe_engine::local::LocalEngine;
use ledger::identity::Identity;
use ledger::{Ledger, LedgerSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Dev-only fallback owner, used when `LEDGER_OWNER` is unset on first boot.
const DEV_OWNER: &str = "0x00000000000000000000000000000000000000aa";

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // Store local state under backend/data (ignored by git).
    let data_dir = PathBuf::from("data");
    std::fs::create_dir_all(&data_dir).map_err(|_| ApiError::Internal)?;

    let db_path = data_dir.join("ledger.sqlite");
    let db_url = format!("sqlite:{}", db_path.to_string_lossy());

    let db = db::connect(&db_url).await?;
    db::init_schema(&db).await?;

    // The owner is fixed at first boot and persisted; it never changes.
    let owner: Identity = match db::get_meta(&db, db::META_OWNER).await? {
        Some(s) => s.parse().map_err(|_| ApiError::Internal)?,
        None => {
            let owner: Identity = std::env::var("LEDGER_OWNER")
                .unwrap_or_else(|_| DEV_OWNER.to_string())
                .parse()
                .map_err(|_| ApiError::Internal)?;
            db::set_meta(&db, db::META_OWNER, &owner.to_string()).await?;
            owner
        }
    };

    let paused = db::get_meta(&db, db::META_PAUSED).await?.as_deref() == Some("1");
    let total_submissions = db::get_meta(&db, db::META_TOTAL_SUBMISSIONS)
        .await?
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let snapshot = LedgerSnapshot {
        owner,
        paused,
        verifiers: db::list_verifiers(&db).await?,
        records: db::list_records(&db).await?,
        history: db::list_history(&db).await?,
        total_submissions,
    };

    tracing::info!(
        %owner,
        paused,
        records = snapshot.records.len(),
        history = snapshot.history.len(),
        verifiers = snapshot.verifiers.len(),
        "ledger restored from journal"
    );

    // NOTE: The local engine's ciphertext table is process memory only, so
    // handles journaled by a previous process are inert until resubmitted.
    // A production deployment points this at an external FHE coprocessor.
    let engine = Arc::new(LocalEngine::new());
    let ledger = Ledger::restore(snapshot, engine.clone());

    let state = AppState::new(db, engine, ledger);

    let app = api::router(state);

    let addr = std::env::var("BACKEND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|_| ApiError::Internal)?;

    tracing::info!(%addr, "backend listening");

    axum::serve(listener, app).await.map_err(|_| ApiError::Internal)?;

    Ok(())
}
