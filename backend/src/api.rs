use crate::db;
use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use fhe_engine::engine::ComputationEngine;
use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use ledger::constants::{MAX_RANGE_BOUND, MIN_RANGE_BOUND};
use ledger::events::Notification;
use ledger::identity::Identity;
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/engine/encrypt", post(encrypt))
        .route("/api/v1/engine/reveal", post(reveal))
        .route("/api/v1/verifications", post(submit))
        .route("/api/v1/verifications/:identity/result", post(get_result))
        .route("/api/v1/verifications/:identity/complete", post(complete))
        .route("/api/v1/verifications/:identity/reset", post(reset))
        .route("/api/v1/predicates/range", post(verify_range))
        .route("/api/v1/predicates/compare", post(compare))
        .route("/api/v1/admin/verifiers", post(grant_verifier))
        .route("/api/v1/admin/verifiers/revoke", post(revoke_verifier))
        .route("/api/v1/admin/pause", post(pause))
        .route("/api/v1/admin/unpause", post(unpause))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/verifications/:identity/status", get(get_status))
        .route("/api/v1/users/:identity/adult", get(is_user_adult))
        .route("/api/v1/history", get(history))
        .route("/api/v1/stats", get(stats))
        .route("/api/v1/verifiers/:identity", get(verifier_status))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Transport-level gate only; capability checks (owner, verifier) happen
    // in the ledger. In production, this should be a strong secret from
    // environment.
    let expected_key = std::env::var("API_KEY").unwrap_or_else(|_| "dev-secret-key".to_string());

    if let Some(provided_key) = headers.get("X-API-KEY") {
        if provided_key == expected_key.as_str() {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!("unauthorized access attempt");
    Err(StatusCode::UNAUTHORIZED)
}

fn log_notification(note: &Notification) {
    match note {
        Notification::AgeSubmitted { identity, timestamp } => {
            tracing::info!(%identity, %timestamp, "age submitted");
        }
        Notification::VerificationCompleted { identity, is_adult, timestamp } => {
            tracing::info!(%identity, is_adult, %timestamp, "verification completed");
        }
        Notification::VerifierAdded { identity } => {
            tracing::info!(%identity, "verifier added");
        }
        Notification::VerifierRemoved { identity } => {
            tracing::info!(%identity, "verifier removed");
        }
    }
}

// --- engine boundary (pre-encryption input stage + decryption gateway) -----

async fn encrypt(State(state): State<AppState>, Json(req): Json<EncryptRequest>) -> Result<Json<HandleResponse>, ApiError> {
    // Cleartext bounds are validated here, before encryption; the ledger
    // core never sees the value again.
    if req.value < MIN_RANGE_BOUND || req.value > MAX_RANGE_BOUND {
        return Err(ApiError::BadRequest(format!(
            "age must be within {MIN_RANGE_BOUND}..={MAX_RANGE_BOUND}"
        )));
    }

    let handle = state
        .engine
        .encode(req.value)
        .map_err(|e| ApiError::Engine(e.to_string()))?;

    Ok(Json(HandleResponse { handle }))
}

async fn reveal(State(state): State<AppState>, Json(req): Json<RevealRequest>) -> Result<Json<RevealResponse>, ApiError> {
    let value = state
        .engine
        .reveal(&req.handle)
        .map_err(|e| ApiError::Engine(e.to_string()))?;

    Ok(Json(RevealResponse { value }))
}

// --- verification record store ---------------------------------------------

async fn submit(State(state): State<AppState>, Json(req): Json<SubmitRequest>) -> Result<Json<StatusResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    let note = ledger.submit(req.caller, req.encrypted_age)?;

    let record = ledger.record(req.caller).ok_or(ApiError::Internal)?;
    let total = ledger.stats().total_submissions;
    db::journal_submission(&state.db, req.caller, record, total).await?;

    db::append_notification(&state.db, &note).await?;
    log_notification(&note);
    Ok(Json(StatusResponse::new(req.caller, ledger.status(req.caller))))
}

async fn get_status(State(state): State<AppState>, Path(identity): Path<Identity>) -> Result<Json<StatusResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    Ok(Json(StatusResponse::new(identity, ledger.status(identity))))
}

async fn get_result(
    State(state): State<AppState>,
    Path(identity): Path<Identity>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<HandleResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    let handle = ledger.result_handle(req.caller, identity)?;
    Ok(Json(HandleResponse { handle }))
}

async fn complete(
    State(state): State<AppState>,
    Path(identity): Path<Identity>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    let note = ledger.complete_verification(req.caller, identity, req.is_adult)?;

    let idx = ledger.history_len() - 1;
    let entry = ledger.history_page(req.caller, idx, 1)?[0].clone();
    db::mark_record_completed(&state.db, identity).await?;
    db::append_history(&state.db, idx, &entry).await?;

    db::append_notification(&state.db, &note).await?;
    log_notification(&note);
    Ok(Json(CompleteResponse {
        identity,
        is_adult: entry.is_adult,
        timestamp: entry.timestamp,
    }))
}

async fn reset(
    State(state): State<AppState>,
    Path(identity): Path<Identity>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    ledger.reset(req.caller, identity)?;
    db::delete_record(&state.db, identity).await?;

    tracing::info!(%identity, "verification record reset");
    Ok(Json(StatusResponse::new(identity, ledger.status(identity))))
}

// --- predicate engine -------------------------------------------------------

async fn verify_range(State(state): State<AppState>, Json(req): Json<RangeRequest>) -> Result<Json<HandleResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    let handle = ledger.verify_range(req.caller, req.min_age, req.max_age)?;
    Ok(Json(HandleResponse { handle }))
}

async fn compare(State(state): State<AppState>, Json(req): Json<CompareRequest>) -> Result<Json<HandleResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    let handle = ledger.compare(req.caller, req.other)?;
    Ok(Json(HandleResponse { handle }))
}

// --- history & statistics ---------------------------------------------------

async fn is_user_adult(State(state): State<AppState>, Path(identity): Path<Identity>) -> Result<Json<AdultResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    let (known, is_adult) = ledger.is_user_adult(identity);
    Ok(Json(AdultResponse {
        identity,
        known,
        is_adult,
    }))
}

async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let start = params.start.unwrap_or(0);
    let count = params.count.unwrap_or(50).min(500);

    let ledger = state.ledger.read().await;
    let entries = ledger
        .history_page(params.caller, start, count)?
        .iter()
        .enumerate()
        .map(|(i, entry)| HistoryItem::new(start + i, entry))
        .collect();

    Ok(Json(HistoryResponse {
        start,
        total: ledger.history_len(),
        entries,
    }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    Ok(Json(ledger.stats().into()))
}

async fn verifier_status(State(state): State<AppState>, Path(identity): Path<Identity>) -> Result<Json<VerifierStatusResponse>, ApiError> {
    let ledger = state.ledger.read().await;
    Ok(Json(VerifierStatusResponse {
        identity,
        is_verifier: ledger.is_verifier(identity),
    }))
}

// --- authorization registry & pause gate ------------------------------------

async fn grant_verifier(State(state): State<AppState>, Json(req): Json<VerifierRequest>) -> Result<Json<VerifierStatusResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    let note = ledger.grant_verifier(req.caller, req.target)?;
    db::insert_verifier(&state.db, req.target).await?;

    db::append_notification(&state.db, &note).await?;
    log_notification(&note);
    Ok(Json(VerifierStatusResponse {
        identity: req.target,
        is_verifier: true,
    }))
}

async fn revoke_verifier(State(state): State<AppState>, Json(req): Json<VerifierRequest>) -> Result<Json<VerifierStatusResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    let note = ledger.revoke_verifier(req.caller, req.target)?;
    db::delete_verifier(&state.db, req.target).await?;

    db::append_notification(&state.db, &note).await?;
    log_notification(&note);
    Ok(Json(VerifierStatusResponse {
        identity: req.target,
        is_verifier: ledger.is_verifier(req.target),
    }))
}

async fn pause(State(state): State<AppState>, Json(req): Json<CallerRequest>) -> Result<Json<PausedResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    ledger.pause(req.caller)?;
    db::set_meta(&state.db, db::META_PAUSED, "1").await?;

    tracing::warn!(caller = %req.caller, "system paused");
    Ok(Json(PausedResponse { paused: true }))
}

async fn unpause(State(state): State<AppState>, Json(req): Json<CallerRequest>) -> Result<Json<PausedResponse>, ApiError> {
    let mut ledger = state.ledger.write().await;

    ledger.unpause(req.caller)?;
    db::set_meta(&state.db, db::META_PAUSED, "0").await?;

    tracing::info!(caller = %req.caller, "system unpaused");
    Ok(Json(PausedResponse { paused: false }))
}
