use crate::errors::ApiError;
use chrono::{DateTime, Utc};
use fhe_engine::handle::CiphertextHandle;
use ledger::history::HistoryEntry;
use ledger::identity::Identity;
use ledger::records::VerificationRecord;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use uuid::Uuid;

pub type Db = Pool<Sqlite>;

pub const META_OWNER: &str = "owner";
pub const META_PAUSED: &str = "paused";
pub const META_TOTAL_SUBMISSIONS: &str = "total_submissions";

pub async fn connect(db_url: &str) -> Result<Db, ApiError> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .map_err(|_| ApiError::Internal)
}

pub async fn init_schema(db: &Db) -> Result<(), ApiError> {
    // NOTE: Keep schema minimal and explicit. The database is a durable
    // journal of committed ledger state; ciphertext material itself is
    // never persisted, only engine tokens.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS meta (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
  identity TEXT PRIMARY KEY,
  submitted_at TEXT NOT NULL,
  completed INTEGER NOT NULL,
  age_token TEXT NOT NULL,
  adult_token TEXT NOT NULL,
  bit_width INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS history (
  idx INTEGER PRIMARY KEY,
  subject TEXT NOT NULL,
  is_adult INTEGER NOT NULL,
  completed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS verifiers (
  identity TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS notifications (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  created_at TEXT NOT NULL,
  payload TEXT NOT NULL
);
"#,
    )
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn get_meta(db: &Db, key: &str) -> Result<Option<String>, ApiError> {
    let row = sqlx::query(r#"SELECT value FROM meta WHERE key = ?"#)
        .bind(key)
        .fetch_optional(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(row.map(|r| r.get(0)))
}

pub async fn set_meta(db: &Db, key: &str, value: &str) -> Result<(), ApiError> {
    sqlx::query(r#"INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)"#)
        .bind(key)
        .bind(value)
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

/// Journal a committed submission: the record row and the submission
/// counter go into the database in one transaction, so a crash between
/// the two writes cannot leave the journal with a record the counter
/// does not account for.
pub async fn journal_submission(
    db: &Db,
    identity: Identity,
    record: &VerificationRecord,
    total_submissions: u64,
) -> Result<(), ApiError> {
    let mut tx = db.begin().await.map_err(|_| ApiError::Internal)?;

    sqlx::query(
        r#"INSERT OR REPLACE INTO records
           (identity, submitted_at, completed, age_token, adult_token, bit_width)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(identity.to_string())
    .bind(record.submitted_at.to_rfc3339())
    .bind(if record.completed { 1i64 } else { 0i64 })
    .bind(record.encrypted_age.token.to_string())
    .bind(record.is_adult.token.to_string())
    .bind(record.encrypted_age.bit_width as i64)
    .execute(&mut *tx)
    .await
    .map_err(|_| ApiError::Internal)?;

    sqlx::query(r#"INSERT OR REPLACE INTO meta (key, value) VALUES (?, ?)"#)
        .bind(META_TOTAL_SUBMISSIONS)
        .bind(total_submissions.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|_| ApiError::Internal)?;

    tx.commit().await.map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn mark_record_completed(db: &Db, identity: Identity) -> Result<(), ApiError> {
    sqlx::query(r#"UPDATE records SET completed = 1 WHERE identity = ?"#)
        .bind(identity.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn delete_record(db: &Db, identity: Identity) -> Result<(), ApiError> {
    sqlx::query(r#"DELETE FROM records WHERE identity = ?"#)
        .bind(identity.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn list_records(db: &Db) -> Result<Vec<(Identity, VerificationRecord)>, ApiError> {
    let rows = sqlx::query(
        r#"SELECT identity, submitted_at, completed, age_token, adult_token, bit_width
           FROM records"#,
    )
    .fetch_all(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let identity: String = row.get(0);
        let submitted_at: String = row.get(1);
        let completed: i64 = row.get(2);
        let age_token: String = row.get(3);
        let adult_token: String = row.get(4);
        let bit_width: i64 = row.get(5);

        let identity: Identity = identity.parse().map_err(|_| ApiError::Internal)?;
        let submitted_at = DateTime::parse_from_rfc3339(&submitted_at)
            .map_err(|_| ApiError::Internal)?
            .with_timezone(&Utc);
        let age_token: Uuid = age_token.parse().map_err(|_| ApiError::Internal)?;
        let adult_token: Uuid = adult_token.parse().map_err(|_| ApiError::Internal)?;
        let bit_width = bit_width as u8;

        out.push((
            identity,
            VerificationRecord {
                encrypted_age: CiphertextHandle { bit_width, token: age_token },
                is_adult: CiphertextHandle { bit_width, token: adult_token },
                submitted_at,
                completed: completed == 1,
            },
        ));
    }

    Ok(out)
}

pub async fn append_history(db: &Db, idx: usize, entry: &HistoryEntry) -> Result<(), ApiError> {
    sqlx::query(
        r#"INSERT INTO history (idx, subject, is_adult, completed_at)
           VALUES (?, ?, ?, ?)"#,
    )
    .bind(idx as i64)
    .bind(entry.subject.to_string())
    .bind(if entry.is_adult { 1i64 } else { 0i64 })
    .bind(entry.timestamp.to_rfc3339())
    .execute(db)
    .await
    .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn list_history(db: &Db) -> Result<Vec<HistoryEntry>, ApiError> {
    let rows = sqlx::query(r#"SELECT subject, is_adult, completed_at FROM history ORDER BY idx"#)
        .fetch_all(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let subject: String = row.get(0);
        let is_adult: i64 = row.get(1);
        let completed_at: String = row.get(2);

        out.push(HistoryEntry {
            subject: subject.parse().map_err(|_| ApiError::Internal)?,
            is_adult: is_adult == 1,
            timestamp: DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|_| ApiError::Internal)?
                .with_timezone(&Utc),
            success: true,
        });
    }

    Ok(out)
}

/// Journal an emitted notification for observers (UI feeds, audits).
pub async fn append_notification(
    db: &Db,
    note: &ledger::events::Notification,
) -> Result<(), ApiError> {
    let payload = serde_json::to_string(note).map_err(|_| ApiError::Internal)?;

    sqlx::query(r#"INSERT INTO notifications (created_at, payload) VALUES (?, ?)"#)
        .bind(Utc::now().to_rfc3339())
        .bind(payload)
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    Ok(())
}

pub async fn insert_verifier(db: &Db, identity: Identity) -> Result<(), ApiError> {
    sqlx::query(r#"INSERT OR REPLACE INTO verifiers (identity) VALUES (?)"#)
        .bind(identity.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn delete_verifier(db: &Db, identity: Identity) -> Result<(), ApiError> {
    sqlx::query(r#"DELETE FROM verifiers WHERE identity = ?"#)
        .bind(identity.to_string())
        .execute(db)
        .await
        .map_err(|_| ApiError::Internal)?;
    Ok(())
}

pub async fn list_verifiers(db: &Db) -> Result<Vec<Identity>, ApiError> {
    let rows = sqlx::query(r#"SELECT identity FROM verifiers"#)
        .fetch_all(db)
        .await
        .map_err(|_| ApiError::Internal)?;

    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let identity: String = row.get(0);
        out.push(identity.parse().map_err(|_| ApiError::Internal)?);
    }

    Ok(out)
}
