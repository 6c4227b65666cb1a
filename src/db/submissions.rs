use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{Inserted, NewSubmission, Submission, Track};

use super::SubmissionRepository;

/// Inserts the row unless the idempotency key already exists. Returns `None`
/// on conflict.
pub async fn create(
    pool: &PgPool,
    record: &NewSubmission,
) -> Result<Option<(i64, DateTime<Utc>)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, DateTime<Utc>)>(
        "INSERT INTO submissions
            (track, applicant_name, email, phone, payload_json, uploads_json, idempotency_key)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         ON CONFLICT (idempotency_key) DO NOTHING
         RETURNING id, created_at",
    )
    .bind(record.track.as_str())
    .bind(&record.applicant_name)
    .bind(&record.email)
    .bind(&record.phone)
    .bind(&record.payload)
    .bind(&record.uploads)
    .bind(&record.idempotency_key)
    .fetch_optional(pool)
    .await
}

pub async fn find_by_idempotency_key(
    pool: &PgPool,
    key: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &PgPool, track: Option<Track>) -> Result<Vec<Submission>, sqlx::Error> {
    match track {
        Some(track) => {
            sqlx::query_as::<_, Submission>(
                "SELECT * FROM submissions WHERE track = $1 ORDER BY id DESC",
            )
            .bind(track.as_str())
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Submission>("SELECT * FROM submissions ORDER BY id DESC")
                .fetch_all(pool)
                .await
        }
    }
}

/// Postgres-backed repository. The pool is built from the privileged
/// connection string when one is configured.
pub struct PgSubmissionRepository {
    pool: PgPool,
}

impl PgSubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionRepository for PgSubmissionRepository {
    async fn insert(&self, record: &NewSubmission) -> Result<Inserted, String> {
        let created = create(&self.pool, record)
            .await
            .map_err(|e| format!("Error saving submission: {e}"))?;

        if let Some((id, created_at)) = created {
            return Ok(Inserted {
                id,
                created_at,
                duplicate: false,
            });
        }

        let existing = find_by_idempotency_key(&self.pool, &record.idempotency_key)
            .await
            .map_err(|e| format!("Error loading existing submission: {e}"))?
            .ok_or_else(|| "Insert conflicted but no existing row was found".to_string())?;

        Ok(Inserted {
            id: existing.id,
            created_at: existing.created_at,
            duplicate: true,
        })
    }

    async fn list(&self, track: Option<Track>) -> Result<Vec<Submission>, String> {
        list(&self.pool, track)
            .await
            .map_err(|e| format!("Error loading submissions: {e}"))
    }
}
