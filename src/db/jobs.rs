//! Job queue recorder: durable records of deferred work.
//!
//! Invoice/payment actions are fire-and-forget: the caller gets a job id
//! back and an out-of-process worker picks the record up later. The backing
//! table is the one piece of schema this crate owns, bootstrapped lazily on
//! first use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::schema::Fields;
use crate::error::{Error, Result};

/// Table owned by this subsystem; created on first enqueue if missing.
pub const JOB_TABLE: &str = "integration_job";

/// Lifecycle status of an async job. Only `queued` is written here; the
/// rest belong to the out-of-process worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(Error::Other(format!("unknown job status: {s}"))),
        }
    }
}

/// A recorded async job.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: i64,
    pub job_type: String,
    pub status: JobStatus,
    /// The original request body, stored verbatim.
    pub payload: serde_json::Value,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl super::Db {
    /// Create the job table if it does not exist. Idempotent.
    pub async fn ensure_job_table(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS integration_job (
                 id BIGSERIAL PRIMARY KEY,
                 job_type VARCHAR(64) NOT NULL,
                 status VARCHAR(16) NOT NULL DEFAULT 'queued',
                 payload JSONB NOT NULL,
                 error TEXT,
                 created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                 updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             )",
        )
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Record a deferred unit of work in status `queued` and return the
    /// generated id. The payload is never inspected beyond being
    /// serializable.
    pub async fn enqueue_job(&self, job_type: &str, payload: serde_json::Value) -> Result<i64> {
        if !self.table_exists(JOB_TABLE).await? {
            self.ensure_job_table().await?;
        }

        let now = Utc::now();
        let id = self
            .insert_filtered(
                JOB_TABLE,
                Fields::new()
                    .set("job_type", job_type)
                    .set("status", JobStatus::Queued.to_string())
                    .set("payload", payload)
                    .set("created_at", now)
                    .set("updated_at", now),
            )
            .await?;
        tracing::info!(job_type, job_id = id, "async job enqueued");
        Ok(id)
    }

    /// Get a recorded job by id.
    pub async fn job(&self, id: i64) -> Result<Job> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT id::BIGINT AS id, job_type, status, payload, error, created_at, updated_at
             FROM integration_job WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or_else(|| Error::NotFound(format!("job {id}")))?
            .try_into_job()
    }
}

/// Internal row type for sqlx::FromRow.
#[derive(sqlx::FromRow)]
struct JobRow {
    id: i64,
    job_type: String,
    status: String,
    payload: serde_json::Value,
    error: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRow {
    fn try_into_job(self) -> Result<Job> {
        Ok(Job {
            id: self.id,
            job_type: self.job_type,
            status: self.status.parse()?,
            payload: self.payload,
            error: self.error,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
