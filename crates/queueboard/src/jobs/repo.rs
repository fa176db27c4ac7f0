// crates/queueboard/src/jobs/repo.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::jobs::model::{Job, JobCounts, JobStatus, NewJob};
use crate::jobs::store::JobStore;

#[derive(Debug, sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    name: String,
    enqueued_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    progress: Value,
    attempts_made: i32,
    delay_ms: i64,
    failed_reason: Option<String>,
    stacktrace: Vec<String>,
    opts_json: Value,
    data_json: Value,
    return_value_json: Option<Value>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id.to_string(),
            name: row.name,
            enqueued_at: row.enqueued_at.timestamp_millis(),
            processed_at: row.processed_at.map(|t| t.timestamp_millis()),
            finished_at: row.finished_at.map(|t| t.timestamp_millis()),
            progress: row.progress,
            attempts_made: row.attempts_made.max(0) as u32,
            delay: row.delay_ms,
            failed_reason: row.failed_reason,
            stacktrace: row.stacktrace,
            opts: row.opts_json,
            data: row.data_json,
            return_value: row.return_value_json.unwrap_or(Value::Null),
        }
    }
}

/// Postgres-backed store for one named queue.
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
    queue: String,
}

impl PgJobStore {
    pub fn new(pool: PgPool, queue: impl Into<String>) -> Self {
        Self {
            pool,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    // ----------------------------
    // Writes (seeding / operator tooling)
    // ----------------------------

    pub async fn enqueue(pool: &PgPool, job: NewJob) -> anyhow::Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO board_jobs
                (queue, name, status, data_json, opts_json, enqueued_at, failed_reason, stacktrace)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&job.queue)
        .bind(&job.name)
        .bind(job.status.as_str())
        .bind(&job.data)
        .bind(&job.opts)
        .bind(job.enqueued_at)
        .bind(&job.failed_reason)
        .bind(&job.stacktrace)
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    pub async fn set_paused(&self, paused: bool) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO board_queues (queue, paused)
            VALUES ($1, $2)
            ON CONFLICT (queue) DO UPDATE SET paused = EXCLUDED.paused
            "#,
        )
        .bind(&self.queue)
        .bind(paused)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn append_log(&self, job_id: Uuid, line: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO board_job_logs (job_id, line) VALUES ($1, $2)")
            .bind(job_id)
            .bind(line)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn status_names(statuses: &[JobStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT status, COUNT(*)::BIGINT
            FROM board_jobs
            WHERE queue = $1 AND status = ANY($2)
            GROUP BY status
            "#,
        )
        .bind(&self.queue)
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await?;

        let mut counts: JobCounts = statuses.iter().map(|s| (*s, 0)).collect();
        for (status, n) in rows {
            counts.set(status.parse()?, n.max(0) as u64);
        }
        Ok(counts)
    }

    /// Range applies per status (row number within the status, newest first),
    /// statuses come back in the order requested.
    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: u64,
        end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        if end < start {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT
                id, name, enqueued_at, processed_at, finished_at,
                progress, attempts_made, delay_ms,
                failed_reason, stacktrace,
                opts_json, data_json, return_value_json
            FROM (
                SELECT j.*,
                       ROW_NUMBER() OVER (
                           PARTITION BY status
                           ORDER BY enqueued_at DESC, id DESC
                       ) - 1 AS rn
                FROM board_jobs j
                WHERE queue = $1 AND status = ANY($2)
            ) ranked
            WHERE rn BETWEEN $3 AND $4
            ORDER BY array_position($2::TEXT[], status), rn
            "#,
        )
        .bind(&self.queue)
        .bind(status_names(statuses))
        .bind(start as i64)
        .bind(end as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Job::from).collect())
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        let paused: Option<bool> =
            sqlx::query_scalar("SELECT paused FROM board_queues WHERE queue = $1")
                .bind(&self.queue)
                .fetch_optional(&self.pool)
                .await?;
        Ok(paused.unwrap_or(false))
    }

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>> {
        // ids this store never handed out have no logs
        let Ok(job_id) = id.parse::<Uuid>() else {
            return Ok(Vec::new());
        };

        let lines = sqlx::query_scalar::<_, String>(
            r#"
            SELECT l.line
            FROM board_job_logs l
            JOIN board_jobs j ON j.id = l.job_id
            WHERE l.job_id = $1 AND j.queue = $2
            ORDER BY l.seq
            "#,
        )
        .bind(job_id)
        .bind(&self.queue)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }
}
