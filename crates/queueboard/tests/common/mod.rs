#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use queueboard::jobs::{Job, JobCounts, JobStatus, JobStore, MemoryJobStore};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Job ids read as `<name>-<index>` so assertions stay legible.
pub fn job(index: usize, name: &str, enqueued_at: i64) -> Job {
    Job::new(format!("{name}-{index}"), name, enqueued_at)
}

/// Store whose `status` listing holds `names` in store order, index 0 being
/// the most recent job.
pub async fn store_with(status: JobStatus, names: &[&str]) -> MemoryJobStore {
    let store = MemoryJobStore::new();
    let jobs = names
        .iter()
        .enumerate()
        .map(|(i, name)| job(i, name, 1_000_000 - i as i64))
        .collect();
    store.set_jobs(status, jobs).await;
    store
}

/// Store whose `status` listing has the given enqueue timestamps, in order.
pub async fn store_with_timestamps(status: JobStatus, timestamps: &[i64]) -> MemoryJobStore {
    let store = MemoryJobStore::new();
    let jobs = timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| job(i, "tick", *ts))
        .collect();
    store.set_jobs(status, jobs).await;
    store
}

pub fn names(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|j| j.name.as_str()).collect()
}

pub fn ids(jobs: &[Job]) -> Vec<&str> {
    jobs.iter().map(|j| j.id.as_str()).collect()
}

/// Splits a job list into runs of consecutive equal names.
pub fn runs(jobs: &[Job]) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = Vec::new();
    for job in jobs {
        if let Some((name, n)) = out.last_mut() {
            if *name == job.name {
                *n += 1;
                continue;
            }
        }
        out.push((job.name.clone(), 1));
    }
    out
}

/// Tracks how many jobs and range reads a store has served.
pub struct CountingStore<S> {
    pub inner: S,
    pub jobs_served: AtomicU64,
    pub range_reads: AtomicU64,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            jobs_served: AtomicU64::new(0),
            range_reads: AtomicU64::new(0),
        }
    }

    pub fn jobs_served(&self) -> u64 {
        self.jobs_served.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: JobStore> JobStore for CountingStore<S> {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        self.inner.get_job_counts(statuses).await
    }

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: u64,
        end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        let jobs = self.inner.get_jobs(statuses, start, end).await?;
        self.range_reads.fetch_add(1, Ordering::SeqCst);
        self.jobs_served.fetch_add(jobs.len() as u64, Ordering::SeqCst);
        Ok(jobs)
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        self.inner.is_paused().await
    }

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>> {
        self.inner.get_job_logs(id).await
    }
}

/// Reports `extra` more jobs per status than it holds, like a store that
/// lost jobs between the count read and the range reads.
pub struct SkewedCounts<S> {
    pub inner: S,
    pub extra: u64,
}

#[async_trait]
impl<S: JobStore> JobStore for SkewedCounts<S> {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        let counts = self.inner.get_job_counts(statuses).await?;
        Ok(statuses
            .iter()
            .map(|s| (*s, counts.get(*s) + self.extra))
            .collect())
    }

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: u64,
        end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        self.inner.get_jobs(statuses, start, end).await
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        self.inner.is_paused().await
    }

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>> {
        self.inner.get_job_logs(id).await
    }
}

/// A store that is down.
pub struct DownStore;

#[async_trait]
impl JobStore for DownStore {
    async fn get_job_counts(&self, _statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        anyhow::bail!("connection refused")
    }

    async fn get_jobs(
        &self,
        _statuses: &[JobStatus],
        _start: u64,
        _end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        anyhow::bail!("connection refused")
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        anyhow::bail!("connection refused")
    }

    async fn get_job_logs(&self, _id: &str) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("connection refused")
    }
}

/// Counts succeed, range reads fail.
pub struct RangeReadsDown<S> {
    pub inner: S,
}

#[async_trait]
impl<S: JobStore> JobStore for RangeReadsDown<S> {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        self.inner.get_job_counts(statuses).await
    }

    async fn get_jobs(
        &self,
        _statuses: &[JobStatus],
        _start: u64,
        _end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        anyhow::bail!("read timed out")
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        self.inner.is_paused().await
    }

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>> {
        self.inner.get_job_logs(id).await
    }
}

/// Postgres pool for store tests, or `None` when `TEST_DATABASE_URL` is not
/// set so the suite still runs without a database.
pub async fn setup_db() -> Option<PgPool> {
    let _ = dotenvy::dotenv();

    let url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    sqlx::query(
        r#"
        TRUNCATE TABLE
            board_job_logs,
            board_queues,
            board_jobs
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(&pool)
    .await
    .expect("truncate failed");

    Some(pool)
}
