//! In-process job store, handy for demos and for exercising the resolver
//! without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::jobs::model::{Job, JobCounts, JobStatus};
use crate::jobs::store::JobStore;

#[derive(Default)]
struct MemoryQueue {
    // newest first, per status
    jobs: HashMap<JobStatus, Vec<Job>>,
    paused: bool,
    logs: HashMap<String, Vec<String>>,
}

#[derive(Default)]
pub struct MemoryJobStore {
    state: RwLock<MemoryQueue>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a job as the most recent one of `status`.
    pub async fn add(&self, status: JobStatus, job: Job) {
        let mut state = self.state.write().await;
        state.jobs.entry(status).or_default().insert(0, job);
    }

    /// Replaces the jobs of `status`, given newest first.
    pub async fn set_jobs(&self, status: JobStatus, jobs: Vec<Job>) {
        let mut state = self.state.write().await;
        state.jobs.insert(status, jobs);
    }

    /// Removes a job wherever it is. Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        let mut removed = false;
        for jobs in state.jobs.values_mut() {
            let before = jobs.len();
            jobs.retain(|job| job.id != id);
            removed |= jobs.len() != before;
        }
        removed
    }

    pub async fn set_paused(&self, paused: bool) {
        self.state.write().await.paused = paused;
    }

    pub async fn append_log(&self, id: &str, line: impl Into<String>) {
        let mut state = self.state.write().await;
        state.logs.entry(id.to_string()).or_default().push(line.into());
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts> {
        let state = self.state.read().await;
        Ok(statuses
            .iter()
            .map(|status| {
                let count = state.jobs.get(status).map_or(0, Vec::len);
                (*status, count as u64)
            })
            .collect())
    }

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: u64,
        end: u64,
    ) -> anyhow::Result<Vec<Job>> {
        let state = self.state.read().await;
        let mut out = Vec::new();
        if end < start {
            return Ok(out);
        }

        let skip = usize::try_from(start).unwrap_or(usize::MAX);
        let take = usize::try_from(end - start)
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        for status in statuses {
            if let Some(jobs) = state.jobs.get(status) {
                out.extend(jobs.iter().skip(skip).take(take).cloned());
            }
        }
        Ok(out)
    }

    async fn is_paused(&self) -> anyhow::Result<bool> {
        Ok(self.state.read().await.paused)
    }

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>> {
        let state = self.state.read().await;
        Ok(state.logs.get(id).cloned().unwrap_or_default())
    }
}
