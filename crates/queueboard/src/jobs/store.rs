use async_trait::async_trait;

use crate::jobs::model::{Job, JobCounts, JobStatus, StatusView};

/// Read side of a job store, one handle per queue.
///
/// Ranges are index based and inclusive on both ends. When several statuses
/// are requested the range applies to each status on its own and the results
/// come back concatenated in the order the statuses were given. Within one
/// status jobs are ordered most recently enqueued first.
///
/// Nothing here is transactional: counts and ranges may disagree if the
/// store changes between calls.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_job_counts(&self, statuses: &[JobStatus]) -> anyhow::Result<JobCounts>;

    async fn get_jobs(
        &self,
        statuses: &[JobStatus],
        start: u64,
        end: u64,
    ) -> anyhow::Result<Vec<Job>>;

    async fn is_paused(&self) -> anyhow::Result<bool>;

    async fn get_job_logs(&self, id: &str) -> anyhow::Result<Vec<String>>;

    /// Statuses this store can list jobs under.
    fn job_statuses(&self) -> Vec<JobStatus> {
        JobStatus::ALL.to_vec()
    }

    /// Statuses offered in the queue's menu, Latest included.
    fn statuses(&self) -> Vec<StatusView> {
        StatusView::menu()
    }
}
