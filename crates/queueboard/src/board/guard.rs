use crate::board::{Board, TrackedQueue};
use crate::error::{BoardError, Result};
use crate::jobs::model::StatusView;
use crate::pagination::RangeResolver;

/// How a guarded endpoint treats read-only queues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardOptions {
    pub skip_read_only_check: bool,
}

impl GuardOptions {
    /// For endpoints that only read, even though they go through the guard.
    pub fn read_like() -> Self {
        Self {
            skip_read_only_check: true,
        }
    }
}

impl Board {
    /// Looks up a queue for an endpoint that may act on it. Read-only queues
    /// are refused unless the endpoint opted out.
    pub fn guarded(&self, name: &str, opts: GuardOptions) -> Result<&TrackedQueue> {
        let queue = self
            .get(name)
            .ok_or_else(|| BoardError::QueueNotFound(name.to_string()))?;

        if queue.options.read_only && !opts.skip_read_only_check {
            return Err(BoardError::ReadOnly(name.to_string()));
        }
        Ok(queue)
    }

    /// Page of `status` holding the first job enqueued at or before
    /// `datetime`, from fresh counts.
    pub async fn page_for_datetime(
        &self,
        name: &str,
        status: StatusView,
        jobs_per_page: u64,
        datetime: i64,
        opts: GuardOptions,
    ) -> Result<u64> {
        let queue = self.guarded(name, opts)?;
        let statuses = status.statuses();
        let counts = queue.store.get_job_counts(&statuses).await?;

        RangeResolver::new(queue.store.as_ref())
            .resolve_page_for_datetime(&statuses, &counts, jobs_per_page, datetime)
            .await
    }

    pub async fn job_logs(&self, name: &str, job_id: &str) -> Result<Vec<String>> {
        let queue = self.guarded(name, GuardOptions::read_like())?;
        Ok(queue.store.get_job_logs(job_id).await?)
    }
}
