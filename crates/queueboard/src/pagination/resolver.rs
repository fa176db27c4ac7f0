//! Turns a page request into a bounded slice of a queue.
//!
//! Plain pages are one range read. Collapsed and filtered pages have
//! content-dependent boundaries, so they scan forward in batches and only
//! know the real page count once the scan runs off the end of the queue.
//! Batches are fetched one after another: run detection and match counting
//! depend on seeing jobs in store order.

use tracing::debug;

use crate::error::Result;
use crate::jobs::model::{Job, JobCounts, JobStatus};
use crate::jobs::store::JobStore;
use crate::pagination::{
    plain_pagination, total_for, ListingMode, PageRange, PageRequest, PaginationResult,
    ResolvedPage, MAX_BATCH, MAX_SEARCH_BUDGET,
};

pub struct RangeResolver<'a> {
    store: &'a dyn JobStore,
}

impl<'a> RangeResolver<'a> {
    pub fn new(store: &'a dyn JobStore) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, request: &PageRequest, counts: &JobCounts) -> Result<ResolvedPage> {
        request.validate()?;

        match request.mode() {
            ListingMode::Filter(name) => self.filtered(request, counts, name).await,
            ListingMode::Collapse => self.collapsed(request, counts).await,
            ListingMode::Plain => self.plain(request, counts).await,
        }
    }

    async fn plain(&self, request: &PageRequest, counts: &JobCounts) -> Result<ResolvedPage> {
        let pagination = plain_pagination(request, counts);
        let jobs = self
            .store
            .get_jobs(&request.statuses, pagination.range.start, pagination.range.end)
            .await?;

        Ok(ResolvedPage { jobs, pagination })
    }

    /// Whole runs of consecutive same-named jobs, at most `jobs_per_page`
    /// of them. The page ends right before the job that would open one run
    /// too many, so a run is never split across pages by the page limit.
    async fn collapsed(&self, request: &PageRequest, counts: &JobCounts) -> Result<ResolvedPage> {
        let per_page = request.jobs_per_page;
        let total = request.total(counts);
        let start = request.start();

        let mut end = start;
        let mut jobs: Vec<Job> = Vec::new();
        let mut current_run: Option<String> = None;
        let mut runs_found = 0u64;
        // set once a job that would open one run too many shows up
        let mut page_full = false;

        while !page_full && end < total {
            // NOTE: with runs_found == 0 this asks for close to MAX_BATCH
            // jobs on the first round trip, not a small growing window.
            let batch = (total - end)
                .min((runs_found + MAX_BATCH).saturating_sub(per_page))
                .max(1);
            let fetched = self
                .store
                .get_jobs(&request.statuses, end, end + batch - 1)
                .await?;

            // Latest reads each status over the range, so a batch can
            // overshoot the per-status cap
            let remaining = usize::try_from(total - end).unwrap_or(usize::MAX);
            let mut added = 0u64;
            for job in fetched.into_iter().take(remaining) {
                if current_run.as_deref() != Some(job.name.as_str()) {
                    if runs_found >= per_page {
                        page_full = true;
                        break;
                    }
                    current_run = Some(job.name.clone());
                    runs_found += 1;
                }
                jobs.push(job);
                added += 1;
            }

            end += added;
            if added == 0 {
                // counts ran ahead of the store
                break;
            }
        }

        debug!(start, end, total, runs_found, "collapsed page scanned");

        Ok(ResolvedPage {
            jobs,
            pagination: scanned_pagination(request, total, start, end),
        })
    }

    /// Exact name matches, bounded by the scan budget.
    async fn filtered(
        &self,
        request: &PageRequest,
        counts: &JobCounts,
        name: &str,
    ) -> Result<ResolvedPage> {
        let per_page = request.jobs_per_page;
        let total = request.total(counts);
        let start = request.start();

        let mut end = start;
        let mut examined = 0u64;
        let mut jobs: Vec<Job> = Vec::new();

        'scan: while (jobs.len() as u64) < per_page && end < total && examined < MAX_SEARCH_BUDGET
        {
            let batch = MAX_BATCH
                .min(total - end)
                .min(MAX_SEARCH_BUDGET - examined);
            let fetched = self
                .store
                .get_jobs(&request.statuses, end, end + batch - 1)
                .await?;

            if fetched.is_empty() {
                break;
            }

            let remaining = usize::try_from(total - end).unwrap_or(usize::MAX);
            for job in fetched.into_iter().take(remaining) {
                if examined >= MAX_SEARCH_BUDGET {
                    break 'scan;
                }
                examined += 1;
                end += 1;

                if job.name == name {
                    jobs.push(job);
                    if jobs.len() as u64 >= per_page {
                        break 'scan;
                    }
                }
            }
        }

        debug!(start, end, total, examined, matched = jobs.len(), "filtered page scanned");

        Ok(ResolvedPage {
            jobs,
            pagination: scanned_pagination(request, total, start, end),
        })
    }

    /// Page holding the first job enqueued at or before `datetime`.
    ///
    /// Stores order jobs newest first and have no timestamp index, so this is
    /// a linear scan from the top of the listing.
    pub async fn resolve_page_for_datetime(
        &self,
        statuses: &[JobStatus],
        counts: &JobCounts,
        jobs_per_page: u64,
        datetime: i64,
    ) -> Result<u64> {
        PageRequest::new(statuses.to_vec(), jobs_per_page).validate()?;

        let total = total_for(statuses, counts, jobs_per_page);
        let mut index = 0u64;

        while index < total {
            let batch = MAX_BATCH.min(total - index);
            let fetched = self.store.get_jobs(statuses, index, index + batch - 1).await?;
            if fetched.is_empty() {
                break;
            }

            let remaining = usize::try_from(total - index).unwrap_or(usize::MAX);
            for job in fetched.into_iter().take(remaining) {
                if job.enqueued_at <= datetime {
                    return Ok((index + 1).div_ceil(jobs_per_page));
                }
                index += 1;
            }
        }

        // nothing that old: last page reached
        Ok(index.div_ceil(jobs_per_page).max(1))
    }
}

fn scanned_pagination(request: &PageRequest, total: u64, start: u64, end: u64) -> PaginationResult {
    let page_count = if end == total {
        request.current_page
    } else {
        request.estimated_page_count(total)
    };

    PaginationResult {
        page_count,
        range: PageRange { start, end },
        next_cursor: end,
    }
}
