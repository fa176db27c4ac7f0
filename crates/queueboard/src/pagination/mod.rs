pub mod markers;
pub mod resolver;

pub use markers::PageMarkers;
pub use resolver::RangeResolver;

use serde::Serialize;

use crate::error::{BoardError, Result};
use crate::jobs::model::{Job, JobCounts, JobStatus};

/// Largest range read issued in one round trip while scanning.
pub const MAX_BATCH: u64 = 1024;

/// Upper bound on jobs examined by one filtered page.
pub const MAX_SEARCH_BUDGET: u64 = MAX_BATCH * 20;

/// One page of one queue, as asked for by a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// A single status, or all of them for the Latest view.
    pub statuses: Vec<JobStatus>,
    pub jobs_per_page: u64,
    /// 1-based.
    pub current_page: u64,
    /// Absolute start index; wins over page arithmetic.
    pub after_cursor: Option<u64>,
    pub collapse_same_name: bool,
    pub filter_name: Option<String>,
    /// Milliseconds since the unix epoch.
    pub before_datetime: Option<i64>,
}

impl PageRequest {
    pub fn new(statuses: Vec<JobStatus>, jobs_per_page: u64) -> Self {
        Self {
            statuses,
            jobs_per_page,
            current_page: 1,
            after_cursor: None,
            collapse_same_name: false,
            filter_name: None,
            before_datetime: None,
        }
    }

    pub fn page(mut self, page: u64) -> Self {
        self.current_page = page;
        self
    }

    pub fn after(mut self, cursor: Option<u64>) -> Self {
        self.after_cursor = cursor;
        self
    }

    pub fn collapse_same_name(mut self, collapse: bool) -> Self {
        self.collapse_same_name = collapse;
        self
    }

    pub fn filter_name(mut self, name: Option<String>) -> Self {
        self.filter_name = name.filter(|n| !n.is_empty());
        self
    }

    pub fn before_datetime(mut self, datetime: Option<i64>) -> Self {
        self.before_datetime = datetime;
        self
    }

    pub fn is_latest(&self) -> bool {
        self.statuses.len() > 1
    }

    /// filter > collapse > plain.
    pub fn mode(&self) -> ListingMode<'_> {
        match (&self.filter_name, self.collapse_same_name) {
            (Some(name), _) => ListingMode::Filter(name),
            (None, true) => ListingMode::Collapse,
            (None, false) => ListingMode::Plain,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.statuses.is_empty() {
            return Err(BoardError::BadRequest("no status requested".into()));
        }
        if self.jobs_per_page == 0 {
            return Err(BoardError::BadRequest("jobsPerPage must be > 0".into()));
        }
        if self.current_page == 0 {
            return Err(BoardError::BadRequest("page must be >= 1".into()));
        }

        // the page's last index must be addressable
        let start = match self.after_cursor {
            Some(cursor) => Some(cursor),
            None => (self.current_page - 1).checked_mul(self.jobs_per_page),
        };
        if start.and_then(|s| s.checked_add(self.jobs_per_page)).is_none() {
            return Err(BoardError::BadRequest(format!(
                "page {} of {} jobs is out of range",
                self.current_page, self.jobs_per_page
            )));
        }
        Ok(())
    }

    /// Where the page starts: the cursor if given, else page arithmetic.
    /// Latest is a single page and always starts at 0.
    pub fn start(&self) -> u64 {
        self.after_cursor.unwrap_or(if self.is_latest() {
            0
        } else {
            self.current_page
                .saturating_sub(1)
                .saturating_mul(self.jobs_per_page)
        })
    }

    pub fn total(&self, counts: &JobCounts) -> u64 {
        total_for(&self.statuses, counts, self.jobs_per_page)
    }

    /// Page count when nothing better is known: exact for plain mode, an
    /// upper bound for the scanning modes.
    pub fn estimated_page_count(&self, total: u64) -> u64 {
        if self.is_latest() {
            1
        } else {
            total.div_ceil(self.jobs_per_page)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode<'a> {
    Filter(&'a str),
    Collapse,
    Plain,
}

/// Number of jobs a listing over `statuses` can reach. Latest caps each
/// status at one page because it is a single-page preview.
pub fn total_for(statuses: &[JobStatus], counts: &JobCounts, jobs_per_page: u64) -> u64 {
    match statuses {
        [status] => counts.get(*status),
        _ => statuses
            .iter()
            .map(|status| counts.get(*status).min(jobs_per_page))
            .sum(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    pub start: u64,
    pub end: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub page_count: u64,
    pub range: PageRange,
    /// Index the following page resumes from.
    #[serde(skip)]
    pub next_cursor: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPage {
    pub jobs: Vec<Job>,
    pub pagination: PaginationResult,
}

/// Pagination for plain mode, no store access needed.
pub fn plain_pagination(request: &PageRequest, counts: &JobCounts) -> PaginationResult {
    let total = request.total(counts);
    let start = request.start();
    let end = start
        .saturating_add(request.jobs_per_page)
        .saturating_sub(1);

    PaginationResult {
        page_count: request.estimated_page_count(total),
        range: PageRange { start, end },
        next_cursor: end.saturating_add(1),
    }
}
