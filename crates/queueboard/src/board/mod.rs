//! Per-queue read models for the dashboard.
//!
//! Every tracked queue reports its counts and pause state on every poll. Only
//! the queue being drilled into pays for resolving a page of jobs; the rest
//! come back with an empty job list.

pub mod guard;

pub use guard::GuardOptions;

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use crate::error::{BoardError, Result};
use crate::jobs::model::{JobCounts, StatusView};
use crate::jobs::store::JobStore;
use crate::jobs::view::{project, DisplayJob, FieldFormatter, PassthroughFormatter};
use crate::pagination::{plain_pagination, PageRequest, PaginationResult, RangeResolver};

/// Policy flags a tracked queue carries. Mutating collaborators must honor
/// them; the board itself only reads.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub read_only: bool,
    pub allow_retries: bool,
    pub allow_completed_retries: bool,
    pub description: Option<String>,
    /// Prepended to the queue name when it is displayed.
    pub prefix: String,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            allow_retries: true,
            allow_completed_retries: true,
            description: None,
            prefix: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct TrackedQueue {
    pub name: String,
    pub store: Arc<dyn JobStore>,
    pub options: QueueOptions,
    pub formatter: Arc<dyn FieldFormatter>,
}

impl TrackedQueue {
    pub fn new(name: impl Into<String>, store: Arc<dyn JobStore>) -> Self {
        Self {
            name: name.into(),
            store,
            options: QueueOptions::default(),
            formatter: Arc::new(PassthroughFormatter),
        }
    }

    pub fn with_options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn FieldFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn display_name(&self) -> String {
        format!("{}{}", self.options.prefix, self.name)
    }
}

/// What the caller wants to see across all tracked queues.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardQuery {
    pub active_queue: Option<String>,
    pub status: StatusView,
    pub page: u64,
    pub after: Option<u64>,
    pub jobs_per_page: u64,
    pub collapse_same_name: bool,
    pub filter_name: Option<String>,
    pub before_datetime: Option<i64>,
}

impl BoardQuery {
    pub fn new(jobs_per_page: u64) -> Self {
        Self {
            active_queue: None,
            status: StatusView::Latest,
            page: 1,
            after: None,
            jobs_per_page,
            collapse_same_name: false,
            filter_name: None,
            before_datetime: None,
        }
    }

    pub fn active(mut self, queue: impl Into<String>, status: StatusView) -> Self {
        self.active_queue = Some(queue.into());
        self.status = status;
        self
    }

    fn is_active(&self, queue: &TrackedQueue) -> bool {
        self.active_queue.as_deref() == Some(queue.name.as_str())
    }

    fn page_request(&self, status: StatusView) -> PageRequest {
        PageRequest::new(status.statuses(), self.jobs_per_page)
            .page(self.page)
            .after(self.after)
            .collapse_same_name(self.collapse_same_name)
            .filter_name(self.filter_name.clone())
            .before_datetime(self.before_datetime)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppQueueView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub statuses: Vec<StatusView>,
    pub counts: JobCounts,
    pub jobs: Vec<DisplayJob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationResult>,
    pub read_only_mode: bool,
    pub allow_retries: bool,
    pub allow_completed_retries: bool,
    pub is_paused: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppQueueView {
    fn empty(queue: &TrackedQueue) -> Self {
        Self {
            name: queue.display_name(),
            description: queue.options.description.clone(),
            statuses: queue.store.statuses(),
            counts: JobCounts::new(),
            jobs: Vec::new(),
            pagination: None,
            read_only_mode: queue.options.read_only,
            allow_retries: queue.options.allow_retries,
            allow_completed_retries: queue.options.allow_completed_retries,
            is_paused: false,
            error: None,
        }
    }

    fn failed(mut self, queue: &TrackedQueue, err: BoardError) -> Self {
        warn!(queue = %queue.name, error = %err, "queue view degraded");
        self.jobs.clear();
        self.pagination = None;
        self.error = Some(err.to_string());
        self
    }
}

/// The set of queues the dashboard tracks, in display order.
#[derive(Clone, Default)]
pub struct Board {
    queues: Vec<TrackedQueue>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a queue, replacing any queue already tracked under that name.
    pub fn track(&mut self, queue: TrackedQueue) {
        match self.queues.iter_mut().find(|q| q.name == queue.name) {
            Some(existing) => *existing = queue,
            None => self.queues.push(queue),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TrackedQueue> {
        self.queues.iter().find(|q| q.name == name)
    }

    pub fn queues(&self) -> &[TrackedQueue] {
        &self.queues
    }

    /// One view per tracked queue. Queues are loaded concurrently and a
    /// failing queue only degrades its own view.
    pub async fn queue_views(&self, query: &BoardQuery) -> Result<Vec<AppQueueView>> {
        query.page_request(query.status).validate()?;

        Ok(join_all(self.queues.iter().map(|queue| self.queue_view(queue, query))).await)
    }

    async fn queue_view(&self, queue: &TrackedQueue, query: &BoardQuery) -> AppQueueView {
        let is_active = query.is_active(queue);
        let status = if is_active {
            query.status
        } else {
            StatusView::Latest
        };
        let mut view = AppQueueView::empty(queue);

        let counts = match queue
            .store
            .get_job_counts(&queue.store.job_statuses())
            .await
        {
            Ok(counts) => counts,
            Err(e) => return view.failed(queue, e.into()),
        };
        view.counts = counts.clone();

        view.is_paused = match queue.store.is_paused().await {
            Ok(paused) => paused,
            Err(e) => return view.failed(queue, e.into()),
        };

        let request = query.page_request(status);
        if !is_active {
            view.pagination = Some(plain_pagination(&request, &counts));
            return view;
        }

        match resolve_active(queue, request, &counts).await {
            Ok((jobs, pagination)) => {
                view.jobs = jobs;
                view.pagination = Some(pagination);
                view
            }
            Err(e) => view.failed(queue, e),
        }
    }
}

async fn resolve_active(
    queue: &TrackedQueue,
    mut request: PageRequest,
    counts: &JobCounts,
) -> Result<(Vec<DisplayJob>, PaginationResult)> {
    let resolver = RangeResolver::new(queue.store.as_ref());

    if let Some(datetime) = request.before_datetime {
        let page = resolver
            .resolve_page_for_datetime(&request.statuses, counts, request.jobs_per_page, datetime)
            .await?;
        request = request.page(page).after(None);
    }

    let page = resolver.resolve(&request, counts).await?;
    let jobs = page
        .jobs
        .iter()
        .map(|job| project(job, queue.formatter.as_ref()))
        .collect();

    Ok((jobs, page.pagination))
}
