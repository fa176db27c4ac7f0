// crates/queueboard/src/api/models.rs
use serde::{Deserialize, Serialize};

use crate::board::{AppQueueView, BoardQuery};
use crate::error::{BoardError, Result};
use crate::jobs::model::StatusView;

/// Query string of `GET /api/queues`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuesQuery {
    pub active_queue: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub after: Option<u64>,
    pub jobs_per_page: Option<u64>,
    pub collapse_same_name_jobs: Option<bool>,
    pub filter_job_name: Option<String>,
    pub before_datetime: Option<i64>,
}

impl QueuesQuery {
    pub fn into_board_query(self, default_jobs_per_page: u64) -> Result<BoardQuery> {
        let status = parse_status(self.status.as_deref())?.unwrap_or(StatusView::Latest);

        Ok(BoardQuery {
            active_queue: self.active_queue.filter(|q| !q.is_empty()),
            status,
            page: self.page.unwrap_or(1),
            after: self.after,
            jobs_per_page: self.jobs_per_page.unwrap_or(default_jobs_per_page),
            collapse_same_name: self.collapse_same_name_jobs.unwrap_or(false),
            filter_name: self.filter_job_name.filter(|n| !n.is_empty()),
            before_datetime: self.before_datetime,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct QueuesResponse {
    pub queues: Vec<AppQueueView>,
}

/// Query string of `GET /api/queues/:queue/page-for-datetime`. Every field
/// is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageForDatetimeQuery {
    pub status: Option<String>,
    pub datetime: Option<i64>,
    pub jobs_per_page: Option<u64>,
}

impl PageForDatetimeQuery {
    pub fn required(&self) -> Result<(StatusView, i64, u64)> {
        match (
            parse_status(self.status.as_deref())?,
            self.datetime,
            self.jobs_per_page,
        ) {
            (Some(status), Some(datetime), Some(jobs_per_page)) => {
                Ok((status, datetime, jobs_per_page))
            }
            _ => Err(BoardError::BadRequest(
                "Not all required params provided".into(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageForDatetimeResponse {
    pub page_number: u64,
}

fn parse_status(raw: Option<&str>) -> Result<Option<StatusView>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.parse().map(Some),
        None => Ok(None),
    }
}
