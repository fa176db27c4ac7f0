use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoardError;

/// A job as the store hands it out. Everything except `id`, `name` and
/// `enqueued_at` is store-defined and may be missing or empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub name: String,

    /// Milliseconds since the unix epoch.
    pub enqueued_at: i64,
    pub processed_at: Option<i64>,
    pub finished_at: Option<i64>,

    #[serde(default)]
    pub progress: Value,
    #[serde(default)]
    pub attempts_made: u32,
    #[serde(default)]
    pub delay: i64,

    pub failed_reason: Option<String>,
    #[serde(default)]
    pub stacktrace: Vec<String>,

    #[serde(default)]
    pub opts: Value,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub return_value: Value,
}

impl Job {
    pub fn new(id: impl Into<String>, name: impl Into<String>, enqueued_at: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            enqueued_at,
            processed_at: None,
            finished_at: None,
            progress: Value::from(0),
            attempts_made: 0,
            delay: 0,
            failed_reason: None,
            stacktrace: Vec::new(),
            opts: Value::Object(Default::default()),
            data: Value::Null,
            return_value: Value::Null,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    Active,
    Waiting,
    WaitingChildren,
    Prioritized,
    Completed,
    Failed,
    Delayed,
    Paused,
}

impl JobStatus {
    pub const ALL: [JobStatus; 8] = [
        JobStatus::Active,
        JobStatus::Waiting,
        JobStatus::WaitingChildren,
        JobStatus::Prioritized,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Delayed,
        JobStatus::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Waiting => "waiting",
            JobStatus::WaitingChildren => "waitingChildren",
            JobStatus::Prioritized => "prioritized",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Delayed => "delayed",
            JobStatus::Paused => "paused",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| BoardError::BadRequest(format!("unknown job status: {s}")))
    }
}

/// What a queue listing is looking at: one real status, or the synthetic
/// union of all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusView {
    Latest,
    Only(JobStatus),
}

impl StatusView {
    /// The status menu every queue exposes, Latest first.
    pub fn menu() -> Vec<StatusView> {
        std::iter::once(StatusView::Latest)
            .chain(JobStatus::ALL.into_iter().map(StatusView::Only))
            .collect()
    }

    pub fn statuses(&self) -> Vec<JobStatus> {
        match self {
            StatusView::Latest => JobStatus::ALL.to_vec(),
            StatusView::Only(status) => vec![*status],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusView::Latest => "latest",
            StatusView::Only(status) => status.as_str(),
        }
    }
}

impl FromStr for StatusView {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "latest" {
            return Ok(StatusView::Latest);
        }
        s.parse().map(StatusView::Only)
    }
}

impl Serialize for StatusView {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-status job counts. Approximate: the store may change between this
/// read and any range read that follows it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobCounts(BTreeMap<JobStatus, u64>);

impl JobCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, status: JobStatus) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn set(&mut self, status: JobStatus, count: u64) {
        self.0.insert(status, count);
    }

    pub fn with(mut self, status: JobStatus, count: u64) -> Self {
        self.set(status, count);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobStatus, u64)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

impl FromIterator<(JobStatus, u64)> for JobCounts {
    fn from_iter<I: IntoIterator<Item = (JobStatus, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub queue: String,
    pub name: String,
    pub status: JobStatus,
    pub data: Value,
    pub opts: Value,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
    pub failed_reason: Option<String>,
    pub stacktrace: Vec<String>,
}
