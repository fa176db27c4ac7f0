use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::jobs::model::Job;

/// The opaque job fields a store may want to render its own way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Data,
    Name,
    ReturnValue,
}

/// Per-store rendering of opaque job fields.
pub trait FieldFormatter: Send + Sync {
    fn format_field(&self, kind: FieldKind, value: Value, job: &Job) -> Value;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFormatter;

impl FieldFormatter for PassthroughFormatter {
    fn format_field(&self, _kind: FieldKind, value: Value, _job: &Job) -> Value {
        value
    }
}

type FieldHook = Arc<dyn Fn(Value, &Job) -> Value + Send + Sync>;

/// Table of hooks keyed by field; fields without a hook pass through.
#[derive(Clone, Default)]
pub struct FieldFormatters {
    hooks: HashMap<FieldKind, FieldHook>,
}

impl FieldFormatters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F>(mut self, kind: FieldKind, hook: F) -> Self
    where
        F: Fn(Value, &Job) -> Value + Send + Sync + 'static,
    {
        self.hooks.insert(kind, Arc::new(hook));
        self
    }
}

impl FieldFormatter for FieldFormatters {
    fn format_field(&self, kind: FieldKind, value: Value, job: &Job) -> Value {
        match self.hooks.get(&kind) {
            Some(hook) => hook(value, job),
            None => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayJob {
    pub id: String,
    pub timestamp: i64,
    pub processed_on: Option<i64>,
    pub finished_on: Option<i64>,
    pub progress: Value,
    pub attempts: u32,
    pub delay: i64,
    pub failed_reason: Option<String>,
    pub stacktrace: Vec<String>,
    pub opts: Value,
    pub data: Value,
    pub name: Value,
    pub return_value: Value,
    pub is_failed: bool,
}

/// Maps a store job to what the board shows. Never fails: anything the
/// store left empty stays empty.
pub fn project(job: &Job, formatter: &dyn FieldFormatter) -> DisplayJob {
    let stacktrace: Vec<String> = job
        .stacktrace
        .iter()
        .filter(|line| !line.is_empty())
        .cloned()
        .collect();

    let failed_reason = job.failed_reason.clone().filter(|r| !r.is_empty());
    let is_failed = failed_reason.is_some() || !stacktrace.is_empty();

    DisplayJob {
        id: job.id.clone(),
        timestamp: job.enqueued_at,
        processed_on: job.processed_at,
        finished_on: job.finished_at,
        progress: job.progress.clone(),
        attempts: job.attempts_made,
        delay: job.delay,
        failed_reason,
        stacktrace,
        opts: job.opts.clone(),
        data: formatter.format_field(FieldKind::Data, job.data.clone(), job),
        name: formatter.format_field(FieldKind::Name, Value::String(job.name.clone()), job),
        return_value: formatter.format_field(FieldKind::ReturnValue, job.return_value.clone(), job),
        is_failed,
    }
}
