pub mod api;
pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod pagination;

pub use board::{AppQueueView, Board, BoardQuery, GuardOptions, QueueOptions, TrackedQueue};
pub use error::{BoardError, Result};
pub use jobs::{Job, JobCounts, JobStatus, JobStore, StatusView};
pub use pagination::{PageMarkers, PageRequest, PaginationResult, RangeResolver};
