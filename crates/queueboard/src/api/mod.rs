use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::error;

use crate::board::{Board, GuardOptions};
use crate::error::BoardError;

pub mod models;

use models::{PageForDatetimeQuery, PageForDatetimeResponse, QueuesQuery, QueuesResponse};

#[derive(Clone, Debug)]
pub struct ApiSettings {
    pub default_jobs_per_page: u64,
    /// Guard applied to the jump-to-time lookup.
    pub datetime_lookup: GuardOptions,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            default_jobs_per_page: 10,
            datetime_lookup: GuardOptions::default(),
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub board: Arc<Board>,
    pub settings: ApiSettings,
}

impl ApiState {
    pub fn new(board: Board, settings: ApiSettings) -> Self {
        Self {
            board: Arc::new(board),
            settings,
        }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/queues", get(list_queues))
        .route(
            "/api/queues/:queue/page-for-datetime",
            get(page_for_datetime),
        )
        .route("/api/queues/:queue/:job_id/logs", get(job_logs))
        // Health
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

fn board_err(e: BoardError) -> ApiError {
    let status = match &e {
        BoardError::BadRequest(_) => StatusCode::BAD_REQUEST,
        BoardError::QueueNotFound(_) => StatusCode::NOT_FOUND,
        BoardError::ReadOnly(_) => StatusCode::METHOD_NOT_ALLOWED,
        BoardError::Store(_) => {
            error!(error = %e, "store unavailable");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

pub async fn list_queues(
    State(state): State<ApiState>,
    Query(q): Query<QueuesQuery>,
) -> Result<Json<QueuesResponse>, ApiError> {
    let query = q
        .into_board_query(state.settings.default_jobs_per_page)
        .map_err(board_err)?;

    let queues = state.board.queue_views(&query).await.map_err(board_err)?;

    Ok(Json(QueuesResponse { queues }))
}

pub async fn page_for_datetime(
    State(state): State<ApiState>,
    Path(queue): Path<String>,
    Query(q): Query<PageForDatetimeQuery>,
) -> Result<Json<PageForDatetimeResponse>, ApiError> {
    let (status, datetime, jobs_per_page) = q.required().map_err(board_err)?;

    let page_number = state
        .board
        .page_for_datetime(
            &queue,
            status,
            jobs_per_page,
            datetime,
            state.settings.datetime_lookup,
        )
        .await
        .map_err(board_err)?;

    Ok(Json(PageForDatetimeResponse { page_number }))
}

pub async fn job_logs(
    State(state): State<ApiState>,
    Path((queue, job_id)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let logs = state
        .board
        .job_logs(&queue, &job_id)
        .await
        .map_err(board_err)?;

    Ok(Json(logs))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
