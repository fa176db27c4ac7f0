use thiserror::Error;

/// Errors surfaced by the board to its callers.
///
/// Client mistakes (`BadRequest`, `QueueNotFound`), policy rejections
/// (`ReadOnly`) and store availability problems (`Store`) are kept apart so the
/// HTTP layer can answer each one differently and callers know which ones are
/// worth retrying.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("queue not found: {0}")]
    QueueNotFound(String),

    #[error("method not allowed on read only queue: {0}")]
    ReadOnly(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;
