use std::sync::Arc;

use queueboard::api::{self, ApiSettings, ApiState};
use queueboard::config::BoardConfig;
use queueboard::db;
use queueboard::jobs::PgJobStore;
use queueboard::{Board, GuardOptions, TrackedQueue};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = BoardConfig::from_env()?;

    info!(
        addr = %cfg.listen_addr,
        queues = ?cfg.queues,
        read_only = ?cfg.read_only_queues,
        jobs_per_page = cfg.default_jobs_per_page,
        migrate_on_startup = cfg.migrate_on_startup,
        "queueboard starting"
    );

    let pool = db::make_pool(&cfg.database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let mut board = Board::new();
    for queue in &cfg.queues {
        let store = Arc::new(PgJobStore::new(pool.clone(), queue.clone()));
        board.track(TrackedQueue::new(queue.clone(), store).with_options(cfg.queue_options(queue)));
    }

    let settings = ApiSettings {
        default_jobs_per_page: cfg.default_jobs_per_page,
        datetime_lookup: GuardOptions {
            skip_read_only_check: cfg.datetime_lookup_skips_read_only,
        },
    };
    let app = api::router(ApiState::new(board, settings));

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    info!("board api listening on http://{}", cfg.listen_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
