use crate::board::QueueOptions;

// Runtime configuration for the board, loaded from the environment.
#[derive(Clone, Debug)]
pub struct BoardConfig {
    pub database_url: String,
    pub listen_addr: String,
    pub migrate_on_startup: bool,

    /// Queues to track, in display order.
    pub queues: Vec<String>,
    pub read_only_queues: Vec<String>,
    pub queue_prefix: String,
    pub allow_retries: bool,
    pub allow_completed_retries: bool,

    pub default_jobs_per_page: u64,
    /// Lets the jump-to-time lookup through on read-only queues.
    pub datetime_lookup_skips_read_only: bool,
}

impl BoardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env_or_fallback("BOARD_DATABASE_URL", "DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let listen_addr = env_or_fallback("BOARD_ADDR", "ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string());

        let migrate_on_startup = env_bool("BOARD_MIGRATE_ON_STARTUP").unwrap_or(false);

        let queues = env_or_fallback("BOARD_QUEUES", "QUEUES")
            .map(|s| split_list(&s))
            .unwrap_or_else(|| vec!["default".to_string()]);

        let read_only_queues = std::env::var("BOARD_READ_ONLY_QUEUES")
            .ok()
            .map(|s| split_list(&s))
            .unwrap_or_default();

        let queue_prefix = std::env::var("BOARD_QUEUE_PREFIX").unwrap_or_default();

        let allow_retries = env_bool("BOARD_ALLOW_RETRIES").unwrap_or(true);
        let allow_completed_retries = env_bool("BOARD_ALLOW_COMPLETED_RETRIES").unwrap_or(true);

        let default_jobs_per_page = std::env::var("BOARD_JOBS_PER_PAGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u64| *n > 0)
            .unwrap_or(10);

        let datetime_lookup_skips_read_only =
            env_bool("BOARD_DATETIME_LOOKUP_SKIPS_READ_ONLY").unwrap_or(false);

        Ok(Self {
            database_url,
            listen_addr,
            migrate_on_startup,
            queues,
            read_only_queues,
            queue_prefix,
            allow_retries,
            allow_completed_retries,
            default_jobs_per_page,
            datetime_lookup_skips_read_only,
        })
    }

    pub fn queue_options(&self, queue: &str) -> QueueOptions {
        QueueOptions {
            read_only: self.read_only_queues.iter().any(|q| q == queue),
            allow_retries: self.allow_retries,
            allow_completed_retries: self.allow_completed_retries,
            description: None,
            prefix: self.queue_prefix.clone(),
        }
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
