use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use queueboard::jobs::{JobStatus, NewJob, PgJobStore, StatusView};
use queueboard::{Board, BoardQuery, JobStore, PageMarkers, PageRequest, RangeResolver, TrackedQueue};
use rand::Rng;
use serde_json::json;
use sqlx::{postgres::PgPoolOptions, PgPool};

const USAGE: &str = "boardctl <command>\n\
     Commands:\n\
     - reset\n\
     - seed <queue> <n>\n\
     - page <queue> <status|latest> <page> [collapse | filter=<name>]\n\
     - walk <queue> <status>          (collapsed pages, following page markers)\n\
     - jump <queue> <status> <rfc3339>\n\
     - watch <queue> <status|latest> <secs>\n\
     \n\
     Uses DATABASE_URL or TEST_DATABASE_URL.\n";

const PER_PAGE: u64 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    let url = env::var("DATABASE_URL")
        .or_else(|_| env::var("TEST_DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("DATABASE_URL or TEST_DATABASE_URL must be set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    let arg = |i: usize| arg_at(&args, i);

    match args[1].as_str() {
        "reset" => reset(&pool).await?,
        "seed" => {
            let n: usize = arg(3).ok().and_then(|s| s.parse().ok()).unwrap_or(50);
            seed(&pool, arg(2)?, n).await?;
        }
        "page" => {
            let page: u64 = arg(4)?.parse()?;
            show_page(&pool, arg(2)?, arg(3)?.parse()?, page, args.get(5).map(String::as_str))
                .await?;
        }
        "walk" => walk(&pool, arg(2)?, arg(3)?.parse()?).await?,
        "jump" => {
            let at: DateTime<Utc> = arg(4)?.parse()?;
            jump(&pool, arg(2)?, arg(3)?.parse()?, at).await?;
        }
        "watch" => {
            let secs: u64 = arg(4)?.parse()?;
            watch(&pool, arg(2)?, arg(3)?.parse()?, secs.max(1)).await?;
        }
        other => {
            eprintln!("Unknown command: {other}");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn arg_at(args: &[String], i: usize) -> anyhow::Result<&str> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing argument {i}\n\n{USAGE}"))
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            board_job_logs,
            board_queues,
            board_jobs
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(pool)
    .await?;

    println!("reset OK");
    Ok(())
}

/// Inserts runs of same-named jobs, newest last, spread over the past hours.
async fn seed(pool: &PgPool, queue: &str, n: usize) -> anyhow::Result<()> {
    const NAMES: [&str; 4] = ["email_send", "resize_image", "sync_account", "report"];
    const STATUSES: [JobStatus; 3] = [JobStatus::Waiting, JobStatus::Completed, JobStatus::Failed];

    let mut rng = rand::thread_rng();
    let mut at = Utc::now() - chrono::Duration::seconds(n as i64 * 60);
    let mut inserted = 0;

    while inserted < n {
        let name = NAMES[rng.gen_range(0..NAMES.len())];
        let run = rng.gen_range(1..=5).min(n - inserted);

        for _ in 0..run {
            let status = STATUSES[rng.gen_range(0..STATUSES.len())];
            let failed = status == JobStatus::Failed;
            at += chrono::Duration::seconds(rng.gen_range(1..=60));

            let id = PgJobStore::enqueue(
                pool,
                NewJob {
                    queue: queue.to_string(),
                    name: name.to_string(),
                    status,
                    data: json!({ "title": name, "seq": inserted }),
                    opts: json!({ "attempts": 3 }),
                    enqueued_at: at,
                    failed_reason: failed.then(|| format!("Random error {inserted}")),
                    stacktrace: if failed {
                        vec![format!("Error: Random error {inserted}"), String::new()]
                    } else {
                        Vec::new()
                    },
                },
            )
            .await?;

            inserted += 1;
            println!("+ {status:<9} {name} id={id}");
        }
    }

    Ok(())
}

async fn show_page(
    pool: &PgPool,
    queue: &str,
    status: StatusView,
    page: u64,
    mode: Option<&str>,
) -> anyhow::Result<()> {
    let store = PgJobStore::new(pool.clone(), queue);
    let counts = store.get_job_counts(&status.statuses()).await?;

    let mut request = PageRequest::new(status.statuses(), PER_PAGE).page(page);
    match mode {
        Some("collapse") => request = request.collapse_same_name(true),
        Some(m) if m.starts_with("filter=") => {
            request = request.filter_name(Some(m.trim_start_matches("filter=").to_string()))
        }
        Some(other) => anyhow::bail!("unknown mode: {other}"),
        None => {}
    }

    let resolved = RangeResolver::new(&store).resolve(&request, &counts).await?;
    println!(
        "page {page}/{} range={}..{} jobs={}",
        resolved.pagination.page_count,
        resolved.pagination.range.start,
        resolved.pagination.range.end,
        resolved.jobs.len()
    );
    for job in resolved.jobs {
        println!("  {} {} enqueued_at={}", job.id, job.name, job.enqueued_at);
    }

    Ok(())
}

/// Pages through a collapsed listing the way the dashboard does, feeding
/// each page's end marker back as the next page's cursor.
async fn walk(pool: &PgPool, queue: &str, status: StatusView) -> anyhow::Result<()> {
    let store = PgJobStore::new(pool.clone(), queue);
    let resolver = RangeResolver::new(&store);
    let mut markers = PageMarkers::new();

    for page in 1..=1000 {
        let counts = store.get_job_counts(&status.statuses()).await?;
        let request = PageRequest::new(status.statuses(), PER_PAGE)
            .page(page)
            .after(markers.after(page))
            .collapse_same_name(true);

        let resolved = resolver.resolve(&request, &counts).await?;
        markers.record(page, &resolved.pagination);

        let mut runs: Vec<(String, usize)> = Vec::new();
        for job in &resolved.jobs {
            if let Some((name, n)) = runs.last_mut() {
                if *name == job.name {
                    *n += 1;
                    continue;
                }
            }
            runs.push((job.name.clone(), 1));
        }
        let summary: Vec<String> = runs.iter().map(|(name, n)| format!("{name}x{n}")).collect();
        println!(
            "page {page} [{}..{}) {}",
            resolved.pagination.range.start,
            resolved.pagination.range.end,
            summary.join(" ")
        );

        if resolved.jobs.is_empty() || resolved.pagination.page_count == page {
            break;
        }
    }

    Ok(())
}

async fn jump(
    pool: &PgPool,
    queue: &str,
    status: StatusView,
    at: DateTime<Utc>,
) -> anyhow::Result<()> {
    let store = PgJobStore::new(pool.clone(), queue);
    let counts = store.get_job_counts(&status.statuses()).await?;
    let page = RangeResolver::new(&store)
        .resolve_page_for_datetime(&status.statuses(), &counts, PER_PAGE, at.timestamp_millis())
        .await?;

    println!("{} enqueued at or before {at} starts on page {page}", status.as_str());
    Ok(())
}

/// Re-resolves the first page on an interval. Each poll stands on its own
/// and replaces whatever the previous one printed.
async fn watch(pool: &PgPool, queue: &str, status: StatusView, secs: u64) -> anyhow::Result<()> {
    let mut board = Board::new();
    board.track(TrackedQueue::new(
        queue,
        Arc::new(PgJobStore::new(pool.clone(), queue)),
    ));
    let query = BoardQuery::new(PER_PAGE).active(queue, status);

    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        for view in board.queue_views(&query).await? {
            let counts: Vec<String> = view
                .counts
                .iter()
                .filter(|(_, n)| *n > 0)
                .map(|(s, n)| format!("{s}={n}"))
                .collect();
            println!(
                "[{}] {} paused={} {}",
                Utc::now().format("%H:%M:%S"),
                view.name,
                view.is_paused,
                counts.join(" ")
            );
            if let Some(err) = view.error {
                println!("  error: {err}");
            }
            for job in view.jobs {
                println!("  {} {} failed={}", job.id, job.name, job.is_failed);
            }
        }
    }

    Ok(())
}
