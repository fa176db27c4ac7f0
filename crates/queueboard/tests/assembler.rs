mod common;

use std::sync::Arc;

use common::{store_with, store_with_timestamps, DownStore, RangeReadsDown};
use queueboard::jobs::{JobStatus, MemoryJobStore, StatusView};
use queueboard::pagination::PageRange;
use queueboard::{AppQueueView, Board, BoardError, BoardQuery, QueueOptions, TrackedQueue};

fn view<'a>(views: &'a [AppQueueView], name: &str) -> &'a AppQueueView {
    views
        .iter()
        .find(|v| v.name == name)
        .unwrap_or_else(|| panic!("no view named {name}"))
}

async fn board() -> Board {
    let emails = store_with(JobStatus::Failed, &["send", "send", "bounce"]).await;
    let reports = store_with(JobStatus::Completed, &["daily"; 25]).await;

    let mut board = Board::new();
    board.track(TrackedQueue::new("emails", Arc::new(emails)));
    board.track(TrackedQueue::new("reports", Arc::new(reports)));
    board.track(TrackedQueue::new("broken", Arc::new(DownStore)));
    board
}

#[tokio::test]
async fn only_the_active_queue_gets_jobs() {
    let board = board().await;
    let query = BoardQuery::new(10).active("emails", StatusView::Only(JobStatus::Failed));

    let views = board.queue_views(&query).await.unwrap();
    assert_eq!(views.len(), 3);

    let emails = view(&views, "emails");
    assert_eq!(emails.jobs.len(), 3);
    assert_eq!(emails.counts.get(JobStatus::Failed), 3);
    assert_eq!(emails.statuses, StatusView::menu());
    let pagination = emails.pagination.as_ref().unwrap();
    assert_eq!(pagination.page_count, 1);
    assert_eq!(pagination.range, PageRange { start: 0, end: 9 });

    let reports = view(&views, "reports");
    assert!(reports.jobs.is_empty());
    assert_eq!(reports.counts.get(JobStatus::Completed), 25);
    // inactive queues are paginated as Latest
    assert_eq!(reports.pagination.as_ref().unwrap().page_count, 1);
    assert!(reports.error.is_none());
}

#[tokio::test]
async fn a_failing_store_only_degrades_its_own_view() {
    let board = board().await;
    let query = BoardQuery::new(10).active("broken", StatusView::Latest);

    let views = board.queue_views(&query).await.unwrap();

    let broken = view(&views, "broken");
    assert!(broken.error.is_some());
    assert!(broken.jobs.is_empty());
    assert!(broken.pagination.is_none());

    for name in ["emails", "reports"] {
        let healthy = view(&views, name);
        assert!(healthy.error.is_none(), "{name} picked up the failure");
        assert!(healthy.pagination.is_some());
    }
}

#[tokio::test]
async fn range_failure_keeps_the_counts() {
    let inner = store_with(JobStatus::Waiting, &["a", "b"]).await;
    let mut board = Board::new();
    board.track(TrackedQueue::new("flaky", Arc::new(RangeReadsDown { inner })));

    let query = BoardQuery::new(10).active("flaky", StatusView::Only(JobStatus::Waiting));
    let views = board.queue_views(&query).await.unwrap();

    let flaky = view(&views, "flaky");
    assert_eq!(flaky.counts.get(JobStatus::Waiting), 2);
    assert!(flaky.jobs.is_empty());
    assert!(flaky.pagination.is_none());
    assert!(flaky.error.as_deref().unwrap().contains("read timed out"));
}

#[tokio::test]
async fn before_datetime_picks_the_page() {
    let timestamps: Vec<i64> = (1..=10).rev().map(|i| i * 10).collect();
    let store = store_with_timestamps(JobStatus::Completed, &timestamps).await;
    let mut board = Board::new();
    board.track(TrackedQueue::new("ticks", Arc::new(store)));

    let mut query = BoardQuery::new(3).active("ticks", StatusView::Only(JobStatus::Completed));
    query.before_datetime = Some(60);
    // a stale cursor must not win over the looked up page
    query.after = Some(8);

    let views = board.queue_views(&query).await.unwrap();
    let ticks = view(&views, "ticks");

    let pagination = ticks.pagination.as_ref().unwrap();
    assert_eq!(pagination.range, PageRange { start: 3, end: 5 });
    assert_eq!(pagination.page_count, 4);
    let ids: Vec<&str> = ticks.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, ["tick-3", "tick-4", "tick-5"]);
}

#[tokio::test]
async fn queue_options_show_up_in_the_view() {
    let store = MemoryJobStore::new();
    store.set_paused(true).await;

    let mut board = Board::new();
    board.track(
        TrackedQueue::new("emails", Arc::new(store)).with_options(QueueOptions {
            read_only: true,
            allow_retries: false,
            allow_completed_retries: false,
            description: Some("outbound mail".into()),
            prefix: "bull:".into(),
        }),
    );

    let views = board.queue_views(&BoardQuery::new(10)).await.unwrap();
    let emails = view(&views, "bull:emails");

    assert!(emails.read_only_mode);
    assert!(!emails.allow_retries);
    assert!(!emails.allow_completed_retries);
    assert!(emails.is_paused);
    assert_eq!(emails.description.as_deref(), Some("outbound mail"));
}

#[tokio::test]
async fn tracking_a_name_twice_replaces_the_queue() {
    let mut board = Board::new();
    board.track(TrackedQueue::new("emails", Arc::new(DownStore)));
    board.track(TrackedQueue::new("emails", Arc::new(MemoryJobStore::new())));

    assert_eq!(board.queues().len(), 1);

    let views = board.queue_views(&BoardQuery::new(10)).await.unwrap();
    assert!(views[0].error.is_none());
}

#[tokio::test]
async fn invalid_query_is_rejected_up_front() {
    let board = board().await;

    let err = board.queue_views(&BoardQuery::new(0)).await.unwrap_err();
    assert!(matches!(err, BoardError::BadRequest(_)));

    let mut query = BoardQuery::new(10);
    query.page = 0;
    let err = board.queue_views(&query).await.unwrap_err();
    assert!(matches!(err, BoardError::BadRequest(_)));
}

#[tokio::test]
async fn view_serializes_for_the_dashboard() {
    let board = board().await;
    let query = BoardQuery::new(10).active("emails", StatusView::Only(JobStatus::Failed));

    let views = board.queue_views(&query).await.unwrap();
    let json = serde_json::to_value(view(&views, "emails")).unwrap();

    assert_eq!(json["readOnlyMode"], false);
    assert_eq!(json["isPaused"], false);
    assert_eq!(json["statuses"][0], "latest");
    assert_eq!(json["counts"]["failed"], 3);
    assert_eq!(json["pagination"]["pageCount"], 1);
    assert_eq!(json["pagination"]["range"]["start"], 0);
    assert!(json.get("error").is_none());
    assert_eq!(json["jobs"][2]["name"], "bounce");
}
