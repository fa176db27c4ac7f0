use queueboard::config::BoardConfig;
use serial_test::serial;

const KEYS: [&str; 10] = [
    "BOARD_DATABASE_URL",
    "DATABASE_URL",
    "BOARD_QUEUES",
    "QUEUES",
    "BOARD_READ_ONLY_QUEUES",
    "BOARD_QUEUE_PREFIX",
    "BOARD_ALLOW_RETRIES",
    "BOARD_JOBS_PER_PAGE",
    "BOARD_DATETIME_LOOKUP_SKIPS_READ_ONLY",
    "BOARD_MIGRATE_ON_STARTUP",
];

fn clear_env() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn defaults_with_only_a_database_url() {
    clear_env();
    std::env::set_var("DATABASE_URL", "postgres://localhost/board");

    let cfg = BoardConfig::from_env().unwrap();

    assert_eq!(cfg.database_url, "postgres://localhost/board");
    assert_eq!(cfg.queues, ["default"]);
    assert!(cfg.read_only_queues.is_empty());
    assert_eq!(cfg.default_jobs_per_page, 10);
    assert!(cfg.allow_retries);
    assert!(!cfg.migrate_on_startup);
    assert!(!cfg.datetime_lookup_skips_read_only);

    clear_env();
}

#[test]
#[serial]
fn board_prefixed_vars_win_and_lists_are_trimmed() {
    clear_env();
    std::env::set_var("DATABASE_URL", "postgres://localhost/other");
    std::env::set_var("BOARD_DATABASE_URL", "postgres://localhost/board");
    std::env::set_var("BOARD_QUEUES", " emails, reports ,,archive ");
    std::env::set_var("BOARD_READ_ONLY_QUEUES", "archive");
    std::env::set_var("BOARD_QUEUE_PREFIX", "bull:");
    std::env::set_var("BOARD_ALLOW_RETRIES", "false");
    std::env::set_var("BOARD_JOBS_PER_PAGE", "0");
    std::env::set_var("BOARD_DATETIME_LOOKUP_SKIPS_READ_ONLY", "yes");

    let cfg = BoardConfig::from_env().unwrap();

    assert_eq!(cfg.database_url, "postgres://localhost/board");
    assert_eq!(cfg.queues, ["emails", "reports", "archive"]);
    // zero is not a page size
    assert_eq!(cfg.default_jobs_per_page, 10);
    assert!(cfg.datetime_lookup_skips_read_only);

    let archive = cfg.queue_options("archive");
    assert!(archive.read_only);
    assert!(!archive.allow_retries);
    assert_eq!(archive.prefix, "bull:");
    assert!(!cfg.queue_options("emails").read_only);

    clear_env();
}

#[test]
#[serial]
fn missing_database_url_is_an_error() {
    clear_env();

    assert!(BoardConfig::from_env().is_err());
}
