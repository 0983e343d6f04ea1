mod common;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use polycopy::engine::{aggregator, monitor};
use polycopy::errors::AppError;
use polycopy::models::{DecisionKind, DecisionStatus, RunStats, RunStatus};

#[tokio::test]
async fn test_performance_nets_same_day_pnl() {
    let pool = common::setup_test_db().await;
    let config = common::seed_config(&pool, "fp-1", 42, 1000).await;

    let day1 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let day2 = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

    common::seed_closed(&pool, &config, Decimal::from(3), day1, day1 + Duration::hours(2)).await;
    common::seed_closed(&pool, &config, Decimal::from(-5), day2, day2 + Duration::hours(1)).await;
    common::seed_closed(&pool, &config, Decimal::from(12), day2, day2 + Duration::hours(5)).await;

    let perf = aggregator::performance_for_config(&pool, config.id).await.unwrap();

    assert_eq!(perf.daily_points.len(), 2);
    assert_eq!(perf.daily_points[1].date, day2.date_naive());
    assert_eq!(perf.daily_points[1].pnl, Decimal::from(7));
    assert_eq!(perf.daily_points[1].copies, 2);

    let running = &perf.cumulative.running_totals;
    assert_eq!(running[1] - running[0], Decimal::from(7));
    assert_eq!(running[1], Decimal::from(10));
    assert!(perf.cumulative.is_positive);

    assert_eq!(perf.total_pnl, Decimal::from(10));
    assert_eq!(perf.total_copies, 3);
    assert_eq!(perf.win_rate, Decimal::from(2) / Decimal::from(3));
}

#[tokio::test]
async fn test_performance_unknown_config() {
    let pool = common::setup_test_db().await;
    assert!(matches!(
        aggregator::performance_for_config(&pool, 404).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_dashboard_without_stopped_has_zero_win_rate() {
    let pool = common::setup_test_db().await;
    let acct = common::account("fp-1");
    let config = common::seed_config(&pool, "fp-1", 42, 1000).await;

    let now = Utc::now();
    let copy = common::new_copy(config.id, Decimal::new(40, 2), Decimal::from(100));
    common::seed_decision(&pool, &config, &copy, DecisionStatus::Executed, now).await;
    let mut skip = copy.clone();
    skip.decision = DecisionKind::Skip;
    skip.size_usdc = Decimal::ZERO;
    common::seed_decision(&pool, &config, &skip, DecisionStatus::Skipped, now).await;

    let dashboard = aggregator::dashboard(&pool, &acct).await.unwrap();
    assert_eq!(dashboard.stats.win_rate, Decimal::ZERO);
    assert_eq!(dashboard.stats.total_copies, 1);
    assert_eq!(dashboard.stats.total_skipped, 1);
    assert_eq!(dashboard.stats.open_positions, 1);
    assert_eq!(dashboard.stats.active_configs, 1);
    assert_eq!(dashboard.configs.len(), 1);
    assert_eq!(dashboard.configs[0].stats.open_positions, 1);
}

#[tokio::test]
async fn test_dashboard_recent_feed_is_capped_and_newest_first() {
    let pool = common::setup_test_db().await;
    let acct = common::account("fp-1");
    let config = common::seed_config(&pool, "fp-1", 42, 1000).await;

    let base = Utc::now() - Duration::hours(2);
    for i in 0..15 {
        let new = common::new_copy(config.id, Decimal::new(40, 2), Decimal::from(i));
        common::seed_decision(&pool, &config, &new, DecisionStatus::Pending, base + Duration::minutes(i))
            .await;
    }

    let dashboard = aggregator::dashboard(&pool, &acct).await.unwrap();
    assert_eq!(dashboard.recent_decisions.len(), aggregator::RECENT_DECISIONS_LIMIT);
    assert_eq!(dashboard.recent_decisions[0].size_usdc, Decimal::from(14));
    assert_eq!(dashboard.recent_decisions[9].size_usdc, Decimal::from(5));
}

#[tokio::test]
async fn test_dashboard_empty_account() {
    let pool = common::setup_test_db().await;
    let dashboard = aggregator::dashboard(&pool, &common::account("nobody")).await.unwrap();
    assert_eq!(dashboard.stats, aggregator::DashboardStats::default());
    assert!(dashboard.configs.is_empty());
    assert!(dashboard.recent_decisions.is_empty());
}

#[tokio::test]
async fn test_monitor_buckets_and_recent_runs() {
    let pool = common::setup_test_db().await;
    let now = Utc.with_ymd_and_hms(2026, 5, 10, 14, 30, 0).unwrap();

    let stats = |wallets: i64, copies: i64| RunStats {
        wallets_checked: wallets,
        decisions_copy: copies,
        ..RunStats::default()
    };

    common::seed_run(&pool, now - Duration::minutes(20), Some(1_500), stats(10, 2)).await;
    common::seed_run(&pool, now - Duration::minutes(5), Some(500), stats(4, 1)).await;
    common::seed_run(&pool, now - Duration::hours(3), Some(2_000), stats(7, 0)).await;
    // outside a 2-hour window
    common::seed_run(&pool, now - Duration::hours(30), Some(100), stats(99, 9)).await;
    // still going
    common::seed_run(&pool, now - Duration::minutes(1), None, RunStats::default()).await;

    let report = monitor::report(&pool, Some(4), Some(3), now).await.unwrap();

    assert_eq!(report.hourly_stats.len(), 4);
    assert_eq!(report.hourly_stats[0].runs, 3);
    assert_eq!(report.hourly_stats[0].wallets_checked, 14);
    assert_eq!(report.hourly_stats[0].decisions_copy, 3);
    assert_eq!(report.hourly_stats[3].runs, 1);
    assert_eq!(report.hourly_stats[3].wallets_checked, 7);
    assert_eq!(report.enabled_configs, 0);

    assert_eq!(report.recent_runs.len(), 3);
    assert_eq!(report.recent_runs[0].status, RunStatus::Running);
    assert_eq!(report.recent_runs[0].duration_ms, None);
    assert_eq!(report.recent_runs[1].duration_ms, Some(500));
    assert_eq!(report.recent_runs[2].duration_ms, Some(1_500));
}

#[tokio::test]
async fn test_monitor_reads_legacy_error_status() {
    let pool = common::setup_test_db().await;
    sqlx::query(
        "INSERT INTO job_runs (job_name, started_at, status, stats, error_text) VALUES (?1, ?2, 'error', '{\"errors\": 2}', 'rpc timeout')",
    )
    .bind("copy_trade_syncer")
    .bind(Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    common::seed_config(&pool, "fp-1", 1, 100).await;

    let report = monitor::report(&pool, None, None, Utc::now()).await.unwrap();
    assert_eq!(report.hourly_stats.len(), 24);
    assert_eq!(report.hourly_stats[0].errors, 2);
    assert_eq!(report.recent_runs[0].status, RunStatus::Failed);
    assert_eq!(report.recent_runs[0].error_text.as_deref(), Some("rpc timeout"));
    assert_eq!(report.enabled_configs, 1);
}
