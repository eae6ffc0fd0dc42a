// ==========================================
// EventWindowFetcher 集成测试
// ==========================================
// 测试目标: 窗口取数、时间戳数值化、排序与二次过滤
// ==========================================


use test_helpers::*;
use workstation_oee::engine::{drop_before, CalcError, EventWindowFetcher, WindowMode};
use workstation_oee::logging;

const MIDNIGHT_MS: i64 = 1_772_668_800_000; // 2026-03-05T00:00:00Z
const SHIFT_START_MS: i64 = MIDNIGHT_MS + 6 * 3600 * 1000;
const NOW_MS: i64 = MIDNIGHT_MS + 10 * 3600 * 1000;

#[tokio::test]
async fn test_fetch_sorts_out_of_order_rows() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (_entities, logs) = open_stores(&db_path);
    let table = workstation_table();

    // 乱序写入
    logs.append(
        &table,
        &[
            log_row(SHIFT_START_MS + 3_000, "Available", "false"),
            log_row(SHIFT_START_MS + 1_000, "Available", "true"),
            log_row(SHIFT_START_MS + 2_000, "Available", "true"),
        ],
    )
    .unwrap();

    let fetcher = EventWindowFetcher::new(logs.as_ref());
    let events = fetcher
        .fetch(&table, WindowMode::FromMidnight, MIDNIGHT_MS, SHIFT_START_MS, NOW_MS)
        .await
        .unwrap();
    let timestamps: Vec<i64> = events.iter().map(|e| e.timestamp_ms).collect();
    assert_eq!(
        timestamps,
        vec![SHIFT_START_MS + 1_000, SHIFT_START_MS + 2_000, SHIFT_START_MS + 3_000]
    );
}

#[tokio::test]
async fn test_window_mode_bounds_are_honored() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (_entities, logs) = open_stores(&db_path);
    let table = workstation_table();

    // 一条在零点后班次前, 一条在班次后, 一条在 now 之后
    logs.append(
        &table,
        &[
            log_row(MIDNIGHT_MS + 1_000, "Available", "true"),
            log_row(SHIFT_START_MS + 1_000, "Available", "false"),
            log_row(NOW_MS + 1_000, "Available", "true"),
        ],
    )
    .unwrap();

    let fetcher = EventWindowFetcher::new(logs.as_ref());
    let from_midnight = fetcher
        .fetch(&table, WindowMode::FromMidnight, MIDNIGHT_MS, SHIFT_START_MS, NOW_MS)
        .await
        .unwrap();
    assert_eq!(from_midnight.len(), 2);

    let from_shift_start = fetcher
        .fetch(&table, WindowMode::FromShiftStart, MIDNIGHT_MS, SHIFT_START_MS, NOW_MS)
        .await
        .unwrap();
    assert_eq!(from_shift_start.len(), 1);
    assert_eq!(from_shift_start[0].timestamp_ms, SHIFT_START_MS + 1_000);
}

#[tokio::test]
async fn test_missing_table_is_empty_window() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (_entities, logs) = open_stores(&db_path);

    let fetcher = EventWindowFetcher::new(logs.as_ref());
    let events = fetcher
        .fetch(
            "workstation_never_seen",
            WindowMode::FromMidnight,
            MIDNIGHT_MS,
            SHIFT_START_MS,
            NOW_MS,
        )
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_non_numeric_timestamp_is_fatal() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (_entities, logs) = open_stores(&db_path);
    let table = job_table();

    logs.append(&table, &[log_row(SHIFT_START_MS, "GoodPartCounter", "5")])
        .unwrap();
    // 直接塞入损坏行: 数字后缀垃圾, 会落入 SQL 窗口但无法整数化
    logs.append(
        &table,
        &[workstation_oee::repository::LogRow {
            recvtimets: format!("{}.75", SHIFT_START_MS + 1_000),
            attrname: "GoodPartCounter".to_string(),
            attrvalue: "6".to_string(),
        }],
    )
    .unwrap();

    let fetcher = EventWindowFetcher::new(logs.as_ref());
    let err = fetcher
        .fetch(&table, WindowMode::FromShiftStart, MIDNIGHT_MS, SHIFT_START_MS, NOW_MS)
        .await
        .unwrap_err();
    assert!(matches!(err, CalcError::InvalidSample { .. }));
}

#[tokio::test]
async fn test_drop_before_defends_early_device_writes() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (_entities, logs) = open_stores(&db_path);
    let table = job_table();

    let ref_start_ms = SHIFT_START_MS + 30 * 60 * 1000;
    logs.append(
        &table,
        &[
            log_row(SHIFT_START_MS + 1_000, "GoodPartCounter", "2"),
            log_row(ref_start_ms, "GoodPartCounter", "4"),
            log_row(ref_start_ms + 1_000, "GoodPartCounter", "6"),
        ],
    )
    .unwrap();

    let fetcher = EventWindowFetcher::new(logs.as_ref());
    let events = fetcher
        .fetch(&table, WindowMode::FromShiftStart, MIDNIGHT_MS, SHIFT_START_MS, NOW_MS)
        .await
        .unwrap();
    assert_eq!(events.len(), 3);

    let kept = drop_before(events, ref_start_ms);
    assert_eq!(kept.len(), 2);
    assert!(kept.iter().all(|e| e.timestamp_ms >= ref_start_ms));
}
