// ==========================================
// SweepRunner 故障隔离测试
// ==========================================
// 测试目标: 连接级故障中止整轮; 单工位故障不影响其余工位
// ==========================================


use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use test_helpers::*;
use workstation_oee::domain::{names, Attribute, AttributeValue, ReferenceEntity};
use workstation_oee::engine::{SweepRunner, WorkstationOutcome};
use workstation_oee::logging;
use workstation_oee::repository::{
    EntityStore, EventLogStore, LogRow, RepositoryError, RepositoryResult, SqliteEntityStore,
};

/// 模拟存储连接断开的实体库
struct DownEntityStore;

#[async_trait]
impl EntityStore for DownEntityStore {
    async fn fetch(&self, _id: &str) -> RepositoryResult<ReferenceEntity> {
        Err(RepositoryError::DatabaseConnectionError("连接被拒绝".to_string()))
    }

    async fn update_attributes(
        &self,
        _id: &str,
        _attributes: BTreeMap<String, Attribute>,
    ) -> RepositoryResult<()> {
        Err(RepositoryError::DatabaseConnectionError("连接被拒绝".to_string()))
    }
}

/// 永远无表的事件日志库
struct EmptyEventLog;

#[async_trait]
impl EventLogStore for EmptyEventLog {
    async fn query_window(
        &self,
        _table: &str,
        _from_ms: i64,
        _to_ms: i64,
    ) -> RepositoryResult<Option<Vec<LogRow>>> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_connectivity_failure_aborts_whole_sweep() {
    logging::init_test();
    let runner = SweepRunner::new(Arc::new(DownEntityStore), Arc::new(EmptyEventLog));
    let ids = vec!["urn:ws:001".to_string(), "urn:ws:002".to_string()];
    let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();

    let report = runner.run_sweep_at(&ids, now).await;
    assert!(report.aborted);
    assert_eq!(report.published, 0);
    // 存储整体断开: 全量清空同样无一成功, 不得虚报
    assert_eq!(report.cleared, 0);
}

/// 仅对指定工位断连的实体库, 其余请求透传真实存储
struct FlakyEntityStore {
    inner: Arc<SqliteEntityStore>,
    down_id: String,
}

#[async_trait]
impl EntityStore for FlakyEntityStore {
    async fn fetch(&self, id: &str) -> RepositoryResult<ReferenceEntity> {
        if id == self.down_id {
            return Err(RepositoryError::DatabaseConnectionError("连接被拒绝".to_string()));
        }
        self.inner.fetch(id).await
    }

    async fn update_attributes(
        &self,
        id: &str,
        attributes: BTreeMap<String, Attribute>,
    ) -> RepositoryResult<()> {
        self.inner.update_attributes(id, attributes).await
    }
}

#[tokio::test]
async fn test_abort_counts_only_confirmed_clears() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (entities, logs) = open_stores(&db_path);
    seed_reference_entities(&entities);

    // 第一个工位连接级断开触发中止; 第二个工位的清空可以成功
    let down_id = "urn:ws:down".to_string();
    let flaky = Arc::new(FlakyEntityStore {
        inner: entities.clone(),
        down_id: down_id.clone(),
    });
    let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();

    let runner = SweepRunner::new(flaky, logs.clone());
    let report = runner
        .run_sweep_at(&[down_id, WS_ID.to_string()], now)
        .await;
    assert!(report.aborted);
    // 断连工位清空不可确认, 仅真实工位计入
    assert_eq!(report.cleared, 1);

    let oee = entities.fetch(OEE_ID).await.unwrap();
    assert_eq!(oee.attribute(names::OEE).unwrap().value, AttributeValue::Null);
}

#[tokio::test]
async fn test_single_workstation_fault_does_not_stop_sweep() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (entities, logs) = open_stores(&db_path);
    seed_reference_entities(&entities);

    // 第二个工位的实体不存在 → 单工位故障, 第一个工位照常"尚无数据"处理
    let ghost = "urn:ws:ghost".to_string();
    let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();

    let runner = SweepRunner::new(entities.clone(), logs.clone());
    let report = runner
        .run_sweep_at(&[ghost, WS_ID.to_string()], now)
        .await;
    assert!(!report.aborted);
    // 幽灵工位: 发布对象无法解析 → 仅记录
    assert_eq!(report.logged_only, 1);
    // 真实工位: 无任何日志 → 尚无数据
    assert_eq!(report.no_data, 1);
}

#[tokio::test]
async fn test_never_reported_workstation_is_no_data() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (entities, logs) = open_stores(&db_path);
    seed_reference_entities(&entities);

    let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
    let runner = SweepRunner::new(entities.clone(), logs.clone());
    let outcome = runner.process_workstation(WS_ID, now).await.unwrap();
    assert_eq!(outcome, WorkstationOutcome::NoData);
}

#[tokio::test]
async fn test_invalid_toggle_value_clears_kpis() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db();
    let (entities, logs) = open_stores(&db_path);
    seed_reference_entities(&entities);

    // 非布尔开关值 → 非法采样, 致命
    logs.append(
        &workstation_table(),
        &[log_row(1_772_668_800_000 + 1_000, names::AVAILABLE, "on")],
    )
    .unwrap();

    let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
    let runner = SweepRunner::new(entities.clone(), logs.clone());
    let outcome = runner.process_workstation(WS_ID, now).await.unwrap();
    assert_eq!(outcome, WorkstationOutcome::Cleared);

    let oee = entities.fetch(OEE_ID).await.unwrap();
    assert_eq!(oee.attribute(names::OEE).unwrap().value, AttributeValue::Null);
}
