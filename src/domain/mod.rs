// ==========================================
// 工位OEE指标计算系统 - 领域模型层
// ==========================================
// 职责: 定义参考实体、事件、班次窗口与 KPI 结果类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod entity;
pub mod event;
pub mod kpi;
pub mod shift;

// 重导出核心类型
pub use entity::{
    log_table_name, names, Attribute, AttributeError, AttributeValue, EntityType, ReferenceEntity,
};
pub use event::{filter_by_attribute, partition_at, sort_by_timestamp, AttributeEvent};
pub use kpi::{
    null_kpi_attributes, null_throughput_attributes, AvailabilitySplit, CycleCounts, KpiResult,
    KpiSnapshot,
};
pub use shift::ShiftWindow;
