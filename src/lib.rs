// ==========================================
// 工位OEE指标计算系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 生产工位 KPI 的时序重建与计算引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 时间工具
pub mod timeutil;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Attribute, AttributeError, AttributeEvent, AttributeValue, AvailabilitySplit, CycleCounts,
    EntityType, KpiResult, KpiSnapshot, ReferenceEntity, ShiftWindow,
};

// 引擎
pub use engine::{
    AvailabilityReconstructor, CalcError, CalcOutcome, CalcResult, CycleCounter, EntityResolver,
    EventWindowFetcher, KpiComposer, KpiOrchestrator, OperationParams, SweepReport, SweepRunner,
    WindowMode, WorkstationOutcome,
};

// 仓储
pub use repository::{
    EntityStore, EventLogStore, LogRow, RepositoryError, SqliteEntityStore, SqliteEventLog,
};

// 配置
pub use config::EngineConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工位OEE指标计算系统";
