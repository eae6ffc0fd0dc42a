// ==========================================
// 工位OEE指标计算系统 - 引擎层
// ==========================================
// 职责: 实现时序重建与 KPI 计算规则, 不拼 SQL
// 红线: Engine 不拼 SQL; 所有失败必须带上下文分类上报
// ==========================================

pub mod availability;
pub mod composer;
pub mod cycles;
pub mod error;
pub mod event_window;
pub mod orchestrator;
pub mod resolver;
pub mod sweep;

// 重导出核心引擎
pub use availability::AvailabilityReconstructor;
pub use composer::KpiComposer;
pub use cycles::CycleCounter;
pub use error::{CalcError, CalcResult};
pub use event_window::{drop_before, EventWindowFetcher, WindowMode};
pub use orchestrator::{CalcOutcome, KpiOrchestrator};
pub use resolver::{resolve_ref_start, EntityResolver, OperationParams};
pub use sweep::{PublishTargets, SweepReport, SweepRunner, WorkstationOutcome};
