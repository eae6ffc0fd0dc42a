// ==========================================
// 工位OEE指标计算系统 - 数据仓储层
// ==========================================
// 职责: 提供上下文库与事件日志的访问接口,屏蔽存储细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化; 日志表名仅接受确定性导出的合法标识符
// ==========================================

pub mod entity_store;
pub mod error;
pub mod event_store;

// 重导出核心仓储
pub use entity_store::{EntityStore, SqliteEntityStore};
pub use error::{RepositoryError, RepositoryResult};
pub use event_store::{EventLogStore, LogRow, SqliteEventLog};
