// ==========================================
// 工位OEE指标计算系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 连接级故障必须可与单条查询故障区分
//       (连接级故障会中止整轮巡检并全量清空 KPI)
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接级错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 查询级错误 =====
    #[error("实体未找到: id={id}")]
    EntityNotFound { id: String },

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 数据形态错误 =====
    #[error("实体文档损坏: id={id}, 原因: {reason}")]
    MalformedDocument { id: String, reason: String },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否为连接级故障
    ///
    /// 连接级故障意味着本轮巡检中后续工位的存储访问同样不可信
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            RepositoryError::DatabaseConnectionError(_) | RepositoryError::LockError(_)
        )
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg)
                if code.code == rusqlite::ErrorCode::CannotOpen
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                RepositoryError::DatabaseConnectionError(
                    msg.clone().unwrap_or_else(|| err.to_string()),
                )
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
