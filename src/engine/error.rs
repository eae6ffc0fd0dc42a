// ==========================================
// 工位OEE指标计算系统 - 计算错误分类
// ==========================================
// 工具: thiserror 派生宏
// 红线: "尚无数据"与致命故障必须在类型上可区分,
//       调用方禁止用 catch-all 兜底判断严重程度
// ==========================================

use crate::domain::entity::AttributeError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 单工位一次计算的错误分类
#[derive(Error, Debug)]
pub enum CalcError {
    // ===== 参考数据错误 =====
    #[error("参考数据错误: {0}")]
    MalformedReference(String),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    // ===== 一致性故障 =====
    #[error("数据一致性故障: 上下文库当前作业={expected}, 日志最近换作业标记={actual}")]
    DataInconsistency { expected: String, actual: String },

    // ===== 尚无数据（低严重度, 不触发清空） =====
    #[error("尚无数据: {0}")]
    NoDataYet(String),

    // ===== 非法采样 =====
    #[error("非法采样值: attribute={attribute}, value={value}")]
    InvalidSample { attribute: String, value: String },

    // ===== 退化算术 =====
    #[error("退化算术: {0}")]
    DegenerateArithmetic(String),

    // ===== 存储层透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CalcError {
    /// 是否为"尚无数据"结局
    ///
    /// 尚无数据: 计算无法产出 KPI, 但不清空既有发布值, 低严重度记录
    pub fn is_no_data(&self) -> bool {
        matches!(self, CalcError::NoDataYet(_))
    }

    /// 是否为存储连接级故障（中止整轮巡检并全量清空）
    pub fn is_connectivity(&self) -> bool {
        matches!(self, CalcError::Repository(e) if e.is_connectivity())
    }
}

/// Result 类型别名
pub type CalcResult<T> = Result<T, CalcError>;
