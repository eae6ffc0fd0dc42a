// ==========================================
// 工位OEE指标计算系统 - 参考实体模型
// ==========================================
// 职责: 外部上下文库实体的本地只读快照
// 红线: 实体一次取回、当次计算内不可变
// 存储形态: {id, type, 属性名: {type, value}, ...}
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ==========================================
// 属性名约定（与上下文库/事件日志一致）
// ==========================================

pub mod names {
    /// 工位 → 班次 关系
    pub const REF_SHIFT: &str = "RefShift";
    /// 工位 → 当前作业 关系（同名属性也出现在事件日志中作为换作业标记）
    pub const REF_JOB: &str = "RefJob";
    /// 作业 → 工序 关系
    pub const REF_OPERATION: &str = "RefOperation";
    /// 作业 → 零件 关系（变体数据模型）
    pub const REF_PART: &str = "RefPart";
    /// 工位 → OEE 发布对象 关系
    pub const REF_OEE: &str = "RefOee";
    /// 工位 → 产出预测发布对象 关系
    pub const REF_THROUGHPUT: &str = "RefThroughput";

    /// 工位可用性开关量（事件日志布尔属性）
    pub const AVAILABLE: &str = "Available";
    /// 良品计数器（事件日志单调递增计数）
    pub const GOOD_PART_COUNTER: &str = "GoodPartCounter";
    /// 不良品计数器
    pub const REJECT_PART_COUNTER: &str = "RejectPartCounter";

    /// 班次开始时刻（"HH:MM:SS"）
    pub const SHIFT_START: &str = "Start";
    /// 班次结束时刻
    pub const SHIFT_END: &str = "End";

    /// 作业当前工序类型码（变体数据模型的选择键）
    pub const CURRENT_OPERATION_TYPE: &str = "CurrentOperationType";
    /// 零件内嵌工序列表（变体数据模型）
    pub const OPERATION_LIST: &str = "OperationList";
    /// 工序类型码
    pub const OPERATION_TYPE: &str = "OperationType";
    /// 单循环耗时（毫秒）
    pub const CYCLE_TIME: &str = "CycleTime";
    /// 单循环产出件数
    pub const PARTS_PER_CYCLE: &str = "PartsPerCycle";

    /// KPI 发布属性
    pub const AVAILABILITY: &str = "Availability";
    pub const PERFORMANCE: &str = "Performance";
    pub const QUALITY: &str = "Quality";
    pub const OEE: &str = "OEE";
    /// 产出预测发布属性
    pub const THROUGHPUT_PER_SHIFT: &str = "ThroughputPerShift";
}

// ==========================================
// EntityType - 实体类型标签
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Workstation,
    Shift,
    Job,
    Part,
    Operation,
    Kpi,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::Workstation => write!(f, "Workstation"),
            EntityType::Shift => write!(f, "Shift"),
            EntityType::Job => write!(f, "Job"),
            EntityType::Part => write!(f, "Part"),
            EntityType::Operation => write!(f, "Operation"),
            EntityType::Kpi => write!(f, "Kpi"),
        }
    }
}

// ==========================================
// AttributeValue - 带类型属性值
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Null,
    Structured(serde_json::Value),
}

impl AttributeValue {
    /// 值的种类描述（用于错误报文）
    pub fn kind(&self) -> &'static str {
        match self {
            AttributeValue::Bool(_) => "Bool",
            AttributeValue::Number(_) => "Number",
            AttributeValue::Text(_) => "Text",
            AttributeValue::Null => "Null",
            AttributeValue::Structured(_) => "Structured",
        }
    }
}

/// 上下文库属性: {type, value}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value_type: "Text".to_string(),
            value: AttributeValue::Text(value.into()),
        }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value_type: "Number".to_string(),
            value: AttributeValue::Number(value),
        }
    }

    pub fn relationship(target: impl Into<String>) -> Self {
        Self {
            value_type: "Relationship".to_string(),
            value: AttributeValue::Text(target.into()),
        }
    }

    /// 清空发布用的空值属性
    pub fn null_number() -> Self {
        Self {
            value_type: "Number".to_string(),
            value: AttributeValue::Null,
        }
    }

    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            value_type: "StructuredValue".to_string(),
            value: AttributeValue::Structured(value),
        }
    }
}

// ==========================================
// AttributeError - 命名的属性访问错误
// ==========================================
// 红线: 禁止裸键访问, 缺失属性必须带实体与属性名上报

#[derive(Error, Debug)]
pub enum AttributeError {
    #[error("实体缺少属性: entity={entity}, attribute={attribute}")]
    Missing { entity: String, attribute: String },

    #[error("属性类型不符: entity={entity}, attribute={attribute}, 期望={expected}, 实际={actual}")]
    WrongType {
        entity: String,
        attribute: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("属性值非法: entity={entity}, attribute={attribute}, value={value}")]
    InvalidValue {
        entity: String,
        attribute: String,
        value: String,
    },
}

// ==========================================
// ReferenceEntity - 参考实体快照
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Attribute>,
}

impl ReferenceEntity {
    pub fn new(id: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: id.into(),
            entity_type,
            attributes: BTreeMap::new(),
        }
    }

    /// 建造器风格的属性追加（测试与适配层使用）
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    /// 按名取属性，缺失返回命名错误
    pub fn attribute(&self, name: &str) -> Result<&Attribute, AttributeError> {
        self.attributes.get(name).ok_or_else(|| AttributeError::Missing {
            entity: self.id.clone(),
            attribute: name.to_string(),
        })
    }

    /// 文本属性（Text）
    pub fn text_attr(&self, name: &str) -> Result<&str, AttributeError> {
        let attr = self.attribute(name)?;
        match &attr.value {
            AttributeValue::Text(s) => Ok(s),
            other => Err(AttributeError::WrongType {
                entity: self.id.clone(),
                attribute: name.to_string(),
                expected: "Text",
                actual: other.kind(),
            }),
        }
    }

    /// 关系属性（目标实体 id）。上下文库中关系值与文本同构。
    pub fn relationship(&self, name: &str) -> Result<&str, AttributeError> {
        self.text_attr(name)
    }

    /// 数值属性。容忍上下文库把数字写成文本的形态。
    pub fn number_attr(&self, name: &str) -> Result<f64, AttributeError> {
        let attr = self.attribute(name)?;
        match &attr.value {
            AttributeValue::Number(n) => Ok(*n),
            AttributeValue::Text(s) => {
                s.trim().parse::<f64>().map_err(|_| AttributeError::InvalidValue {
                    entity: self.id.clone(),
                    attribute: name.to_string(),
                    value: s.clone(),
                })
            }
            other => Err(AttributeError::WrongType {
                entity: self.id.clone(),
                attribute: name.to_string(),
                expected: "Number",
                actual: other.kind(),
            }),
        }
    }

    /// 整数属性（小数部分非零视为非法值）
    pub fn integer_attr(&self, name: &str) -> Result<i64, AttributeError> {
        let n = self.number_attr(name)?;
        if n.fract() != 0.0 {
            return Err(AttributeError::InvalidValue {
                entity: self.id.clone(),
                attribute: name.to_string(),
                value: n.to_string(),
            });
        }
        Ok(n as i64)
    }

    /// 结构化属性（变体数据模型的内嵌工序列表）
    pub fn structured_attr(&self, name: &str) -> Result<&serde_json::Value, AttributeError> {
        let attr = self.attribute(name)?;
        match &attr.value {
            AttributeValue::Structured(v) => Ok(v),
            other => Err(AttributeError::WrongType {
                entity: self.id.clone(),
                attribute: name.to_string(),
                expected: "Structured",
                actual: other.kind(),
            }),
        }
    }
}

/// 事件日志逻辑表名: 由实体类型与 id 确定性导出
///
/// 规则: 全小写, 非字母数字字符一律映射为下划线
pub fn log_table_name(entity_type: EntityType, id: &str) -> String {
    let raw = format!("{}_{}", entity_type, id);
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
