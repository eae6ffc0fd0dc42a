// ==========================================
// 工位OEE指标计算系统 - 属性变更事件
// ==========================================
// 职责: 事件日志行的规范化形态与序列操作
// 约定: 事件可乱序到达, 处理前必须按时间戳升序排序
// ==========================================

use serde::{Deserialize, Serialize};

/// 一次被观测到的属性变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeEvent {
    /// UTC 毫秒时间戳
    pub timestamp_ms: i64,
    /// 属性名
    pub attribute_name: String,
    /// 属性值（原始字符串形态）
    pub attribute_value: String,
}

impl AttributeEvent {
    pub fn new(timestamp_ms: i64, attribute_name: impl Into<String>, attribute_value: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            attribute_name: attribute_name.into(),
            attribute_value: attribute_value.into(),
        }
    }
}

/// 按时间戳升序排序（稳定排序, 同时刻事件保持到达顺序）
pub fn sort_by_timestamp(events: &mut [AttributeEvent]) {
    events.sort_by_key(|e| e.timestamp_ms);
}

/// 过滤指定属性的事件, 保持原有顺序
pub fn filter_by_attribute<'a>(events: &'a [AttributeEvent], name: &str) -> Vec<&'a AttributeEvent> {
    events.iter().filter(|e| e.attribute_name == name).collect()
}

/// 以 split_ms 为界切分为 (早于, 不早于) 两段, 段内保持时间顺序
pub fn partition_at(events: &[AttributeEvent], split_ms: i64) -> (Vec<&AttributeEvent>, Vec<&AttributeEvent>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    for event in events {
        if event.timestamp_ms < split_ms {
            before.push(event);
        } else {
            after.push(event);
        }
    }
    (before, after)
}
