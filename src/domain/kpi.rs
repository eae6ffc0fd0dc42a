// ==========================================
// 工位OEE指标计算系统 - KPI 结果对象
// ==========================================
// 职责: 每次计算新建的 KPI 快照与发布文档
// 红线: 四项 KPI 与产出预测要么全有、要么全空, 禁止部分发布
// ==========================================

use crate::domain::entity::{names, Attribute};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// AvailabilitySplit - 可用性时长拆分
// ==========================================

/// 自参考起点以来的在线/离线累计时长
///
/// time_on_ms 同时作为 Performance 的分母（总可用毫秒数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySplit {
    pub time_on_ms: i64,
    pub time_off_ms: i64,
}

impl AvailabilitySplit {
    pub fn elapsed_ms(&self) -> i64 {
        self.time_on_ms + self.time_off_ms
    }

    /// 可用率 = 在线时长 / 总时长; 调用方保证总时长非零
    pub fn availability(&self) -> f64 {
        self.time_on_ms as f64 / self.elapsed_ms() as f64
    }
}

// ==========================================
// CycleCounts - 生产循环计数
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleCounts {
    /// 成功循环数
    pub good: i64,
    /// 失败循环数
    pub scrap: i64,
}

impl CycleCounts {
    pub fn total(&self) -> i64 {
        self.good + self.scrap
    }
}

// ==========================================
// KpiResult / KpiSnapshot
// ==========================================

/// 四项 KPI（发布对象之一）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiResult {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

/// 一次计算的完整输出: 四项 KPI + 独立的产出预测标量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshot {
    pub kpi: KpiResult,
    /// 班次剩余时间内的产出件数投影
    pub throughput: f64,
    /// 本次计算的参考起点
    pub ref_start: DateTime<Utc>,
    /// 本次计算采用的统一"当前时刻"
    pub now: DateTime<Utc>,
}

impl KpiSnapshot {
    /// KPI 发布文档（部分实体更新: 仅四项 KPI 属性）
    pub fn kpi_attributes(&self) -> BTreeMap<String, Attribute> {
        let mut attrs = BTreeMap::new();
        attrs.insert(names::AVAILABILITY.to_string(), Attribute::number(self.kpi.availability));
        attrs.insert(names::PERFORMANCE.to_string(), Attribute::number(self.kpi.performance));
        attrs.insert(names::QUALITY.to_string(), Attribute::number(self.kpi.quality));
        attrs.insert(names::OEE.to_string(), Attribute::number(self.kpi.oee));
        attrs
    }

    /// 产出预测发布文档
    pub fn throughput_attributes(&self) -> BTreeMap<String, Attribute> {
        let mut attrs = BTreeMap::new();
        attrs.insert(names::THROUGHPUT_PER_SHIFT.to_string(), Attribute::number(self.throughput));
        attrs
    }
}

/// 清空发布文档: 四项 KPI 全部置空
///
/// 计算失败时必须发布, 避免陈旧 KPI 继续示人
pub fn null_kpi_attributes() -> BTreeMap<String, Attribute> {
    let mut attrs = BTreeMap::new();
    attrs.insert(names::AVAILABILITY.to_string(), Attribute::null_number());
    attrs.insert(names::PERFORMANCE.to_string(), Attribute::null_number());
    attrs.insert(names::QUALITY.to_string(), Attribute::null_number());
    attrs.insert(names::OEE.to_string(), Attribute::null_number());
    attrs
}

/// 清空发布文档: 产出预测置空
pub fn null_throughput_attributes() -> BTreeMap<String, Attribute> {
    let mut attrs = BTreeMap::new();
    attrs.insert(names::THROUGHPUT_PER_SHIFT.to_string(), Attribute::null_number());
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::AttributeValue;
    use chrono::TimeZone;

    #[test]
    fn test_availability_split() {
        let split = AvailabilitySplit {
            time_on_ms: 45_000,
            time_off_ms: 15_000,
        };
        assert_eq!(split.elapsed_ms(), 60_000);
        assert!((split.availability() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_cycle_counts_total() {
        let counts = CycleCounts { good: 9, scrap: 3 };
        assert_eq!(counts.total(), 12);
    }

    #[test]
    fn test_publish_documents_are_complete() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let snapshot = KpiSnapshot {
            kpi: KpiResult {
                availability: 1.0,
                performance: 0.9,
                quality: 0.95,
                oee: 0.855,
            },
            throughput: 120.0,
            ref_start: now,
            now,
        };
        let kpi = snapshot.kpi_attributes();
        assert_eq!(kpi.len(), 4);
        assert_eq!(kpi["OEE"].value, AttributeValue::Number(0.855));
        let tp = snapshot.throughput_attributes();
        assert_eq!(tp["ThroughputPerShift"].value, AttributeValue::Number(120.0));
    }

    #[test]
    fn test_null_documents_clear_every_field() {
        let kpi = null_kpi_attributes();
        assert_eq!(kpi.len(), 4);
        assert!(kpi.values().all(|a| a.value == AttributeValue::Null));
        let tp = null_throughput_attributes();
        assert_eq!(tp["ThroughputPerShift"].value, AttributeValue::Null);
    }
}
