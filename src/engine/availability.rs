// ==========================================
// 工位OEE指标计算系统 - 可用性重建引擎
// ==========================================
// 职责: 把稀疏布尔开关事件重建为在线/离线连续时长
// 算法: 按时间排序的区间状态机, 区间归属于事件之前的状态
// 不变式: time_on + time_off == now - ref_start（区间无缝无叠）
// ==========================================

use crate::domain::entity::names;
use crate::domain::event::{partition_at, AttributeEvent};
use crate::domain::kpi::AvailabilitySplit;
use crate::engine::error::{CalcError, CalcResult};

/// 解析布尔开关量; 非 "true"/"false" 一律按非法采样处理
fn parse_toggle(event: &AttributeEvent) -> CalcResult<bool> {
    match event.attribute_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(CalcError::InvalidSample {
            attribute: names::AVAILABLE.to_string(),
            value: other.to_string(),
        }),
    }
}

// ==========================================
// AvailabilityReconstructor - 可用性重建器
// ==========================================

pub struct AvailabilityReconstructor;

impl AvailabilityReconstructor {
    /// 自参考起点重建在线/离线时长拆分
    ///
    /// # 参数
    /// - toggles: 当日自零点起的全部 Available 开关事件（已按时间升序）
    /// - ref_start_ms: 参考起点（毫秒）
    /// - now_ms: 本次计算统一采用的当前时刻（毫秒）
    ///
    /// # 返回
    /// - Ok(AvailabilitySplit): 重建成功
    /// - Err(NoDataYet): 当日无任何开关日志（工位从未上报）
    /// - Err(InvalidSample): 出现非布尔值
    /// - Err(DegenerateArithmetic): 窗口总时长为零
    pub fn reconstruct(
        toggles: &[AttributeEvent],
        ref_start_ms: i64,
        now_ms: i64,
    ) -> CalcResult<AvailabilitySplit> {
        let (before, after) = partition_at(toggles, ref_start_ms);

        // 参考起点之后无变化: 状态自起点起保持不变
        if after.is_empty() {
            let last = before.last().ok_or_else(|| {
                CalcError::NoDataYet("当日无任何可用性日志, 工位从未上报开关状态".to_string())
            })?;
            let elapsed = now_ms - ref_start_ms;
            if elapsed <= 0 {
                return Err(CalcError::DegenerateArithmetic(
                    "可用性窗口总时长为零".to_string(),
                ));
            }
            return Ok(if parse_toggle(last)? {
                AvailabilitySplit {
                    time_on_ms: elapsed,
                    time_off_ms: 0,
                }
            } else {
                AvailabilitySplit {
                    time_on_ms: 0,
                    time_off_ms: elapsed,
                }
            });
        }

        // 参考起点瞬间的状态: 取起点前最后一条; 无证据则视为离线
        let mut state = match before.last() {
            Some(last) => parse_toggle(last)?,
            None => false,
        };

        let mut time_on_ms: i64 = 0;
        let mut time_off_ms: i64 = 0;
        let mut interval_start = ref_start_ms;

        // 每条事件闭合一个区间, 区间归属于事件之前保持的状态
        for event in &after {
            let duration = event.timestamp_ms - interval_start;
            if state {
                time_on_ms += duration;
            } else {
                time_off_ms += duration;
            }
            state = parse_toggle(event)?;
            interval_start = event.timestamp_ms;
        }

        // 末段: 最后一条事件到当前时刻
        let tail = now_ms - interval_start;
        if state {
            time_on_ms += tail;
        } else {
            time_off_ms += tail;
        }

        let split = AvailabilitySplit {
            time_on_ms,
            time_off_ms,
        };
        if split.elapsed_ms() == 0 {
            return Err(CalcError::DegenerateArithmetic(
                "可用性窗口总时长为零".to_string(),
            ));
        }
        Ok(split)
    }
}
