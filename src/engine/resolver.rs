// ==========================================
// 工位OEE指标计算系统 - 参考实体解析引擎
// ==========================================
// 职责: 工位 → 班次/作业/工序 的关系解析,
//       班次窗口推导与参考起点(RefStart)判定
// 红线: 上下文库与事件日志的作业不一致必须按致命故障上报
// ==========================================

use crate::domain::entity::{names, ReferenceEntity};
use crate::domain::event::{filter_by_attribute, AttributeEvent};
use crate::domain::shift::ShiftWindow;
use crate::engine::error::{CalcError, CalcResult};
use crate::repository::entity_store::EntityStore;
use crate::timeutil;
use chrono::{DateTime, Utc};
use tracing::debug;

// ==========================================
// OperationParams - 工序参数
// ==========================================

/// 当前工序的计算参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationParams {
    pub operation_id: String,
    /// 单循环耗时（毫秒）
    pub cycle_time_ms: i64,
    /// 单循环产出件数
    pub parts_per_cycle: i64,
}

impl OperationParams {
    fn validated(operation_id: String, cycle_time_ms: i64, parts_per_cycle: i64) -> CalcResult<Self> {
        if cycle_time_ms <= 0 {
            return Err(CalcError::MalformedReference(format!(
                "CycleTime 必须为正: operation={}, 实际={}",
                operation_id, cycle_time_ms
            )));
        }
        if parts_per_cycle <= 0 {
            return Err(CalcError::MalformedReference(format!(
                "PartsPerCycle 必须为正: operation={}, 实际={}",
                operation_id, parts_per_cycle
            )));
        }
        Ok(Self {
            operation_id,
            cycle_time_ms,
            parts_per_cycle,
        })
    }
}

// ==========================================
// EntityResolver - 参考实体解析器
// ==========================================

pub struct EntityResolver<'a, E: EntityStore + ?Sized> {
    entities: &'a E,
}

impl<'a, E: EntityStore + ?Sized> EntityResolver<'a, E> {
    pub fn new(entities: &'a E) -> Self {
        Self { entities }
    }

    /// 解析当日班次窗口
    ///
    /// 班次实体的 Start/End 为排班时刻字符串, 与"当前时刻"的日期组合;
    /// End 不晚于 Start（含跨午夜班次）按参考数据错误拒绝
    pub async fn resolve_shift_window(
        &self,
        workstation: &ReferenceEntity,
        now: DateTime<Utc>,
    ) -> CalcResult<ShiftWindow> {
        let shift_id = workstation.relationship(names::REF_SHIFT)?;
        let shift = self.entities.fetch(shift_id).await?;

        let start_raw = shift.text_attr(names::SHIFT_START)?;
        let end_raw = shift.text_attr(names::SHIFT_END)?;

        let start_time = timeutil::parse_time_of_day(start_raw).ok_or_else(|| {
            CalcError::MalformedReference(format!(
                "班次开始时刻不可解析: shift={}, Start={}",
                shift.id, start_raw
            ))
        })?;
        let end_time = timeutil::parse_time_of_day(end_raw).ok_or_else(|| {
            CalcError::MalformedReference(format!(
                "班次结束时刻不可解析: shift={}, End={}",
                shift.id, end_raw
            ))
        })?;

        let start = timeutil::time_of_day_on(now, start_time);
        let end = timeutil::time_of_day_on(now, end_time);
        ShiftWindow::new(start, end).ok_or_else(|| {
            CalcError::MalformedReference(format!(
                "班次窗口非法(End 不晚于 Start, 跨午夜班次不受支持): shift={}, Start={}, End={}",
                shift.id, start_raw, end_raw
            ))
        })
    }

    /// 解析当前作业实体
    pub async fn resolve_job(&self, workstation: &ReferenceEntity) -> CalcResult<ReferenceEntity> {
        let job_id = workstation.relationship(names::REF_JOB)?;
        Ok(self.entities.fetch(job_id).await?)
    }

    /// 解析当前工序参数
    ///
    /// 主数据模型: 作业 → RefOperation → 工序实体;
    /// 变体数据模型: 作业 → RefPart → 零件内嵌工序列表,
    ///               按 CurrentOperationType 选中一项
    pub async fn resolve_operation(&self, job: &ReferenceEntity) -> CalcResult<OperationParams> {
        if job.attributes.contains_key(names::REF_OPERATION) {
            let operation_id = job.relationship(names::REF_OPERATION)?;
            let operation = self.entities.fetch(operation_id).await?;
            return OperationParams::validated(
                operation.id.clone(),
                operation.integer_attr(names::CYCLE_TIME)?,
                operation.integer_attr(names::PARTS_PER_CYCLE)?,
            );
        }

        // 变体数据模型
        let part_id = job.relationship(names::REF_PART)?;
        let part = self.entities.fetch(part_id).await?;
        let wanted_type = job.text_attr(names::CURRENT_OPERATION_TYPE)?;
        let list = part.structured_attr(names::OPERATION_LIST)?;

        let operations = list.as_array().ok_or_else(|| {
            CalcError::MalformedReference(format!(
                "零件工序列表不是数组: part={}",
                part.id
            ))
        })?;

        for op in operations {
            let op_type = op.get(names::OPERATION_TYPE).and_then(|v| v.as_str());
            if op_type == Some(wanted_type) {
                let cycle_time_ms = embedded_integer(op, names::CYCLE_TIME, &part.id)?;
                let parts_per_cycle = embedded_integer(op, names::PARTS_PER_CYCLE, &part.id)?;
                let operation_id = op
                    .get("Id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("{}#{}", part.id, wanted_type));
                return OperationParams::validated(operation_id, cycle_time_ms, parts_per_cycle);
            }
        }

        Err(CalcError::MalformedReference(format!(
            "零件工序列表中无匹配工序: part={}, CurrentOperationType={}",
            part.id, wanted_type
        )))
    }
}

/// 判定参考起点(RefStart)
///
/// 在工位日志的 RefJob 换作业标记中判定当前作业的当日起点:
/// - 无任何标记: 取班次开始
/// - 最近标记的作业 ≠ 上下文库当前作业: 致命一致性故障
/// - 否则取"尾部连续同作业标记段"的最早时间戳, 再收敛到 [班次开始, now]
///
/// 不变式: 返回值 ∈ [shift.start, now]
pub fn resolve_ref_start(
    workstation_events: &[AttributeEvent],
    active_job_id: &str,
    shift: &ShiftWindow,
    now: DateTime<Utc>,
) -> CalcResult<DateTime<Utc>> {
    let markers = filter_by_attribute(workstation_events, names::REF_JOB);

    let last = match markers.last() {
        None => {
            debug!("当日无换作业标记, 参考起点取班次开始");
            return Ok(shift.start);
        }
        Some(last) => last,
    };

    if last.attribute_value != active_job_id {
        return Err(CalcError::DataInconsistency {
            expected: active_job_id.to_string(),
            actual: last.attribute_value.clone(),
        });
    }

    // 尾部连续同作业标记段的最早时间戳（容忍同值重复写入）
    let mut job_start_ms = last.timestamp_ms;
    for marker in markers.iter().rev() {
        if marker.attribute_value == active_job_id {
            job_start_ms = marker.timestamp_ms;
        } else {
            break;
        }
    }

    let job_start = timeutil::ms_to_utc(job_start_ms).ok_or_else(|| {
        CalcError::MalformedReference(format!("换作业标记时间戳超界: {}", job_start_ms))
    })?;
    Ok(shift.clamp_ref_start(job_start, now))
}

/// 内嵌工序对象里的整数字段（容忍数字或数字字符串两种形态）
fn embedded_integer(op: &serde_json::Value, field: &str, part_id: &str) -> CalcResult<i64> {
    let value = op.get(field).ok_or_else(|| {
        CalcError::MalformedReference(format!(
            "内嵌工序缺少字段: part={}, field={}",
            part_id, field
        ))
    })?;
    match value {
        serde_json::Value::Number(n) => n.as_i64().ok_or_else(|| {
            CalcError::MalformedReference(format!(
                "内嵌工序字段非整数: part={}, field={}, value={}",
                part_id, field, n
            ))
        }),
        serde_json::Value::String(s) => s.trim().parse().map_err(|_| {
            CalcError::MalformedReference(format!(
                "内嵌工序字段非整数: part={}, field={}, value={}",
                part_id, field, s
            ))
        }),
        other => Err(CalcError::MalformedReference(format!(
            "内嵌工序字段形态非法: part={}, field={}, value={}",
            part_id, field, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn shift() -> ShiftWindow {
        ShiftWindow::new(
            Utc.with_ymd_and_hms(2026, 3, 5, 6, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 5, 14, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn marker(ts: DateTime<Utc>, job: &str) -> AttributeEvent {
        AttributeEvent::new(ts.timestamp_millis(), names::REF_JOB, job)
    }

    #[test]
    fn test_no_markers_falls_back_to_shift_start() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let ref_start =
            resolve_ref_start(
                &[],
                "job1",
                &shift(),
                now,
            )
            .unwrap();
        assert_eq!(ref_start, shift().start);
    }

    #[test]
    fn test_mismatched_last_marker_is_inconsistency() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let events = vec![marker(Utc.with_ymd_and_hms(2026, 3, 5, 7, 0, 0).unwrap(), "job9")];
        let err = resolve_ref_start(
            &events,
            "job1",
            &shift(),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, CalcError::DataInconsistency { .. }));
    }

    #[test]
    fn test_trailing_run_takes_earliest_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 3, 5, 7, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();
        let events = vec![marker(t1, "job0"), marker(t2, "job1"), marker(t3, "job1")];
        let ref_start = resolve_ref_start(
            &events,
            "job1",
            &shift(),
            now,
        )
        .unwrap();
        assert_eq!(ref_start, t2);
    }

    #[test]
    fn test_ref_start_clamped_into_shift_window() {
        let now = Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap();
        // 换作业发生在班次开始之前 → 收敛到班次开始
        let early = Utc.with_ymd_and_hms(2026, 3, 5, 4, 0, 0).unwrap();
        let events = vec![marker(early, "job1")];
        let ref_start = resolve_ref_start(
            &events,
            "job1",
            &shift(),
            now,
        )
        .unwrap();
        assert_eq!(ref_start, shift().start);
    }
}
