// ==========================================
// 工位OEE指标计算系统 - KPI 合成引擎
// ==========================================
// 职责: 把可用性拆分、循环计数与工序参数合成四项 KPI 与产出预测
// 公式:
//   Quality     = 成功循环 / 总循环
//   Performance = 总循环 × CycleTime / 在线时长   (不封顶, 允许超产 > 1)
//   OEE         = Availability × Performance × Quality
//   Throughput  = (班次剩余时长 / CycleTime) × PartsPerCycle × OEE
//     其中班次剩余时长 = 班次结束 - 参考起点（整班投影, 不是自 now 起）
// 红线: 除零必须显式拦截, 禁止 NaN/Inf 流出
// ==========================================

use crate::domain::kpi::{AvailabilitySplit, CycleCounts, KpiResult, KpiSnapshot};
use crate::domain::shift::ShiftWindow;
use crate::engine::error::{CalcError, CalcResult};
use crate::engine::resolver::OperationParams;
use chrono::{DateTime, Utc};

// ==========================================
// KpiComposer - KPI 合成器
// ==========================================

pub struct KpiComposer;

impl KpiComposer {
    /// 合成完整 KPI 快照
    ///
    /// # 返回
    /// - Ok(KpiSnapshot): 四项 KPI 与产出预测全部就绪
    /// - Err(NoDataYet): 总循环数为零, Quality/Performance 无定义
    /// - Err(DegenerateArithmetic): 窗口总时长或在线时长为零
    pub fn compose(
        split: &AvailabilitySplit,
        counts: &CycleCounts,
        operation: &OperationParams,
        shift: &ShiftWindow,
        ref_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CalcResult<KpiSnapshot> {
        let total = counts.total();
        if total == 0 {
            return Err(CalcError::NoDataYet(
                "窗口内无任何生产循环, Quality/Performance 无定义".to_string(),
            ));
        }
        if split.elapsed_ms() <= 0 {
            return Err(CalcError::DegenerateArithmetic(
                "窗口总时长为零".to_string(),
            ));
        }
        if split.time_on_ms <= 0 {
            return Err(CalcError::DegenerateArithmetic(
                "在线时长为零, Performance 无定义".to_string(),
            ));
        }

        let availability = split.availability();
        let quality = counts.good as f64 / total as f64;
        let performance =
            total as f64 * operation.cycle_time_ms as f64 / split.time_on_ms as f64;
        let oee = availability * performance * quality;

        let shift_remaining_ms = shift.remaining_ms_from(ref_start);
        let throughput = shift_remaining_ms as f64 / operation.cycle_time_ms as f64
            * operation.parts_per_cycle as f64
            * oee;

        Ok(KpiSnapshot {
            kpi: KpiResult {
                availability,
                performance,
                quality,
                oee,
            },
            throughput,
            ref_start,
            now,
        })
    }
}
