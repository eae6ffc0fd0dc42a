// ==========================================
// 工位OEE指标计算系统 - 计算编排器
// ==========================================
// 职责: 按固定顺序驱动 解析 → 取数 → 重建/计数 → 合成,
//       并定义班次窗口前置条件与失败语义
// 约定: "当前时刻"由调用方一次捕获并显式传入（测试可注入）,
//       计算过程内禁止再读墙钟
// ==========================================

use crate::domain::entity::{log_table_name, names, EntityType};
use crate::domain::kpi::KpiSnapshot;
use crate::engine::availability::AvailabilityReconstructor;
use crate::engine::composer::KpiComposer;
use crate::engine::cycles::CycleCounter;
use crate::engine::error::CalcResult;
use crate::engine::event_window::{drop_before, EventWindowFetcher, WindowMode};
use crate::engine::resolver::{resolve_ref_start, EntityResolver};
use crate::repository::entity_store::EntityStore;
use crate::repository::event_store::EventLogStore;
use crate::timeutil;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

// ==========================================
// CalcOutcome - 计算结局
// ==========================================

/// 一次计算的结局: 产出快照, 或处于班次窗口之外的空结果
///
/// 班次之外不是故障, 因此不走错误通道
#[derive(Debug, Clone, PartialEq)]
pub enum CalcOutcome {
    Computed(KpiSnapshot),
    OutsideShift,
}

// ==========================================
// KpiOrchestrator - 计算编排器
// ==========================================

pub struct KpiOrchestrator<E, L>
where
    E: EntityStore,
    L: EventLogStore,
{
    entities: Arc<E>,
    logs: Arc<L>,
}

impl<E, L> KpiOrchestrator<E, L>
where
    E: EntityStore,
    L: EventLogStore,
{
    pub fn new(entities: Arc<E>, logs: Arc<L>) -> Self {
        Self { entities, logs }
    }

    /// 为指定工位计算一次 KPI 快照
    ///
    /// # 参数
    /// - workstation_id: 工位实体 id
    /// - now: 本次计算统一采用的当前时刻
    ///
    /// # 返回
    /// - Ok(Computed): 四项 KPI 与产出预测全部就绪
    /// - Ok(OutsideShift): now 在当日班次窗口之外
    /// - Err(CalcError): 按 engine::error 分类的失败
    pub async fn calculate(
        &self,
        workstation_id: &str,
        now: DateTime<Utc>,
    ) -> CalcResult<CalcOutcome> {
        let now_ms = timeutil::utc_to_ms(now);
        let midnight_ms = timeutil::utc_to_ms(timeutil::midnight_of(now));

        // 1. 参考实体解析
        let workstation = self.entities.fetch(workstation_id).await?;
        let resolver = EntityResolver::new(self.entities.as_ref());
        let shift = resolver.resolve_shift_window(&workstation, now).await?;

        // 前置条件: now 必须落在当日班次窗口内
        if !shift.contains(now) {
            debug!(workstation_id, "当前时刻在班次窗口之外, 空结果");
            return Ok(CalcOutcome::OutsideShift);
        }

        let job = resolver.resolve_job(&workstation).await?;
        let operation = resolver.resolve_operation(&job).await?;

        // 2. 工位事件流: 恒自零点取数, 供起点前状态推断
        let fetcher = EventWindowFetcher::new(self.logs.as_ref());
        let shift_start_ms = timeutil::utc_to_ms(shift.start);
        let workstation_table = log_table_name(EntityType::Workstation, &workstation.id);
        let workstation_events = fetcher
            .fetch(
                &workstation_table,
                WindowMode::FromMidnight,
                midnight_ms,
                shift_start_ms,
                now_ms,
            )
            .await?;

        // 3. 参考起点判定
        let ref_start = resolve_ref_start(&workstation_events, &job.id, &shift, now)?;
        let ref_start_ms = timeutil::utc_to_ms(ref_start);
        debug!(workstation_id, %ref_start, "参考起点已判定");

        // 4. 作业事件流: 自班次开始取数, 再按参考起点二次过滤
        let job_table = log_table_name(EntityType::Job, &job.id);
        let job_events = fetcher
            .fetch(
                &job_table,
                WindowMode::FromShiftStart,
                midnight_ms,
                shift_start_ms,
                now_ms,
            )
            .await?;
        let job_events = drop_before(job_events, ref_start_ms);

        // 5. 可用性重建
        let toggles: Vec<_> = workstation_events
            .iter()
            .filter(|e| e.attribute_name == names::AVAILABLE)
            .cloned()
            .collect();
        let split = AvailabilityReconstructor::reconstruct(&toggles, ref_start_ms, now_ms)?;

        // 6. 循环计数
        let good_samples: Vec<String> = job_events
            .iter()
            .filter(|e| e.attribute_name == names::GOOD_PART_COUNTER)
            .map(|e| e.attribute_value.clone())
            .collect();
        let reject_samples: Vec<String> = job_events
            .iter()
            .filter(|e| e.attribute_name == names::REJECT_PART_COUNTER)
            .map(|e| e.attribute_value.clone())
            .collect();
        let counts =
            CycleCounter::new(operation.parts_per_cycle)?.count(&good_samples, &reject_samples)?;

        // 7. KPI 合成
        let snapshot = KpiComposer::compose(&split, &counts, &operation, &shift, ref_start, now)?;
        info!(
            workstation_id,
            availability = snapshot.kpi.availability,
            performance = snapshot.kpi.performance,
            quality = snapshot.kpi.quality,
            oee = snapshot.kpi.oee,
            throughput = snapshot.throughput,
            "KPI 计算完成"
        );
        Ok(CalcOutcome::Computed(snapshot))
    }
}
