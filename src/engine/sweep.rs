// ==========================================
// 工位OEE指标计算系统 - 周期巡检执行器
// ==========================================
// 职责: 顺序处理一批工位, 每个工位一道错误边界
// 失败语义:
//   - 致命故障 → 发布全空 KPI/产出预测（显式清空, 杜绝陈旧值示人）
//   - 尚无数据 → 低严重度记录, 不清空
//   - 班次之外 → 空结果, 不发布不清空
//   - 发布对象无法解析 → 唯一不可清空的情形, 仅记录
//   - 存储连接级故障 → 中止本轮剩余工位, 尽力清空全部工位
// 红线: 单工位故障不得让进程崩溃, 周期循环必须走到下一轮
// ==========================================

use crate::domain::entity::names;
use crate::domain::kpi::{null_kpi_attributes, null_throughput_attributes};
use crate::engine::error::{CalcError, CalcResult};
use crate::engine::orchestrator::{CalcOutcome, KpiOrchestrator};
use crate::repository::entity_store::EntityStore;
use crate::repository::event_store::EventLogStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

// ==========================================
// 发布对象与单工位结局
// ==========================================

/// 单工位的两个发布对象 id（KPI 与产出预测）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTargets {
    pub oee_id: String,
    pub throughput_id: String,
}

/// 单工位处理结局（巡检报告用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkstationOutcome {
    /// KPI 与产出预测已发布
    Published,
    /// 班次窗口之外, 空结果
    OutsideShift,
    /// 尚无数据, 未发布未清空
    NoData,
    /// 致命故障, 已发布全空值
    Cleared,
    /// 连发布对象都无法解析, 仅记录
    LoggedOnly,
}

/// 一轮巡检的汇总报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub published: usize,
    pub outside_shift: usize,
    pub no_data: usize,
    pub cleared: usize,
    pub logged_only: usize,
    /// 连接级故障导致本轮提前中止
    pub aborted: bool,
}

impl SweepReport {
    fn record(&mut self, outcome: WorkstationOutcome) {
        match outcome {
            WorkstationOutcome::Published => self.published += 1,
            WorkstationOutcome::OutsideShift => self.outside_shift += 1,
            WorkstationOutcome::NoData => self.no_data += 1,
            WorkstationOutcome::Cleared => self.cleared += 1,
            WorkstationOutcome::LoggedOnly => self.logged_only += 1,
        }
    }
}

// ==========================================
// SweepRunner - 巡检执行器
// ==========================================

pub struct SweepRunner<E, L>
where
    E: EntityStore,
    L: EventLogStore,
{
    orchestrator: KpiOrchestrator<E, L>,
    entities: Arc<E>,
}

impl<E, L> SweepRunner<E, L>
where
    E: EntityStore,
    L: EventLogStore,
{
    pub fn new(entities: Arc<E>, logs: Arc<L>) -> Self {
        Self {
            orchestrator: KpiOrchestrator::new(entities.clone(), logs),
            entities,
        }
    }

    /// 顺序处理一批工位（每个工位在处理时各自捕获一次墙钟）
    pub async fn run_sweep(&self, workstation_ids: &[String]) -> SweepReport {
        self.run_sweep_inner(workstation_ids, None).await
    }

    /// 注入统一"当前时刻"的巡检入口（确定性测试用）
    pub async fn run_sweep_at(
        &self,
        workstation_ids: &[String],
        now: DateTime<Utc>,
    ) -> SweepReport {
        self.run_sweep_inner(workstation_ids, Some(now)).await
    }

    async fn run_sweep_inner(
        &self,
        workstation_ids: &[String],
        fixed_now: Option<DateTime<Utc>>,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        info!(workstations = workstation_ids.len(), "巡检开始");

        for workstation_id in workstation_ids {
            let now = fixed_now.unwrap_or_else(Utc::now);
            match self.process_workstation(workstation_id, now).await {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    // 连接级故障: 后续工位同样不可信, 中止并尽力全量清空
                    error!(workstation_id = %workstation_id, error = %e, "存储连接故障, 中止本轮巡检");
                    report.aborted = true;
                    report.cleared += self.clear_all(workstation_ids).await;
                    break;
                }
            }
        }

        info!(
            published = report.published,
            outside_shift = report.outside_shift,
            no_data = report.no_data,
            cleared = report.cleared,
            logged_only = report.logged_only,
            aborted = report.aborted,
            "巡检结束"
        );
        report
    }

    /// 单工位处理（一道错误边界）
    ///
    /// # 返回
    /// - Err: 仅当存储连接级故障需要中止整轮时
    pub async fn process_workstation(
        &self,
        workstation_id: &str,
        now: DateTime<Utc>,
    ) -> CalcResult<WorkstationOutcome> {
        // 先解析发布对象: 后续任何失败都要知道该清空哪两个实体
        let targets = match self.resolve_targets(workstation_id).await {
            Ok(targets) => targets,
            Err(e) if e.is_connectivity() => return Err(e),
            Err(e) => {
                error!(workstation_id, error = %e, "发布对象无法解析, 无从清空, 仅记录");
                return Ok(WorkstationOutcome::LoggedOnly);
            }
        };

        match self.orchestrator.calculate(workstation_id, now).await {
            Ok(CalcOutcome::Computed(snapshot)) => {
                match self.publish(&targets, &snapshot).await {
                    Ok(()) => Ok(WorkstationOutcome::Published),
                    Err(e) if e.is_connectivity() => Err(e),
                    Err(e) => {
                        // 半发布状态违背"全有或全空", 立即清空兜底
                        error!(workstation_id, error = %e, "发布失败, 清空兜底");
                        self.clear_guarded(workstation_id, &targets).await
                    }
                }
            }
            Ok(CalcOutcome::OutsideShift) => {
                debug!(workstation_id, "班次窗口之外");
                Ok(WorkstationOutcome::OutsideShift)
            }
            Err(e) if e.is_connectivity() => Err(e),
            Err(e) if e.is_no_data() => {
                info!(workstation_id, reason = %e, "尚无数据, 本轮不发布");
                Ok(WorkstationOutcome::NoData)
            }
            Err(e) => {
                error!(workstation_id, error = %e, "计算失败, 发布全空 KPI");
                self.clear_guarded(workstation_id, &targets).await
            }
        }
    }

    /// 清空并把非连接级的清空失败降级为"仅记录"
    async fn clear_guarded(
        &self,
        workstation_id: &str,
        targets: &PublishTargets,
    ) -> CalcResult<WorkstationOutcome> {
        match self.clear(targets).await {
            Ok(()) => Ok(WorkstationOutcome::Cleared),
            Err(e) if e.is_connectivity() => Err(e),
            Err(e) => {
                error!(workstation_id, error = %e, "清空失败, 仅记录");
                Ok(WorkstationOutcome::LoggedOnly)
            }
        }
    }

    /// 从工位实体解析两个发布对象
    async fn resolve_targets(&self, workstation_id: &str) -> CalcResult<PublishTargets> {
        let workstation = self.entities.fetch(workstation_id).await?;
        Ok(PublishTargets {
            oee_id: workstation.relationship(names::REF_OEE)?.to_string(),
            throughput_id: workstation.relationship(names::REF_THROUGHPUT)?.to_string(),
        })
    }

    async fn publish(
        &self,
        targets: &PublishTargets,
        snapshot: &crate::domain::kpi::KpiSnapshot,
    ) -> CalcResult<()> {
        self.entities
            .update_attributes(&targets.oee_id, snapshot.kpi_attributes())
            .await?;
        self.entities
            .update_attributes(&targets.throughput_id, snapshot.throughput_attributes())
            .await?;
        Ok(())
    }

    /// 发布全空 KPI 与产出预测
    async fn clear(&self, targets: &PublishTargets) -> CalcResult<()> {
        self.entities
            .update_attributes(&targets.oee_id, null_kpi_attributes())
            .await
            .map_err(CalcError::from)?;
        self.entities
            .update_attributes(&targets.throughput_id, null_throughput_attributes())
            .await
            .map_err(CalcError::from)?;
        Ok(())
    }

    /// 连接级故障后的安全措施: 尽力清空全部工位
    ///
    /// # 返回
    /// - 两个发布对象都确认置空的工位数（失败的只告警, 不计入）
    async fn clear_all(&self, workstation_ids: &[String]) -> usize {
        let mut cleared = 0;
        for workstation_id in workstation_ids {
            match self.resolve_targets(workstation_id).await {
                Ok(targets) => match self.clear(&targets).await {
                    Ok(()) => cleared += 1,
                    Err(e) => {
                        warn!(workstation_id = %workstation_id, error = %e, "全量清空失败")
                    }
                },
                Err(e) => warn!(workstation_id = %workstation_id, error = %e, "全量清空时发布对象不可解析"),
            }
        }
        cleared
    }
}
