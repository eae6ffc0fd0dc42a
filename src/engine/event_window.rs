// ==========================================
// 工位OEE指标计算系统 - 事件窗口取数引擎
// ==========================================
// 职责: 取窗口内原始日志行, 数值化时间戳并按时间升序整理
// 约定: 工位流恒用 FromMidnight（为区间重建提供起点前状态）,
//       作业流用 FromShiftStart 且在取回后再按参考起点二次过滤
// ==========================================

use crate::domain::event::{sort_by_timestamp, AttributeEvent};
use crate::engine::error::{CalcError, CalcResult};
use crate::repository::event_store::EventLogStore;
use tracing::debug;

/// 窗口选择模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// 自当日零点起
    FromMidnight,
    /// 自班次开始起
    FromShiftStart,
}

impl WindowMode {
    /// 窗口下界（毫秒）
    pub fn lower_bound(&self, midnight_ms: i64, shift_start_ms: i64) -> i64 {
        match self {
            WindowMode::FromMidnight => midnight_ms,
            WindowMode::FromShiftStart => shift_start_ms,
        }
    }
}

// ==========================================
// EventWindowFetcher - 事件窗口取数器
// ==========================================

pub struct EventWindowFetcher<'a, L: EventLogStore + ?Sized> {
    logs: &'a L,
}

impl<'a, L: EventLogStore + ?Sized> EventWindowFetcher<'a, L> {
    pub fn new(logs: &'a L) -> Self {
        Self { logs }
    }

    /// 取窗口 [from_ms, now_ms] 内的事件并按时间升序返回
    ///
    /// # 返回
    /// - Ok(vec![]): 日志表不存在或窗口内无行（定义为"无数据", 非故障）
    /// - Err(InvalidSample): 出现非数值时间戳
    pub async fn fetch(
        &self,
        table: &str,
        mode: WindowMode,
        midnight_ms: i64,
        shift_start_ms: i64,
        now_ms: i64,
    ) -> CalcResult<Vec<AttributeEvent>> {
        let from_ms = mode.lower_bound(midnight_ms, shift_start_ms);
        let rows = match self.logs.query_window(table, from_ms, now_ms).await? {
            Some(rows) => rows,
            None => {
                debug!(table, "日志表尚不存在, 按空窗口处理");
                return Ok(Vec::new());
            }
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp_ms: i64 =
                row.recvtimets
                    .trim()
                    .parse()
                    .map_err(|_| CalcError::InvalidSample {
                        attribute: "recvtimets".to_string(),
                        value: row.recvtimets.clone(),
                    })?;
            events.push(AttributeEvent {
                timestamp_ms,
                attribute_name: row.attrname,
                attribute_value: row.attrvalue,
            });
        }

        sort_by_timestamp(&mut events);
        Ok(events)
    }
}

/// 二次过滤: 丢弃严格早于参考起点的事件
///
/// 防御设备在排班开始之前就写入作业日志
pub fn drop_before(events: Vec<AttributeEvent>, ref_start_ms: i64) -> Vec<AttributeEvent> {
    events
        .into_iter()
        .filter(|e| e.timestamp_ms >= ref_start_ms)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(ts: i64) -> AttributeEvent {
        AttributeEvent::new(ts, "GoodPartCounter", "1")
    }

    #[test]
    fn test_window_mode_lower_bound() {
        assert_eq!(WindowMode::FromMidnight.lower_bound(100, 500), 100);
        assert_eq!(WindowMode::FromShiftStart.lower_bound(100, 500), 500);
    }

    #[test]
    fn test_drop_before_keeps_boundary() {
        let events = vec![ev(100), ev(200), ev(300)];
        let kept = drop_before(events, 200);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].timestamp_ms, 200);
    }
}
