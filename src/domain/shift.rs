// ==========================================
// 工位OEE指标计算系统 - 班次窗口
// ==========================================
// 职责: 当日班次边界与参考起点的时间语义
// 红线: 跨午夜班次不受支持, 解析阶段即拒绝
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 当日班次窗口 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ShiftWindow {
    /// 构造班次窗口; end 不晚于 start 时返回 None（跨午夜或排班数据损坏）
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end > start {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// 时刻是否落在窗口内（闭区间）
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// 把候选参考起点收敛到 [start, now]
    ///
    /// 不变式: 返回值 ∈ [self.start, now]
    pub fn clamp_ref_start(&self, candidate: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        candidate.max(self.start).min(now)
    }

    /// 自参考起点到班次结束的剩余毫秒数（产出预测的投影窗口）
    pub fn remaining_ms_from(&self, ref_start: DateTime<Utc>) -> i64 {
        (self.end - ref_start).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 5, h, m, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_window() {
        assert!(ShiftWindow::new(at(22, 0), at(6, 0)).is_none());
        assert!(ShiftWindow::new(at(6, 0), at(6, 0)).is_none());
    }

    #[test]
    fn test_contains_is_closed_interval() {
        let w = ShiftWindow::new(at(6, 0), at(14, 0)).unwrap();
        assert!(w.contains(at(6, 0)));
        assert!(w.contains(at(14, 0)));
        assert!(!w.contains(at(14, 1)));
        assert!(!w.contains(at(5, 59)));
    }

    #[test]
    fn test_clamp_ref_start() {
        let w = ShiftWindow::new(at(6, 0), at(14, 0)).unwrap();
        let now = at(10, 0);
        // 早于班次开始 → 收敛到班次开始
        assert_eq!(w.clamp_ref_start(at(3, 0), now), at(6, 0));
        // 晚于 now → 收敛到 now
        assert_eq!(w.clamp_ref_start(at(12, 0), now), now);
        // 窗口内原样返回
        assert_eq!(w.clamp_ref_start(at(8, 0), now), at(8, 0));
    }

    #[test]
    fn test_remaining_ms_from() {
        let w = ShiftWindow::new(at(6, 0), at(14, 0)).unwrap();
        assert_eq!(w.remaining_ms_from(at(6, 0)), 8 * 3600 * 1000);
        assert_eq!(w.remaining_ms_from(at(13, 0)), 3600 * 1000);
    }
}
