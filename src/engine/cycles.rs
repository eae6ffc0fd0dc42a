// ==========================================
// 工位OEE指标计算系统 - 生产循环计数引擎
// ==========================================
// 职责: 把周期性计数器快照折算为完成循环数
// 算法: 去重取 min/max; 集合含 0 说明窗口恰从复位点开始,
//       否则推断存在一个窗口前已开始的循环(+1)
// 前提: 计数器在窗口内单调递增, 仅在循环边界复位为 0
// ==========================================

use crate::domain::kpi::CycleCounts;
use crate::engine::error::{CalcError, CalcResult};
use std::collections::BTreeSet;

// ==========================================
// CycleCounter - 循环计数器
// ==========================================

pub struct CycleCounter {
    parts_per_cycle: i64,
}

impl CycleCounter {
    /// 创建计数器; PartsPerCycle 必须为正
    pub fn new(parts_per_cycle: i64) -> CalcResult<Self> {
        if parts_per_cycle <= 0 {
            return Err(CalcError::MalformedReference(format!(
                "PartsPerCycle 必须为正, 实际={}",
                parts_per_cycle
            )));
        }
        Ok(Self { parts_per_cycle })
    }

    /// 单个计数器的循环数
    ///
    /// # 参数
    /// - samples: 窗口内观测到的计数值（字符串形态, 允许重复与乱序）
    /// - attribute: 计数器属性名（用于错误报文）
    ///
    /// # 返回
    /// - Ok(0): 窗口内无快照
    /// - Err(InvalidSample): 出现非数值快照
    pub fn count_counter(&self, samples: &[String], attribute: &str) -> CalcResult<i64> {
        if samples.is_empty() {
            return Ok(0);
        }

        // 去重 + 数值化; BTreeSet 同时给出 min/max
        let mut values = BTreeSet::new();
        for sample in samples {
            let value: i64 = sample.trim().parse().map_err(|_| CalcError::InvalidSample {
                attribute: attribute.to_string(),
                value: sample.clone(),
            })?;
            values.insert(value);
        }

        // 非空集合必有首尾元素
        let min = *values.iter().next().unwrap_or(&0);
        let max = *values.iter().next_back().unwrap_or(&0);

        let complete = (max - min) / self.parts_per_cycle;
        if values.contains(&0) {
            // 窗口恰从复位点开始
            Ok(complete)
        } else {
            // 窗口从循环中段开始, 补计起始循环
            Ok(complete + 1)
        }
    }

    /// 良品/不良品两路计数器折算为循环计数
    pub fn count(&self, good_samples: &[String], reject_samples: &[String]) -> CalcResult<CycleCounts> {
        use crate::domain::entity::names;
        let good = self.count_counter(good_samples, names::GOOD_PART_COUNTER)?;
        let scrap = self.count_counter(reject_samples, names::REJECT_PART_COUNTER)?;
        Ok(CycleCounts { good, scrap })
    }
}
