// ==========================================
// 工位OEE指标计算系统 - 配置层
// ==========================================
// 职责: 进程级运行配置的加载与默认值
// 红线: 配置一次构造、进程内不可变; 禁止共享可变默认容器
// 来源优先级: OEE_CONFIG_FILE 指定的 JSON 文件 > 环境变量 > 默认值
// ==========================================

use serde::Deserialize;
use std::path::PathBuf;

/// 默认巡检间隔（秒）
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// 进程级运行配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// 存储数据库路径
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// 两轮巡检之间的休眠秒数
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// 受管工位实体 id 列表
    #[serde(default)]
    pub workstation_ids: Vec<String>,
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("workstation-oee")
        .join("oee.db")
        .to_string_lossy()
        .to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            workstation_ids: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// 从进程环境加载配置
    ///
    /// # 环境变量
    /// - OEE_CONFIG_FILE: JSON 配置文件路径（存在则优先生效）
    /// - OEE_DB_PATH: 存储数据库路径
    /// - OEE_SWEEP_INTERVAL_SECS: 巡检间隔秒数
    /// - OEE_WORKSTATIONS: 逗号分隔的工位实体 id 列表
    pub fn from_env() -> anyhow::Result<Self> {
        if let Ok(path) = std::env::var("OEE_CONFIG_FILE") {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| anyhow::anyhow!("配置文件读取失败: {}: {}", path, e))?;
            let config: EngineConfig = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("配置文件解析失败: {}: {}", path, e))?;
            return Ok(config);
        }

        let mut config = EngineConfig::default();
        if let Ok(db_path) = std::env::var("OEE_DB_PATH") {
            config.db_path = db_path;
        }
        if let Ok(raw) = std::env::var("OEE_SWEEP_INTERVAL_SECS") {
            config.sweep_interval_secs = raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("巡检间隔非法: {}", raw))?;
        }
        if let Ok(raw) = std::env::var("OEE_WORKSTATIONS") {
            config.workstation_ids = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        Ok(config)
    }
}
