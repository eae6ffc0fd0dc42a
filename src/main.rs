// ==========================================
// 工位OEE指标计算系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 运行模型: 单线程周期巡检, 工位顺序处理
// ==========================================

use std::sync::Arc;
use std::time::Duration;
use workstation_oee::config::EngineConfig;
use workstation_oee::engine::SweepRunner;
use workstation_oee::repository::{SqliteEntityStore, SqliteEventLog};
use workstation_oee::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", workstation_oee::APP_NAME);
    tracing::info!("系统版本: {}", workstation_oee::VERSION);
    tracing::info!("==================================================");

    // 加载配置
    let config = EngineConfig::from_env()?;
    tracing::info!("使用数据库: {}", config.db_path);
    tracing::info!("受管工位数: {}", config.workstation_ids.len());
    tracing::info!("巡检间隔: {}s", config.sweep_interval_secs);

    if config.workstation_ids.is_empty() {
        tracing::warn!("未配置任何工位(OEE_WORKSTATIONS), 巡检将空转");
    }

    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);

    // 周期巡检: 每轮独立建立存储连接, 轮末随作用域释放
    loop {
        match build_runner(&config.db_path) {
            Ok(runner) => {
                let report = runner.run_sweep(&config.workstation_ids).await;
                if report.aborted {
                    tracing::warn!("本轮巡检因存储故障提前中止");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "存储连接建立失败, 跳过本轮");
            }
        }
        tokio::time::sleep(sweep_interval).await;
    }
}

fn build_runner(db_path: &str) -> anyhow::Result<SweepRunner<SqliteEntityStore, SqliteEventLog>> {
    let entities = Arc::new(SqliteEntityStore::new(db_path)?);
    let logs = Arc::new(SqliteEventLog::new(db_path)?);
    Ok(SweepRunner::new(entities, logs))
}
