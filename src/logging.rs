// ==========================================
// 工位OEE指标计算系统 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 巡检循环长期驻留, 默认只放行本引擎 info 与依赖库 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的过滤器: 引擎 info, 依赖库 warn
const DEFAULT_FILTER: &str = "warn,workstation_oee=info";

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: `warn,workstation_oee=info`）
///   例如: RUST_LOG=debug 或 RUST_LOG=workstation_oee=trace
///
/// # 示例
/// ```no_run
/// use workstation_oee::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 巡检日志按工位排查, 目标与行号都要带上
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统
///
/// 引擎放行到 debug 便于排查; 可重复调用, 后续调用为空操作
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("workstation_oee=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_is_repeatable() {
        init_test();
        init_test();
    }

    #[test]
    fn test_default_filter_parses() {
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }
}
