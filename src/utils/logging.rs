/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use crate::config::Config;
use crate::models::{Metric, MetricRun};
use std::time::Duration;
use tracing::{info, warn};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 文章难度分析 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📄 文章文件: {}", config.passages_file);
    info!("📊 并发 worker 数: {}", config.max_workers);
    info!(
        "🔁 最大尝试次数: {} (退避 {}–{} ms, 超时 {} 秒)",
        config.max_attempts,
        config.retry_base_delay_ms,
        config.retry_max_delay_ms,
        config.call_timeout_secs
    );
    info!("{}", "=".repeat(60));
}

/// 记录文章加载信息
pub fn log_passages_loaded(total: usize, metrics: usize) {
    info!("✓ 加载了 {} 篇文章", total);
    info!("📋 将依次计算 {} 个指标\n", metrics);
}

/// 记录指标开始
pub fn log_metric_start(index: usize, total: usize, metric: Metric) {
    info!("\n{}", "─".repeat(60));
    info!("📐 [{}/{}] 计算指标: {}", index, total, metric);
}

/// 记录指标完成
pub fn log_metric_complete(run: &MetricRun, elapsed: Duration) {
    match &run.error {
        Some(reason) => warn!("❌ 指标 {} 整体失败: {}", run.metric, reason),
        None => info!(
            "✓ 指标 {} 完成: 成功 {}/{} ({:.2} 秒)",
            run.metric,
            run.succeeded,
            run.succeeded + run.failed,
            elapsed.as_secs_f64()
        ),
    }
}

/// 打印最终统计信息
pub fn print_final_stats(passages: usize, metrics: usize, failures: usize, report_dir: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("📄 文章: {}", passages);
    info!("📐 指标: {}", metrics);
    info!("❌ 失败占位值: {}", failures);
    info!("{}", "=".repeat(60));
    info!("\n报告已保存至: {}", report_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
