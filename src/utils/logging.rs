//! 日志工具模块
//!
//! 提供 tracing 初始化和统计输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 默认 info 级别（verbose 时 debug），RUST_LOG 环境变量优先级最高
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // try_init: 集成测试里会被多次调用，重复初始化直接忽略
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n视频发布日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(total_runs: usize, max_concurrent: usize, dry_run: bool) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动视频发布模式");
    info!("📋 待执行 run 数: {}", total_runs);
    info!("📊 最大并发数: {}", max_concurrent);
    if dry_run {
        info!("🧪 演练模式：不会点击发布按钮");
    }
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(
    confirmed: usize,
    unconfirmed: usize,
    failed: usize,
    total: usize,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 确认成功: {}/{}", confirmed, total);
    if unconfirmed > 0 {
        info!("❓ 未确认（可能已发布）: {}", unconfirmed);
    }
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
    }

    #[test]
    fn truncate_cuts_long_text() {
        let out = truncate_text("abcdefghij", 4);
        assert_eq!(out, "abcd...");
    }
}
