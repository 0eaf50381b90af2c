//! 单次发布处理器 - 编排层
//!
//! 一个 run 的完整生命周期：
//! 加载凭证 → 启动独立浏览器 → 交给 PublishWorkflow → 关闭浏览器
//!
//! 每个 run 独占一个浏览器实例。登录态注入发生在导航之前，
//! 共享浏览器会让不同账号的 cookie 互相污染，所以这里不共享。

use std::fs;

use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::{AppResult, ConfigError, FileError};
use crate::infrastructure::DomBridge;
use crate::models::PostTask;
use crate::workflow::{PublishWorkflow, RunCtx, RunOutcome};

/// 执行一次发布任务
///
/// # 参数
/// - `task`: 发布任务（视频 + 文案 + 可选专属凭证）
/// - `ctx`: run 上下文（用于日志前缀）
///
/// # 返回
/// 硬错误（浏览器起不来、凭证文件读不到）通过 `Err` 上浮；
/// 业务结果（确认 / 未确认 / 阶段失败）都在 `RunOutcome` 里
pub async fn process_run(config: &Config, task: &PostTask, ctx: &RunCtx) -> AppResult<RunOutcome> {
    info!("{} {}", ctx, "-".repeat(40));
    info!("{} 🎬 开始处理: {}", ctx, task.video_path.display());

    let raw_credentials = load_credentials(config, task)?;

    let (mut browser, page) = browser::launch_headless_browser().await?;
    let bridge = DomBridge::new(page);

    let workflow = PublishWorkflow::new(config);
    let outcome = workflow.run(&bridge, &raw_credentials, task, ctx).await;

    // 无论业务结果如何，浏览器都要收掉
    if let Err(e) = browser.close().await {
        warn!("{} ⚠️ 关闭浏览器失败: {}", ctx, e);
    }
    let _ = browser.wait().await;

    info!(
        "{} 🏷 结果: {:?}（终态 {:?}，警告 {} 条）",
        ctx,
        outcome.verdict,
        outcome.final_state,
        outcome
            .notes
            .iter()
            .filter(|n| matches!(n.severity, crate::workflow::outcome::Severity::Warning))
            .count()
    );

    Ok(outcome)
}

/// 加载本次 run 使用的凭证文本
///
/// 优先级：任务专属凭证文件 > 环境变量内联凭证 > 全局凭证文件
fn load_credentials(config: &Config, task: &PostTask) -> AppResult<String> {
    if let Some(path) = &task.cookie_file {
        return Ok(fs::read_to_string(path).map_err(|e| FileError::ReadFailed {
            path: path.clone(),
            source: e,
        })?);
    }
    if let Some(inline) = &config.cookies_inline {
        if !inline.trim().is_empty() {
            return Ok(inline.clone());
        }
    }
    if config.cookies_file.trim().is_empty() {
        return Err(ConfigError::Missing {
            what: "COOKIES 或 COOKIES_FILE（两者至少配置一个）".to_string(),
        }
        .into());
    }
    let path = std::path::PathBuf::from(&config.cookies_file);
    Ok(fs::read_to_string(&path).map_err(|e| FileError::ReadFailed { path, source: e })?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        let mut config = Config::from_env();
        config.cookies_inline = None;
        config.cookies_file = String::new();
        config
    }

    #[test]
    fn inline_credentials_win_over_missing_file() {
        let mut config = base_config();
        config.cookies_inline = Some("sessionid=abc".to_string());
        let task = PostTask::from_config(&config);
        let raw = load_credentials(&config, &task).unwrap();
        assert_eq!(raw, "sessionid=abc");
    }

    #[test]
    fn task_cookie_file_overrides_inline() {
        let dir = std::env::temp_dir().join("run_processor_cred_test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("account.txt");
        std::fs::write(&file, "sessionid=from-file").unwrap();

        let mut config = base_config();
        config.cookies_inline = Some("sessionid=inline".to_string());
        let mut task = PostTask::from_config(&config);
        task.cookie_file = Some(file.clone());

        let raw = load_credentials(&config, &task).unwrap();
        assert_eq!(raw, "sessionid=from-file");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_everything_is_config_error() {
        let config = base_config();
        let task = PostTask::from_config(&config);
        let err = load_credentials(&config, &task).unwrap_err();
        assert!(err.to_string().contains("COOKIES"));
    }
}
