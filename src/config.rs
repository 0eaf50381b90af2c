//! 程序配置
//!
//! 所有配置在启动时从环境变量一次性读入，之后不可变，
//! 以引用方式传给 workflow / orchestrator，不使用全局可变状态。

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 上传页面 URL
    pub target_url: String,
    /// 凭证文本（"name=value; ..." 或 JSON 记录数组），优先于 cookies_file
    pub cookies_inline: Option<String>,
    /// 凭证文件路径
    pub cookies_file: String,
    /// 客户端签名（User-Agent 伪装）
    pub user_agent: String,
    /// 语言环境（Accept-Language / navigator.language）
    pub locale: String,
    /// 时区
    pub timezone: String,
    /// 待上传的视频文件
    pub video_path: String,
    /// 文案（可为空，空则跳过 caption 阶段的输入）
    pub caption: Option<String>,
    /// 任务清单目录（存在则优先于单视频模式）
    pub manifest_folder: String,
    /// 重复执行次数（单视频模式下生成 run_count 个任务）
    pub run_count: usize,
    /// 演练模式：走到可见性阶段为止，不点发布
    pub dry_run: bool,
    /// 同时执行的 run 数量（每个 run 一个独立浏览器）
    pub max_concurrent_runs: usize,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,

    // --- 各阶段时限 ---
    /// 元素定位的默认预算
    pub resolve_budget: Duration,
    /// 定位轮询间隔
    pub poll_interval: Duration,
    /// 上传后等待处理完成的上限（可配置为多分钟）
    pub processing_ceiling: Duration,
    /// 等待发布按钮变为可用的上限
    pub publish_enable_ceiling: Duration,
    /// 点击发布后等待确认信号的上限
    pub confirm_ceiling: Duration,

    // --- 重试策略 ---
    /// 单个交互的最大重试轮数
    pub max_attempts: usize,
    /// 重试间隔基数（线性递增）
    pub backoff_base: Duration,
    /// 重试间隔上限
    pub backoff_cap: Duration,
    /// 单个交互的墙钟上限
    pub action_ceiling: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://www.tiktok.com/upload?lang=en".to_string(),
            cookies_inline: None,
            cookies_file: "cookies.txt".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            locale: "en-US".to_string(),
            timezone: "Europe/Paris".to_string(),
            video_path: "video.mp4".to_string(),
            caption: None,
            manifest_folder: "posts_toml".to_string(),
            run_count: 1,
            dry_run: false,
            max_concurrent_runs: 2,
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            resolve_budget: Duration::from_secs(15),
            poll_interval: Duration::from_millis(500),
            processing_ceiling: Duration::from_secs(180),
            publish_enable_ceiling: Duration::from_secs(60),
            confirm_ceiling: Duration::from_secs(45),
            max_attempts: 4,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(4),
            action_ceiling: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            target_url: std::env::var("TARGET_URL").unwrap_or(default.target_url),
            cookies_inline: std::env::var("COOKIES").ok().filter(|v| !v.trim().is_empty()),
            cookies_file: std::env::var("COOKIES_FILE").unwrap_or(default.cookies_file),
            user_agent: std::env::var("USER_AGENT").unwrap_or(default.user_agent),
            locale: std::env::var("LOCALE").unwrap_or(default.locale),
            timezone: std::env::var("TIMEZONE").unwrap_or(default.timezone),
            video_path: std::env::var("VIDEO_PATH").unwrap_or(default.video_path),
            caption: std::env::var("CAPTION").ok().filter(|v| !v.trim().is_empty()),
            manifest_folder: std::env::var("MANIFEST_FOLDER").unwrap_or(default.manifest_folder),
            run_count: env_parse("RUN_COUNT", default.run_count),
            dry_run: env_parse("DRY_RUN", default.dry_run),
            max_concurrent_runs: env_parse("MAX_CONCURRENT_RUNS", default.max_concurrent_runs),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
            resolve_budget: env_secs("RESOLVE_BUDGET_SECS", default.resolve_budget),
            poll_interval: env_millis("POLL_INTERVAL_MS", default.poll_interval),
            processing_ceiling: env_secs("PROCESSING_CEILING_SECS", default.processing_ceiling),
            publish_enable_ceiling: env_secs(
                "PUBLISH_ENABLE_CEILING_SECS",
                default.publish_enable_ceiling,
            ),
            confirm_ceiling: env_secs("CONFIRM_CEILING_SECS", default.confirm_ceiling),
            max_attempts: env_parse("MAX_ATTEMPTS", default.max_attempts),
            backoff_base: env_millis("BACKOFF_BASE_MS", default.backoff_base),
            backoff_cap: env_millis("BACKOFF_CAP_MS", default.backoff_cap),
            action_ceiling: env_secs("ACTION_CEILING_SECS", default.action_ceiling),
        }
    }
}

/// 读取环境变量并解析；解析失败时告警并退回默认值，绝不让脏配置静默生效
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                let err = ConfigError::EnvVarParseFailed {
                    var_name: name.to_string(),
                    value,
                    expected_type: std::any::type_name::<T>().to_string(),
                };
                warn!("⚠️ {}，改用默认值", err);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_secs(name: &str, default: Duration) -> Duration {
    Duration::from_secs(env_parse(name, default.as_secs()))
}

fn env_millis(name: &str, default: Duration) -> Duration {
    Duration::from_millis(env_parse(name, default.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_reads_valid_values() {
        std::env::set_var("CONFIG_TEST_GOOD_USIZE", "9");
        assert_eq!(env_parse("CONFIG_TEST_GOOD_USIZE", 7usize), 9);
        std::env::remove_var("CONFIG_TEST_GOOD_USIZE");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("CONFIG_TEST_BAD_USIZE", "not-a-number");
        assert_eq!(env_parse("CONFIG_TEST_BAD_USIZE", 7usize), 7);
        std::env::remove_var("CONFIG_TEST_BAD_USIZE");
    }

    #[test]
    fn env_secs_falls_back_on_garbage() {
        std::env::set_var("CONFIG_TEST_BAD_SECS", "ten");
        assert_eq!(
            env_secs("CONFIG_TEST_BAD_SECS", Duration::from_secs(15)),
            Duration::from_secs(15)
        );
        std::env::remove_var("CONFIG_TEST_BAD_SECS");
    }
}
