//! 应用错误类型
//!
//! 注意区分两类"失败"：
//! - 本模块中的错误是硬错误（配置、浏览器、文件、会话注水），沿 `?` 向上传播
//! - 定位失败（NotFound）、重试耗尽（Exhausted）、无确认信号（UnconfirmedSuccess）
//!   属于业务结果，用普通枚举值表达，见 `locator::Resolution` 和 `workflow::outcome`

use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 会话注水错误（登录态无法建立，整个 run 直接终止）
    #[error("会话注水错误: {0}")]
    Hydration(#[from] HydrationError),
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 会话注水错误
///
/// 这一类错误发生在导航之前，属于致命错误，不做重试
#[derive(Debug, Error)]
pub enum HydrationError {
    /// 过滤后没有任何白名单内的凭证字段
    #[error("凭证文本中没有任何有效的会话字段（共解析出 {parsed} 条，白名单命中 0 条）")]
    NoValidCredentials { parsed: usize },
    /// 缺少必需的会话字段（如 sessionid）
    #[error("缺少必需的会话字段，已保留字段: {kept:?}")]
    MissingRequiredField { kept: Vec<String> },
    /// 页面已经发生过导航，注入登录态为时已晚
    #[error("页面已导航，禁止再附加登录态（必须在首次导航前注入）")]
    AttachedAfterNavigation,
    /// 向浏览器写入凭证失败
    #[error("向浏览器注入凭证失败: {source}")]
    InjectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("配置无头浏览器失败: {message}")]
    ConfigurationFailed { message: String },
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在（例如待上传的视频）
    #[error("文件不存在: {path:?}")]
    NotFound { path: PathBuf },
    /// 读取文件失败
    #[error("读取文件失败 ({path:?}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path:?}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 必填配置缺失（例如既没有 COOKIES 也没有 COOKIES_FILE）
    #[error("缺少必填配置: {what}")]
    Missing { what: String },
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
