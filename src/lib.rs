//! # Upload Video Publish
//!
//! 一个面向不稳定第三方站点的自动化视频发布程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `DomBridge` - 唯一的 page owner，提供 eval() / 导航 / 文件注入能力
//!
//! ### ② 会话层（Session）
//! - `session/` - 登录态的解析、过滤与注入
//! - `SessionHydrator` - 把原始凭证文本变成可附加的浏览器身份
//!
//! ### ③ 定位层（Locator）
//! - `locator/` - 语义目标与只读探测
//! - `SemanticTarget` - 按角色声明的定位策略阶梯
//! - `LocatorResolver` - 在预算内解析目标，软失败用值表达
//!
//! ### ④ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ObstructionClearer` - 扫掉弹窗等阻挡物
//! - `ActionExecutor` - 带重试和力度升级的交互执行
//!
//! ### ⑤ 流程层（Workflow）
//! - `workflow/` - 定义"一次发布"的完整状态机
//! - `RunCtx` - 上下文封装（run 序号 + 视频名）
//! - `PublishWorkflow` - 注水 → 上传 → 文案 → 合规 → 发布 → 确认
//!
//! ### ⑥ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 批量调度器，管理并发和统计
//! - `orchestrator/run_processor` - 单次发布处理器，独占一个浏览器

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod locator;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::launch_headless_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::DomBridge;
pub use locator::{LocatorResolver, Resolution, SemanticTarget};
pub use models::PostTask;
pub use orchestrator::{process_run, App};
pub use services::{ActionExecutor, ActionOutcome, ObstructionClearer};
pub use session::SessionHydrator;
pub use workflow::{PublishWorkflow, RunCtx, RunOutcome, Verdict};
