//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和资源生命周期，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_runner` - 批量发布调度器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 加载任务清单（Vec<PostTask>），无清单时回退到单视频模式
//! - 控制并发数量（Semaphore）
//! - 汇总全局统计并换算退出码
//!
//! ### `run_processor` - 单次发布处理器
//! - 为每个 run 启动独立的无头浏览器（run 之间完全隔离）
//! - 加载该 run 的凭证文本
//! - 委托 workflow::PublishWorkflow 执行发布
//! - 无论结果如何都关闭浏览器
//!
//! ## 层次关系
//!
//! ```text
//! batch_runner (处理 Vec<PostTask>)
//!     ↓
//! run_processor (处理单个 PostTask，独占一个 Browser)
//!     ↓
//! workflow::PublishWorkflow (状态机：注水 → 上传 → 发布 → 确认)
//!     ↓
//! services (能力层：resolver / clearer / executor)
//!     ↓
//! infrastructure (基础设施：DomBridge)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_runner 管批量，run_processor 管单个
//! 2. **资源隔离**：每个 run 独占浏览器，登录态互不污染
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_runner;
pub mod run_processor;

pub use batch_runner::App;
pub use run_processor::process_run;
