//! 流程层
//!
//! 定义"一次发布"的完整状态机：上传 → 文案 → 合规 → 可见性 → 发布 → 确认

pub mod outcome;
pub mod publish_flow;
pub mod run_ctx;

pub use outcome::{RunOutcome, StageNote, Verdict, WorkflowState};
pub use publish_flow::PublishWorkflow;
pub use run_ctx::RunCtx;
