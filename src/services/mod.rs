//! 业务能力层
//!
//! 无状态服务：清障、交互执行。只处理"单次能力"，不关心流程顺序。

pub mod action_executor;
pub mod obstruction;

pub use action_executor::{Action, ActionAttempt, ActionExecutor, ActionOutcome, ForceLevel};
pub use obstruction::ObstructionClearer;
