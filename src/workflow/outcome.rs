//! 工作流状态与终局结果
//!
//! 状态只进不退；到达 Failed 之后不再迁移。
//! "没等到确认信号"不是失败也不是成功，用 `UnconfirmedSuccess` 单独表达，
//! 由调用方决定按哪种口径统计。

use crate::services::ActionAttempt;

/// 工作流状态
///
/// 声明顺序即迁移顺序（派生的 Ord 用于前进性检查），Failed 必须在最后
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorkflowState {
    Started,
    IdentityHydrated,
    Navigated,
    FileAttached,
    ProcessingSettled,
    CaptionSet,
    ComplianceSatisfied,
    VisibilitySet,
    PublishClicked,
    Confirmed,
    Failed,
}

impl WorkflowState {
    /// 尝试前进到 next；倒退或原地踏步会被拒绝
    pub fn advance_to(&mut self, next: WorkflowState) -> bool {
        if next > *self {
            *self = next;
            true
        } else {
            false
        }
    }
}

/// 阶段备注的严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// 软警告：阶段降级通过（如找不到文案编辑器）
    Warning,
    /// 硬失败：run 就死在这个阶段
    Failure,
}

/// 带阶段标签的备注
#[derive(Debug, Clone)]
pub struct StageNote {
    /// 阶段标签（如 "file-attach"、"publish-click"）
    pub stage: &'static str,
    pub severity: Severity,
    pub detail: String,
}

/// run 的终局判定
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 拿到了明确的发布确认信号
    Confirmed,
    /// 发布已点击，但时限内没有任何可识别的确认信号；
    /// 服务端可能已经成功，刻意不把它归入成功或失败
    UnconfirmedSuccess,
    /// 演练模式走完了发布前的所有阶段
    DryRunAccepted,
    /// 在某个阶段内死亡
    Failed { stage: &'static str },
}

/// 单个 run 的完整结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdict: Verdict,
    pub final_state: WorkflowState,
    /// 过程中的警告与失败明细
    pub notes: Vec<StageNote>,
    /// 所有成功交互的记录（含策略序号与力度）
    pub attempts: Vec<ActionAttempt>,
}

impl RunOutcome {
    /// 该 run 是否计入"接受"（Confirmed / 演练通过 / 未确认按乐观口径计入）
    pub fn is_accepted(&self) -> bool {
        matches!(
            self.verdict,
            Verdict::Confirmed | Verdict::UnconfirmedSuccess | Verdict::DryRunAccepted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_advances_strictly_forward() {
        let mut state = WorkflowState::Started;
        assert!(state.advance_to(WorkflowState::IdentityHydrated));
        assert!(state.advance_to(WorkflowState::Navigated));
        assert!(state.advance_to(WorkflowState::FileAttached));
        // 原地踏步与倒退都被拒绝
        assert!(!state.advance_to(WorkflowState::FileAttached));
        assert!(!state.advance_to(WorkflowState::Started));
        assert_eq!(state, WorkflowState::FileAttached);
    }

    #[test]
    fn failed_is_reachable_from_any_state_and_terminal() {
        let mut state = WorkflowState::Navigated;
        assert!(state.advance_to(WorkflowState::Failed));
        // Failed 是终点，连 Confirmed 也进不去
        assert!(!state.advance_to(WorkflowState::Confirmed));
        assert_eq!(state, WorkflowState::Failed);
    }

    #[test]
    fn states_can_be_skipped_but_never_revisited() {
        // 合规/可见性等阶段允许降级跳过，状态依然单向前进
        let mut state = WorkflowState::ProcessingSettled;
        assert!(state.advance_to(WorkflowState::ComplianceSatisfied));
        assert!(!state.advance_to(WorkflowState::CaptionSet));
    }

    #[test]
    fn unconfirmed_counts_as_accepted() {
        let outcome = RunOutcome {
            verdict: Verdict::UnconfirmedSuccess,
            final_state: WorkflowState::PublishClicked,
            notes: vec![],
            attempts: vec![],
        };
        assert!(outcome.is_accepted());

        let failed = RunOutcome {
            verdict: Verdict::Failed { stage: "publish-click" },
            final_state: WorkflowState::Failed,
            notes: vec![],
            attempts: vec![],
        };
        assert!(!failed.is_accepted());
    }
}
