//! 发布流程 - 流程层
//!
//! 驱动一次完整发布的状态机：
//! 注水 → 导航 → 挂载视频 → 等处理 → 文案 → 合规 → 可见性 → 发布 → 确认
//!
//! 迁移守卫的宽严有别：
//! - 承重阶段（注水、挂载、发布点击）失败即判死
//! - 文案 / 合规 / 可见性 / 确认是尽力而为，失败降级成警告继续走
//!
//! 所有失败以类型化结果（`RunOutcome`）上浮，不让异常穿出流程边界。

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, FileError};
use crate::infrastructure::DomBridge;
use crate::locator::targets::{
    CAPTION_EDITOR, COMPLIANCE_CHECKBOX, FILE_INPUT, PROCESSING_DONE, PUBLISH_BUTTON,
    SUCCESS_SIGNAL, UPLOAD_TRIGGER, VISIBILITY_PUBLIC,
};
use crate::locator::{LocatorResolver, Resolution, SemanticTarget};
use crate::models::PostTask;
use crate::services::{Action, ActionAttempt, ActionExecutor, ActionOutcome, ObstructionClearer};
use crate::session::{ClientProfile, SessionHydrator};
use crate::utils::poll_until;
use crate::workflow::outcome::{RunOutcome, Severity, StageNote, Verdict, WorkflowState};
use crate::workflow::run_ctx::RunCtx;

/// 发布流程
///
/// 每个 run 新建一个实例；状态和身份归它独占，services 均为无状态
pub struct PublishWorkflow<'a> {
    config: &'a Config,
    hydrator: SessionHydrator,
    resolver: LocatorResolver,
    clearer: ObstructionClearer,
    executor: ActionExecutor,
    state: WorkflowState,
    notes: Vec<StageNote>,
    attempts: Vec<ActionAttempt>,
}

impl<'a> PublishWorkflow<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            hydrator: SessionHydrator::new(config),
            resolver: LocatorResolver::new(config),
            clearer: ObstructionClearer::new(config),
            executor: ActionExecutor::new(config),
            state: WorkflowState::Started,
            notes: Vec::new(),
            attempts: Vec::new(),
        }
    }

    /// 执行一次发布
    pub async fn run(
        mut self,
        bridge: &DomBridge,
        raw_credentials: &str,
        task: &PostTask,
        ctx: &RunCtx,
    ) -> RunOutcome {
        // ========== 阶段 1: 会话注水 ==========
        info!("{} 🔑 开始会话注水...", ctx);
        let profile = ClientProfile {
            user_agent: self.config.user_agent.clone(),
            locale: self.config.locale.clone(),
            timezone: self.config.timezone.clone(),
        };
        let identity = match self.hydrator.hydrate(raw_credentials, profile) {
            Ok(identity) => identity,
            Err(e) => return self.fail(ctx, "hydrate", e.to_string()),
        };
        if let Err(e) = self.hydrator.attach(&identity, bridge).await {
            return self.fail(ctx, "hydrate", e.to_string());
        }
        self.advance(ctx, WorkflowState::IdentityHydrated);

        // ========== 阶段 2: 导航 ==========
        if let Err(e) = bridge.goto(&self.config.target_url).await {
            return self.fail(ctx, "navigate", e.to_string());
        }
        self.advance(ctx, WorkflowState::Navigated);

        // ========== 阶段 3: 挂载视频（承重阶段） ==========
        if !task.video_path.exists() {
            let err = FileError::NotFound {
                path: task.video_path.clone(),
            };
            return self.fail(ctx, "file-attach", err.to_string());
        }
        info!("{} 📤 挂载视频: {}", ctx, task.video_path.display());
        match self
            .try_perform(bridge, &FILE_INPUT, Action::AttachFile(task.video_path.clone()))
            .await
        {
            Ok(ActionOutcome::Success(_)) => {}
            Ok(ActionOutcome::Exhausted { .. }) => {
                // 替代路径：点上传触发器，走文件选择事件拦截
                info!("{} 未找到可用的文件输入，改走上传触发器替代路径", ctx);
                match self
                    .try_perform(
                        bridge,
                        &UPLOAD_TRIGGER,
                        Action::AttachFile(task.video_path.clone()),
                    )
                    .await
                {
                    Ok(ActionOutcome::Success(_)) => {}
                    Ok(ActionOutcome::Exhausted { last_reason, .. }) => {
                        return self.fail(ctx, "file-attach", last_reason);
                    }
                    Err(e) => return self.fail(ctx, "file-attach", e.to_string()),
                }
            }
            Err(e) => return self.fail(ctx, "file-attach", e.to_string()),
        }
        self.advance(ctx, WorkflowState::FileAttached);

        // ========== 阶段 4: 等待处理完成（乐观降级） ==========
        info!(
            "{} ⏳ 等待服务端处理（上限 {:?}）...",
            ctx, self.config.processing_ceiling
        );
        let resolver = &self.resolver;
        let settled = poll_until(
            Duration::from_secs(2),
            self.config.processing_ceiling,
            move || async move {
                // 信号 1: 发布按钮解除禁用
                if let Resolution::Found(el) = resolver.resolve_once(bridge, &PUBLISH_BUTTON).await
                {
                    if !el.disabled {
                        return Some("publish-enabled");
                    }
                }
                // 信号 2: 显式的处理完成标志
                if resolver.resolve_once(bridge, &PROCESSING_DONE).await.is_found() {
                    return Some("processing-done");
                }
                None
            },
        )
        .await;
        match settled {
            Some(signal) => info!("{} ✓ 处理完成信号: {}", ctx, signal),
            None => {
                // 部分界面变体根本不给完成信号，按软警告乐观放行
                self.warn_note(
                    ctx,
                    "processing",
                    format!("{:?} 内未观察到处理完成信号，乐观继续", self.config.processing_ceiling),
                );
            }
        }
        self.advance(ctx, WorkflowState::ProcessingSettled);

        // ========== 阶段 5: 文案（尽力而为） ==========
        if let Some(caption) = task.caption.clone() {
            info!("{} ✍️ 填写文案: {}", ctx, crate::utils::logging::truncate_text(&caption, 40));
            match self
                .try_perform(bridge, &CAPTION_EDITOR, Action::Type(caption))
                .await
            {
                Ok(out) if out.is_success() => {}
                Ok(_) => self.warn_note(ctx, "caption", "找不到文案编辑器，跳过文案".to_string()),
                Err(e) => self.warn_note(ctx, "caption", format!("文案输入出错: {}", e)),
            }
        }
        self.advance(ctx, WorkflowState::CaptionSet);

        // ========== 阶段 6: 合规确认（条件性出现，找不到不算错） ==========
        let mut checked = 0usize;
        for _ in 0..5 {
            // 勾掉一个后 :not(:checked) 不再命中它，循环自然收敛
            if !self
                .resolver
                .resolve(bridge, &COMPLIANCE_CHECKBOX, Duration::from_secs(2))
                .await
                .is_found()
            {
                break;
            }
            match self.try_perform(bridge, &COMPLIANCE_CHECKBOX, Action::Click).await {
                Ok(out) if out.is_success() => checked += 1,
                Ok(_) => {
                    self.warn_note(ctx, "compliance", "合规项勾选失败".to_string());
                    break;
                }
                Err(e) => return self.fail(ctx, "compliance", e.to_string()),
            }
        }
        info!("{} ☑️ 勾选合规项 {} 个", ctx, checked);
        self.advance(ctx, WorkflowState::ComplianceSatisfied);

        // ========== 阶段 7: 可见性（尽力而为，选"公开"） ==========
        match self.try_perform(bridge, &VISIBILITY_PUBLIC, Action::Click).await {
            Ok(out) if out.is_success() => info!("{} 🌍 可见性已设为公开", ctx),
            Ok(_) => self.warn_note(ctx, "visibility", "未找到可见性控件，保持默认".to_string()),
            Err(e) => self.warn_note(ctx, "visibility", format!("设置可见性出错: {}", e)),
        }
        self.advance(ctx, WorkflowState::VisibilitySet);

        // ========== 演练模式在这里收尾 ==========
        if self.config.dry_run {
            info!("{} 🧪 演练模式：发布前的所有阶段已走完，不点发布", ctx);
            return self.finish(Verdict::DryRunAccepted);
        }

        // ========== 阶段 8: 点击发布（承重阶段，按钮会在校验期间反复闪烁禁用） ==========
        let resolver = &self.resolver;
        let enabled = poll_until(
            self.config.poll_interval,
            self.config.publish_enable_ceiling,
            move || async move {
                match resolver.resolve_once(bridge, &PUBLISH_BUTTON).await {
                    Resolution::Found(el) if !el.disabled => Some(()),
                    _ => None,
                }
            },
        )
        .await;
        if enabled.is_none() {
            return self.fail(
                ctx,
                "publish-click",
                format!(
                    "发布按钮在 {:?} 内从未变为可用",
                    self.config.publish_enable_ceiling
                ),
            );
        }
        match self.try_perform(bridge, &PUBLISH_BUTTON, Action::Click).await {
            Ok(ActionOutcome::Success(_)) => {}
            Ok(ActionOutcome::Exhausted { last_reason, .. }) => {
                return self.fail(ctx, "publish-click", last_reason);
            }
            Err(e) => return self.fail(ctx, "publish-click", e.to_string()),
        }
        self.advance(ctx, WorkflowState::PublishClicked);

        // ========== 阶段 9: 等确认信号 ==========
        info!(
            "{} 🔎 等待发布确认（上限 {:?}）...",
            ctx, self.config.confirm_ceiling
        );
        let resolver = &self.resolver;
        // 点击后页面可能正在跳转，单轮探测失败分不清"界面没了"和"探测本身挂了"，
        // 连续两轮都看不到上传界面才认定已发布
        let gone_streak = AtomicU32::new(0);
        let gone = &gone_streak;
        let confirmed = poll_until(Duration::from_secs(1), self.config.confirm_ceiling, move || {
            async move {
                if resolver.resolve_once(bridge, &SUCCESS_SIGNAL).await.is_found() {
                    return Some("confirm-signal");
                }
                if resolver.resolve_once(bridge, &FILE_INPUT).await.is_found() {
                    gone.store(0, Ordering::Relaxed);
                } else if gone.fetch_add(1, Ordering::Relaxed) + 1 >= 2 {
                    return Some("surface-gone");
                }
                None
            }
        })
        .await;
        match confirmed {
            Some(signal) => {
                info!("{} 🎉 发布确认: {}", ctx, signal);
                self.advance(ctx, WorkflowState::Confirmed);
                self.finish(Verdict::Confirmed)
            }
            None => {
                // 发布可能已在服务端成功，只是客户端看不到信号；单独归类，不算失败
                self.warn_note(
                    ctx,
                    "confirm",
                    format!("{:?} 内未观察到任何确认信号", self.config.confirm_ceiling),
                );
                self.finish(Verdict::UnconfirmedSuccess)
            }
        }
    }

    /// 执行交互并记录成功的尝试
    async fn try_perform(
        &mut self,
        bridge: &DomBridge,
        target: &SemanticTarget,
        action: Action,
    ) -> Result<ActionOutcome, AppError> {
        let outcome = self
            .executor
            .perform(bridge, &self.clearer, target, action)
            .await?;
        if let ActionOutcome::Success(attempt) = &outcome {
            self.attempts.push(attempt.clone());
        }
        Ok(outcome)
    }

    /// 状态前进并记录日志
    fn advance(&mut self, ctx: &RunCtx, next: WorkflowState) {
        let from = self.state;
        if self.state.advance_to(next) {
            info!("{} 🏁 状态: {:?} → {:?}", ctx, from, next);
        }
    }

    /// 记录软警告（阶段降级通过）
    fn warn_note(&mut self, ctx: &RunCtx, stage: &'static str, detail: String) {
        warn!("{} ⚠️ [{}] {}", ctx, stage, detail);
        self.notes.push(StageNote {
            stage,
            severity: Severity::Warning,
            detail,
        });
    }

    /// 判死：进入 Failed 状态并产出终局结果
    fn fail(&mut self, ctx: &RunCtx, stage: &'static str, detail: String) -> RunOutcome {
        error!("{} ❌ [{}] {}", ctx, stage, detail);
        self.notes.push(StageNote {
            stage,
            severity: Severity::Failure,
            detail,
        });
        self.state.advance_to(WorkflowState::Failed);
        RunOutcome {
            verdict: Verdict::Failed { stage },
            final_state: self.state,
            notes: self.notes.clone(),
            attempts: self.attempts.clone(),
        }
    }

    /// 正常收尾
    fn finish(&mut self, verdict: Verdict) -> RunOutcome {
        RunOutcome {
            verdict,
            final_state: self.state,
            notes: self.notes.clone(),
            attempts: self.attempts.clone(),
        }
    }
}
