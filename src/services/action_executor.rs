//! 交互执行器 - 业务能力层
//!
//! 对一个已声明的语义目标执行单次交互（点击 / 输入 / 挂载文件），
//! 失败时按"重试轮 × 力度阶梯"两个维度推进：
//! - 每一轮先清障、再重新定位（绝不复用上一轮的解析结果，DOM 可能已换元素）
//! - 同一轮内力度从 Standard 逐级升到 Forced、Programmatic
//! - 轮与轮之间线性退避，封顶；整体受最大轮数和墙钟双重约束
//!
//! 重试耗尽返回 `Exhausted` 值，由工作流决定降级还是判死，这里不抛错。

use std::path::{Path, PathBuf};
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::EventFileChooserOpened;
use futures::StreamExt;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::DomBridge;
use crate::locator::resolver::fast_path_css;
use crate::locator::strategy::{js_str, LocatorStrategy, FACTS_HELPERS_JS};
use crate::locator::{LocatorResolver, ResolvedElement, SemanticTarget};
use crate::services::ObstructionClearer;
use crate::utils::poll::linear_backoff;

/// 请求的交互类型
#[derive(Debug, Clone)]
pub enum Action {
    /// 点击
    Click,
    /// 输入文本（富文本编辑器或表单控件）
    Type(String),
    /// 把文件路径挂载到文件输入
    AttachFile(PathBuf),
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Type(_) => "type",
            Action::AttachFile(_) => "attach-file",
        }
    }
}

/// 交互力度，同一轮内按此顺序逐级升级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceLevel {
    /// 常规交互：滚动到视口，检查可见/未被遮挡/未禁用后再动手
    Standard,
    /// 强制交互：跳过可交互性检查，必要时强改样式
    Forced,
    /// 程序化派发：直接在元素上合成底层事件
    Programmatic,
}

/// 力度阶梯（顺序即约定：更强的力度只在更弱的失败后使用）
pub const ESCALATION: [ForceLevel; 3] = [
    ForceLevel::Standard,
    ForceLevel::Forced,
    ForceLevel::Programmatic,
];

impl std::fmt::Display for ForceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ForceLevel::Standard => "standard",
            ForceLevel::Forced => "forced",
            ForceLevel::Programmatic => "programmatic",
        };
        write!(f, "{}", s)
    }
}

/// 一次成功交互的记录
#[derive(Debug, Clone)]
pub struct ActionAttempt {
    /// 目标角色
    pub role: &'static str,
    /// 命中的策略序号
    pub strategy_index: usize,
    /// 最终成功时的力度
    pub force: ForceLevel,
    /// 用掉的重试轮数（从 1 开始）
    pub iterations: usize,
}

/// 交互结果
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// 成功，附带过程记录
    Success(ActionAttempt),
    /// 重试耗尽
    Exhausted { last_reason: String, attempts: usize },
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success(_))
    }
}

/// 单次力度尝试的 JS 侧返回
#[derive(Debug, serde::Deserialize)]
struct JsActionResult {
    ok: bool,
    #[serde(default)]
    reason: Option<String>,
}

/// 交互执行器（无状态服务）
pub struct ActionExecutor {
    resolver: LocatorResolver,
    resolve_budget: Duration,
    max_attempts: usize,
    backoff_base: Duration,
    backoff_cap: Duration,
    ceiling: Duration,
}

impl ActionExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: LocatorResolver::new(config),
            resolve_budget: config.resolve_budget,
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base,
            backoff_cap: config.backoff_cap,
            ceiling: config.action_ceiling,
        }
    }

    /// 对语义目标执行一次交互，带重试和力度升级
    pub async fn perform(
        &self,
        bridge: &DomBridge,
        clearer: &ObstructionClearer,
        target: &SemanticTarget,
        action: Action,
    ) -> AppResult<ActionOutcome> {
        let deadline = Instant::now() + self.ceiling;
        let mut last_reason = format!("[{}] 目标从未解析成功", target.role);
        let mut attempts_used = 0;

        for iteration in 0..self.max_attempts {
            if Instant::now() >= deadline {
                last_reason = format!("[{}] 达到墙钟上限 {:?}", target.role, self.ceiling);
                break;
            }
            attempts_used = iteration + 1;

            // 1. 清障（阻挡物会反复出现，每轮都清）
            let cleared = clearer.clear(bridge).await?;
            if cleared > 0 {
                debug!("[{}] 本轮清障 {} 个", target.role, cleared);
            }

            // 2. 重新定位，绝不复用旧结果
            let resolution = self.resolver.resolve(bridge, target, self.resolve_budget).await;
            let Some(resolved) = resolution.found().cloned() else {
                last_reason = format!("[{}] 定位失败 (NotFound)", target.role);
                sleep(linear_backoff(self.backoff_base, self.backoff_cap, iteration)).await;
                continue;
            };

            // 3. 禁用状态：给一个宽限间隔后从头再来，不白费一次交互
            if resolved.disabled && !matches!(action, Action::AttachFile(_)) {
                last_reason = format!("[{}] 目标处于禁用状态", target.role);
                debug!("{}，等待后重试", last_reason);
                sleep(linear_backoff(self.backoff_base, self.backoff_cap, iteration)).await;
                continue;
            }

            // 4. 同一轮内按力度阶梯升级
            for force in ESCALATION {
                match self
                    .attempt_once(bridge, target, &resolved, &action, force)
                    .await
                {
                    Ok(None) => {
                        let attempt = ActionAttempt {
                            role: target.role,
                            strategy_index: resolved.strategy_index,
                            force,
                            iterations: iteration + 1,
                        };
                        info!(
                            "✋ [{}] {} 成功 (策略 #{}, 力度 {}, 第 {} 轮)",
                            target.role,
                            action.label(),
                            attempt.strategy_index,
                            attempt.force,
                            attempt.iterations
                        );
                        return Ok(ActionOutcome::Success(attempt));
                    }
                    Ok(Some(reason)) => {
                        debug!(
                            "[{}] {} 在力度 {} 下失败: {}，升级",
                            target.role,
                            action.label(),
                            force,
                            reason
                        );
                        last_reason = format!("[{}] {} ({})", target.role, reason, force);
                    }
                    Err(e) => {
                        debug!(
                            "[{}] {} 在力度 {} 下执行出错: {}",
                            target.role,
                            action.label(),
                            force,
                            e
                        );
                        last_reason = format!("[{}] 执行出错: {}", target.role, e);
                    }
                }
            }

            sleep(linear_backoff(self.backoff_base, self.backoff_cap, iteration)).await;
        }

        warn!(
            "⛔ [{}] {} 重试耗尽: {}",
            target.role,
            action.label(),
            last_reason
        );
        // 墙钟提前截断时 attempts_used 小于 max_attempts，如实上报
        Ok(ActionOutcome::Exhausted {
            last_reason,
            attempts: attempts_used,
        })
    }

    /// 单次力度尝试；Ok(None) = 成功，Ok(Some(reason)) = 本力度失败
    async fn attempt_once(
        &self,
        bridge: &DomBridge,
        target: &SemanticTarget,
        resolved: &ResolvedElement,
        action: &Action,
        force: ForceLevel,
    ) -> AppResult<Option<String>> {
        let strategy = &target.strategies[resolved.strategy_index];
        match action {
            Action::Click => self.click(bridge, target, resolved, strategy, force).await,
            Action::Type(text) => self.type_text(bridge, strategy, text, force).await,
            Action::AttachFile(path) => {
                self.attach_file(bridge, target, resolved, strategy, path, force)
                    .await
            }
        }
    }

    /// 点击：顶层 CSS 命中时 Standard 走真实 CDP 鼠标输入，其余走 JS
    async fn click(
        &self,
        bridge: &DomBridge,
        target: &SemanticTarget,
        resolved: &ResolvedElement,
        strategy: &LocatorStrategy,
        force: ForceLevel,
    ) -> AppResult<Option<String>> {
        if force == ForceLevel::Standard {
            if let Some(css) = fast_path_css(target, resolved) {
                if let Some(element) = bridge.find(css).await {
                    let native = async {
                        element.scroll_into_view().await?;
                        element.click().await?;
                        Ok::<_, chromiumoxide::error::CdpError>(())
                    }
                    .await;
                    return match native {
                        Ok(()) => Ok(None),
                        Err(e) => Ok(Some(format!("原生点击失败: {}", e))),
                    };
                }
            }
        }

        let tail = match force {
            ForceLevel::Standard => {
                r#"
const el = hit.el;
const doc = el.ownerDocument;
el.scrollIntoView({ block: 'center' });
if (!isVisible(el)) return { ok: false, reason: 'not-visible' };
if (isDisabled(el)) return { ok: false, reason: 'disabled' };
const rect = el.getBoundingClientRect();
const at = doc.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
if (at && !(el.contains(at) || at.contains(el))) return { ok: false, reason: 'covered' };
el.click();
return { ok: true };
"#
            }
            ForceLevel::Forced => {
                r#"
const el = hit.el;
el.scrollIntoView({ block: 'center' });
el.style.pointerEvents = 'auto';
el.style.visibility = 'visible';
el.click();
return { ok: true };
"#
            }
            ForceLevel::Programmatic => {
                r#"
const el = hit.el;
const win = el.ownerDocument.defaultView || window;
for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click']) {
    el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: win }));
}
return { ok: true };
"#
            }
        };
        self.run_action_js(bridge, strategy, tail.to_string()).await
    }

    /// 输入文本：优先走富文本的 insertText，表单控件走 value + input 事件
    async fn type_text(
        &self,
        bridge: &DomBridge,
        strategy: &LocatorStrategy,
        text: &str,
        force: ForceLevel,
    ) -> AppResult<Option<String>> {
        let text_js = js_str(text);
        let tail = match force {
            ForceLevel::Standard => format!(
                r#"
const el = hit.el;
const doc = el.ownerDocument;
el.scrollIntoView({{ block: 'center' }});
if (!isVisible(el)) return {{ ok: false, reason: 'not-visible' }};
el.focus();
if (el.isContentEditable) {{
    doc.execCommand('selectAll', false, null);
    const done = doc.execCommand('insertText', false, {text});
    return {{ ok: !!done, reason: done ? null : 'insertText-rejected' }};
}}
if ('value' in el) {{
    el.value = {text};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ ok: true }};
}}
return {{ ok: false, reason: 'not-editable' }};
"#,
                text = text_js
            ),
            ForceLevel::Forced => format!(
                r#"
const el = hit.el;
el.style.visibility = 'visible';
el.focus();
if (el.isContentEditable) {{
    el.innerText = {text};
    el.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
    return {{ ok: true }};
}}
if ('value' in el) {{
    el.value = {text};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    return {{ ok: true }};
}}
return {{ ok: false, reason: 'not-editable' }};
"#,
                text = text_js
            ),
            ForceLevel::Programmatic => format!(
                r#"
const el = hit.el;
const win = el.ownerDocument.defaultView || window;
if (el.isContentEditable) {{
    el.textContent = {text};
}} else if ('value' in el) {{
    const proto = el.tagName === 'TEXTAREA'
        ? win.HTMLTextAreaElement.prototype
        : win.HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value');
    if (setter && setter.set) {{ setter.set.call(el, {text}); }} else {{ el.value = {text}; }}
}} else {{
    return {{ ok: false, reason: 'not-editable' }};
}}
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return {{ ok: true }};
"#,
                text = text_js
            ),
        };
        self.run_action_js(bridge, strategy, tail).await
    }

    /// 挂载文件
    ///
    /// 力度映射：
    /// - Standard: 顶层文档里直接对 file input 写入文件路径
    /// - Forced / Programmatic: 拦截文件选择对话框，点击目标触发选择，
    ///   再通过拦截到的事件把路径喂进去（frame 内元素只有这条路）
    async fn attach_file(
        &self,
        bridge: &DomBridge,
        target: &SemanticTarget,
        resolved: &ResolvedElement,
        strategy: &LocatorStrategy,
        path: &Path,
        force: ForceLevel,
    ) -> AppResult<Option<String>> {
        match force {
            ForceLevel::Standard => {
                let Some(css) = fast_path_css(target, resolved) else {
                    return Ok(Some("不在顶层文档或无 CSS 快速路径，无法直接写入".to_string()));
                };
                let Some(element) = bridge.find(css).await else {
                    return Ok(Some("顶层快速路径查找失败".to_string()));
                };
                if resolved.tag != "input" {
                    return Ok(Some(format!("目标是 <{}>，不是 file input", resolved.tag)));
                }
                bridge.set_input_files(&element, path).await?;
                Ok(None)
            }
            ForceLevel::Forced | ForceLevel::Programmatic => {
                self.attach_via_chooser(bridge, strategy, path, force).await
            }
        }
    }

    /// 拦截文件选择对话框的挂载路径
    async fn attach_via_chooser(
        &self,
        bridge: &DomBridge,
        strategy: &LocatorStrategy,
        path: &Path,
        force: ForceLevel,
    ) -> AppResult<Option<String>> {
        bridge.intercept_file_chooser(true).await?;
        let mut events = bridge
            .page()
            .event_listener::<EventFileChooserOpened>()
            .await?;

        // 点击触发文件选择；Programmatic 力度下用合成事件点
        let click_tail = if force == ForceLevel::Programmatic {
            r#"
const el = hit.el;
const win = el.ownerDocument.defaultView || window;
for (const type of ['pointerdown', 'mousedown', 'pointerup', 'mouseup', 'click']) {
    el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: win }));
}
return { ok: true };
"#
        } else {
            r#"
const el = hit.el;
el.scrollIntoView({ block: 'center' });
el.style.pointerEvents = 'auto';
el.click();
return { ok: true };
"#
        };
        let click_result = match self
            .run_action_js(bridge, strategy, click_tail.to_string())
            .await
        {
            Ok(result) => result,
            Err(e) => {
                // 拦截必须在任何退出路径上关掉，否则后续交互全被吞
                let _ = bridge.intercept_file_chooser(false).await;
                return Err(e);
            }
        };

        let outcome = if let Some(reason) = click_result {
            Some(format!("触发文件选择失败: {}", reason))
        } else {
            match timeout(Duration::from_secs(10), events.next()).await {
                Ok(Some(event)) => match event.backend_node_id.clone() {
                    Some(node_id) => match bridge.set_input_files_on_node(node_id, path).await {
                        Ok(()) => None,
                        Err(e) => Some(format!("向选中节点写入文件失败: {}", e)),
                    },
                    None => Some("文件选择事件缺少节点信息".to_string()),
                },
                _ => Some("等待文件选择事件超时".to_string()),
            }
        };

        bridge.intercept_file_chooser(false).await?;
        Ok(outcome)
    }

    /// 组装并执行"定位 + 交互"一体的 JS：保证操作的就是刚定位到的元素
    async fn run_action_js(
        &self,
        bridge: &DomBridge,
        strategy: &LocatorStrategy,
        tail: String,
    ) -> AppResult<Option<String>> {
        let js = format!(
            r#"(() => {{
{helpers}
{walk}
if (!hit) return {{ ok: false, reason: 'stale-gone' }};
{tail}
}})()"#,
            helpers = FACTS_HELPERS_JS,
            walk = strategy.walk_js(),
            tail = tail,
        );
        let result: JsActionResult = bridge.eval_as(js).await?;
        if result.ok {
            Ok(None)
        } else {
            Ok(Some(result.reason.unwrap_or_else(|| "未知原因".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 力度阶梯顺序是对外约定：更强的力度只会在更弱的失败后出现
    #[test]
    fn escalation_order_is_standard_forced_programmatic() {
        assert_eq!(
            ESCALATION,
            [
                ForceLevel::Standard,
                ForceLevel::Forced,
                ForceLevel::Programmatic
            ]
        );
    }

    #[test]
    fn action_labels() {
        assert_eq!(Action::Click.label(), "click");
        assert_eq!(Action::Type("x".into()).label(), "type");
        assert_eq!(Action::AttachFile("v.mp4".into()).label(), "attach-file");
    }

    #[test]
    fn js_action_result_tolerates_missing_reason() {
        let ok: JsActionResult = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        assert!(ok.ok);
        let fail: JsActionResult =
            serde_json::from_str(r#"{"ok": false, "reason": "covered"}"#).unwrap();
        assert_eq!(fail.reason.as_deref(), Some("covered"));
    }
}
