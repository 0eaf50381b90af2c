//! 清障服务 - 业务能力层
//!
//! 检测并压制拦截指针输入的临时阻挡物（弹窗遮罩、cookie 横幅）。
//! 先尝试语义化关闭（点击阻挡物里带文字的确认/关闭按钮）；
//! 短时间内点不掉就直接剥夺它拦截指针的能力并隐藏，但不把它从树上摘掉，
//! 摘节点可能连带破坏兄弟组件的状态。
//!
//! 阻挡物会反复出现（同意弹窗可被重新触发），
//! 所以每次交互尝试前都要调用，而不是每个 run 调一次。

use serde_json::json;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::DomBridge;
use crate::locator::strategy::FACTS_HELPERS_JS;
use crate::locator::targets::{MODAL_DISMISS, MODAL_OVERLAY};
use crate::locator::{LocatorResolver, SemanticTarget};

/// 清障服务
pub struct ObstructionClearer {
    resolver: LocatorResolver,
}

impl ObstructionClearer {
    pub fn new(config: &Config) -> Self {
        Self {
            resolver: LocatorResolver::new(config),
        }
    }

    /// 扫描并清除当前可见的阻挡物
    ///
    /// # 返回
    /// 本次清掉的阻挡物数量（0 表示路径本来就是通的）
    pub async fn clear(&self, bridge: &DomBridge) -> AppResult<usize> {
        // 没有阻挡物是常态，先做一轮廉价探测
        if !self.resolver.resolve_once(bridge, &MODAL_OVERLAY).await.is_found() {
            return Ok(0);
        }

        // 第一步：语义化关闭
        if self.try_dismiss(bridge).await? {
            // 关闭动画需要一点时间，复查一次
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            if !self.resolver.resolve_once(bridge, &MODAL_OVERLAY).await.is_found() {
                info!("🧹 阻挡物已通过确认按钮关闭");
                return Ok(1);
            }
        }

        // 第二步：强制压制（pointer-events: none + 隐藏，不摘节点）
        let neutralized = self.neutralize(bridge, &MODAL_OVERLAY).await?;
        if neutralized > 0 {
            info!("🧹 强制压制了 {} 个阻挡物", neutralized);
        }
        Ok(neutralized)
    }

    /// 点击阻挡物里的确认/关闭控件
    async fn try_dismiss(&self, bridge: &DomBridge) -> AppResult<bool> {
        let Some(resolved) = self
            .resolver
            .resolve_once(bridge, &MODAL_DISMISS)
            .await
            .found()
            .cloned()
        else {
            return Ok(false);
        };

        let strategy = &MODAL_DISMISS.strategies[resolved.strategy_index];
        let js = format!(
            r#"(() => {{
{walk}
if (!hit) return false;
hit.el.click();
return true;
}})()"#,
            walk = strategy.walk_js(),
        );
        let clicked: bool = bridge.eval_as(js).await.unwrap_or(false);
        debug!(
            "清障: 确认按钮 (策略 #{}) 点击{}",
            resolved.strategy_index,
            if clicked { "成功" } else { "失败" }
        );
        Ok(clicked)
    }

    /// 压制所有命中遮罩模式的元素：禁用指针拦截并隐藏
    async fn neutralize(&self, bridge: &DomBridge, target: &SemanticTarget) -> AppResult<usize> {
        let selectors: Vec<&str> = target
            .strategies
            .iter()
            .filter_map(|s| s.css_selector())
            .collect();
        let js = format!(
            r#"(() => {{
{helpers}
const selectors = {selectors};
let cleared = 0;
for (const sel of selectors) {{
    for (const el of document.querySelectorAll(sel)) {{
        if (!isVisible(el)) continue;
        el.style.pointerEvents = 'none';
        el.style.visibility = 'hidden';
        cleared += 1;
    }}
}}
return cleared;
}})()"#,
            helpers = FACTS_HELPERS_JS,
            selectors = json!(selectors),
        );
        let cleared: usize = bridge.eval_as(js).await.unwrap_or(0);
        Ok(cleared)
    }
}
