//! 定位解析器
//!
//! 按策略表顺序逐个下发只读 JS 探针，第一个被接受的命中即为结果。
//! 解析是幂等、无副作用的：DOM 变化期间可以反复调用，
//! 调用方绝不应跨次复用旧的解析结果。

use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::Config;
use crate::infrastructure::DomBridge;
use crate::locator::strategy::{Presence, SemanticTarget};
use crate::utils::poll_until;

/// 探针返回的元素状态
#[derive(Debug, Clone, Deserialize)]
struct ElementFacts {
    found: bool,
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    top: bool,
    #[serde(default)]
    visible: bool,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    tag: String,
}

/// 一次成功解析的快照
///
/// 注意这不是元素句柄：DOM 随时可能换掉元素本体，
/// 交互脚本会用同一条策略重新定位后再动手。
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    /// 命中的策略序号（0 = 置信度最高）
    pub strategy_index: usize,
    /// 命中所在的 frame 深度（0 = 顶层文档）
    pub depth: u32,
    /// 是否位于顶层文档
    pub in_top_document: bool,
    /// 当前是否可见
    pub visible: bool,
    /// 是否带禁用标记（disabled / aria-disabled / class 含 disabled）
    pub disabled: bool,
    /// 元素标签名（小写）
    pub tag: String,
}

/// 解析结果：软失败用值表达，不抛错误
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(ResolvedElement),
    NotFound,
}

impl Resolution {
    pub fn found(&self) -> Option<&ResolvedElement> {
        match self {
            Resolution::Found(el) => Some(el),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// 定位解析器（无状态服务，按引用共享）
pub struct LocatorResolver {
    poll_interval: Duration,
}

impl LocatorResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
        }
    }

    /// 在预算内解析语义目标
    ///
    /// # 参数
    /// - `budget`: 总时限；DOM 未就绪时按固定间隔重试
    ///
    /// # 返回
    /// 预算内无任何策略命中时返回 `Resolution::NotFound`（不是错误）
    pub async fn resolve(
        &self,
        bridge: &DomBridge,
        target: &SemanticTarget,
        budget: Duration,
    ) -> Resolution {
        let hit = poll_until(self.poll_interval, budget, move || async move {
            self.probe_all(bridge, target).await
        })
        .await;

        match hit {
            Some(el) => {
                debug!(
                    "🎯 [{}] 策略 #{} 命中 (<{}> depth={} visible={} disabled={})",
                    target.role, el.strategy_index, el.tag, el.depth, el.visible, el.disabled
                );
                Resolution::Found(el)
            }
            None => {
                debug!("🕳 [{}] 预算 {:?} 内未命中任何策略", target.role, budget);
                Resolution::NotFound
            }
        }
    }

    /// 单轮解析（不等待；用于阻挡物扫描和确认信号轮询）
    pub async fn resolve_once(&self, bridge: &DomBridge, target: &SemanticTarget) -> Resolution {
        match self.probe_all(bridge, target).await {
            Some(el) => Resolution::Found(el),
            None => Resolution::NotFound,
        }
    }

    /// 按声明顺序探测整张策略表，返回第一个被接受的命中
    async fn probe_all(
        &self,
        bridge: &DomBridge,
        target: &SemanticTarget,
    ) -> Option<ResolvedElement> {
        for (index, strategy) in target.strategies.iter().enumerate() {
            let facts: ElementFacts = match bridge.eval_as(strategy.probe_js()).await {
                Ok(facts) => facts,
                Err(e) => {
                    // 导航中途探针会失败，视为本轮未命中，下一轮再试
                    trace!("[{}] 策略 #{} 探针执行失败: {}", target.role, index, e);
                    continue;
                }
            };
            if !facts.found {
                continue;
            }
            // 可见性要求：按钮类必须可见，file input 挂树即可
            if strategy.presence == Presence::Visible && !facts.visible {
                trace!("[{}] 策略 #{} 命中但不可见，跳过", target.role, index);
                continue;
            }
            return Some(ResolvedElement {
                strategy_index: index,
                depth: facts.depth,
                in_top_document: facts.top,
                visible: facts.visible,
                disabled: facts.disabled,
                tag: facts.tag,
            });
        }
        None
    }
}

/// 查一次目标的"命中 CSS 快速路径"：顶层文档 + 纯 CSS 策略时可走原生输入
pub(crate) fn fast_path_css(
    target: &SemanticTarget,
    resolved: &ResolvedElement,
) -> Option<&'static str> {
    if !resolved.in_top_document {
        return None;
    }
    target
        .strategies
        .get(resolved.strategy_index)
        .and_then(|s| s.css_selector())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::strategy::{LocatorStrategy, Predicate, SearchScope};

    static TARGET: SemanticTarget = SemanticTarget {
        role: "test-target",
        strategies: &[
            LocatorStrategy {
                predicate: Predicate::Css("button[data-e2e='x']"),
                scope: SearchScope::DocumentOnly,
                presence: Presence::Visible,
            },
            LocatorStrategy {
                predicate: Predicate::Text {
                    tags: "button",
                    needle: "x",
                },
                scope: SearchScope::DocumentOnly,
                presence: Presence::Visible,
            },
        ],
    };

    fn resolved(index: usize, top: bool) -> ResolvedElement {
        ResolvedElement {
            strategy_index: index,
            depth: if top { 0 } else { 1 },
            in_top_document: top,
            visible: true,
            disabled: false,
            tag: "button".to_string(),
        }
    }

    #[test]
    fn fast_path_requires_top_document_and_css() {
        assert_eq!(fast_path_css(&TARGET, &resolved(0, true)), Some("button[data-e2e='x']"));
        // frame 内命中不能走顶层快速路径
        assert_eq!(fast_path_css(&TARGET, &resolved(0, false)), None);
        // 文案策略没有可复用的选择器
        assert_eq!(fast_path_css(&TARGET, &resolved(1, true)), None);
    }

    #[test]
    fn facts_deserialization_tolerates_missing_fields() {
        let facts: ElementFacts = serde_json::from_str(r#"{"found": false}"#).unwrap();
        assert!(!facts.found);
        assert_eq!(facts.depth, 0);
        assert!(facts.tag.is_empty());
    }
}
