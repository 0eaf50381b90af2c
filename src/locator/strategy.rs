//! 定位策略模型与 JS 探针生成
//!
//! 一个 `SemanticTarget` 是"语义角色 + 有序策略表"。
//! 策略顺序编码的是置信度排名：序号越小越可信，命中即停。
//! 目标站点的 data-e2e 属性最可信，文案匹配最不可信（受语言变体影响），
//! 所以属性匹配永远排在文案匹配前面。

/// 文档树上的匹配谓词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// 属性/结构匹配：CSS 选择器
    Css(&'static str),
    /// 可访问性角色 + 名称匹配（aria-label 或可见文本，子串、不区分大小写）
    RoleName {
        role: &'static str,
        name: &'static str,
    },
    /// 文案匹配：指定标签下可见文本包含给定子串（不区分大小写）
    Text {
        tags: &'static str,
        needle: &'static str,
    },
    /// 结构匹配：先定位容器，再在容器内找目标
    Within {
        container: &'static str,
        inner: &'static str,
    },
}

/// 搜索范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// 只搜当前文档
    DocumentOnly,
    /// 当前文档 + 递归搜索所有可达的嵌套 frame
    ///
    /// 上传控件可能渲染在嵌入的子文档里，只搜顶层会漏
    AllFrames,
}

/// 接受条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// 必须可见（有渲染尺寸、未被样式隐藏）——按钮类目标
    Visible,
    /// 挂在树上即可——file input 经常被样式化触发器故意藏起来，
    /// 交互前由调用方负责强制可见
    AttachedOnly,
}

/// 单个定位策略
#[derive(Debug, Clone, Copy)]
pub struct LocatorStrategy {
    pub predicate: Predicate,
    pub scope: SearchScope,
    pub presence: Presence,
}

/// 语义目标：角色标签 + 有序策略表
#[derive(Debug, Clone, Copy)]
pub struct SemanticTarget {
    pub role: &'static str,
    pub strategies: &'static [LocatorStrategy],
}

/// 探测结果中通用的可见性/禁用状态判断
pub(crate) const FACTS_HELPERS_JS: &str = r#"
const isVisible = (el) => {
    const rect = el.getBoundingClientRect();
    const win = el.ownerDocument.defaultView || window;
    const style = win.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
        && style.visibility !== 'hidden' && style.display !== 'none';
};
const isDisabled = (el) => !!(
    el.disabled
    || el.getAttribute('aria-disabled') === 'true'
    || (el.getAttribute('class') || '').split(/\s+/).some(c => c.includes('disabled'))
);
"#;

impl LocatorStrategy {
    /// 生成 `(doc) => element | null` 形式的查找函数
    fn finder_js(&self) -> String {
        match self.predicate {
            Predicate::Css(selector) => {
                format!("(doc) => doc.querySelector({})", js_str(selector))
            }
            Predicate::RoleName { role, name } => {
                let candidates = role_candidates(role);
                format!(
                    r#"(doc) => {{
    const want = {name}.toLowerCase();
    for (const el of doc.querySelectorAll({candidates})) {{
        const label = (el.getAttribute('aria-label') || el.textContent || '')
            .trim().toLowerCase();
        if (label.includes(want)) return el;
    }}
    return null;
}}"#,
                    name = js_str(name),
                    candidates = js_str(&candidates),
                )
            }
            Predicate::Text { tags, needle } => format!(
                r#"(doc) => {{
    const want = {needle}.toLowerCase();
    for (const el of doc.querySelectorAll({tags})) {{
        if ((el.textContent || '').trim().toLowerCase().includes(want)) return el;
    }}
    return null;
}}"#,
                needle = js_str(needle),
                tags = js_str(tags),
            ),
            Predicate::Within { container, inner } => format!(
                r#"(doc) => {{
    const box = doc.querySelector({container});
    return box ? box.querySelector({inner}) : null;
}}"#,
                container = js_str(container),
                inner = js_str(inner),
            ),
        }
    }

    /// 生成定位序言：执行后局部变量 `hit` 为 `{{el, depth}}` 或 null
    ///
    /// 探针和交互脚本共用这段序言，保证"看到的"和"操作的"是同一套谓词
    pub(crate) fn walk_js(&self) -> String {
        let frames = matches!(self.scope, SearchScope::AllFrames);
        format!(
            r#"
const finder = {finder};
const walk = (doc, depth) => {{
    let el = null;
    try {{ el = finder(doc); }} catch (e) {{ el = null; }}
    if (el) return {{ el, depth }};
    if (!{frames} || depth >= 4) return null;
    for (const fr of doc.querySelectorAll('iframe,frame')) {{
        let child = null;
        try {{ child = fr.contentDocument; }} catch (e) {{ child = null; }}
        if (!child) continue;
        const found = walk(child, depth + 1);
        if (found) return found;
    }}
    return null;
}};
const hit = walk(document, 0);
"#,
            finder = self.finder_js(),
            frames = frames,
        )
    }

    /// 生成只读探针：返回元素存在性与状态，不改动 DOM
    pub(crate) fn probe_js(&self) -> String {
        format!(
            r#"(() => {{
{helpers}
{walk}
if (!hit) return {{ found: false }};
return {{
    found: true,
    depth: hit.depth,
    top: hit.depth === 0,
    visible: isVisible(hit.el),
    disabled: isDisabled(hit.el),
    tag: hit.el.tagName.toLowerCase(),
}};
}})()"#,
            helpers = FACTS_HELPERS_JS,
            walk = self.walk_js(),
        )
    }

    /// 若是纯 CSS 谓词，返回选择器（顶层文档的快速路径可直接复用）
    pub fn css_selector(&self) -> Option<&'static str> {
        match self.predicate {
            Predicate::Css(selector) => Some(selector),
            _ => None,
        }
    }
}

/// 角色对应的候选元素选择器（显式 role 属性 + 隐式语义标签）
fn role_candidates(role: &str) -> String {
    match role {
        "button" => format!("[role='{}'], button", role),
        "checkbox" => format!("[role='{}'], input[type='checkbox']", role),
        "radio" => format!("[role='{}'], input[type='radio']", role),
        "textbox" => format!("[role='{}'], textarea, input[type='text']", role),
        _ => format!("[role='{}']", role),
    }
}

/// 把 Rust 字符串安全地嵌入 JS 源码
pub(crate) fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_finder_escapes_selector() {
        let strategy = LocatorStrategy {
            predicate: Predicate::Css("div[role='button'][data-e2e=\"upload\"]"),
            scope: SearchScope::DocumentOnly,
            presence: Presence::Visible,
        };
        let js = strategy.probe_js();
        // 选择器里的引号必须以 JSON 字面量形式出现
        assert!(js.contains(r#""div[role='button'][data-e2e=\"upload\"]""#));
        assert!(js.contains("walk(document, 0)"));
    }

    #[test]
    fn frame_scope_toggles_recursion() {
        let base = LocatorStrategy {
            predicate: Predicate::Css("input[type='file']"),
            scope: SearchScope::AllFrames,
            presence: Presence::AttachedOnly,
        };
        assert!(base.walk_js().contains("if (!true || depth >= 4)"));

        let top_only = LocatorStrategy {
            scope: SearchScope::DocumentOnly,
            ..base
        };
        assert!(top_only.walk_js().contains("if (!false || depth >= 4)"));
    }

    #[test]
    fn css_selector_only_for_css_predicate() {
        let css = LocatorStrategy {
            predicate: Predicate::Css("button"),
            scope: SearchScope::DocumentOnly,
            presence: Presence::Visible,
        };
        assert_eq!(css.css_selector(), Some("button"));

        let text = LocatorStrategy {
            predicate: Predicate::Text {
                tags: "button",
                needle: "post",
            },
            ..css
        };
        assert_eq!(text.css_selector(), None);
    }
}
