//! 语义目标总表
//!
//! 每个角色一张声明式策略表，按置信度降序排列：
//! 站点自有的 data-e2e 属性 > 结构匹配 > 可访问性角色 > 文案匹配。
//! 文案匹配同时覆盖英文界面和法语界面变体（目标站点按地区下发不同文案）。

use crate::locator::strategy::{
    LocatorStrategy, Predicate, Presence, SearchScope, SemanticTarget,
};

use Predicate::{Css, RoleName, Text, Within};
use Presence::{AttachedOnly, Visible};
use SearchScope::{AllFrames, DocumentOnly};

/// 视频文件输入框
///
/// 几乎总是被样式化的上传按钮挡在身后且不可见，所以只要求挂树
pub static FILE_INPUT: SemanticTarget = SemanticTarget {
    role: "file-input",
    strategies: &[
        LocatorStrategy {
            predicate: Css("[data-e2e='upload-button'] input[type='file']"),
            scope: AllFrames,
            presence: AttachedOnly,
        },
        LocatorStrategy {
            predicate: Css("input[type='file'][accept*='video']"),
            scope: AllFrames,
            presence: AttachedOnly,
        },
        LocatorStrategy {
            predicate: Css("input[type='file']"),
            scope: AllFrames,
            presence: AttachedOnly,
        },
    ],
};

/// 打开文件选择的上传触发器（file input 完全不可达时的替代路径）
pub static UPLOAD_TRIGGER: SemanticTarget = SemanticTarget {
    role: "upload-trigger",
    strategies: &[
        LocatorStrategy {
            predicate: Css("div[role='button'][data-e2e='upload-button']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: RoleName {
                role: "button",
                name: "upload",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "button",
                needle: "importer",
            },
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 文案编辑器（富文本，contenteditable）
pub static CAPTION_EDITOR: SemanticTarget = SemanticTarget {
    role: "caption-editor",
    strategies: &[
        LocatorStrategy {
            predicate: Within {
                container: "[data-e2e='caption-container']",
                inner: "[contenteditable='true']",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css(".public-DraftEditor-content[contenteditable='true']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("div[contenteditable='true']"),
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 未勾选的合规确认框（按账号/地区条件性出现，找不到不算错）
pub static COMPLIANCE_CHECKBOX: SemanticTarget = SemanticTarget {
    role: "compliance-checkbox",
    strategies: &[
        LocatorStrategy {
            predicate: Within {
                container: "[data-e2e='upload-content-check']",
                inner: "input[type='checkbox']:not(:checked)",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("label[class*='consent'] input[type='checkbox']:not(:checked)"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("input[type='checkbox']:not(:checked)"),
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// "公开可见"选项
pub static VISIBILITY_PUBLIC: SemanticTarget = SemanticTarget {
    role: "visibility-public",
    strategies: &[
        LocatorStrategy {
            predicate: Css("[data-e2e='visibility-everyone']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: RoleName {
                role: "radio",
                name: "everyone",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "label, span",
                needle: "tout le monde",
            },
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 发布按钮
pub static PUBLISH_BUTTON: SemanticTarget = SemanticTarget {
    role: "publish-button",
    strategies: &[
        LocatorStrategy {
            predicate: Css("button[data-e2e='post-button']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: RoleName {
                role: "button",
                name: "post",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "button",
                needle: "publier",
            },
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 服务端处理完成的信号元素（部分界面变体根本没有这个信号）
pub static PROCESSING_DONE: SemanticTarget = SemanticTarget {
    role: "processing-done",
    strategies: &[
        LocatorStrategy {
            predicate: Css("[data-e2e='process-success']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "span, p, div",
                needle: "uploaded",
            },
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 发布成功的确认信号
pub static SUCCESS_SIGNAL: SemanticTarget = SemanticTarget {
    role: "success-signal",
    strategies: &[
        LocatorStrategy {
            predicate: Css("[data-e2e='publish-success']"),
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "div, span, p",
                needle: "has been published",
            },
            scope: AllFrames,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Text {
                tags: "div, span, p",
                needle: "publiée",
            },
            scope: AllFrames,
            presence: Visible,
        },
    ],
};

/// 全屏遮罩类阻挡物（cookie 横幅、弹窗遮罩）
pub static MODAL_OVERLAY: SemanticTarget = SemanticTarget {
    role: "modal-overlay",
    strategies: &[
        LocatorStrategy {
            predicate: Css("div[data-e2e='cookie-banner']"),
            scope: DocumentOnly,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("div[class*='cookie-banner']"),
            scope: DocumentOnly,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("div[class*='modal-mask'], div[class*='overlay-mask']"),
            scope: DocumentOnly,
            presence: Visible,
        },
    ],
};

/// 阻挡物内带文字的确认/关闭控件（优先语义化关掉，而不是暴力隐藏）
pub static MODAL_DISMISS: SemanticTarget = SemanticTarget {
    role: "modal-dismiss",
    strategies: &[
        LocatorStrategy {
            predicate: RoleName {
                role: "button",
                name: "accept all",
            },
            scope: DocumentOnly,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: RoleName {
                role: "button",
                name: "accept",
            },
            scope: DocumentOnly,
            presence: Visible,
        },
        LocatorStrategy {
            predicate: Css("button[aria-label='Close'], [data-e2e='modal-close-inner-button']"),
            scope: DocumentOnly,
            presence: Visible,
        },
    ],
};
