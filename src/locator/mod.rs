//! 元素定位子系统
//!
//! 语义目标（"publish-button"、"file-input"）到具体元素的解析，
//! 按声明顺序尝试多个定位策略，可递归搜索嵌套 frame。

pub mod resolver;
pub mod strategy;
pub mod targets;

pub use resolver::{LocatorResolver, Resolution, ResolvedElement};
pub use strategy::{LocatorStrategy, Predicate, Presence, SearchScope, SemanticTarget};
