//! 会话层
//!
//! 把原始凭证文本变成结构化登录态，并在首次导航前注入浏览器

pub mod hydrator;
pub mod identity;

pub use hydrator::SessionHydrator;
pub use identity::{ClientProfile, CredentialField, Identity};
