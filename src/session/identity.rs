//! 登录身份模型

use serde::Deserialize;

/// 单个凭证字段（一条会话 cookie）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialField {
    /// 字段名（如 sessionid）
    pub name: String,
    /// 字段值（已去除引号和控制字符）
    pub value: String,
    /// 生效域（如 .tiktok.com）
    pub domain: String,
}

/// 客户端侧写：伪装的客户端签名和地域环境
#[derive(Debug, Clone)]
pub struct ClientProfile {
    /// User-Agent 签名
    pub user_agent: String,
    /// 语言环境
    pub locale: String,
    /// 时区
    pub timezone: String,
}

/// 结构化登录身份
///
/// 只有通过白名单过滤、且包含必需会话字段的身份才会被构造出来；
/// 持有 Identity 即意味着"可用"。
#[derive(Debug, Clone)]
pub struct Identity {
    /// 白名单内的凭证字段
    pub fields: Vec<CredentialField>,
    /// 客户端侧写
    pub profile: ClientProfile,
}

impl Identity {
    /// 字段名列表（用于日志，绝不输出值）
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// 浏览器导出格式的凭证记录（JSON 数组形式的输入）
#[derive(Debug, Deserialize)]
pub struct RawCredentialRecord {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
}
