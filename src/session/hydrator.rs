//! 会话注水器
//!
//! `hydrate`: 原始凭证文本 -> 结构化 Identity
//! `attach`: 在首次导航前，把 Identity 写入浏览器（cookie / UA / 语言 / 时区）
//!
//! 解析策略刻意宽松（接受分号分隔列表和 JSON 记录数组两种形式），
//! 过滤策略刻意严格（只保留白名单字段，未知字段静默丢弃），
//! 防止脏字段在底层协议报错。

use chromiumoxide::cdp::browser_protocol::emulation::{
    SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use phf::phf_set;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::HydrationError;
use crate::infrastructure::DomBridge;
use crate::session::identity::{ClientProfile, CredentialField, Identity, RawCredentialRecord};

/// 有业务意义的会话字段白名单
///
/// 目标站点的会话由这组 cookie 共同构成，其余字段（统计、实验分组等）
/// 注入后轻则无效，重则触发风控，统一丢弃。
static CREDENTIAL_ALLOW_LIST: phf::Set<&'static str> = phf_set! {
    "sessionid",
    "sessionid_ss",
    "sid_tt",
    "sid_guard",
    "sid_ucp_v1",
    "ssid_ucp_v1",
    "uid_tt",
    "uid_tt_ss",
    "ttwid",
    "msToken",
    "odin_tt",
    "tt_csrf_token",
    "tt_chain_token",
    "passport_csrf_token",
    "cmpl_token",
    "store-idc",
    "store-country-code",
};

/// 必需字段：至少要有其中一个，否则登录态不成立
static REQUIRED_ANY: phf::Set<&'static str> = phf_set! {
    "sessionid",
    "sessionid_ss",
    "sid_tt",
};

fn control_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1F\x7F]").expect("固定模式必然有效"))
}

/// 会话注水器
pub struct SessionHydrator {
    /// cookie 默认生效域（从 target_url 推导）
    default_domain: String,
}

impl SessionHydrator {
    pub fn new(config: &Config) -> Self {
        Self {
            default_domain: host_scope(&config.target_url),
        }
    }

    /// 把原始凭证文本注水为结构化身份
    ///
    /// # 参数
    /// - `raw_credentials`: "name=value; name=value" 列表，或 JSON 记录数组
    /// - `profile`: 客户端侧写（UA / 语言 / 时区），UA 中的控制字符同样会被清洗
    pub fn hydrate(
        &self,
        raw_credentials: &str,
        mut profile: ClientProfile,
    ) -> Result<Identity, HydrationError> {
        let entries = if raw_credentials.trim_start().starts_with('[') {
            self.parse_record_list(raw_credentials)
        } else {
            self.parse_delimited(raw_credentials)
        };
        let parsed = entries.len();

        // 白名单过滤：未知字段静默丢弃
        let fields: Vec<CredentialField> = entries
            .into_iter()
            .filter(|f| CREDENTIAL_ALLOW_LIST.contains(f.name.as_str()))
            .collect();

        if fields.is_empty() {
            return Err(HydrationError::NoValidCredentials { parsed });
        }

        if !fields.iter().any(|f| REQUIRED_ANY.contains(f.name.as_str())) {
            return Err(HydrationError::MissingRequiredField {
                kept: fields.into_iter().map(|f| f.name).collect(),
            });
        }

        profile.user_agent = normalize(&profile.user_agent);

        let identity = Identity { fields, profile };
        info!(
            "🔑 会话注水成功: 保留 {} 个字段 {:?}",
            identity.fields.len(),
            identity.field_names()
        );
        Ok(identity)
    }

    /// 把身份附加到浏览器上下文
    ///
    /// 必须发生在首次导航之前，否则返回 `AttachedAfterNavigation`
    pub async fn attach(
        &self,
        identity: &Identity,
        bridge: &DomBridge,
    ) -> Result<(), HydrationError> {
        if bridge.has_navigated() {
            return Err(HydrationError::AttachedAfterNavigation);
        }

        let page = bridge.page();

        // 1. 注入 cookie
        let cookies: Vec<CookieParam> = identity
            .fields
            .iter()
            .map(|f| {
                let mut cookie = CookieParam::new(f.name.clone(), f.value.clone());
                cookie.domain = Some(f.domain.clone());
                cookie.path = Some("/".to_string());
                cookie.secure = Some(true);
                cookie
            })
            .collect();
        page.set_cookies(cookies)
            .await
            .map_err(|e| HydrationError::InjectionFailed {
                source: Box::new(e),
            })?;

        // 2. 客户端签名
        page.set_user_agent(identity.profile.user_agent.as_str())
            .await
            .map_err(|e| HydrationError::InjectionFailed {
                source: Box::new(e),
            })?;

        // 3. 语言与时区
        page.execute(SetLocaleOverrideParams {
            locale: Some(identity.profile.locale.clone()),
        })
        .await
        .map_err(|e| HydrationError::InjectionFailed {
            source: Box::new(e),
        })?;
        page.execute(SetTimezoneOverrideParams::new(
            identity.profile.timezone.clone(),
        ))
        .await
        .map_err(|e| HydrationError::InjectionFailed {
            source: Box::new(e),
        })?;

        debug!(
            "登录态已注入: {} 个 cookie, UA 长度 {}",
            identity.fields.len(),
            identity.profile.user_agent.len()
        );
        Ok(())
    }

    /// 解析 "name=value; name=value" 形式
    fn parse_delimited(&self, raw: &str) -> Vec<CredentialField> {
        raw.split(';')
            .filter_map(|item| {
                let item = item.trim();
                let (name, value) = item.split_once('=')?;
                self.build_field(name, value, None)
            })
            .collect()
    }

    /// 解析 JSON 记录数组形式（浏览器插件导出格式）
    fn parse_record_list(&self, raw: &str) -> Vec<CredentialField> {
        let records: Vec<RawCredentialRecord> = match serde_json::from_str(raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("JSON 凭证解析失败，按空列表处理: {}", e);
                return Vec::new();
            }
        };
        records
            .into_iter()
            .filter_map(|r| self.build_field(&r.name, &r.value, r.domain))
            .collect()
    }

    /// 清洗并构造单个字段；名或值为空则拒绝
    fn build_field(
        &self,
        name: &str,
        value: &str,
        domain: Option<String>,
    ) -> Option<CredentialField> {
        let name = normalize(trim_quotes(name.trim()));
        let value = normalize(trim_quotes(value.trim()));
        if name.is_empty() || value.is_empty() {
            return None;
        }
        Some(CredentialField {
            name,
            value,
            domain: domain
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| self.default_domain.clone()),
        })
    }
}

/// 去掉值两端的成对引号
fn trim_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').and_then(|v| v.strip_suffix('"')).unwrap_or(s);
    s.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')).unwrap_or(s)
}

/// 清除回车、换行及其他不可打印字符
///
/// 这些字节一旦进入 cookie 头或 UA 头会直接破坏外发协议
fn normalize(s: &str) -> String {
    control_chars().replace_all(s, "").into_owned()
}

/// 从目标 URL 推导 cookie 生效域（"https://www.xx.com/path" -> ".xx.com"）
fn host_scope(url: &str) -> String {
    let host = url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .split(['/', '?'])
        .next()
        .unwrap_or("");
    // 去掉 www 前缀，留父域
    let parent = host.strip_prefix("www.").unwrap_or(host);
    if parent.is_empty() {
        String::new()
    } else {
        format!(".{}", parent)
    }
}
