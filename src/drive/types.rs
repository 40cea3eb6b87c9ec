/// Google Drive 数据结构
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token 过期判断的提前量（秒）
///
/// 只覆盖时钟偏差和单次运行的耗时，需远小于 Access Token 的最短有效期
const EXPIRY_SKEW_SECONDS: i64 = 30;

/// Drive 文件记录（只请求 id 和 name 两个字段）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    /// 文件 ID
    pub id: String,

    /// 显示名称
    pub name: String,
}

/// `files.list` 单页响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListPage {
    /// 本页文件
    #[serde(default)]
    pub files: Vec<DriveFile>,

    /// 下一页的续传令牌
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl FileListPage {
    /// 是否还有下一页（空字符串视为没有）
    pub fn next_token(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// 持久化的授权 Token
///
/// 字段布局与 Google 客户端库的 "authorized user" 文件一致，
/// 已有的 `token.json` 可以直接复用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Access Token（明文）
    #[serde(default)]
    pub token: Option<String>,

    /// Refresh Token（明文）
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// 刷新时使用的 Token 端点
    pub token_uri: String,

    /// 刷新时使用的客户端 ID
    pub client_id: String,

    /// 刷新时使用的客户端密钥
    #[serde(default)]
    pub client_secret: String,

    /// 已授权的权限范围
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Access Token 过期时间（UTC），缺失表示不过期
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Access Token 是否已过期（提前 30 秒视为过期）
    pub fn is_expired(&self) -> bool {
        self.expiry
            .is_some_and(|expiry| Utc::now() >= expiry - Duration::seconds(EXPIRY_SKEW_SECONDS))
    }

    /// 是否可以直接使用
    pub fn is_valid(&self) -> bool {
        self.access_token().is_some() && !self.is_expired()
    }

    /// 是否可以静默刷新
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// 非空的 Access Token
    pub fn access_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

/// 日志中只显示密钥的首尾
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{}...{}", head, tail)
}
