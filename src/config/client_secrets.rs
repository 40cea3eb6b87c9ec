/// OAuth2 客户端凭据读取模块
///
/// 读取 Google Cloud Console 下载的 `credentials.json`（"installed" 或 "web" 格式）
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Google OAuth2 授权端点（凭据文件未指定时使用）
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth2 Token 端点（凭据文件未指定时使用）
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Drive 元数据只读权限
pub const DRIVE_METADATA_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/drive.metadata.readonly";

/// OAuth2 客户端配置
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthConfig {
    /// Google OAuth2 客户端 ID
    pub client_id: String,

    /// Google OAuth2 客户端密钥（桌面客户端也会下发）
    #[serde(default)]
    pub client_secret: String,

    /// 授权端点
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    /// Token 端点
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    GOOGLE_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// 凭据文件外层结构，Google 按客户端类型分为两种
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<OAuthConfig>,
    web: Option<OAuthConfig>,
}

impl OAuthConfig {
    /// 从凭据文件加载
    ///
    /// # Errors
    /// - 文件不存在或无法读取
    /// - JSON 格式错误
    /// - 既没有 `installed` 也没有 `web` 段
    /// - `client_id` 为空
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| {
            format!(
                "读取 OAuth2 凭据文件失败: {}（请从 Google Cloud Console 下载桌面客户端凭据）",
                path.display()
            )
        })?;

        let config = Self::parse(&content)
            .with_context(|| format!("解析 OAuth2 凭据文件失败: {}", path.display()))?;

        tracing::info!("✅ 已加载 OAuth2 凭据: {}", path.display());

        Ok(config)
    }

    /// 解析凭据 JSON 文本
    pub fn parse(content: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(content)?;

        let config = file
            .installed
            .or(file.web)
            .ok_or_else(|| anyhow::anyhow!("凭据文件缺少 installed 或 web 段"))?;

        if config.client_id.trim().is_empty() {
            anyhow::bail!("凭据文件中的 client_id 为空");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_client() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "cv-lookup",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "shh",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let config = OAuthConfig::parse(json).unwrap();
        assert_eq!(config.client_id, "123.apps.googleusercontent.com");
        assert_eq!(config.client_secret, "shh");
        assert_eq!(config.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_parse_web_client_fills_default_endpoints() {
        let json = r#"{"web": {"client_id": "abc", "client_secret": "def"}}"#;

        let config = OAuthConfig::parse(json).unwrap();
        assert_eq!(config.client_id, "abc");
        assert_eq!(config.auth_uri, GOOGLE_AUTH_URI);
        assert_eq!(config.token_uri, GOOGLE_TOKEN_URI);
    }

    #[test]
    fn test_parse_rejects_unknown_layout() {
        assert!(OAuthConfig::parse(r#"{"service_account": {}}"#).is_err());
        assert!(OAuthConfig::parse(r#"{"installed": {"client_id": "  "}}"#).is_err());
        assert!(OAuthConfig::parse("not json").is_err());
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let err = OAuthConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("credentials.json"));
    }
}
