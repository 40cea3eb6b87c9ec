/// Token 文件存储模块
///
/// 负责将授权 Token 以明文 JSON 持久化到本地文件
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::drive::types::StoredToken;

/// Token 文件存储
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// 创建指向指定文件的存储
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载 Token
    ///
    /// # Returns
    /// 文件不存在时返回 `None`
    ///
    /// # Errors
    /// - 文件无法读取
    /// - JSON 格式错误（不会静默重新授权）
    pub fn load(&self) -> Result<Option<StoredToken>> {
        if !self.path.exists() {
            tracing::debug!("Token 文件不存在: {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("读取 Token 文件失败: {}", self.path.display()))?;

        let token: StoredToken = serde_json::from_str(&content)
            .with_context(|| format!("解析 Token 文件失败（文件可能损坏）: {}", self.path.display()))?;

        tracing::debug!("已加载 Token: {}", self.path.display());

        Ok(Some(token))
    }

    /// 保存 Token（覆盖写入）
    ///
    /// # Errors
    /// - 序列化失败
    /// - 文件写入失败
    pub fn save(&self, token: &StoredToken) -> Result<()> {
        let content = serde_json::to_string_pretty(token).context("序列化 Token 失败")?;

        std::fs::write(&self.path, content)
            .with_context(|| format!("写入 Token 文件失败: {}", self.path.display()))?;

        restrict_permissions(&self.path)?;

        tracing::debug!("Token 已保存到: {}", self.path.display());

        Ok(())
    }
}

/// Token 为明文，仅允许当前用户读写
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("设置 Token 文件权限失败: {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn sample_token() -> StoredToken {
        StoredToken {
            token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec!["https://www.googleapis.com/auth/drive.metadata.readonly".to_string()],
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[test]
    fn test_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let token = sample_token();

        store.save(&token).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, token);
    }

    #[test]
    fn test_save_overwrites_previous_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save(&sample_token()).unwrap();

        let mut newer = sample_token();
        newer.token = Some("newer".to_string());
        store.save(&newer).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.access_token(), Some("newer"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(TokenStore::new(&path).load().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&sample_token()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
