/// Token 获取与刷新管理模块
use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::token_store::TokenStore;
use crate::drive::types::StoredToken;

/// 授权能力
///
/// 生产环境由浏览器交互流程实现，测试中替换为假实现
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// 交互式获取全新的 Token
    async fn acquire(&self) -> Result<StoredToken>;

    /// 使用 Refresh Token 静默刷新
    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken>;
}

/// 获取可用的 Token
///
/// 1. Token 文件存在且有效：直接返回，不写文件
/// 2. 已过期但带 Refresh Token：静默刷新
/// 3. 其他情况：走交互式授权
///
/// 刷新或重新授权后都会覆盖写回 Token 文件
///
/// # Errors
/// - Token 文件损坏
/// - 刷新失败（不会退回交互式授权）
/// - 交互式授权失败
pub async fn obtain_credentials<A>(store: &TokenStore, authorizer: &A) -> Result<StoredToken>
where
    A: Authorizer + ?Sized,
{
    let existing = store.load()?;

    if let Some(token) = &existing {
        if token.is_valid() {
            tracing::info!("✅ 使用已保存的 Token: {}", store.path().display());
            return Ok(token.clone());
        }
    }

    let token = match existing {
        Some(token) if token.is_expired() && token.can_refresh() => {
            tracing::info!(
                "Access Token 已过期（{}），自动刷新",
                token
                    .expiry
                    .map(|e| e.to_rfc3339())
                    .unwrap_or_default()
            );
            authorizer.refresh(&token).await.context("刷新 Access Token 失败")?
        }
        _ => authorizer.acquire().await.context("OAuth2 授权失败")?,
    };

    store.save(&token)?;

    tracing::info!("✅ Token 已保存: {}", store.path().display());

    Ok(token)
}
