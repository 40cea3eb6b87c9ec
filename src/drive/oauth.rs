/// Google Drive OAuth2 认证流程
///
/// 实现完整的 OAuth2 授权码流程（带 PKCE）以及 Refresh Token 刷新
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, RequestTokenError, Scope, TokenResponse, TokenUrl,
    basic::{BasicClient, BasicErrorResponseType},
};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tiny_http::{Header, Response, Server, StatusCode};
use tokio::sync::oneshot;
use url::Url;

use crate::config::Config;
use crate::config::client_secrets::{DRIVE_METADATA_READONLY_SCOPE, GOOGLE_AUTH_URI, OAuthConfig};
use crate::drive::token::Authorizer;
use crate::drive::types::{StoredToken, mask_secret};

/// Token 响应未给出有效期时的默认值（秒）
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// OAuth2 成功页面 HTML
const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>授权成功 - cvid</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Arial, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
            background: #f4f6fb;
        }
        .container {
            background: white;
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.1);
            text-align: center;
            max-width: 400px;
        }
        .checkmark { font-size: 64px; color: #4caf50; }
    </style>
</head>
<body>
    <div class="container">
        <div class="checkmark">✓</div>
        <h1>授权成功</h1>
        <p>Google Drive 已授权，可以关闭此页面并返回终端。</p>
    </div>
</body>
</html>"#;

/// OAuth2 错误页面 HTML
const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>授权失败 - cvid</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Arial, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            height: 100vh;
            margin: 0;
            background: #fbf4f4;
        }
        .container {
            background: white;
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0,0,0,0.1);
            text-align: center;
            max-width: 400px;
        }
        .cross { font-size: 64px; color: #f44336; }
    </style>
</head>
<body>
    <div class="container">
        <div class="cross">✗</div>
        <h1>授权失败</h1>
        <p>未能完成 Google Drive 授权，请返回终端查看错误信息。</p>
    </div>
</body>
</html>"#;

/// 浏览器交互式授权
///
/// `acquire` 走完整的授权码流程，`refresh` 使用 Token 自带的客户端信息静默刷新
#[derive(Debug, Clone)]
pub struct BrowserAuthorizer {
    /// OAuth2 客户端凭据文件，仅在需要交互授权时读取
    credentials_path: PathBuf,

    /// 本地回调端口（0 = 系统分配）
    callback_port: u16,

    /// 回调等待超时
    callback_timeout: Duration,
}

impl BrowserAuthorizer {
    pub fn new(config: &Config) -> Self {
        Self {
            credentials_path: config.credentials_path.clone(),
            callback_port: config.callback_port,
            callback_timeout: config.callback_timeout,
        }
    }
}

#[async_trait]
impl Authorizer for BrowserAuthorizer {
    /// 执行交互式授权
    ///
    /// 1. 读取客户端凭据
    /// 2. 启动本地服务器
    /// 3. 生成授权 URL 并打开浏览器
    /// 4. 等待回调并验证 CSRF state
    /// 5. 交换 Token
    ///
    /// # Errors
    /// - 凭据文件缺失或无效
    /// - 无法启动本地服务器（端口被占用）
    /// - 用户拒绝授权或超时
    /// - Token 交换失败
    async fn acquire(&self) -> Result<StoredToken> {
        tracing::info!("🔐 开始 Google Drive OAuth2 授权流程");

        let config = OAuthConfig::load(&self.credentials_path)?;

        let server = Server::http(("127.0.0.1", self.callback_port))
            .map_err(|e| anyhow::anyhow!("无法启动本地服务器（端口可能被占用）: {}", e))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| anyhow::anyhow!("无法获取本地服务器端口"))?;
        let redirect_uri = format!("http://localhost:{}/", port);

        tracing::info!("✅ 本地服务器启动成功: {}", redirect_uri);

        let client = build_client(
            &config.client_id,
            &config.client_secret,
            &config.auth_uri,
            &config.token_uri,
        )?
        .set_redirect_uri(RedirectUrl::new(redirect_uri)?);

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();
        let (auth_url, csrf_state) = client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new(DRIVE_METADATA_READONLY_SCOPE.to_string()))
            .add_extra_param("access_type", "offline")
            .set_pkce_challenge(pkce_challenge)
            .url();

        tracing::debug!("授权 URL: {}", auth_url);

        let (code_tx, code_rx) = oneshot::channel();
        let timeout = self.callback_timeout;
        let server_handle = std::thread::spawn(move || {
            let result = wait_for_callback(&server, port, timeout);
            code_tx.send(result).ok();
        });

        println!("请在浏览器中完成授权：\n{}\n", auth_url);
        if let Err(e) = webbrowser::open(auth_url.as_str()) {
            tracing::warn!("无法自动打开浏览器，请手动复制上面的 URL: {}", e);
        } else {
            tracing::info!("✅ 浏览器已打开，等待用户授权...");
        }

        let (received_code, received_state) = code_rx
            .await
            .context("本地服务器接收回调失败")??;

        server_handle
            .join()
            .map_err(|_| anyhow::anyhow!("服务器线程 panic"))?;

        tracing::info!("✅ 收到授权回调");

        if received_state.secret() != csrf_state.secret() {
            anyhow::bail!("CSRF 验证失败：state 不匹配");
        }
        tracing::info!("✅ CSRF 验证通过");

        let token_response = client
            .exchange_code(received_code)
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| anyhow::anyhow!("Token 交换失败: {}", e))?;

        let access_token = token_response.access_token().secret().to_string();
        let refresh_token = token_response.refresh_token().map(|t| t.secret().to_string());
        if refresh_token.is_none() {
            tracing::warn!("未收到 refresh_token，Token 过期后需要重新授权");
        }

        let scopes = token_response
            .scopes()
            .map(|scopes| scopes.iter().map(|s| s.as_str().to_string()).collect())
            .unwrap_or_else(|| vec![DRIVE_METADATA_READONLY_SCOPE.to_string()]);

        tracing::info!("✅ Token 交换成功");
        tracing::debug!("Access Token: {}", mask_secret(&access_token));

        Ok(StoredToken {
            token: Some(access_token),
            refresh_token,
            token_uri: config.token_uri,
            client_id: config.client_id,
            client_secret: config.client_secret,
            scopes,
            expiry: Some(expiry_from(token_response.expires_in())),
        })
    }

    /// 使用 Refresh Token 换取新的 Access Token
    ///
    /// # Errors
    /// - Token 中没有 Refresh Token
    /// - Refresh Token 已过期或被撤销
    /// - 网络请求失败
    async fn refresh(&self, token: &StoredToken) -> Result<StoredToken> {
        tracing::debug!("开始刷新 Access Token");

        let refresh_token = token
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("Token 中没有 refresh_token，无法刷新"))?;

        let client = build_client(
            &token.client_id,
            &token.client_secret,
            GOOGLE_AUTH_URI,
            &token.token_uri,
        )?;

        let token_response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(oauth2::reqwest::async_http_client)
            .await
            .map_err(|e| match e {
                RequestTokenError::ServerResponse(resp)
                    if *resp.error() == BasicErrorResponseType::InvalidGrant =>
                {
                    tracing::error!(
                        "❌ Token 刷新失败 [授权被拒绝/已过期]，请删除 Token 文件后重新授权"
                    );
                    anyhow::anyhow!("Refresh Token 已过期或被撤销: {}", resp)
                }
                RequestTokenError::ServerResponse(resp) => {
                    anyhow::anyhow!("Refresh Token 交换失败: {}", resp)
                }
                other => anyhow::anyhow!("Refresh Token 交换失败: {}", other),
            })?;

        let access_token = token_response.access_token().secret().to_string();
        let expiry = expiry_from(token_response.expires_in());

        tracing::info!("✅ Access Token 刷新成功（新的过期时间: {}）", expiry);
        tracing::debug!("新 Token: {}", mask_secret(&access_token));

        Ok(StoredToken {
            token: Some(access_token),
            // 刷新响应不一定带新的 refresh_token
            refresh_token: Some(
                token_response
                    .refresh_token()
                    .map(|t| t.secret().to_string())
                    .unwrap_or(refresh_token),
            ),
            expiry: Some(expiry),
            ..token.clone()
        })
    }
}

/// 构建 OAuth2 客户端（空密钥按公共客户端处理）
fn build_client(
    client_id: &str,
    client_secret: &str,
    auth_uri: &str,
    token_uri: &str,
) -> Result<BasicClient> {
    let secret = if client_secret.is_empty() {
        None
    } else {
        Some(ClientSecret::new(client_secret.to_string()))
    };

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        secret,
        AuthUrl::new(auth_uri.to_string()).context("授权端点 URL 无效")?,
        Some(TokenUrl::new(token_uri.to_string()).context("Token 端点 URL 无效")?),
    ))
}

fn expiry_from(expires_in: Option<Duration>) -> chrono::DateTime<Utc> {
    let expires_in = expires_in.unwrap_or(Duration::from_secs(DEFAULT_EXPIRES_IN_SECS));
    Utc::now()
        + chrono::Duration::from_std(expires_in)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_EXPIRES_IN_SECS as i64))
}

/// 单个回调请求的解析结果
#[derive(Debug, PartialEq, Eq)]
enum CallbackOutcome {
    /// 带授权码的回调
    Authorized { code: String, state: String },

    /// 用户拒绝授权
    Denied(String),

    /// 与授权无关的请求（如 favicon）
    Ignored,
}

/// 解析回调请求路径中的 query 参数
fn parse_callback(port: u16, request_url: &str) -> Result<CallbackOutcome> {
    let parsed_url = Url::parse(&format!("http://localhost:{}{}", port, request_url))
        .with_context(|| format!("无法解析回调 URL: {}", request_url))?;

    let params: std::collections::HashMap<_, _> = parsed_url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Ok(CallbackOutcome::Denied(error.clone()));
    }

    let Some(code) = params.get("code") else {
        return Ok(CallbackOutcome::Ignored);
    };

    let state = params
        .get("state")
        .ok_or_else(|| anyhow::anyhow!("回调缺少 state 参数"))?;

    Ok(CallbackOutcome::Authorized {
        code: code.clone(),
        state: state.clone(),
    })
}

/// 阻塞等待 OAuth2 回调，直到收到授权结果或超时
fn wait_for_callback(
    server: &Server,
    port: u16,
    timeout: Duration,
) -> Result<(AuthorizationCode, CsrfToken)> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            anyhow::bail!("授权超时：用户未在 {} 秒内完成授权", timeout.as_secs());
        }

        let Some(request) = server
            .recv_timeout(remaining)
            .context("本地服务器接收请求失败")?
        else {
            continue;
        };

        tracing::debug!("收到请求: {}", request.url());

        let outcome = parse_callback(port, request.url());
        let response = match &outcome {
            Ok(CallbackOutcome::Authorized { .. }) => html_response(SUCCESS_HTML, 200),
            Ok(CallbackOutcome::Ignored) => Response::from_string("Not Found").with_status_code(StatusCode(404)),
            Ok(CallbackOutcome::Denied(_)) | Err(_) => html_response(ERROR_HTML, 400),
        };

        if let Err(e) = request.respond(response) {
            tracing::warn!("回调响应发送失败: {}", e);
        }

        match outcome? {
            CallbackOutcome::Authorized { code, state } => {
                tracing::debug!("Code: {}", mask_secret(&code));
                return Ok((AuthorizationCode::new(code), CsrfToken::new(state)));
            }
            CallbackOutcome::Denied(error) => {
                tracing::error!("用户拒绝授权: {}", error);
                anyhow::bail!("用户拒绝授权: {}", error);
            }
            CallbackOutcome::Ignored => continue,
        }
    }
}

fn html_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    let response = Response::from_string(body).with_status_code(StatusCode(status));

    match Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}
