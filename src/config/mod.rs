use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub mod client_secrets;
pub mod token_store;

/// OAuth2 客户端凭据文件（由用户从 Google Cloud Console 下载）
const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// 授权 Token 缓存文件
const DEFAULT_TOKEN_PATH: &str = "token.json";

/// 结果输出文件
const DEFAULT_OUTPUT_PATH: &str = "cv_ids.json";

/// 授权回调默认等待时间（秒）
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

/// 运行配置
///
/// 只从环境变量读取，未设置时使用当前目录下的固定文件名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// OAuth2 客户端凭据文件（只读）
    pub credentials_path: PathBuf,

    /// Token 缓存文件（读写，明文）
    pub token_path: PathBuf,

    /// 结果输出文件（覆盖写入）
    pub output_path: PathBuf,

    /// 本地回调服务器端口，0 表示由系统分配
    pub callback_port: u16,

    /// 等待浏览器授权回调的超时时间
    pub callback_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_PATH),
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            callback_port: 0,
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// 从进程环境变量加载配置
    ///
    /// 支持的变量：
    /// - `CVID_CREDENTIALS_PATH`
    /// - `CVID_TOKEN_PATH`
    /// - `CVID_OUTPUT_PATH`
    /// - `CVID_OAUTH_PORT`
    /// - `CVID_OAUTH_TIMEOUT_SECS`
    ///
    /// # Errors
    /// - 端口或超时不是合法数字
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 使用自定义查找函数加载配置（测试时无需修改进程环境）
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(path) = lookup("CVID_CREDENTIALS_PATH") {
            cfg.credentials_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CVID_TOKEN_PATH") {
            cfg.token_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("CVID_OUTPUT_PATH") {
            cfg.output_path = PathBuf::from(path);
        }

        if let Some(port) = lookup("CVID_OAUTH_PORT") {
            cfg.callback_port = port
                .trim()
                .parse()
                .with_context(|| format!("CVID_OAUTH_PORT 不是合法端口: {}", port))?;
        }

        if let Some(secs) = lookup("CVID_OAUTH_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("CVID_OAUTH_TIMEOUT_SECS 不是合法秒数: {}", secs))?;
            cfg.callback_timeout = Duration::from_secs(secs);
        }

        tracing::debug!("运行配置: {:?}", cfg);

        Ok(cfg)
    }
}
