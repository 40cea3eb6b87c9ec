/// Google Drive API 调用模块
///
/// 负责分页列出文件夹中的 PDF 文件
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::drive::types::{DriveFile, FileListPage};
use crate::utils::http_client;

/// Google Drive API 基础地址
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// 只请求 id 和 name 两个字段
const LIST_FIELDS: &str = "nextPageToken, files(id, name)";

/// Drive API 错误
#[derive(Debug, Error)]
pub enum DriveError {
    /// Token 无效或已过期
    #[error("Drive API 拒绝了授权（401），Token 无效或已过期: {0}")]
    Unauthorized(String),

    /// 无权访问该文件夹
    #[error("无权访问该文件夹（403）: {0}")]
    PermissionDenied(String),

    /// 文件夹不存在
    #[error("文件夹不存在（404）: {0}")]
    NotFound(String),

    /// 其他非成功状态码
    #[error("Drive API 返回错误 {status}: {body}")]
    Api { status: StatusCode, body: String },

    /// 网络请求失败
    #[error("请求 Drive API 失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 响应 JSON 无法解析
    #[error("解析 Drive API 响应失败: {0}")]
    Decode(#[from] serde_json::Error),
}

/// 分页读取文件列表的能力
#[async_trait]
pub trait FilePager: Send + Sync {
    /// 读取一页文件夹内的 PDF 文件
    ///
    /// `page_token` 为 `None` 时读取第一页
    async fn fetch_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileListPage, DriveError>;
}

/// 列出文件夹中所有未删除的 PDF 文件
///
/// 按返回顺序拼接所有分页结果，不排序、不重试
pub async fn list_pdfs<P>(pager: &P, folder_id: &str) -> Result<Vec<DriveFile>, DriveError>
where
    P: FilePager + ?Sized,
{
    let mut all_files = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = pager.fetch_page(folder_id, page_token.as_deref()).await?;
        pages += 1;

        let next = page.next_token().map(str::to_string);
        tracing::debug!("第 {} 页: {} 个文件", pages, page.files.len());
        all_files.extend(page.files);

        match next {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    tracing::info!("✅ 共找到 {} 个 PDF 文件（{} 页）", all_files.len(), pages);

    Ok(all_files)
}

/// 构建 `files.list` 查询条件
pub fn pdf_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "'{}' in parents and mimeType='application/pdf' and trashed=false",
        escaped
    )
}

/// Google Drive API 客户端
pub struct DriveApiClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl DriveApiClient {
    /// 创建新的 Drive API 客户端
    ///
    /// # Arguments
    /// * `access_token` - 有效的 Access Token（明文）
    pub fn new(access_token: String) -> Self {
        Self::with_http(http_client::get_client().clone(), DRIVE_API_BASE, access_token)
    }

    /// 使用指定的 HTTP 客户端和 API 地址
    pub fn with_http(http: Client, base_url: &str, access_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn handle_response(response: reqwest::Response) -> Result<FileListPage, DriveError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&body)?);
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => DriveError::Unauthorized(body),
            StatusCode::FORBIDDEN => DriveError::PermissionDenied(body),
            StatusCode::NOT_FOUND => DriveError::NotFound(body),
            _ => DriveError::Api { status, body },
        })
    }
}

#[async_trait]
impl FilePager for DriveApiClient {
    async fn fetch_page(
        &self,
        folder_id: &str,
        page_token: Option<&str>,
    ) -> Result<FileListPage, DriveError> {
        let url = format!("{}/files", self.base_url);
        let query = pdf_query(folder_id);

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str()), ("fields", LIST_FIELDS)]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;

        Self::handle_response(response).await
    }
}
