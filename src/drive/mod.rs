/// Google Drive 模块 - OAuth2 认证与 API 调用
pub mod api;
pub mod oauth;
pub mod token;
pub mod types;

// 重新导出常用类型和函数
pub use api::{DriveApiClient, FilePager, list_pdfs};
pub use oauth::BrowserAuthorizer;
pub use token::{Authorizer, obtain_credentials};
