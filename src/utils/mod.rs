/// 工具模块
pub mod folder_link;
pub mod http_client;
