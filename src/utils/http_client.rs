/// 全局共享的 HTTP 客户端
///
/// 复用 TCP 连接和连接池，避免每次分页请求都重新建立连接
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

/// 全局 HTTP 客户端实例（使用懒初始化）
pub static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        // 超时配置
        .timeout(Duration::from_secs(30)) // 整体请求超时 30 秒
        .connect_timeout(Duration::from_secs(10)) // 连接建立超时 10 秒
        // 用户代理
        .user_agent(concat!("cvid/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("构建全局 HTTP 客户端失败")
});

/// 获取全局 HTTP 客户端
pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}
