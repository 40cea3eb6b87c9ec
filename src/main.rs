use anyhow::{Context, Result};
use std::io::{BufRead, Write};

mod config;
mod cv;
mod drive;
mod utils;

use config::Config;
use config::token_store::TokenStore;
use drive::{Authorizer, BrowserAuthorizer, DriveApiClient, FilePager};

/// 输入提示
const PROMPT: &str = "请输入公开文件夹链接或文件夹 ID: ";

fn main() -> Result<()> {
    // 1. 初始化日志
    init_logger()?;

    // 2. 加载配置
    let config = Config::load()?;

    // 3. 读取文件夹链接
    let folder_id = prompt_folder_id(&mut std::io::stdin().lock(), &mut std::io::stdout())?;
    tracing::info!("📁 文件夹 ID: {}", folder_id);

    // 4. 创建 Tokio 运行时（用于 async OAuth2 和 Drive API）
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("创建 Tokio 运行时失败")?;

    let authorizer = BrowserAuthorizer::new(&config);
    let count = rt.block_on(run(&config, &folder_id, &authorizer, DriveApiClient::new))?;

    println!("✅ 已保存 {} 条记录到 {}", count, config.output_path.display());

    Ok(())
}

/// 授权 → 列出 PDF → 生成查找表 → 写入文件
///
/// `connect` 用拿到的 Access Token 创建 Drive 分页客户端
async fn run<A, P, F>(config: &Config, folder_id: &str, authorizer: &A, connect: F) -> Result<usize>
where
    A: Authorizer + ?Sized,
    P: FilePager,
    F: FnOnce(String) -> P,
{
    let store = TokenStore::new(&config.token_path);

    let token = drive::obtain_credentials(&store, authorizer).await?;
    let access_token = token
        .access_token()
        .ok_or_else(|| anyhow::anyhow!("授权结果中没有 Access Token"))?
        .to_string();

    let client = connect(access_token);
    let files = drive::list_pdfs(&client, folder_id)
        .await
        .with_context(|| format!("列出文件夹 {} 中的 PDF 失败", folder_id))?;

    let map = cv::build_map(&files);
    cv::write_map(&config.output_path, &map)?;

    Ok(map.len())
}

/// 打印提示并读取一行输入，解析出文件夹 ID
fn prompt_folder_id<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "{}", PROMPT)?;
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("读取输入失败")?;
    if read == 0 {
        anyhow::bail!("未读取到输入（标准输入已关闭）");
    }

    Ok(utils::folder_link::extract_folder_id(&line))
}

/// 初始化日志系统
///
/// 日志输出到 stderr，stdout 只保留提示和结果
fn init_logger() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cvid=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
