/// 文件夹分享链接解析
use once_cell::sync::Lazy;
use regex::Regex;

/// 匹配 `.../folders/<id>` 形式的链接
static FOLDER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/folders/([a-zA-Z0-9_-]+)").expect("文件夹链接正则无效"));

/// 从用户输入中提取文件夹 ID
///
/// 输入包含 `/folders/<id>` 时取出 `<id>`，否则把去掉首尾空白的输入原样当作 ID
pub fn extract_folder_id(input: &str) -> String {
    let input = input.trim();

    FOLDER_ID_RE
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(input)
        .to_string()
}
