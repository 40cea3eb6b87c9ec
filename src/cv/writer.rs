/// 结果文件写入模块
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::cv::key::to_key;
use crate::drive::types::DriveFile;

/// 查找键 → 文件 ID
pub type KeyMap = BTreeMap<String, String>;

/// 构建查找表
///
/// 键冲突时后出现的文件覆盖先出现的
pub fn build_map(files: &[DriveFile]) -> KeyMap {
    let mut map = KeyMap::new();

    for file in files {
        let key = to_key(&file.name);
        if let Some(previous) = map.insert(key.clone(), file.id.clone()) {
            tracing::debug!(
                "键冲突: {} ({} 覆盖 {}，文件名: {})",
                key,
                file.id,
                previous,
                file.name
            );
        }
    }

    map
}

/// 序列化为 4 空格缩进的 JSON
pub fn to_json(map: &KeyMap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    map.serialize(&mut serializer).context("序列化查找表失败")?;
    Ok(buf)
}

/// 写入结果文件
///
/// 无条件覆盖已有文件，不合并、不备份
///
/// # Errors
/// - 序列化失败
/// - 文件写入失败
pub fn write_map(path: &Path, map: &KeyMap) -> Result<()> {
    let content = to_json(map)?;

    std::fs::write(path, content)
        .with_context(|| format!("写入结果文件失败: {}", path.display()))?;

    tracing::debug!("已写入 {} 条记录到: {}", map.len(), path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(id: &str, name: &str) -> DriveFile {
        DriveFile {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_build_map() {
        let map = build_map(&[file("1", "A.pdf"), file("2", "B-Side.pdf")]);

        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], "1");
        assert_eq!(map["b_side"], "2");
    }

    #[test]
    fn test_collision_last_write_wins() {
        let map = build_map(&[file("1", "CV-Jane.pdf"), file("2", "cv_jane.PDF")]);

        assert_eq!(map.len(), 1);
        assert_eq!(map["cv_jane"], "2");
    }

    #[test]
    fn test_json_uses_four_space_indent() {
        let map = build_map(&[file("1", "A.pdf"), file("2", "B.pdf")]);
        let json = String::from_utf8(to_json(&map).unwrap()).unwrap();

        assert_eq!(json, "{\n    \"a\": \"1\",\n    \"b\": \"2\"\n}");
    }

    #[test]
    fn test_empty_map_is_empty_object() {
        let json = String::from_utf8(to_json(&KeyMap::new()).unwrap()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_write_map_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cv_ids.json");
        std::fs::write(&path, r#"{"stale": "0", "a": "old"}"#).unwrap();

        let map = build_map(&[file("1", "A.pdf"), file("2", "B.pdf")]);
        write_map(&path, &map).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, serde_json::json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_write_map_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("cv_ids.json");

        assert!(write_map(&path, &KeyMap::new()).is_err());
    }
}
