/// CV 查找表 - 文件名转换与结果写入
pub mod key;
pub mod writer;

pub use writer::{build_map, write_map};
