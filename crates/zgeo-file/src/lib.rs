//! ZGEO 宏模板文件格式
//!
//! 支持：
//! - `.json` 文本模板，便于手工编辑和版本管理
//! - `.zgeo` 二进制宏库（MessagePack + Zstd）
//!
//! [`load`] 按文件头自动识别格式。

pub mod error;
pub mod native;
pub mod template;

pub use error::FileError;
pub use native::MacroLibrary;
pub use template::{register_all, LoadReport, MacroFile};

use std::fs::File;
use std::io::Read;
use std::path::Path;
use zgeo_core::registry::MacroRecord;

/// 读取宏文件，二进制宏库和 JSON 模板均可
pub fn load(path: &Path) -> Result<Vec<MacroRecord>, FileError> {
    let mut magic = [0u8; 4];
    let is_native = File::open(path)?.read_exact(&mut magic).is_ok() && &magic == native::MAGIC;
    if is_native {
        Ok(native::load(path)?.macros)
    } else {
        Ok(template::load(path)?.macros)
    }
}
