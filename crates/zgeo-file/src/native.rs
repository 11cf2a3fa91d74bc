//! ZGEO 二进制宏库（.zgeo）
//!
//! 基于 MessagePack + Zstd 的紧凑二进制格式，用于分发成批的宏。
//! 文件由 16 字节文件头和压缩后的内容组成。

use crate::error::FileError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use zgeo_core::registry::MacroRecord;

/// 文件魔数 "ZGEO"
pub(crate) const MAGIC: &[u8; 4] = b"ZGEO";

/// 当前文件格式版本
const FORMAT_VERSION: u32 = 1;

/// Zstd 压缩级别（1-22，3 是默认值，平衡速度和压缩比）
const COMPRESSION_LEVEL: i32 = 3;

/// 文件头（16 字节）
#[derive(Debug)]
struct FileHeader {
    /// 魔数 "ZGEO"
    magic: [u8; 4],
    /// 格式版本
    version: u32,
    /// 标志位（预留）
    flags: u32,
    /// 压缩后数据长度
    compressed_size: u32,
}

impl FileHeader {
    fn new(compressed_size: u32) -> Self {
        Self {
            magic: *MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            compressed_size,
        }
    }

    fn write(&self, writer: &mut impl Write) -> Result<(), std::io::Error> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        Ok(())
    }

    fn read(reader: &mut impl Read) -> Result<Self, FileError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if &magic != MAGIC {
            return Err(FileError::InvalidFormat(
                "Invalid magic number, not a ZGEO macro library".to_string(),
            ));
        }

        let mut buf = [0u8; 4];

        reader.read_exact(&mut buf)?;
        let version = u32::from_le_bytes(buf);

        reader.read_exact(&mut buf)?;
        let flags = u32::from_le_bytes(buf);

        reader.read_exact(&mut buf)?;
        let compressed_size = u32::from_le_bytes(buf);

        Ok(Self {
            magic,
            version,
            flags,
            compressed_size,
        })
    }
}

/// 宏库元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMetadata {
    pub name: String,
    pub created: DateTime<Utc>,
    /// 最近一次保存的时间，由 [`save`] 更新
    pub modified: DateTime<Utc>,
}

/// 一组宏
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroLibrary {
    pub metadata: LibraryMetadata,
    pub macros: Vec<MacroRecord>,
}

impl MacroLibrary {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            metadata: LibraryMetadata {
                name: name.into(),
                created: now,
                modified: now,
            },
            macros: Vec::new(),
        }
    }
}

/// 保存宏库
pub fn save(library: &mut MacroLibrary, path: &Path) -> Result<(), FileError> {
    library.metadata.modified = Utc::now();

    let msgpack_data = rmp_serde::to_vec_named(library)?;
    let compressed_data = zstd::encode_all(msgpack_data.as_slice(), COMPRESSION_LEVEL)?;
    let compressed_size = u32::try_from(compressed_data.len())
        .map_err(|_| FileError::InvalidFormat("Macro library too large".to_string()))?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    FileHeader::new(compressed_size).write(&mut writer)?;
    writer.write_all(&compressed_data)?;
    writer.flush()?;

    tracing::info!(
        "Saved {} macros to {} ({} bytes compressed)",
        library.macros.len(),
        path.display(),
        compressed_data.len()
    );

    Ok(())
}

/// 加载宏库
pub fn load(path: &Path) -> Result<MacroLibrary, FileError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let header = FileHeader::read(&mut reader)?;

    if header.version > FORMAT_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "File version {} is newer than supported version {}",
            header.version, FORMAT_VERSION
        )));
    }

    let mut compressed_data = vec![0u8; header.compressed_size as usize];
    reader.read_exact(&mut compressed_data)?;

    let msgpack_data = zstd::decode_all(compressed_data.as_slice())?;
    let library: MacroLibrary = rmp_serde::from_slice(&msgpack_data)?;

    tracing::info!(
        "Loaded {} macros from {} (library '{}')",
        library.macros.len(),
        path.display(),
        library.metadata.name
    );

    Ok(library)
}
