//! JSON 宏模板文件
//!
//! 一个文件可包含多个宏，每个宏包装恰好一个结果的层次模板。

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use zgeo_core::hierarchy::SkippedElement;
use zgeo_core::registry::{MacroDefinition, MacroRecord, TypeRegistry};

/// 当前模板格式版本
const TEMPLATE_VERSION: u32 = 1;

/// 模板文件内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroFile {
    pub version: u32,
    pub macros: Vec<MacroRecord>,
}

impl MacroFile {
    pub fn new(macros: Vec<MacroRecord>) -> Self {
        Self {
            version: TEMPLATE_VERSION,
            macros,
        }
    }
}

/// 保存为格式化的 JSON
pub fn save(file: &MacroFile, path: &Path) -> Result<(), FileError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, file)?;
    writer.flush()?;

    tracing::info!("Saved {} macros to {}", file.macros.len(), path.display());
    Ok(())
}

pub fn load(path: &Path) -> Result<MacroFile, FileError> {
    let reader = BufReader::new(File::open(path)?);
    let file: MacroFile = serde_json::from_reader(reader)?;

    if file.version > TEMPLATE_VERSION {
        return Err(FileError::UnsupportedVersion(format!(
            "Template version {} is newer than supported version {}",
            file.version, TEMPLATE_VERSION
        )));
    }

    tracing::info!("Loaded {} macros from {}", file.macros.len(), path.display());
    Ok(file)
}

/// 批量注册的结果
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 成功注册的宏名
    pub loaded: Vec<String>,
    /// 宏名及其被跳过的元素
    pub skipped: Vec<(String, SkippedElement)>,
    /// 整个宏无法注册时的宏名与原因
    pub failed: Vec<(String, String)>,
}

/// 把记录逐个注册进注册表；单个宏失败不影响其余的宏
///
/// 按顺序注册，后面的宏可以引用前面的宏。
pub fn register_all(records: &[MacroRecord], registry: &mut TypeRegistry) -> LoadReport {
    let mut report = LoadReport::default();
    for record in records {
        let name = record.action_name.clone();
        let result = MacroDefinition::from_record(record, registry)
            .and_then(|(def, skipped)| registry.register_macro(def).map(|()| skipped));
        match result {
            Ok(skipped) => {
                report
                    .skipped
                    .extend(skipped.into_iter().map(|s| (name.clone(), s)));
                report.loaded.push(name);
            }
            Err(err) => {
                tracing::warn!("Failed to load macro {}: {}", name, err);
                report.failed.push((name, err.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use zgeo_core::calcer::ObjectCalcer;
    use zgeo_core::hierarchy::{ElementRecord, ObjectHierarchy};
    use zgeo_core::imp::ObjectImp;
    use zgeo_core::math::Coordinate;

    fn midpoint_record(reg: &TypeRegistry, name: &str) -> MacroRecord {
        let a = ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(0.0, 0.0)));
        let b = ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(1.0, 0.0)));
        let m = reg.build("MidPoint", vec![a.clone(), b.clone()], &Default::default()).unwrap();
        let h = ObjectHierarchy::capture(&[a, b], &[m]);
        MacroDefinition::new(name, "Midpoint", h).unwrap().to_record().unwrap()
    }

    #[test]
    fn test_save_load_roundtrip() {
        let file_path = std::env::temp_dir().join("test_zgeo_template.json");
        let reg = TypeRegistry::with_builtin_types();
        let file = MacroFile::new(vec![midpoint_record(&reg, "Middle")]);

        save(&file, &file_path).expect("Failed to save");
        let loaded = load(&file_path).expect("Failed to load");
        assert_eq!(loaded, file);

        std::fs::remove_file(&file_path).ok();
    }

    #[test]
    fn test_newer_version_rejected() {
        let file_path = std::env::temp_dir().join("test_zgeo_template_version.json");
        let mut file = MacroFile::new(Vec::new());
        file.version = TEMPLATE_VERSION + 1;
        save(&file, &file_path).expect("Failed to save");

        assert!(matches!(load(&file_path), Err(FileError::UnsupportedVersion(_))));

        std::fs::remove_file(&file_path).ok();
    }

    #[test]
    fn test_register_all_reports_problems() {
        let mut reg = TypeRegistry::with_builtin_types();
        let good = midpoint_record(&reg, "Middle");
        let duplicate = midpoint_record(&reg, "Middle");

        let mut partial = midpoint_record(&reg, "Partial");
        partial.hierarchy.elements.push(ElementRecord {
            id: 50,
            type_name: "Unknown".to_owned(),
            given: false,
            is_final: false,
            parents: vec![1],
            params: Default::default(),
        });

        let report = register_all(&[good, duplicate, partial], &mut reg);
        assert_eq!(report.loaded, vec!["Middle".to_owned(), "Partial".to_owned()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].1.id, 50);
        assert!(reg.get("Partial").is_some());
    }
}
