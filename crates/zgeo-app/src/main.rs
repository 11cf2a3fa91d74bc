//! ZGEO 命令行工具
//!
//! ```text
//! zgeo inspect <file>
//! zgeo run <file> [--macro NAME] [--config CONFIG.json] x1 y1 [x2 y2 ...]
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use zgeo_core::calc_path::{calc_path, recalc};
use zgeo_core::calcer::{CalcerRef, ObjectCalcer};
use zgeo_core::config::EngineConfig;
use zgeo_core::hierarchy::HierarchyNode;
use zgeo_core::imp::{ImpType, ObjectImp};
use zgeo_core::registry::TypeRegistry;
use zgeo_file::register_all;

#[derive(Parser, Debug)]
#[command(name = "zgeo")]
#[command(about = "Inspect and instantiate geometric macro files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 列出文件中的宏及其节点
    Inspect { file: PathBuf },
    /// 以给定点坐标实例化一个宏并打印结果
    Run {
        file: PathBuf,
        /// 宏名，缺省时取文件中的第一个宏
        #[arg(long)]
        r#macro: Option<String>,
        /// 引擎容差配置（JSON）
        #[arg(long)]
        config: Option<PathBuf>,
        /// x1 y1 x2 y2 ...
        #[arg(allow_negative_numbers = true)]
        coords: Vec<f64>,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing::subscriber::set_global_default(
        FmtSubscriber::builder().with_max_level(Level::INFO).finish(),
    )?;

    match Cli::parse().command {
        Command::Inspect { file } => inspect(&file),
        Command::Run {
            file,
            r#macro,
            config,
            coords,
        } => run(&file, r#macro.as_deref(), config.as_deref(), &coords),
    }
}

/// 读取宏文件并注册全部宏
fn load_registry(path: &Path) -> Result<TypeRegistry> {
    let records = zgeo_file::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let mut registry = TypeRegistry::with_builtin_types();
    let report = register_all(&records, &mut registry);
    for (name, skipped) in &report.skipped {
        println!("warning: {name}: skipped element {}: {}", skipped.id, skipped.reason);
    }
    for (name, reason) in &report.failed {
        println!("warning: {name}: not loaded: {reason}");
    }
    info!("{} of {} macros loaded", report.loaded.len(), records.len());
    Ok(registry)
}

fn inspect(path: &Path) -> Result<()> {
    let registry = load_registry(path)?;
    for def in registry.macros() {
        let h = def.hierarchy();
        println!("{}", def.action_name);
        if !def.description.is_empty() {
            println!("  {}", def.description);
        }
        let reqs: Vec<&str> = h.arg_requirements().iter().map(|r| r.name()).collect();
        println!("  given: [{}]", reqs.join(", "));
        if !h.all_given_objects_used() {
            println!("  note: not every given object is used");
        }
        for (i, node) in h.nodes().iter().enumerate() {
            let marker = if h.finals().contains(&i) { "*" } else { " " };
            let text = match node {
                HierarchyNode::Given { requirement } => format!("given {}", requirement.name()),
                HierarchyNode::Const { imp } => format!("const {imp}"),
                HierarchyNode::ApplyType { ty, parents } => format!("{} {:?}", ty.name(), parents),
                HierarchyNode::FetchProperty { parent, property } => {
                    format!("property '{property}' of {parent}")
                }
            };
            println!("  {marker}{i:>3} {text}");
        }
    }
    Ok(())
}

fn run(path: &Path, macro_name: Option<&str>, config: Option<&Path>, coords: &[f64]) -> Result<()> {
    if coords.len() % 2 != 0 {
        bail!("Coordinates must come in x y pairs");
    }
    let cfg = match config {
        Some(p) => EngineConfig::from_json_str(&std::fs::read_to_string(p)?)?,
        None => EngineConfig::default(),
    };
    let registry = load_registry(path)?;

    let def = match macro_name {
        Some(name) => registry.macro_by_name(name),
        None => registry.macros().next(),
    }
    .context("No such macro in file")?;

    let reqs = def.hierarchy().arg_requirements();
    if let Some(r) = reqs.iter().find(|r| !ImpType::Point.inherits(**r)) {
        bail!("Given objects must be points, but this macro needs a {}", r.name());
    }
    if reqs.len() * 2 != coords.len() {
        bail!("{} needs {} points", def.action_name, reqs.len());
    }

    let fixed_point = registry
        .get("FixedPoint")
        .context("FixedPoint type missing")?;
    let mut inputs: Vec<CalcerRef> = Vec::new();
    let givens: Vec<CalcerRef> = coords
        .chunks(2)
        .map(|xy| {
            let x = ObjectCalcer::new_const(ObjectImp::Double(xy[0]));
            let y = ObjectCalcer::new_const(ObjectImp::Double(xy[1]));
            inputs.extend([x.clone(), y.clone()]);
            ObjectCalcer::new_type(fixed_point.clone(), vec![x, y])
        })
        .collect();

    let filled = registry.instantiate_macro(&def.action_name, &givens)?;
    // 没有给定对象的宏只能从新建的节点开始算
    inputs.extend(filled.built.iter().cloned());
    recalc(&calc_path(&inputs), &cfg);

    for result in &filled.finals {
        let imp = result.imp();
        println!("{}: {imp}", def.action_name);
        for (i, name) in imp.properties().iter().enumerate().skip(1) {
            println!("  {name}: {}", imp.property(i, &cfg));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "zgeo", "run", "lib.zgeo", "--macro", "Middle", "1", "-2.5", "-3", "4",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                file,
                r#macro,
                config,
                coords,
            } => {
                assert_eq!(file, PathBuf::from("lib.zgeo"));
                assert_eq!(r#macro.as_deref(), Some("Middle"));
                assert!(config.is_none());
                assert_eq!(coords, vec![1.0, -2.5, -3.0, 4.0]);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_inspect() {
        let cli = Cli::try_parse_from(["zgeo", "inspect", "macros.json"]).unwrap();
        assert!(matches!(cli.command, Command::Inspect { file } if file == PathBuf::from("macros.json")));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Cli::try_parse_from(["zgeo"]).is_err());
        assert!(Cli::try_parse_from(["zgeo", "run", "lib.zgeo", "one"]).is_err());
        assert!(Cli::try_parse_from(["zgeo", "run", "lib.zgeo", "--config"]).is_err());
    }

    #[test]
    fn test_run_rejects_odd_coordinate_count() {
        let err = run(Path::new("missing.zgeo"), None, None, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(err.to_string().contains("pairs"));
    }
}
