//! ZGEO 几何计算引擎
//!
//! 交互式几何作图的核心：由计算节点构成的有向无环依赖图，
//! 每个节点持有一个不可变的值，由构造类型从父节点的值算出。
//!
//! # 架构设计
//!
//! - `imp`: 值（点、线、圆、圆锥曲线、三次曲线、多边形、数值）
//! - `types`: 构造类型，负责计算与拖动回写
//! - `calcer`: 计算节点，子节点强引用父节点，父节点弱引用子节点
//! - `calc_path`: 重算顺序
//! - `hierarchy`: 把具体子图抽象成可重放的宏模板
//! - `registry`: 按名字查找类型与宏
//! - `holder`: 计算节点 + 显示属性
//!
//! 退化的几何输入得到 `ObjectImp::Invalid` 并静默向下传播；
//! 对计算图的结构性误用返回 `Err`。
//!
//! # 示例
//!
//! ```rust
//! use zgeo_core::prelude::*;
//!
//! let reg = TypeRegistry::with_builtin_types();
//! let a = ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(0.0, 0.0)));
//! let b = ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(2.0, 0.0)));
//! let mid = reg.build("MidPoint", vec![a.clone(), b], &Default::default()).unwrap();
//!
//! let cfg = EngineConfig::default();
//! recalc(&calc_path(&[a]), &cfg);
//! assert_eq!(mid.imp().as_point(), Some(Coordinate::new(1.0, 0.0)));
//! ```

pub mod calc_path;
pub mod calcer;
pub mod config;
pub mod conic;
pub mod cubic;
pub mod error;
pub mod geometry;
pub mod hierarchy;
pub mod holder;
pub mod imp;
pub mod math;
pub mod numerics;
pub mod registry;
pub mod transform;
pub mod types;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::calc_path::{calc_path, calc_path_to, recalc};
    pub use crate::calcer::{CalcerKind, CalcerRef, ObjectCalcer};
    pub use crate::config::EngineConfig;
    pub use crate::error::{CalcerError, HierarchyError, HolderError, MacroError};
    pub use crate::geometry::{CircleData, LineData, PolygonData};
    pub use crate::hierarchy::{FillUp, HierarchyRecord, ObjectHierarchy, SkippedElement};
    pub use crate::holder::{Color, DrawingAttributes, ObjectHolder};
    pub use crate::imp::{ImpType, ObjectImp};
    pub use crate::math::{Coordinate, Vector2};
    pub use crate::registry::{MacroDefinition, MacroRecord, TypeRegistry};
    pub use crate::transform::Transformation;
    pub use crate::types::{build_intersection_roots, ObjectType};
}
