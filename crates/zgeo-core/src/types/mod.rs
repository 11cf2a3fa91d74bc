//! 构造类型
//!
//! 每种构造是一个无状态的共享策略对象：按位置检查参数，
//! 由父节点的值算出新值，并决定该对象能否被拖动、拖动时
//! 如何回写到祖先常量节点。
//!
//! 绝大多数内置类型是 [`StandardType`]：参数解析器 + 计算函数 + 移动方式。

mod circles;
mod conics;
mod cubics;
mod intersections;
mod inversion;
mod lines;
mod points;
mod polygons;
mod tangents;
mod transforms;

pub use intersections::build_intersection_roots;

use crate::calcer::{CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use crate::error::CalcerError;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{invalid_coord, Coordinate};
use std::collections::HashSet;
use std::rc::Rc;

/// 构造类型
pub trait ObjectType {
    /// 全局唯一的类型名，也是模板文件中引用类型的方式
    fn name(&self) -> &str;

    /// 结果值的类型
    fn result_type(&self) -> ImpType;

    /// 参数形状检查；失败时计算节点得到 `Invalid`
    fn check_args(&self, args: &[&ObjectImp]) -> bool;

    /// 由参数值计算结果；只在 `check_args` 通过后调用
    fn calc(&self, args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp;

    /// 第 `index` 个参数至少要是什么类型
    fn imp_requirement(&self, index: usize) -> ImpType;

    /// 结果是否落在第 `index` 个参数上或经过它
    fn is_defined_on_or_through(&self, _index: usize) -> bool {
        false
    }

    fn can_move(&self, _calcer: &ObjectCalcer) -> bool {
        false
    }

    fn is_freely_translatable(&self, _calcer: &ObjectCalcer) -> bool {
        false
    }

    /// 把对象移到 `to`，通过改写祖先常量实现；调用方随后需要重算
    fn move_object(
        &self,
        _calcer: &ObjectCalcer,
        _to: &Coordinate,
        _cfg: &EngineConfig,
    ) -> Result<(), CalcerError> {
        Ok(())
    }

    /// 拖动时的参考点
    fn move_reference_point(&self, _calcer: &ObjectCalcer) -> Coordinate {
        invalid_coord()
    }

    /// 移动时会被改写的祖先节点
    fn movable_parents(&self, _calcer: &ObjectCalcer) -> Vec<CalcerRef> {
        Vec::new()
    }
}

impl std::fmt::Debug for dyn ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectType({})", self.name())
    }
}

/// 单个参数的声明
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArgSpec {
    pub ty: ImpType,
    pub label: &'static str,
    pub on_or_through: bool,
}

/// 普通参数
pub const fn arg(ty: ImpType, label: &'static str) -> ArgSpec {
    ArgSpec {
        ty,
        label,
        on_or_through: false,
    }
}

/// 结果落在其上或经过的参数
pub const fn through(ty: ImpType, label: &'static str) -> ArgSpec {
    ArgSpec {
        ty,
        label,
        on_or_through: true,
    }
}

/// 按位置的参数解析器
#[derive(Debug, Clone)]
pub struct ArgsParser {
    specs: Vec<ArgSpec>,
    min_args: usize,
    variadic: bool,
}

impl ArgsParser {
    /// 所有参数都必须提供
    pub fn new(specs: Vec<ArgSpec>) -> Self {
        let min_args = specs.len();
        Self {
            specs,
            min_args,
            variadic: false,
        }
    }

    /// 允许省略末尾的参数
    pub fn with_min(mut self, min_args: usize) -> Self {
        self.min_args = min_args;
        self
    }

    /// 最后一个声明可以重复任意次
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn specs(&self) -> &[ArgSpec] {
        &self.specs
    }

    pub fn min_args(&self) -> usize {
        self.min_args
    }

    /// 第 `index` 个参数的声明
    pub fn spec(&self, index: usize) -> Option<&ArgSpec> {
        match self.specs.get(index) {
            Some(s) => Some(s),
            None if self.variadic => self.specs.last(),
            None => None,
        }
    }

    /// 个数在范围内，且每个参数有效并满足声明的类型
    pub fn check(&self, args: &[&ObjectImp]) -> bool {
        if args.len() < self.min_args {
            return false;
        }
        if !self.variadic && args.len() > self.specs.len() {
            return false;
        }
        args.iter().enumerate().all(|(i, a)| {
            a.valid() && self.spec(i).is_some_and(|s| a.inherits(s.ty))
        })
    }
}

/// 拖动方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// 不能拖动
    Fixed,
    /// 改写 x、y 两个常量父节点
    FixedPoint,
    /// 改写相对附着点的偏移量
    RelativePoint,
    /// 改写曲线参数
    ConstrainedPoint,
    /// 平移所有点父节点
    Translate,
}

pub type CalcFn = fn(&[&ObjectImp], &EngineConfig) -> ObjectImp;

/// 由参数解析器、计算函数和移动方式组成的构造类型
pub struct StandardType {
    name: &'static str,
    result: ImpType,
    args: ArgsParser,
    calc: CalcFn,
    motion: Motion,
}

impl StandardType {
    pub fn new(name: &'static str, result: ImpType, args: ArgsParser, calc: CalcFn) -> Self {
        Self {
            name,
            result,
            args,
            calc,
            motion: Motion::Fixed,
        }
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    pub fn args_parser(&self) -> &ArgsParser {
        &self.args
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }
}

/// 值为点的父节点及其坐标
fn point_parents(calcer: &ObjectCalcer) -> Vec<(CalcerRef, Coordinate)> {
    calcer
        .parents()
        .into_iter()
        .filter_map(|p| {
            let c = p.imp().as_point()?;
            Some((p, c))
        })
        .collect()
}

/// 按首次出现保序去重
pub(crate) fn dedup_calcers(calcers: Vec<CalcerRef>) -> Vec<CalcerRef> {
    let mut seen = HashSet::new();
    calcers
        .into_iter()
        .filter(|c| seen.insert(Rc::as_ptr(c)))
        .collect()
}

impl ObjectType for StandardType {
    fn name(&self) -> &str {
        self.name
    }

    fn result_type(&self) -> ImpType {
        self.result
    }

    fn check_args(&self, args: &[&ObjectImp]) -> bool {
        self.args.check(args)
    }

    fn calc(&self, args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
        if !self.args.check(args) {
            return ObjectImp::Invalid;
        }
        (self.calc)(args, cfg)
    }

    fn imp_requirement(&self, index: usize) -> ImpType {
        self.args.spec(index).map_or(ImpType::Any, |s| s.ty)
    }

    fn is_defined_on_or_through(&self, index: usize) -> bool {
        self.args.spec(index).is_some_and(|s| s.on_or_through)
    }

    fn can_move(&self, calcer: &ObjectCalcer) -> bool {
        match self.motion {
            Motion::Fixed => false,
            Motion::FixedPoint | Motion::RelativePoint | Motion::ConstrainedPoint => true,
            Motion::Translate => self.is_freely_translatable(calcer),
        }
    }

    fn is_freely_translatable(&self, calcer: &ObjectCalcer) -> bool {
        match self.motion {
            Motion::FixedPoint | Motion::RelativePoint => true,
            Motion::Translate => {
                let points = point_parents(calcer);
                !points.is_empty() && points.iter().all(|(p, _)| p.is_freely_translatable())
            }
            Motion::Fixed | Motion::ConstrainedPoint => false,
        }
    }

    fn move_object(
        &self,
        calcer: &ObjectCalcer,
        to: &Coordinate,
        cfg: &EngineConfig,
    ) -> Result<(), CalcerError> {
        let parents = calcer.parents();
        match (self.motion, parents.as_slice()) {
            (Motion::FixedPoint, [x, y]) => {
                x.set_imp(ObjectImp::Double(to.x))?;
                y.set_imp(ObjectImp::Double(to.y))
            }
            (Motion::RelativePoint, [dx, dy, object]) => {
                let attach = object.imp().attach_point();
                dx.set_imp(ObjectImp::Double(to.x - attach.x))?;
                dy.set_imp(ObjectImp::Double(to.y - attach.y))
            }
            (Motion::ConstrainedPoint, [param, curve]) => {
                let p = curve.imp().get_param(to, cfg);
                param.set_imp(ObjectImp::Double(p))
            }
            (Motion::Translate, _) => {
                let points = point_parents(calcer);
                let Some(&(_, reference)) = points.first() else {
                    return Ok(());
                };
                for (parent, coord) in &points {
                    if parent.can_move() {
                        parent.move_to(&(to + (coord - reference)), cfg)?;
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn move_reference_point(&self, calcer: &ObjectCalcer) -> Coordinate {
        match self.motion {
            Motion::FixedPoint | Motion::RelativePoint | Motion::ConstrainedPoint => {
                calcer.imp().as_point().unwrap_or_else(invalid_coord)
            }
            Motion::Translate => point_parents(calcer)
                .first()
                .map_or_else(invalid_coord, |(_, c)| *c),
            Motion::Fixed => invalid_coord(),
        }
    }

    fn movable_parents(&self, calcer: &ObjectCalcer) -> Vec<CalcerRef> {
        let parents = calcer.parents();
        match self.motion {
            Motion::Fixed => Vec::new(),
            Motion::FixedPoint => parents,
            Motion::RelativePoint => parents.into_iter().take(2).collect(),
            Motion::ConstrainedPoint => parents.into_iter().take(1).collect(),
            Motion::Translate => {
                let mut ret = Vec::new();
                for p in &parents {
                    ret.extend(p.movable_parents());
                }
                ret.extend(parents);
                dedup_calcers(ret)
            }
        }
    }
}

/// 原样复制唯一参数
///
/// 层次模板中一个结果同时也是中间对象时，用它在末尾再产出一次。
pub struct CopyType;

impl ObjectType for CopyType {
    fn name(&self) -> &str {
        "Copy"
    }

    fn result_type(&self) -> ImpType {
        ImpType::Any
    }

    fn check_args(&self, args: &[&ObjectImp]) -> bool {
        args.len() == 1
    }

    fn calc(&self, args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
        match args {
            [a] => (*a).clone(),
            _ => ObjectImp::Invalid,
        }
    }

    fn imp_requirement(&self, _index: usize) -> ImpType {
        ImpType::Any
    }
}

/// 全部内置类型
pub fn builtin_types() -> Vec<Rc<dyn ObjectType>> {
    let mut ret: Vec<Rc<dyn ObjectType>> = vec![Rc::new(CopyType)];
    for t in points::types()
        .into_iter()
        .chain(lines::types())
        .chain(circles::types())
        .chain(conics::types())
        .chain(cubics::types())
        .chain(polygons::types())
        .chain(intersections::types())
        .chain(tangents::types())
        .chain(inversion::types())
        .chain(transforms::types())
    {
        ret.push(Rc::new(t));
    }
    ret
}

/// 参数取值的便捷函数，供各类型的计算函数使用
pub(crate) mod args {
    use crate::geometry::LineData;
    use crate::imp::ObjectImp;
    use crate::math::Coordinate;

    pub fn points(args: &[&ObjectImp]) -> Vec<Coordinate> {
        args.iter().filter_map(|a| a.as_point()).collect()
    }

    pub fn point(args: &[&ObjectImp], i: usize) -> Option<Coordinate> {
        args.get(i)?.as_point()
    }

    pub fn line(args: &[&ObjectImp], i: usize) -> Option<LineData> {
        args.get(i)?.as_line()
    }

    pub fn double(args: &[&ObjectImp], i: usize) -> Option<f64> {
        args.get(i)?.as_double()
    }

    pub fn int(args: &[&ObjectImp], i: usize) -> Option<i64> {
        args.get(i)?.as_int()
    }

    /// 点坐标有效时包装为点值，否则为 `Invalid`
    pub fn point_or_invalid(p: Option<Coordinate>) -> ObjectImp {
        match p {
            Some(p) if crate::math::coord_valid(&p) => ObjectImp::Point(p),
            _ => ObjectImp::Invalid,
        }
    }
}
