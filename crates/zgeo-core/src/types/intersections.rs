//! 交点构造
//!
//! 有多个交点的构造用一个整数常量参数锁定取哪一个根，
//! 每个根是单独的计算节点；[`build_intersection_roots`] 一次建好全部根。

use super::args::{int, line, point};
use super::{arg, through, ArgsParser, ObjectType, StandardType};
use crate::calcer::{CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use crate::conic::{calc_conic_line_intersect, IntersectionSide};
use crate::cubic::calc_cubic_line_intersect;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{
    circle_line_intersection, line_line_intersection, orthogonal, radical_start_point,
};
use crate::numerics::RootParams;
use std::rc::Rc;

const INTERSECT_LINE: &str = "Intersect with this line";

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "LineLineIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::AbstractLine, INTERSECT_LINE),
                through(ImpType::AbstractLine, INTERSECT_LINE),
            ]),
            line_line,
        ),
        StandardType::new(
            "ConicLineIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Conic, "Intersect with this conic"),
                through(ImpType::AbstractLine, INTERSECT_LINE),
                arg(ImpType::Int, "param"),
            ]),
            conic_line,
        ),
        StandardType::new(
            "ConicLineOtherIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Conic, "Intersect with this conic"),
                through(ImpType::AbstractLine, INTERSECT_LINE),
                arg(ImpType::Point, "known intersection"),
            ]),
            conic_line_other,
        ),
        StandardType::new(
            "CircleCircleIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Circle, "Intersect with this circle"),
                through(ImpType::Circle, "Intersect with this circle"),
                arg(ImpType::Int, "param"),
            ]),
            circle_circle,
        ),
        StandardType::new(
            "CircleCircleOtherIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Circle, "Intersect with this circle"),
                through(ImpType::Circle, "Intersect with this circle"),
                arg(ImpType::Point, "known intersection"),
            ]),
            circle_circle_other,
        ),
        StandardType::new(
            "CubicLineIntersection",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Cubic, "Intersect with this cubic curve"),
                through(ImpType::AbstractLine, INTERSECT_LINE),
                arg(ImpType::Int, "param"),
            ]),
            cubic_line,
        ),
    ]
}

/// 为多根构造的每个根建一个计算节点
///
/// 每个节点的参数是 `parents` 加上一个锁定根序号的整数常量。
pub fn build_intersection_roots(
    ty: Rc<dyn ObjectType>,
    parents: &[CalcerRef],
    roots: &[i64],
) -> Vec<CalcerRef> {
    roots
        .iter()
        .map(|&root| {
            let mut args = parents.to_vec();
            args.push(ObjectCalcer::new_const(ObjectImp::Int(root)));
            ObjectCalcer::new_type(ty.clone(), args)
        })
        .collect()
}

fn side(args: &[&ObjectImp], i: usize) -> Option<i32> {
    match int(args, i)? {
        1 => Some(1),
        -1 => Some(-1),
        _ => None,
    }
}

/// 交点必须同时落在两条线上，线段和射线之外的交点无效
fn line_line(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(l1), Some(l2)) = (line(args, 0), line(args, 1)) else {
        return ObjectImp::Invalid;
    };
    match line_line_intersection(&l1.a, &l1.b, &l2.a, &l2.b) {
        Some(p) if args[0].contains_point(&p, cfg) && args[1].contains_point(&p, cfg) => {
            ObjectImp::Point(p)
        }
        _ => ObjectImp::Invalid,
    }
}

fn conic_line(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(l), Some(side)) = (line(args, 1), side(args, 2)) else {
        return ObjectImp::Invalid;
    };
    let ret = if let Some(c) = args[0].as_circle() {
        circle_line_intersection(&c.center, c.squared_radius(), &l.a, &l.b, side)
    } else {
        args[0]
            .as_conic_cartesian()
            .and_then(|cart| calc_conic_line_intersect(&cart, &l, IntersectionSide::Side(side)))
    };
    ret.map_or(ObjectImp::Invalid, ObjectImp::Point)
}

/// 已知一个交点时求另一个，拖动时两个交点不会互换
fn conic_line_other(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(cart), Some(l), Some(p)) = (args[0].as_conic_cartesian(), line(args, 1), point(args, 2))
    else {
        return ObjectImp::Invalid;
    };
    if !args[1].contains_point(&p, cfg) || !args[0].contains_point(&p, cfg) {
        return ObjectImp::Invalid;
    }
    let ba = l.dir();
    let knownparam = (p - l.a).dot(&ba) / ba.norm_squared();
    calc_conic_line_intersect(&cart, &l, IntersectionSide::Other(knownparam))
        .map_or(ObjectImp::Invalid, ObjectImp::Point)
}

fn circle_circle(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(c1), Some(c2), Some(side)) = (args[0].as_circle(), args[1].as_circle(), side(args, 2))
    else {
        return ObjectImp::Invalid;
    };
    let r1sq = c1.squared_radius();
    let Some(a) = radical_start_point(&c1.center, r1sq, &c2.center, c2.squared_radius()) else {
        return ObjectImp::Invalid;
    };
    let b = a + orthogonal(&(c2.center - c1.center));
    circle_line_intersection(&c1.center, r1sq, &a, &b, side)
        .map_or(ObjectImp::Invalid, ObjectImp::Point)
}

/// 已知交点关于连心线的镜像
fn circle_circle_other(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(c1), Some(c2), Some(p)) = (args[0].as_circle(), args[1].as_circle(), point(args, 2))
    else {
        return ObjectImp::Invalid;
    };
    if !args[0].contains_point(&p, cfg) || !args[1].contains_point(&p, cfg) {
        return ObjectImp::Invalid;
    }
    let w = orthogonal(&(c2.center - c1.center));
    let wnormsq = w.norm_squared();
    if wnormsq < 1e-12 {
        return ObjectImp::Invalid;
    }
    let dist = (p - c1.center).dot(&w) / wnormsq;
    ObjectImp::Point(p - w * (2.0 * dist))
}

fn cubic_line(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(cubic), Some(l), Some(root)) = (args[0].as_cubic(), line(args, 1), int(args, 2))
    else {
        return ObjectImp::Invalid;
    };
    let Ok(root) = usize::try_from(root) else {
        return ObjectImp::Invalid;
    };
    calc_cubic_line_intersect(&cubic, &l, root, RootParams::from(cfg), cfg.cubic_root_bound)
        .map_or(ObjectImp::Invalid, ObjectImp::Point)
}
