//! 关于圆的反演

use super::args::{line, point};
use super::{arg, ArgsParser, StandardType};
use crate::config::EngineConfig;
use crate::geometry::{CircleData, LineData};
use crate::imp::{ImpType, ObjectImp};
use crate::math::{Coordinate, Vector2};

const INVERT_WITH: &str = "Invert with respect to this circle";

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "InvertPoint",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Compute the inversion of this point"),
                arg(ImpType::Circle, INVERT_WITH),
            ]),
            invert_point,
        ),
        // 过反演中心的直线映成自身，此时结果是直线而不是圆
        StandardType::new(
            "InvertLine",
            ImpType::Circle,
            ArgsParser::new(vec![
                arg(ImpType::Line, "Compute the inversion of this line"),
                arg(ImpType::Circle, INVERT_WITH),
            ]),
            invert_line,
        ),
        // 过反演中心的圆映成直线
        StandardType::new(
            "InvertCircle",
            ImpType::Circle,
            ArgsParser::new(vec![
                arg(ImpType::Circle, "Compute the inversion of this circle"),
                arg(ImpType::Circle, INVERT_WITH),
            ]),
            invert_circle,
        ),
    ]
}

/// 相对反演中心的向量 v 的像 r²·v/|v|²
fn invert_relative(v: Vector2, radius_sq: f64) -> Vector2 {
    v * (radius_sq / v.norm_squared())
}

fn invert_point(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(p), Some(c)) = (point(args, 0), args[1].as_circle()) else {
        return ObjectImp::Invalid;
    };
    let rel = p - c.center;
    if rel.norm_squared() == 0.0 {
        return ObjectImp::Invalid;
    }
    ObjectImp::Point(c.center + invert_relative(rel, c.squared_radius()))
}

/// 不过中心的直线映成过中心的圆，直径端点是垂足的像
fn invert_line(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(l), Some(c)) = (line(args, 0), args[1].as_circle()) else {
        return ObjectImp::Invalid;
    };
    if l.is_degenerate() {
        return ObjectImp::Invalid;
    }
    let radius_sq = c.squared_radius();
    let relb = l.b - c.center;
    let ab = l.dir();
    let t = relb.dot(&ab) / ab.norm_squared();
    // 中心到直线的垂线
    let relh = relb - ab * t;
    let normhsq = relh.norm_squared();
    if normhsq < 1e-12 * radius_sq {
        return ObjectImp::Line(l);
    }
    ObjectImp::Circle(CircleData::new(
        c.center + relh * (0.5 * radius_sq / normhsq),
        0.5 * radius_sq / normhsq.sqrt(),
    ))
}

/// 取圆在中心连线上的两个对径点，分别反演后得到像的直径
fn invert_circle(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(circle), Some(reference)) = (args[0].as_circle(), args[1].as_circle()) else {
        return ObjectImp::Invalid;
    };
    let refc: Coordinate = reference.center;
    let radius_sq = reference.squared_radius();
    let c = circle.center - refc;
    let clength = c.norm();
    let cnorm = if clength != 0.0 { c / clength } else { Vector2::new(1.0, 0.0) };
    let r = circle.radius.abs();
    let tc = cnorm * r;

    let b = c + tc;
    let bprime = invert_relative(b, radius_sq);
    if (clength - r).abs() < 1e-6 * clength {
        let foot = refc + bprime;
        return ObjectImp::Line(LineData::new(foot, foot + Vector2::new(-c.y, c.x)));
    }
    let a = c - tc;
    if a.norm_squared() == 0.0 || b.norm_squared() == 0.0 {
        return ObjectImp::Invalid;
    }
    let aprime = invert_relative(a, radius_sq);
    ObjectImp::Circle(CircleData::new(
        refc + (aprime + bprime) * 0.5,
        0.5 * (bprime - aprime).norm(),
    ))
}
