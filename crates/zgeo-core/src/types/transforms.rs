//! 变换构造
//!
//! 第一个参数是被变换的对象，其余参数确定变换；结果是对象在变换下的像。

use super::args::{double, line, point, points};
use super::{arg, ArgsParser, StandardType};
use crate::config::EngineConfig;
use crate::imp::{ImpType, ObjectImp};
use crate::transform::Transformation;

const OBJECT: &str = "Transform this object";

pub(super) fn types() -> Vec<StandardType> {
    let object = || arg(ImpType::Any, OBJECT);
    vec![
        StandardType::new(
            "Translated",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Segment, "Translate by this vector"),
            ]),
            translated,
        ),
        StandardType::new(
            "PointReflection",
            ImpType::Any,
            ArgsParser::new(vec![object(), arg(ImpType::Point, "Reflect in this point")]),
            point_reflection,
        ),
        StandardType::new(
            "LineReflection",
            ImpType::Any,
            ArgsParser::new(vec![object(), arg(ImpType::AbstractLine, "Reflect in this line")]),
            line_reflection,
        ),
        StandardType::new(
            "Rotation",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Point, "Rotate around this point"),
                arg(ImpType::Double, "Rotate by this angle"),
            ]),
            rotation,
        ),
        StandardType::new(
            "ScalingOverCenter",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Point, "Scale with this center"),
                arg(ImpType::Double, "Scale by this factor"),
            ]),
            scaling_over_center,
        ),
        StandardType::new(
            "ScalingOverLine",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::AbstractLine, "Scale over this line"),
                arg(ImpType::Double, "Scale by this factor"),
            ]),
            scaling_over_line,
        ),
        StandardType::new(
            "ProjectiveRotation",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Ray, "Projectively rotate with this ray"),
                arg(ImpType::Double, "Projectively rotate by this angle"),
            ]),
            projective_rotation,
        ),
        StandardType::new(
            "HarmonicHomology",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Point, "Harmonic homology with this center"),
                arg(ImpType::AbstractLine, "Harmonic homology with this axis"),
            ]),
            harmonic_homology,
        ),
        StandardType::new(
            "AffinityGI3P",
            ImpType::Any,
            ArgsParser::new(
                std::iter::once(object())
                    .chain(std::iter::repeat(arg(ImpType::Point, "Map this point")).take(3))
                    .chain(std::iter::repeat(arg(ImpType::Point, "onto this point")).take(3))
                    .collect(),
            ),
            affinity_gi3p,
        ),
        StandardType::new(
            "ProjectivityGI4P",
            ImpType::Any,
            ArgsParser::new(
                std::iter::once(object())
                    .chain(std::iter::repeat(arg(ImpType::Point, "Map this point")).take(4))
                    .chain(std::iter::repeat(arg(ImpType::Point, "onto this point")).take(4))
                    .collect(),
            ),
            projectivity_gi4p,
        ),
        StandardType::new(
            "CastShadow",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Point, "Cast a shadow from this light source"),
                arg(ImpType::AbstractLine, "Cast a shadow on the horizon represented by this line"),
            ]),
            cast_shadow,
        ),
        StandardType::new(
            "Similitude",
            ImpType::Any,
            ArgsParser::new(vec![
                object(),
                arg(ImpType::Point, "Apply a similitude with this center"),
                arg(ImpType::Point, "mapping this point"),
                arg(ImpType::Point, "onto this point"),
            ]),
            similitude,
        ),
    ]
}

fn apply(args: &[&ObjectImp], t: Option<Transformation>) -> ObjectImp {
    match t {
        Some(t) => args[0].transform(&t),
        None => ObjectImp::Invalid,
    }
}

fn translated(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    apply(args, line(args, 1).map(|l| Transformation::translation(&l.dir())))
}

fn point_reflection(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    apply(args, point(args, 1).map(|c| Transformation::point_reflection(&c)))
}

fn line_reflection(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    apply(args, line(args, 1).map(|l| Transformation::line_reflection(&l)))
}

fn rotation(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let t = point(args, 1)
        .zip(double(args, 2))
        .map(|(c, angle)| Transformation::rotation(angle, &c));
    apply(args, t)
}

fn scaling_over_center(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let t = point(args, 1)
        .zip(double(args, 2))
        .map(|(c, factor)| Transformation::scaling_over_point(factor, &c));
    apply(args, t)
}

fn scaling_over_line(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let t = line(args, 1)
        .zip(double(args, 2))
        .map(|(l, factor)| Transformation::scaling_over_line(factor, &l));
    apply(args, t)
}

fn projective_rotation(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(ray), Some(alpha)) = (line(args, 1), double(args, 2)) else {
        return ObjectImp::Invalid;
    };
    if ray.is_degenerate() {
        return ObjectImp::Invalid;
    }
    let dir = ray.dir().normalize();
    apply(args, Some(Transformation::projective_rotation(alpha, &dir, &ray.a)))
}

fn harmonic_homology(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let t = point(args, 1)
        .zip(line(args, 2))
        .map(|(c, axis)| Transformation::harmonic_homology(&c, &axis));
    apply(args, t)
}

fn affinity_gi3p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let pts = points(&args[1..]);
    if pts.len() != 6 {
        return ObjectImp::Invalid;
    }
    apply(args, Transformation::affinity_gi3p(&pts[..3], &pts[3..]))
}

fn projectivity_gi4p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let pts = points(&args[1..]);
    if pts.len() != 8 {
        return ObjectImp::Invalid;
    }
    apply(args, Transformation::projectivity_gi4p(&pts[..4], &pts[4..]))
}

fn cast_shadow(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let t = point(args, 1)
        .zip(line(args, 2))
        .map(|(light, horizon)| Transformation::cast_shadow(&light, &horizon));
    apply(args, t)
}

/// 以 c 为中心、把 a 映到 b 的相似变换
fn similitude(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(c), Some(a), Some(b)) = (point(args, 1), point(args, 2), point(args, 3)) else {
        return ObjectImp::Invalid;
    };
    let (a, b) = (a - c, b - c);
    if a.norm_squared() == 0.0 {
        return ObjectImp::Invalid;
    }
    let factor = (b.norm_squared() / a.norm_squared()).sqrt();
    let theta = b.y.atan2(b.x) - a.y.atan2(a.x);
    apply(args, Some(Transformation::similitude(&c, theta, factor)))
}
