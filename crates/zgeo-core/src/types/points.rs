//! 点的构造

use super::args::{double, point, point_or_invalid};
use super::{arg, through, ArgsParser, Motion, StandardType};
use crate::config::EngineConfig;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{coord_valid, Coordinate};

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "FixedPoint",
            ImpType::Point,
            ArgsParser::new(vec![arg(ImpType::Double, "x"), arg(ImpType::Double, "y")]),
            fixed_point,
        )
        .with_motion(Motion::FixedPoint),
        StandardType::new(
            "RelativePoint",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Double, "relative-x"),
                arg(ImpType::Double, "relative-y"),
                arg(ImpType::Any, "object"),
            ]),
            relative_point,
        )
        .with_motion(Motion::RelativePoint),
        StandardType::new(
            "ConstrainedPoint",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Double, "parameter"),
                through(ImpType::Curve, "Constrain the point to this curve"),
            ]),
            constrained_point,
        )
        .with_motion(Motion::ConstrainedPoint),
        StandardType::new(
            "MidPoint",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Construct the midpoint of this point"),
                arg(ImpType::Point, "and this other point"),
            ]),
            mid_point,
        ),
        StandardType::new(
            "TransportOfMeasure",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Segment, "Transport the length of this segment"),
                through(ImpType::Curve, "onto this line or circle"),
                arg(ImpType::Point, "starting at this point"),
            ]),
            transport_of_measure,
        ),
    ]
}

fn fixed_point(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match (double(args, 0), double(args, 1)) {
        (Some(x), Some(y)) => point_or_invalid(Some(Coordinate::new(x, y))),
        _ => ObjectImp::Invalid,
    }
}

fn relative_point(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(dx), Some(dy)) = (double(args, 0), double(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let reference = args[2].attach_point();
    if !coord_valid(&reference) {
        return ObjectImp::Invalid;
    }
    point_or_invalid(Some(reference + crate::math::Vector2::new(dx, dy)))
}

fn constrained_point(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let Some(param) = double(args, 0) else {
        return ObjectImp::Invalid;
    };
    point_or_invalid(Some(args[1].get_point(param, cfg)))
}

fn mid_point(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match (point(args, 0), point(args, 1)) {
        (Some(a), Some(b)) => ObjectImp::Point(nalgebra::center(&a, &b)),
        _ => ObjectImp::Invalid,
    }
}

/// 把线段长度沿直线或圆从给定点量出去
fn transport_of_measure(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(segment), Some(p)) = (args[0].as_line(), point(args, 2)) else {
        return ObjectImp::Invalid;
    };
    let measure = segment.length();
    let curve = args[1];
    if !curve.contains_point(&p, cfg) {
        return ObjectImp::Invalid;
    }
    match curve {
        ObjectImp::Line(l) => {
            let dir = l.dir() / l.length();
            point_or_invalid(Some(p + dir * measure))
        }
        ObjectImp::Circle(c) => {
            let mut param = curve.get_param(&p, cfg);
            param += measure / (2.0 * c.radius.abs() * std::f64::consts::PI);
            while param > 1.0 {
                param -= 1.0;
            }
            point_or_invalid(Some(curve.get_point(param, cfg)))
        }
        _ => ObjectImp::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CircleData, LineData};
    use crate::types::ObjectType;

    fn find(name: &str) -> StandardType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    #[test]
    fn test_fixed_point() {
        let t = find("FixedPoint");
        let r = t.calc(
            &[&ObjectImp::Double(1.0), &ObjectImp::Double(-2.0)],
            &EngineConfig::default(),
        );
        assert_eq!(r, ObjectImp::Point(Coordinate::new(1.0, -2.0)));
    }

    #[test]
    fn test_relative_point_follows_attach_point() {
        let t = find("RelativePoint");
        let base = ObjectImp::Point(Coordinate::new(3.0, 3.0));
        let r = t.calc(
            &[&ObjectImp::Double(1.0), &ObjectImp::Double(2.0), &base],
            &EngineConfig::default(),
        );
        assert_eq!(r, ObjectImp::Point(Coordinate::new(4.0, 5.0)));
    }

    #[test]
    fn test_transport_of_measure_on_circle() {
        let t = find("TransportOfMeasure");
        let cfg = EngineConfig::default();
        let seg = ObjectImp::Segment(LineData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(std::f64::consts::FRAC_PI_2, 0.0),
        ));
        let circle = ObjectImp::Circle(CircleData::new(Coordinate::new(0.0, 0.0), 1.0));
        let start = ObjectImp::Point(Coordinate::new(1.0, 0.0));
        let r = t.calc(&[&seg, &circle, &start], &cfg);
        let p = r.as_point().unwrap();
        // 从 (1,0) 沿单位圆走四分之一圈
        assert!((p - Coordinate::new(0.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn test_transport_of_measure_requires_point_on_curve() {
        let t = find("TransportOfMeasure");
        let seg = ObjectImp::Segment(LineData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
        ));
        let line = ObjectImp::Line(LineData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
        ));
        let off = ObjectImp::Point(Coordinate::new(5.0, 0.0));
        assert_eq!(
            t.calc(&[&seg, &line, &off], &EngineConfig::default()),
            ObjectImp::Invalid
        );
    }
}
