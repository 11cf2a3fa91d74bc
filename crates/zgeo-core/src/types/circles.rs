//! 圆的构造

use super::args::{double, point, points};
use super::{arg, through, ArgsParser, Motion, StandardType};
use crate::config::EngineConfig;
use crate::geometry::CircleData;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{circumcenter, Coordinate};

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "CircleBCP",
            ImpType::Circle,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Construct a circle with this center"),
                through(ImpType::Point, "Construct a circle through this point"),
            ]),
            circle_bcp,
        )
        .with_motion(Motion::Translate),
        StandardType::new(
            "CircleBTP",
            ImpType::Circle,
            ArgsParser::new(vec![
                through(ImpType::Point, "Construct a circle through this point"),
                through(ImpType::Point, "Construct a circle through this point"),
                through(ImpType::Point, "Construct a circle through this point"),
            ])
            .with_min(2),
            circle_btp,
        )
        .with_motion(Motion::Translate),
        StandardType::new(
            "CircleBPR",
            ImpType::Circle,
            ArgsParser::new(vec![
                arg(ImpType::Point, "center"),
                arg(ImpType::Double, "radius"),
            ]),
            circle_bpr,
        )
        .with_motion(Motion::Translate),
    ]
}

fn circle_bcp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match (point(args, 0), point(args, 1)) {
        (Some(c), Some(p)) => ObjectImp::Circle(CircleData::new(c, (p - c).norm())),
        _ => ObjectImp::Invalid,
    }
}

/// 过三点的圆；只给两点时取与它们构成正三角形的第三点
fn circle_btp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let pts = points(args);
    let (a, b) = match pts.as_slice() {
        [a, b, ..] => (*a, *b),
        _ => return ObjectImp::Invalid,
    };
    let c = match pts.get(2) {
        Some(c) => *c,
        None => equilateral_apex(&a, &b),
    };
    match circumcenter(&a, &b, &c) {
        Some(center) => ObjectImp::Circle(CircleData::new(center, (center - a).norm())),
        None => ObjectImp::Invalid,
    }
}

fn equilateral_apex(a: &Coordinate, b: &Coordinate) -> Coordinate {
    let m = nalgebra::center(a, b);
    if b.y != a.y {
        // 中垂线斜率
        let d = -(b.x - a.x) / (b.y - a.y);
        let l = 3.0_f64.sqrt() * (a - b).norm() / 2.0;
        let d2 = d * d;
        let l2 = l * l;
        let dx = (l2 / (d2 + 1.0)).sqrt();
        let mut dy = (l2 * d2 / (d2 + 1.0)).sqrt();
        if d < 0.0 {
            dy = -dy;
        }
        Coordinate::new(m.x + dx, m.y + dy)
    } else {
        Coordinate::new(m.x, m.y + (a.x - b.x))
    }
}

fn circle_bpr(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match (point(args, 0), double(args, 1)) {
        (Some(c), Some(r)) => ObjectImp::Circle(CircleData::new(c, r)),
        _ => ObjectImp::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectType;

    fn find(name: &str) -> StandardType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    #[test]
    fn test_circle_through_three_points() {
        let t = find("CircleBTP");
        let pts = [
            ObjectImp::Point(Coordinate::new(1.0, 0.0)),
            ObjectImp::Point(Coordinate::new(-1.0, 0.0)),
            ObjectImp::Point(Coordinate::new(0.0, 1.0)),
        ];
        let args: Vec<&ObjectImp> = pts.iter().collect();
        let c = t.calc(&args, &EngineConfig::default()).as_circle().unwrap();
        assert!(c.center.coords.norm() < 1e-12);
        assert!((c.radius - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_through_two_points_is_equilateral() {
        let t = find("CircleBTP");
        let a = ObjectImp::Point(Coordinate::new(0.0, 0.0));
        let b = ObjectImp::Point(Coordinate::new(2.0, 0.0));
        let c = t.calc(&[&a, &b], &EngineConfig::default()).as_circle().unwrap();
        // 边长2的正三角形外接圆半径为 2/√3
        assert!((c.radius - 2.0 / 3.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_collinear_points_are_invalid() {
        let t = find("CircleBTP");
        let pts = [
            ObjectImp::Point(Coordinate::new(0.0, 0.0)),
            ObjectImp::Point(Coordinate::new(1.0, 1.0)),
            ObjectImp::Point(Coordinate::new(2.0, 2.0)),
        ];
        let args: Vec<&ObjectImp> = pts.iter().collect();
        assert_eq!(t.calc(&args, &EngineConfig::default()), ObjectImp::Invalid);
    }
}
