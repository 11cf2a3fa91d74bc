//! 线段、射线与直线的构造

use super::args::{line, point};
use super::{arg, through, ArgsParser, Motion, StandardType};
use crate::config::EngineConfig;
use crate::geometry::LineData;
use crate::imp::{ImpType, ObjectImp};
use crate::math::orthogonal;

pub(super) fn types() -> Vec<StandardType> {
    let two_points = || {
        ArgsParser::new(vec![
            through(ImpType::Point, "Construct through this point"),
            through(ImpType::Point, "and through this other point"),
        ])
    };
    let line_and_point = || {
        ArgsParser::new(vec![
            arg(ImpType::AbstractLine, "Construct relative to this line"),
            through(ImpType::Point, "through this point"),
        ])
    };
    vec![
        StandardType::new("SegmentAB", ImpType::Segment, two_points(), segment_ab)
            .with_motion(Motion::Translate),
        StandardType::new("LineAB", ImpType::Line, two_points(), line_ab)
            .with_motion(Motion::Translate),
        StandardType::new("RayAB", ImpType::Ray, two_points(), ray_ab)
            .with_motion(Motion::Translate),
        StandardType::new("LinePerpend", ImpType::Line, line_and_point(), line_perpend),
        StandardType::new("LineParallel", ImpType::Line, line_and_point(), line_parallel),
    ]
}

fn two_points(args: &[&ObjectImp]) -> Option<LineData> {
    Some(LineData::new(point(args, 0)?, point(args, 1)?))
}

fn segment_ab(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    two_points(args).map_or(ObjectImp::Invalid, ObjectImp::Segment)
}

fn line_ab(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match two_points(args) {
        Some(l) if !l.is_degenerate() => ObjectImp::Line(l),
        _ => ObjectImp::Invalid,
    }
}

fn ray_ab(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    match two_points(args) {
        Some(l) if !l.is_degenerate() => ObjectImp::Ray(l),
        _ => ObjectImp::Invalid,
    }
}

fn line_perpend(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(l), Some(p)) = (line(args, 0), point(args, 1)) else {
        return ObjectImp::Invalid;
    };
    if l.is_degenerate() {
        return ObjectImp::Invalid;
    }
    ObjectImp::Line(LineData::new(p, p + orthogonal(&l.dir())))
}

fn line_parallel(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(l), Some(p)) = (line(args, 0), point(args, 1)) else {
        return ObjectImp::Invalid;
    };
    if l.is_degenerate() {
        return ObjectImp::Invalid;
    }
    ObjectImp::Line(LineData::new(p, p + l.dir()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Coordinate;
    use crate::types::ObjectType;

    fn find(name: &str) -> StandardType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    #[test]
    fn test_perpendicular() {
        let t = find("LinePerpend");
        let l = ObjectImp::Segment(LineData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 0.0),
        ));
        let p = ObjectImp::Point(Coordinate::new(1.0, 1.0));
        let r = t.calc(&[&l, &p], &EngineConfig::default());
        let data = r.as_line().unwrap();
        assert!(data.is_orthogonal_to(&l.as_line().unwrap()));
        assert_eq!(data.a, Coordinate::new(1.0, 1.0));
    }

    #[test]
    fn test_degenerate_line_is_invalid() {
        let t = find("LineAB");
        let p = ObjectImp::Point(Coordinate::new(1.0, 1.0));
        assert_eq!(t.calc(&[&p, &p], &EngineConfig::default()), ObjectImp::Invalid);
    }
}
