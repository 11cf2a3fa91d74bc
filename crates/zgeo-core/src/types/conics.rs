//! 圆锥曲线的构造
//!
//! 拟合类构造在点数不足时按固定顺序追加线性约束，
//! 焦点类构造直接给出极坐标数据。

use super::args::{int, line, point, points};
use super::{arg, through, ArgsParser, StandardType};
use crate::config::EngineConfig;
use crate::conic::{
    calc_conic_asymptote, calc_conic_bdfp, calc_conic_bffp, calc_conic_by_asymptotes,
    calc_conic_polar_line, calc_conic_polar_point, calc_conic_radical,
    calc_conic_through_points, ConicPolarData, LinearConstraint,
};
use crate::geometry::LineData;
use crate::imp::{ConicImp, ImpType, ObjectImp};
use crate::math::{coord_valid, orthogonal, radical_start_point};

const THROUGH_POINT: &str = "Construct a conic through this point";

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "ConicB5P",
            ImpType::Conic,
            ArgsParser::new(vec![through(ImpType::Point, THROUGH_POINT); 5]).with_min(1),
            conic_b5p,
        ),
        StandardType::new(
            "ConicBAAP",
            ImpType::Conic,
            ArgsParser::new(vec![
                arg(ImpType::AbstractLine, "Construct a conic with this asymptote"),
                arg(ImpType::AbstractLine, "Construct a conic with this asymptote"),
                through(ImpType::Point, THROUGH_POINT),
            ]),
            conic_baap,
        ),
        StandardType::new(
            "EllipseBFFP",
            ImpType::Conic,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Construct an ellipse with this focus"),
                arg(ImpType::Point, "Construct an ellipse with this focus"),
                through(ImpType::Point, "Construct an ellipse through this point"),
            ])
            .with_min(2),
            ellipse_bffp,
        ),
        StandardType::new(
            "HyperbolaBFFP",
            ImpType::Conic,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Construct a hyperbola with this focus"),
                arg(ImpType::Point, "Construct a hyperbola with this focus"),
                through(ImpType::Point, "Construct a hyperbola through this point"),
            ])
            .with_min(2),
            hyperbola_bffp,
        ),
        StandardType::new(
            "ConicBDFP",
            ImpType::Conic,
            ArgsParser::new(vec![
                arg(ImpType::AbstractLine, "Construct a conic with this line as directrix"),
                arg(ImpType::Point, "Construct a conic with this point as focus"),
                through(ImpType::Point, THROUGH_POINT),
            ])
            .with_min(2),
            conic_bdfp,
        ),
        StandardType::new(
            "ParabolaBTP",
            ImpType::Conic,
            ArgsParser::new(vec![
                through(ImpType::Point, "Construct a parabola through this point");
                3
            ])
            .with_min(2),
            parabola_btp,
        ),
        StandardType::new(
            "EquilateralHyperbolaB4P",
            ImpType::Conic,
            ArgsParser::new(vec![
                through(ImpType::Point, "Construct a hyperbola through this point");
                4
            ])
            .with_min(1),
            equilateral_hyperbola_b4p,
        ),
        StandardType::new(
            "ConicPolarPoint",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Construct a polar point wrt. this conic"),
                arg(ImpType::AbstractLine, "Construct the polar point of this line"),
            ]),
            conic_polar_point,
        ),
        StandardType::new(
            "ConicPolarLine",
            ImpType::Line,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Construct a polar line wrt. this conic"),
                arg(ImpType::Point, "Construct the polar line of this point"),
            ]),
            conic_polar_line,
        ),
        StandardType::new(
            "ConicDirectrix",
            ImpType::Line,
            ArgsParser::new(vec![arg(ImpType::Conic, "Construct the directrix of this conic")]),
            conic_directrix,
        ),
        StandardType::new(
            "ParabolaBDP",
            ImpType::Conic,
            ArgsParser::new(vec![
                arg(ImpType::AbstractLine, "Construct a parabola with this directrix"),
                arg(ImpType::Point, "Construct a parabola with this focus"),
            ]),
            parabola_bdp,
        ),
        StandardType::new(
            "ConicAsymptote",
            ImpType::Line,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Construct the asymptotes of this conic"),
                arg(ImpType::Int, "param"),
            ]),
            conic_asymptote,
        ),
        StandardType::new(
            "ConicRadical",
            ImpType::Line,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Construct the radical lines of this conic"),
                arg(ImpType::Conic, "and this other conic"),
                arg(ImpType::Int, "param"),
                arg(ImpType::Int, "param"),
            ]),
            conic_radical,
        ),
    ]
}

fn cartesian_or_invalid(
    data: Option<crate::conic::ConicCartesianData>,
) -> ObjectImp {
    data.map_or(ObjectImp::Invalid, ConicImp::from_cartesian)
}

fn polar_or_invalid(data: Option<ConicPolarData>) -> ObjectImp {
    data.map_or(ObjectImp::Invalid, ConicImp::from_polar)
}

fn conic_b5p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    use LinearConstraint::*;
    cartesian_or_invalid(calc_conic_through_points(
        &points(args),
        &[ZeroTilt, ParabolaIfZeroTilt, YSymmetry],
    ))
}

fn conic_baap(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(la), Some(lb), Some(p)) = (line(args, 0), line(args, 1), point(args, 2)) else {
        return ObjectImp::Invalid;
    };
    ConicImp::from_cartesian(calc_conic_by_asymptotes(&la, &lb, &p))
}

fn ellipse_bffp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    polar_or_invalid(calc_conic_bffp(&points(args), 1))
}

fn hyperbola_bffp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    polar_or_invalid(calc_conic_bffp(&points(args), -1))
}

fn conic_bdfp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(directrix), Some(focus)) = (line(args, 0), point(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let p = match point(args, 2) {
        Some(p) => p,
        None => {
            // 取焦点到准线垂线段的中点，得到抛物线
            let ba = directrix.dir();
            let fa = focus - directrix.b;
            let scal = fa.dot(&ba) / ba.norm_squared();
            nalgebra::center(&(directrix.a + ba * scal), &focus)
        }
    };
    polar_or_invalid(calc_conic_bdfp(&directrix, &focus, &p))
}

fn parabola_btp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    use LinearConstraint::*;
    cartesian_or_invalid(calc_conic_through_points(
        &points(args),
        &[ZeroTilt, ParabolaIfZeroTilt, YSymmetry],
    ))
}

fn equilateral_hyperbola_b4p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    cartesian_or_invalid(calc_conic_through_points(
        &points(args),
        &[LinearConstraint::Equilateral],
    ))
}

fn conic_polar_point(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(c), Some(l)) = (args[0].as_conic_cartesian(), line(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let p = calc_conic_polar_point(&c, &l);
    if coord_valid(&p) {
        ObjectImp::Point(p)
    } else {
        ObjectImp::Invalid
    }
}

fn conic_polar_line(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(c), Some(p)) = (args[0].as_conic_cartesian(), point(args, 1)) else {
        return ObjectImp::Invalid;
    };
    calc_conic_polar_line(&c, &p).map_or(ObjectImp::Invalid, ObjectImp::Line)
}

fn conic_directrix(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let Some(data) = args[0].as_conic_polar() else {
        return ObjectImp::Invalid;
    };
    let (ec, es) = (data.ecostheta0, data.esintheta0);
    let eccsq = data.eccentricity_squared();
    // 圆没有准线
    if eccsq == 0.0 {
        return ObjectImp::Invalid;
    }
    let a = data.focus1 - crate::math::Vector2::new(ec, es) * (data.pdimen / eccsq);
    let b = a + crate::math::Vector2::new(-es, ec);
    ObjectImp::Line(LineData::new(a, b))
}

fn parabola_bdp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(l), Some(c)) = (line(args, 0), point(args, 1)) else {
        return ObjectImp::Invalid;
    };
    if l.is_degenerate() {
        return ObjectImp::Invalid;
    }
    let ldir = l.dir().normalize();
    let fa = c - l.a;
    let pdimen = fa.y * ldir.x - fa.x * ldir.y;
    ConicImp::from_polar(ConicPolarData::new(c, pdimen, -ldir.y, ldir.x))
}

fn conic_asymptote(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(c), Some(which)) = (args[0].as_conic_cartesian(), int(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let Ok(which) = i32::try_from(which) else {
        return ObjectImp::Invalid;
    };
    calc_conic_asymptote(&c, which).map_or(ObjectImp::Invalid, ObjectImp::Line)
}

fn conic_radical(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(which), Some(zeroindex)) = (int(args, 2), int(args, 3)) else {
        return ObjectImp::Invalid;
    };
    if let (Some(c1), Some(c2)) = (args[0].as_circle(), args[1].as_circle()) {
        // 两圆只有一条根轴
        if which != 1 {
            return ObjectImp::Invalid;
        }
        let Some(a) = radical_start_point(
            &c1.center,
            c1.squared_radius(),
            &c2.center,
            c2.squared_radius(),
        ) else {
            return ObjectImp::Invalid;
        };
        return ObjectImp::Line(LineData::new(a, a + orthogonal(&(c2.center - c1.center))));
    }
    let (Some(e1), Some(e2)) = (args[0].as_conic_cartesian(), args[1].as_conic_cartesian())
    else {
        return ObjectImp::Invalid;
    };
    let (Ok(which), Ok(zeroindex)) = (i32::try_from(which), i32::try_from(zeroindex)) else {
        return ObjectImp::Invalid;
    };
    calc_conic_radical(&e1, &e2, which, zeroindex).map_or(ObjectImp::Invalid, ObjectImp::Line)
}
