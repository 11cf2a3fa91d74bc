//! 曲线上一点处的切线与曲率中心
//!
//! 圆锥曲线和三次曲线都由隐式方程 f(x,y)=0 给出：梯度是法向，
//! 曲率由 div(∇f/|∇f|) 得到。

use super::args::{point, point_or_invalid};
use super::{arg, through, ArgsParser, StandardType};
use crate::conic::calc_conic_polar_line;
use crate::config::EngineConfig;
use crate::geometry::LineData;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{Coordinate, Vector2};

const SELECT_POINT: &str = "Select the point for the tangent to go through...";

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "TangentConic",
            ImpType::Line,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Select the curve..."),
                through(ImpType::Point, SELECT_POINT),
            ]),
            tangent_conic,
        ),
        StandardType::new(
            "TangentCubic",
            ImpType::Line,
            ArgsParser::new(vec![
                arg(ImpType::Cubic, "Select the curve..."),
                through(ImpType::Point, SELECT_POINT),
            ]),
            tangent_cubic,
        ),
        StandardType::new(
            "CocConic",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Conic, "Select the curve..."),
                arg(ImpType::Point, "Select a point on the curve..."),
            ]),
            coc_conic,
        ),
        StandardType::new(
            "CocCubic",
            ImpType::Point,
            ArgsParser::new(vec![
                arg(ImpType::Cubic, "Select the curve..."),
                arg(ImpType::Point, "Select a point on the curve..."),
            ]),
            coc_cubic,
        ),
    ]
}

/// 曲线值及其上的点；点不在曲线上时为 `None`
fn point_on_curve(args: &[&ObjectImp], cfg: &EngineConfig) -> Option<Coordinate> {
    let p = point(args, 1)?;
    args[0].contains_point(&p, cfg).then_some(p)
}

/// 切线即该点关于圆锥曲线的极线
fn tangent_conic(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(data), Some(p)) = (args[0].as_conic_cartesian(), point_on_curve(args, cfg)) else {
        return ObjectImp::Invalid;
    };
    calc_conic_polar_line(&data, &p).map_or(ObjectImp::Invalid, ObjectImp::Line)
}

/// 切向量 (-fy, fx) 与梯度正交；奇点处梯度为零，没有切线
fn tangent_cubic(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(cubic), Some(p)) = (args[0].as_cubic(), point_on_curve(args, cfg)) else {
        return ObjectImp::Invalid;
    };
    let (_, fx, fy) = cubic.eval_with_gradient(&p);
    let direction = Vector2::new(-fy, fx);
    if direction.norm_squared() < 1e-24 {
        return ObjectImp::Invalid;
    }
    ObjectImp::Line(LineData::new(p, p + direction))
}

/// 由梯度和Hessian求曲率中心
///
/// k·|∇f| = fxx + fyy − (∇f)ᵀH(∇f)/|∇f|²，中心为 p − ∇f/(k·|∇f|)。
/// 拐点处曲率为零，中心在无穷远。
fn center_of_curvature(p: &Coordinate, gradient: Vector2, hxx: f64, hyy: f64, hxy: f64) -> Option<Coordinate> {
    let (gx, gy) = (gradient.x, gradient.y);
    let normsq = gx * gx + gy * gy;
    if normsq == 0.0 {
        return None;
    }
    let kgf = hxx + hyy - (hxx * gx * gx + hyy * gy * gy + 2.0 * hxy * gx * gy) / normsq;
    Some(p - gradient / kgf)
}

fn coc_conic(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(data), Some(p)) = (args[0].as_conic_cartesian(), point_on_curve(args, cfg)) else {
        return ObjectImp::Invalid;
    };
    let [a, b, c, d, e, _] = data.coeffs;
    let gradient = Vector2::new(2.0 * a * p.x + c * p.y + d, c * p.x + 2.0 * b * p.y + e);
    point_or_invalid(center_of_curvature(&p, gradient, 2.0 * a, 2.0 * b, c))
}

fn coc_cubic(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(cubic), Some(p)) = (args[0].as_cubic(), point_on_curve(args, cfg)) else {
        return ObjectImp::Invalid;
    };
    let [_, _, _, a011, a012, a022, a111, a112, a122, a222] = cubic.coeffs;
    let (x, y) = (p.x, p.y);
    let (_, fx, fy) = cubic.eval_with_gradient(&p);
    let hxx = 6.0 * a111 * x + 2.0 * a112 * y + 2.0 * a011;
    let hyy = 6.0 * a222 * y + 2.0 * a122 * x + 2.0 * a022;
    let hxy = 2.0 * a112 * x + 2.0 * a122 * y + a012;
    point_or_invalid(center_of_curvature(&p, Vector2::new(fx, fy), hxx, hyy, hxy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conic::ConicCartesianData;
    use crate::cubic::CubicCartesianData;
    use crate::geometry::CircleData;
    use crate::imp::ConicImp;
    use crate::math::cross;
    use crate::types::ObjectType;

    fn find(name: &str) -> StandardType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    fn pt(x: f64, y: f64) -> ObjectImp {
        ObjectImp::Point(Coordinate::new(x, y))
    }

    /// y = x²
    fn parabola() -> ObjectImp {
        ConicImp::from_cartesian(ConicCartesianData::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0))
    }

    /// y = x³
    fn cubic_parabola() -> ObjectImp {
        ObjectImp::Cubic(CubicCartesianData::new([
            0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
        ]))
    }

    fn assert_line_through(l: &LineData, p: Coordinate, dir: Vector2) {
        assert!(cross(&(l.a - p), &dir).abs() < 1e-9, "{l:?} misses {p}");
        assert!(cross(&l.dir(), &dir).abs() < 1e-9 * l.dir().norm(), "{l:?} not along {dir}");
    }

    #[test]
    fn test_tangent_to_circle_and_parabola() {
        let t = find("TangentConic");
        let cfg = EngineConfig::default();
        let circle = ObjectImp::Circle(CircleData::new(Coordinate::new(0.0, 0.0), 1.0));
        let r = t.calc(&[&circle, &pt(1.0, 0.0)], &cfg);
        assert_line_through(&r.as_line().unwrap(), Coordinate::new(1.0, 0.0), Vector2::new(0.0, 1.0));

        let r = t.calc(&[&parabola(), &pt(1.0, 1.0)], &cfg);
        assert_line_through(&r.as_line().unwrap(), Coordinate::new(1.0, 1.0), Vector2::new(1.0, 2.0));

        assert_eq!(t.calc(&[&circle, &pt(2.0, 0.0)], &cfg), ObjectImp::Invalid);
    }

    #[test]
    fn test_tangent_to_cubic() {
        let t = find("TangentCubic");
        let cfg = EngineConfig::default();
        let r = t.calc(&[&cubic_parabola(), &pt(1.0, 1.0)], &cfg);
        assert!(matches!(r, ObjectImp::Line(_)));
        assert_line_through(&r.as_line().unwrap(), Coordinate::new(1.0, 1.0), Vector2::new(1.0, 3.0));
        assert_eq!(t.calc(&[&cubic_parabola(), &pt(1.0, 2.0)], &cfg), ObjectImp::Invalid);
    }

    #[test]
    fn test_tangent_at_cusp_is_invalid() {
        // y² = x³ 在原点有尖点
        let cusp = ObjectImp::Cubic(CubicCartesianData::new([
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0,
        ]));
        let t = find("TangentCubic");
        assert_eq!(t.calc(&[&cusp, &pt(0.0, 0.0)], &EngineConfig::default()), ObjectImp::Invalid);
    }

    #[test]
    fn test_center_of_curvature_of_conics() {
        let t = find("CocConic");
        let cfg = EngineConfig::default();
        let circle = ObjectImp::Circle(CircleData::new(Coordinate::new(1.0, 1.0), 2.0));
        let c = t.calc(&[&circle, &pt(3.0, 1.0)], &cfg).as_point().unwrap();
        assert!((c - Coordinate::new(1.0, 1.0)).norm() < 1e-9);

        // 抛物线顶点处曲率半径为 1/2
        let c = t.calc(&[&parabola(), &pt(0.0, 0.0)], &cfg).as_point().unwrap();
        assert!((c - Coordinate::new(0.0, 0.5)).norm() < 1e-9);
    }

    #[test]
    fn test_center_of_curvature_of_cubic() {
        let t = find("CocCubic");
        let cfg = EngineConfig::default();
        // y = x³ 在 (1,1)：R = 10^1.5 / 6，法向 (-3,1)/√10
        let c = t.calc(&[&cubic_parabola(), &pt(1.0, 1.0)], &cfg).as_point().unwrap();
        assert!((c - Coordinate::new(-4.0, 1.0 + 5.0 / 3.0)).norm() < 1e-9);

        // 拐点
        assert_eq!(t.calc(&[&cubic_parabola(), &pt(0.0, 0.0)], &cfg), ObjectImp::Invalid);
    }
}
