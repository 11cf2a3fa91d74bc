//! 多边形的构造与求交

use super::args::{int, line, point, points};
use super::{arg, through, ArgsParser, Motion, StandardType};
use crate::config::EngineConfig;
use crate::geometry::{convex_hull, LineData, PolygonData};
use crate::imp::{ImpType, ObjectImp};
use crate::math::{cross, Coordinate, Vector2};
use nalgebra::Rotation2;
use std::f64::consts::PI;

pub(super) fn types() -> Vec<StandardType> {
    vec![
        StandardType::new(
            "TriangleB3P",
            ImpType::Polygon,
            ArgsParser::new(vec![
                through(ImpType::Point, "Construct a triangle with this vertex");
                3
            ]),
            polygon_bnp,
        )
        .with_motion(Motion::Translate),
        StandardType::new(
            "PolygonBNP",
            ImpType::Polygon,
            ArgsParser::new(vec![
                through(ImpType::Point, "Construct a polygon with this vertex");
                3
            ])
            .variadic(),
            polygon_bnp,
        )
        .with_motion(Motion::Translate),
        StandardType::new(
            "PolygonBCV",
            ImpType::Polygon,
            ArgsParser::new(vec![
                arg(ImpType::Point, "Construct a regular polygon with this center"),
                through(ImpType::Point, "Construct a regular polygon with this vertex"),
                arg(ImpType::Int, "sides"),
                arg(ImpType::Int, "twist"),
            ])
            .with_min(3),
            polygon_bcv,
        )
        .with_motion(Motion::Translate),
        StandardType::new(
            "PolygonVertex",
            ImpType::Point,
            ArgsParser::new(vec![
                through(ImpType::Polygon, "Construct the vertices of this polygon"),
                arg(ImpType::Int, "param"),
            ]),
            polygon_vertex,
        ),
        StandardType::new(
            "PolygonSide",
            ImpType::Segment,
            ArgsParser::new(vec![
                arg(ImpType::Polygon, "Construct the sides of this polygon"),
                arg(ImpType::Int, "param"),
            ]),
            polygon_side,
        ),
        StandardType::new(
            "ConvexHull",
            ImpType::Polygon,
            ArgsParser::new(vec![arg(
                ImpType::Polygon,
                "Construct the convex hull of this polygon",
            )]),
            convex_hull_type,
        ),
        // 声明为线段，但退化情形只剩一个交点时结果是点
        StandardType::new(
            "PolygonLineIntersection",
            ImpType::Segment,
            ArgsParser::new(vec![
                arg(ImpType::Polygon, "Intersect this polygon with a line"),
                arg(ImpType::AbstractLine, "Intersect this line with a polygon"),
            ]),
            polygon_line_intersection,
        ),
        StandardType::new(
            "PolygonPolygonIntersection",
            ImpType::Polygon,
            ArgsParser::new(vec![
                arg(ImpType::Polygon, "Intersect this polygon with another polygon"),
                arg(ImpType::Polygon, "Intersect with this polygon"),
            ]),
            polygon_polygon_intersection,
        ),
    ]
}

fn polygon_bnp(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let pts = points(args);
    if pts.len() < 3 {
        return ObjectImp::Invalid;
    }
    ObjectImp::Polygon(PolygonData::new(pts))
}

/// 由中心、一个顶点和边数构造的正多边形；`twist` 大于1时得到星形
fn polygon_bcv(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(center), Some(vertex), Some(sides)) = (point(args, 0), point(args, 1), int(args, 2))
    else {
        return ObjectImp::Invalid;
    };
    let twist = if args.len() > 3 {
        match int(args, 3) {
            Some(t) => t,
            None => return ObjectImp::Invalid,
        }
    } else {
        1
    };
    if sides < 3 {
        return ObjectImp::Invalid;
    }
    let d = vertex - center;
    let alpha = 2.0 * twist as f64 * PI / sides as f64;
    let vertices = (0..sides)
        .map(|i| center + Rotation2::new(alpha * i as f64) * d)
        .collect();
    ObjectImp::Polygon(PolygonData::new(vertices))
}

fn polygon_vertex(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(polygon), Some(i)) = (args[0].as_polygon(), int(args, 1)) else {
        return ObjectImp::Invalid;
    };
    match usize::try_from(i).ok().and_then(|i| polygon.points.get(i)) {
        Some(p) => ObjectImp::Point(*p),
        None => ObjectImp::Invalid,
    }
}

fn polygon_side(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(polygon), Some(i)) = (args[0].as_polygon(), int(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let n = polygon.npoints();
    match usize::try_from(i) {
        Ok(i) if i < n => {
            ObjectImp::Segment(LineData::new(polygon.points[i], polygon.points[(i + 1) % n]))
        }
        _ => ObjectImp::Invalid,
    }
}

fn convex_hull_type(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let Some(polygon) = args[0].as_polygon() else {
        return ObjectImp::Invalid;
    };
    if polygon.npoints() < 3 {
        return ObjectImp::Invalid;
    }
    let hull = convex_hull(&polygon.points);
    if hull.len() < 3 {
        return ObjectImp::Invalid;
    }
    ObjectImp::Polygon(PolygonData::new(hull))
}

/// 多边形与直线、射线或线段的交
///
/// 结果一般是若干条共线的线段，只有恰好一条时才有定义。
/// 线段和射线的端点落在多边形内部时，端点本身成为交线段的端点。
/// 结果类型见 [`segment_from_hits`]。
fn polygon_line_intersection(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    let (Some(polygon), Some(l)) = (args[0].as_polygon(), line(args, 1)) else {
        return ObjectImp::Invalid;
    };
    let (bound_left, bound_right) = match args[1] {
        ObjectImp::Segment(_) => (true, true),
        ObjectImp::Ray(_) => (true, false),
        _ => (false, false),
    };
    let Some(&last) = polygon.points.last() else {
        return ObjectImp::Invalid;
    };

    let a = l.a;
    let ab = l.dir();
    let below = |p: &Vector2| ab.x * p.y <= ab.y * p.x;

    let mut hits: Vec<Coordinate> = Vec::with_capacity(2);
    let mut left_inside = false;
    let mut right_inside = false;
    let mut prev = last - a;
    let mut prev_below = below(&prev);
    for &vertex in &polygon.points {
        let cur = vertex - a;
        let cur_below = below(&cur);
        if cur_below != prev_below {
            let dc = cur - prev;
            let num = cross(&cur, &dc);
            let den = cross(&ab, &dc);
            // 与支撑线平行
            if den.abs() <= 1e-6 * num.abs() {
                continue;
            }
            let t = num / den;
            if bound_left && t <= 0.0 {
                left_inside = !left_inside;
            } else if bound_right && t >= 1.0 {
                right_inside = !right_inside;
            } else {
                if hits.len() >= 2 {
                    return ObjectImp::Invalid;
                }
                hits.push(a + ab * t);
            }
        }
        prev = cur;
        prev_below = cur_below;
    }

    for (inside, end) in [(left_inside, l.a), (right_inside, l.b)] {
        if inside {
            if hits.len() >= 2 {
                return ObjectImp::Invalid;
            }
            hits.push(end);
        }
    }

    segment_from_hits(&hits)
}

/// 由边界交点组成交线段
///
/// 类型声明的结果是线段，但只有一个交点时返回的是点而不是退化线段，
/// 依赖它的构造需要按实际值的类型处理。
fn segment_from_hits(hits: &[Coordinate]) -> ObjectImp {
    match hits {
        [p] => ObjectImp::Point(*p),
        [p, q] => ObjectImp::Segment(LineData::new(*p, *q)),
        _ => ObjectImp::Invalid,
    }
}

const WALK_EPSILON: f64 = 1e-9;

/// 线段 p→p+d 与线段 q→q+f 的交点参数 (t, s)
fn segment_crossing(p: &Coordinate, d: &Vector2, q: &Coordinate, f: &Vector2) -> Option<(f64, f64)> {
    let den = cross(d, f);
    if den.abs() < 1e-12 {
        return None;
    }
    let qp = q - p;
    let t = cross(&qp, f) / den;
    let s = cross(&qp, d) / den;
    ((0.0..=1.0).contains(&s)).then_some((t, s))
}

fn counterclockwise(polygon: &PolygonData) -> Vec<Coordinate> {
    let mut pts = polygon.points.clone();
    if !polygon.is_counterclockwise() {
        pts.reverse();
    }
    pts
}

/// 行走的起点：所在多边形、出发边和出发点
fn walk_start(polys: &[Vec<Coordinate>; 2]) -> Option<(usize, usize, Coordinate)> {
    for cur in 0..2 {
        let other = PolygonData::new(polys[1 - cur].clone());
        if let Some(i) = polys[cur].iter().position(|v| other.is_in_polygon(v)) {
            return Some((cur, i, polys[cur][i]));
        }
    }
    // 没有顶点在对方内部，找多边形 A 进入 B 的穿越点
    let (a, b) = (&polys[0], &polys[1]);
    for i in 0..a.len() {
        let p = a[i];
        let d = a[(i + 1) % a.len()] - p;
        for j in 0..b.len() {
            let q = b[j];
            let f = b[(j + 1) % b.len()] - q;
            if let Some((t, _)) = segment_crossing(&p, &d, &q, &f) {
                if (0.0..1.0).contains(&t) && cross(&f, &d) > 0.0 {
                    return Some((0, i, p + d * t));
                }
            }
        }
    }
    None
}

/// 行走结果之外是否还有交的部分
///
/// 一方在另一方内部的顶点，以及两者边界的交点，都必须出现在结果环上；
/// 否则交集不连通，单个环只是其中一块。
fn has_unvisited_part(polys: &[Vec<Coordinate>; 2], ring: &[Coordinate]) -> bool {
    let on_ring = |p: &Coordinate| {
        let tolerance = 1e-7 * (1.0 + p.coords.norm());
        ring.iter().any(|r| (r - p).norm() <= tolerance)
    };
    for cur in 0..2 {
        let other = PolygonData::new(polys[1 - cur].clone());
        if polys[cur].iter().any(|v| other.is_in_polygon(v) && !on_ring(v)) {
            return true;
        }
    }
    let (a, b) = (&polys[0], &polys[1]);
    for i in 0..a.len() {
        let p = a[i];
        let d = a[(i + 1) % a.len()] - p;
        for j in 0..b.len() {
            let q = b[j];
            let f = b[(j + 1) % b.len()] - q;
            if let Some((t, _)) = segment_crossing(&p, &d, &q, &f) {
                if (0.0..=1.0).contains(&t) && !on_ring(&(p + d * t)) {
                    return true;
                }
            }
        }
    }
    false
}

/// 两个简单多边形的交
///
/// 两者统一为逆时针后，沿当前多边形的边界前进；遇到另一多边形的边时
/// 记下交点并切换到那条边继续走，直到回到起点。步数超过
/// `polygon_walk_limit` 视为退化，结果为 `Invalid`。
/// 交集不连通时同样为 `Invalid`。
fn polygon_polygon_intersection(args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
    let (Some(pa), Some(pb)) = (args[0].as_polygon(), args[1].as_polygon()) else {
        return ObjectImp::Invalid;
    };
    if pa.npoints() < 3 || pb.npoints() < 3 {
        return ObjectImp::Invalid;
    }
    let polys = [counterclockwise(pa), counterclockwise(pb)];
    let Some((mut cur, mut edge, start)) = walk_start(&polys) else {
        tracing::trace!("polygons are disjoint");
        return ObjectImp::Invalid;
    };
    let close_tolerance = 1e-9 * (1.0 + start.coords.norm());

    let mut result = vec![start];
    let mut pos = start;
    loop {
        if result.len() > cfg.polygon_walk_limit {
            tracing::warn!(limit = cfg.polygon_walk_limit, "polygon intersection walk did not close");
            return ObjectImp::Invalid;
        }
        let poly = &polys[cur];
        let target = poly[(edge + 1) % poly.len()];
        let d = target - pos;

        let other = &polys[1 - cur];
        let mut nearest: Option<(f64, usize)> = None;
        for j in 0..other.len() {
            let q = other[j];
            let f = other[(j + 1) % other.len()] - q;
            if let Some((t, _)) = segment_crossing(&pos, &d, &q, &f) {
                if t > WALK_EPSILON && t <= 1.0 && nearest.map_or(true, |(best, _)| t < best) {
                    nearest = Some((t, j));
                }
            }
        }

        let next = match nearest {
            Some((t, j)) => {
                cur = 1 - cur;
                edge = j;
                pos + d * t
            }
            None => {
                edge = (edge + 1) % poly.len();
                target
            }
        };
        if (next - start).norm() <= close_tolerance {
            break;
        }
        result.push(next);
        pos = next;
    }

    if result.len() < 3 {
        return ObjectImp::Invalid;
    }
    if has_unvisited_part(&polys, &result) {
        tracing::debug!("polygon intersection has more than one component");
        return ObjectImp::Invalid;
    }
    ObjectImp::Polygon(PolygonData::new(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectType;

    fn find(name: &str) -> StandardType {
        types().into_iter().find(|t| t.name() == name).unwrap()
    }

    fn square(x0: f64, y0: f64, side: f64) -> ObjectImp {
        ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(x0, y0),
            Coordinate::new(x0 + side, y0),
            Coordinate::new(x0 + side, y0 + side),
            Coordinate::new(x0, y0 + side),
        ]))
    }

    #[test]
    fn test_regular_hexagon() {
        let t = find("PolygonBCV");
        let c = ObjectImp::Point(Coordinate::new(0.0, 0.0));
        let v = ObjectImp::Point(Coordinate::new(1.0, 0.0));
        let n = ObjectImp::Int(6);
        let r = t.calc(&[&c, &v, &n], &EngineConfig::default());
        let poly = r.as_polygon().unwrap();
        assert_eq!(poly.npoints(), 6);
        assert!((poly.perimeter() - 6.0).abs() < 1e-9);
        assert!(poly.center_of_mass.coords.norm() < 1e-12);
    }

    #[test]
    fn test_regular_polygon_needs_three_sides() {
        let t = find("PolygonBCV");
        let c = ObjectImp::Point(Coordinate::new(0.0, 0.0));
        let v = ObjectImp::Point(Coordinate::new(1.0, 0.0));
        let n = ObjectImp::Int(2);
        assert_eq!(t.calc(&[&c, &v, &n], &EngineConfig::default()), ObjectImp::Invalid);
    }

    #[test]
    fn test_vertex_and_side_indices() {
        let sq = square(0.0, 0.0, 1.0);
        let cfg = EngineConfig::default();
        let side = find("PolygonSide").calc(&[&sq, &ObjectImp::Int(3)], &cfg);
        assert_eq!(
            side,
            ObjectImp::Segment(LineData::new(Coordinate::new(0.0, 1.0), Coordinate::new(0.0, 0.0)))
        );
        let vertex = find("PolygonVertex").calc(&[&sq, &ObjectImp::Int(4)], &cfg);
        assert_eq!(vertex, ObjectImp::Invalid);
        let negative = find("PolygonVertex").calc(&[&sq, &ObjectImp::Int(-1)], &cfg);
        assert_eq!(negative, ObjectImp::Invalid);
    }

    #[test]
    fn test_line_through_square_gives_segment() {
        let t = find("PolygonLineIntersection");
        let sq = square(0.0, 0.0, 2.0);
        let l = ObjectImp::Line(LineData::new(Coordinate::new(-5.0, 1.0), Coordinate::new(5.0, 1.0)));
        let r = t.calc(&[&sq, &l], &EngineConfig::default());
        let seg = r.as_line().unwrap();
        let mut xs = [seg.a.x, seg.b.x];
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((xs[0] - 0.0).abs() < 1e-12 && (xs[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_ending_inside_square() {
        let t = find("PolygonLineIntersection");
        let sq = square(0.0, 0.0, 2.0);
        let s = ObjectImp::Segment(LineData::new(Coordinate::new(-1.0, 1.0), Coordinate::new(1.0, 1.0)));
        let r = t.calc(&[&sq, &s], &EngineConfig::default());
        assert!(matches!(r, ObjectImp::Segment(_)));
        let seg = r.as_line().unwrap();
        assert!(seg.a == Coordinate::new(1.0, 1.0) || seg.b == Coordinate::new(1.0, 1.0));
    }

    #[test]
    fn test_single_hit_is_a_point_not_a_segment() {
        let p = Coordinate::new(1.0, 2.0);
        assert_eq!(find("PolygonLineIntersection").result_type(), ImpType::Segment);
        assert_eq!(segment_from_hits(&[p]), ObjectImp::Point(p));
        assert_eq!(segment_from_hits(&[]), ObjectImp::Invalid);
        let q = Coordinate::new(3.0, 2.0);
        assert_eq!(segment_from_hits(&[p, q]), ObjectImp::Segment(LineData::new(p, q)));
    }

    #[test]
    fn test_overlapping_squares_intersect() {
        let t = find("PolygonPolygonIntersection");
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let r = t.calc(&[&a, &b], &EngineConfig::default());
        let poly = r.as_polygon().unwrap();
        assert_eq!(poly.npoints(), 4);
        assert!((poly.surface().unwrap() - 1.0).abs() < 1e-9);
        assert!((poly.center_of_mass - Coordinate::new(1.5, 1.5)).norm() < 1e-9);
    }

    #[test]
    fn test_crossing_rectangles_without_inner_vertices() {
        let t = find("PolygonPolygonIntersection");
        let wide = ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(0.0, 1.0),
            Coordinate::new(4.0, 1.0),
            Coordinate::new(4.0, 2.0),
            Coordinate::new(0.0, 2.0),
        ]));
        let tall = ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(1.0, 0.0),
            Coordinate::new(2.0, 0.0),
            Coordinate::new(2.0, 4.0),
            Coordinate::new(1.0, 4.0),
        ]));
        let r = t.calc(&[&wide, &tall], &EngineConfig::default());
        let poly = r.as_polygon().unwrap();
        assert!((poly.surface().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contained_polygon_is_itself() {
        let t = find("PolygonPolygonIntersection");
        let outer = square(0.0, 0.0, 4.0);
        let inner = square(1.0, 1.0, 1.0);
        let r = t.calc(&[&outer, &inner], &EngineConfig::default());
        assert!((r.as_polygon().unwrap().surface().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_polygons_are_invalid() {
        let t = find("PolygonPolygonIntersection");
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 5.0, 1.0);
        assert_eq!(t.calc(&[&a, &b], &EngineConfig::default()), ObjectImp::Invalid);
    }

    #[test]
    fn test_disconnected_intersection_is_invalid() {
        let t = find("PolygonPolygonIntersection");
        let u_shape = ObjectImp::Polygon(PolygonData::new(
            [(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (2.0, 3.0), (2.0, 1.0), (1.0, 1.0), (1.0, 3.0), (0.0, 3.0)]
                .iter()
                .map(|&(x, y)| Coordinate::new(x, y))
                .collect(),
        ));
        let bar = ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(-1.0, 2.0),
            Coordinate::new(4.0, 2.0),
            Coordinate::new(4.0, 2.5),
            Coordinate::new(-1.0, 2.5),
        ]));
        let cfg = EngineConfig::default();
        assert_eq!(t.calc(&[&u_shape, &bar], &cfg), ObjectImp::Invalid);
        assert_eq!(t.calc(&[&bar, &u_shape], &cfg), ObjectImp::Invalid);

        // 同一个 U 形，横条只穿过底部时交集连通
        let low_bar = ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(-1.0, 0.25),
            Coordinate::new(4.0, 0.25),
            Coordinate::new(4.0, 0.75),
            Coordinate::new(-1.0, 0.75),
        ]));
        let r = t.calc(&[&u_shape, &low_bar], &cfg);
        assert!((r.as_polygon().unwrap().surface().unwrap() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_walk_limit_gives_invalid() {
        let t = find("PolygonPolygonIntersection");
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let cfg = EngineConfig {
            polygon_walk_limit: 2,
            ..EngineConfig::default()
        };
        assert_eq!(t.calc(&[&a, &b], &cfg), ObjectImp::Invalid);
    }
}
