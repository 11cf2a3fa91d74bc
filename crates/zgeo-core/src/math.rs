//! 基础数学类型与平面几何辅助函数
//!
//! 坐标统一使用 `nalgebra::Point2<f64>`，向量使用 `Vector2<f64>`。

pub use nalgebra::{Matrix3, Vector3};

/// 平面坐标
pub type Coordinate = nalgebra::Point2<f64>;

/// 平面向量
pub type Vector2 = nalgebra::Vector2<f64>;

/// 通用比较容差
pub const EPSILON: f64 = 1e-10;

/// 判断坐标是否有效（两个分量都是有限数）
#[inline]
pub fn coord_valid(p: &Coordinate) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// 无效坐标
#[inline]
pub fn invalid_coord() -> Coordinate {
    Coordinate::new(f64::NAN, f64::NAN)
}

/// 二维叉积
#[inline]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// 逆时针旋转90度
#[inline]
pub fn orthogonal(v: &Vector2) -> Vector2 {
    Vector2::new(-v.y, v.x)
}

/// 两条直线 (a1,b1) 与 (a2,b2) 的交点；平行时返回 `None`
pub fn line_line_intersection(
    a1: &Coordinate,
    b1: &Coordinate,
    a2: &Coordinate,
    b2: &Coordinate,
) -> Option<Coordinate> {
    let d1 = b1 - a1;
    let d2 = b2 - a2;
    let denom = cross(&d1, &d2);
    if denom.abs() < EPSILON * d1.norm() * d2.norm() || denom == 0.0 {
        return None;
    }
    let t = cross(&(a2 - a1), &d2) / denom;
    Some(a1 + d1 * t)
}

/// 点 p 在直线 (a,b) 上的垂足
pub fn point_on_perpend_foot(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> Coordinate {
    let dir = b - a;
    let len_sq = dir.norm_squared();
    if len_sq == 0.0 {
        return *a;
    }
    let t = (p - a).dot(&dir) / len_sq;
    a + dir * t
}

/// 点到直线 (a,b) 的距离
pub fn distance_to_line(a: &Coordinate, b: &Coordinate, p: &Coordinate) -> f64 {
    (p - point_on_perpend_foot(a, b, p)).norm()
}

/// 三点外接圆圆心；三点共线时返回 `None`
pub fn circumcenter(a: &Coordinate, b: &Coordinate, c: &Coordinate) -> Option<Coordinate> {
    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * cross(&ab, &ac);
    if d.abs() < EPSILON * ab.norm_squared().max(ac.norm_squared()) || d == 0.0 {
        return None;
    }
    let ab2 = ab.norm_squared();
    let ac2 = ac.norm_squared();
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    Some(Coordinate::new(a.x + ux, a.y + uy))
}

/// 点是否落在直线 (a,b) 上
pub fn is_on_line(p: &Coordinate, a: &Coordinate, b: &Coordinate, fault: f64) -> bool {
    distance_to_line(a, b, p) <= fault
}

/// 点是否落在线段 [a,b] 上
pub fn is_on_segment(p: &Coordinate, a: &Coordinate, b: &Coordinate, fault: f64) -> bool {
    is_on_line(p, a, b, fault)
        && (p - a).dot(&(b - a)) >= -fault
        && (p - b).dot(&(a - b)) >= -fault
}

/// 点是否落在射线 a→b 上
pub fn is_on_ray(p: &Coordinate, a: &Coordinate, b: &Coordinate, fault: f64) -> bool {
    is_on_line(p, a, b, fault) && (p - a).dot(&(b - a)) >= -fault
}

/// 圆与直线的交点
///
/// `side` 取 1 或 -1 选择两个交点之一。
pub fn circle_line_intersection(
    center: &Coordinate,
    sqr_radius: f64,
    a: &Coordinate,
    b: &Coordinate,
    side: i32,
) -> Option<Coordinate> {
    let dir = b - a;
    let len_sq = dir.norm_squared();
    if len_sq == 0.0 {
        return None;
    }
    let foot = point_on_perpend_foot(a, b, center);
    let dist_sq = (foot - center).norm_squared();
    let rest = sqr_radius - dist_sq;
    if rest < 0.0 {
        return None;
    }
    let offset = dir * ((rest / len_sq).sqrt() * side as f64);
    Some(foot + offset)
}

/// 两圆根轴上最靠近第一个圆心的点
///
/// 位于 c1→c2 方向上距 c1 为 (d²+r1²−r2²)/(2d) 处。
pub fn radical_start_point(
    c1: &Coordinate,
    sqr_r1: f64,
    c2: &Coordinate,
    sqr_r2: f64,
) -> Option<Coordinate> {
    let dir = c2 - c1;
    let d = dir.norm();
    if d == 0.0 {
        return None;
    }
    let lambda = (d * d + sqr_r1 - sqr_r2) / (2.0 * d);
    Some(c1 + dir * (lambda / d))
}
