//! 几何数据
//!
//! 值类型所携带的纯数据：
//! - 两点确定的直线数据 (LineData)，线段、射线、直线共用
//! - 圆 (CircleData)
//! - 多边形 (PolygonData)

use crate::math::{cross, Coordinate, Vector2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 由两点 a、b 确定的直线数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    pub a: Coordinate,
    pub b: Coordinate,
}

impl LineData {
    pub fn new(a: Coordinate, b: Coordinate) -> Self {
        Self { a, b }
    }

    /// 方向向量 b - a
    #[inline]
    pub fn dir(&self) -> Vector2 {
        self.b - self.a
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.dir().norm()
    }

    /// 两点重合时直线退化
    pub fn is_degenerate(&self) -> bool {
        self.dir().norm_squared() == 0.0
    }

    pub fn valid(&self) -> bool {
        crate::math::coord_valid(&self.a) && crate::math::coord_valid(&self.b)
    }

    /// 是否与另一条直线平行
    pub fn is_parallel_to(&self, other: &LineData) -> bool {
        let d1 = self.dir();
        let d2 = other.dir();
        cross(&d1, &d2).abs() <= 1e-6 * d1.norm() * d2.norm()
    }

    /// 是否与另一条直线垂直
    pub fn is_orthogonal_to(&self, other: &LineData) -> bool {
        let d1 = self.dir();
        let d2 = other.dir();
        d1.dot(&d2).abs() <= 1e-6 * d1.norm() * d2.norm()
    }

    /// 直线方程系数 (a, b, c)，满足 a·x + b·y + c = 0
    pub fn equation(&self) -> (f64, f64, f64) {
        let a = self.a.y - self.b.y;
        let b = self.b.x - self.a.x;
        let c = self.a.x * self.b.y - self.a.y * self.b.x;
        (a, b, c)
    }
}

/// 圆
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleData {
    pub center: Coordinate,
    pub radius: f64,
}

impl CircleData {
    pub fn new(center: Coordinate, radius: f64) -> Self {
        Self { center, radius }
    }

    #[inline]
    pub fn squared_radius(&self) -> f64 {
        self.radius * self.radius
    }

    pub fn surface(&self) -> f64 {
        PI * self.squared_radius()
    }

    pub fn circumference(&self) -> f64 {
        2.0 * PI * self.radius.abs()
    }

    pub fn valid(&self) -> bool {
        crate::math::coord_valid(&self.center) && self.radius.is_finite()
    }
}

/// 多边形
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonData {
    pub points: Vec<Coordinate>,
    pub center_of_mass: Coordinate,
}

impl PolygonData {
    /// 以顶点平均值作为质心创建多边形
    pub fn new(points: Vec<Coordinate>) -> Self {
        let n = points.len().max(1) as f64;
        let sum = points
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Self {
            points,
            center_of_mass: Coordinate::from(sum / n),
        }
    }

    #[inline]
    pub fn npoints(&self) -> usize {
        self.points.len()
    }

    pub fn valid(&self) -> bool {
        self.points.iter().all(crate::math::coord_valid)
    }

    /// 第 i 条边（从顶点 i 到顶点 i+1）
    pub fn side(&self, i: usize) -> LineData {
        let n = self.points.len();
        LineData::new(self.points[i % n], self.points[(i + 1) % n])
    }

    /// 周长
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        (0..n)
            .map(|i| (self.points[i] - self.points[(i + n - 1) % n]).norm())
            .sum()
    }

    /// 有向面积的两倍（逆时针为负，与 x·dy 约定相反）
    fn signed_surface2(&self) -> f64 {
        let Some(&last) = self.points.last() else {
            return 0.0;
        };
        let mut prev = last;
        let mut s = 0.0;
        for &p in &self.points {
            s += (p.x - prev.x) * (p.y + prev.y);
            prev = p;
        }
        s
    }

    /// 面积；只对环绕数绝对值为1的多边形有定义
    pub fn surface(&self) -> Option<f64> {
        if self.winding_number().abs() != 1 {
            return None;
        }
        Some((self.signed_surface2() / 2.0).abs())
    }

    /// 是否逆时针排列
    pub fn is_counterclockwise(&self) -> bool {
        self.signed_surface2() < 0.0
    }

    /// 环绕数
    ///
    /// 沿边界行走时统计方向穿越 (1,0) 的次数，左转为正。
    pub fn winding_number(&self) -> i32 {
        let n = self.points.len();
        if n == 0 {
            return 0;
        }
        let mut winding = 0;
        let mut prevside = self.points[0] - self.points[n - 1];
        for i in 0..n {
            let side = self.points[(i + 1) % n] - self.points[i];
            let vecprod = side.x * prevside.y - side.y * prevside.x;
            let steeringdir = if vecprod > 0.0 { 1 } else { -1 };
            if vecprod == 0.0 || side.y * prevside.y > 0.0 {
                prevside = side;
                continue;
            }
            if side.y * (steeringdir as f64) < 0.0 && prevside.y * (steeringdir as f64) >= 0.0 {
                winding -= steeringdir;
            }
            prevside = side;
        }
        winding
    }

    /// 沿边界行走时转向是否始终同向
    pub fn is_monotone_steering(&self) -> bool {
        let n = self.points.len();
        if n == 0 {
            return true;
        }
        let mut prevside = self.points[0] - self.points[n - 1];
        let mut prevsteeringdir = 0;
        for i in 0..n {
            let side = self.points[(i + 1) % n] - self.points[i];
            let vecprod = side.x * prevside.y - side.y * prevside.x;
            let steeringdir = if vecprod > 0.0 { 1 } else { -1 };
            if vecprod == 0.0 {
                prevside = side;
                continue;
            }
            if prevsteeringdir * steeringdir < 0 {
                return false;
            }
            prevside = side;
            prevsteeringdir = steeringdir;
        }
        true
    }

    pub fn is_convex(&self) -> bool {
        self.is_monotone_steering() && self.winding_number().abs() == 1
    }

    /// 点是否在多边形内部；边界上的点视为外部
    ///
    /// 从点向右作水平射线并统计交点奇偶性。
    pub fn is_in_polygon(&self, p: &Coordinate) -> bool {
        let Some(&last) = self.points.last() else {
            return false;
        };
        let mut inside = false;
        let (cx, cy) = (p.x, p.y);
        let mut prevpoint = last;
        let mut prevbelow = last.y >= cy;
        for &point in &self.points {
            let below = point.y >= cy;
            if prevbelow != below {
                if (point.x - cx) * (prevpoint.x - cx) > 0.0 {
                    if point.x >= cx {
                        inside = !inside;
                    }
                } else {
                    let num = (point.y - cy) * (prevpoint.x - point.x);
                    let den = prevpoint.y - point.y;
                    if num == den * (point.x - cx) {
                        return false;
                    }
                    if num / den <= point.x - cx {
                        inside = !inside;
                    }
                }
            }
            prevpoint = point;
            prevbelow = below;
        }
        inside
    }
}

/// 点集的凸包，逆时针排列
///
/// 从最低点出发做礼品包装，O(n²)。少于3个点时原样返回。
pub fn convex_hull(points: &[Coordinate]) -> Vec<Coordinate> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut worklist = points.to_vec();
    let mut result = Vec::new();

    let mut imin = 0;
    for (i, p) in worklist.iter().enumerate().skip(1) {
        if p.y < worklist[imin].y {
            imin = i;
        }
    }

    let startpoint = worklist[imin];
    result.push(startpoint);
    let mut apoint = startpoint;
    let mut aangle = 0.0;

    while !worklist.is_empty() {
        let mut best: Option<(usize, f64)> = None;
        for (i, p) in worklist.iter().enumerate() {
            if *p == apoint {
                continue;
            }
            let v = p - apoint;
            let mut angle = v.y.atan2(v.x);
            while angle < aangle {
                angle += 2.0 * PI;
            }
            if best.map_or(true, |(_, min)| angle < min) {
                best = Some((i, angle));
            }
        }

        // 所有点重合
        let Some((besti, anglemin)) = best else {
            return result;
        };
        apoint = worklist[besti];
        aangle = anglemin;
        if apoint == startpoint {
            return result;
        }
        result.push(apoint);
        worklist.remove(besti);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PolygonData {
        PolygonData::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 1.0),
        ])
    }

    #[test]
    fn test_polygon_basic_properties() {
        let sq = square();
        assert_eq!(sq.npoints(), 4);
        assert!((sq.perimeter() - 4.0).abs() < 1e-12);
        assert!((sq.surface().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(sq.winding_number(), 1);
        assert!(sq.is_counterclockwise());
        assert!(sq.is_convex());
        assert!((sq.center_of_mass.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clockwise_winding() {
        let mut pts = square().points;
        pts.reverse();
        let sq = PolygonData::new(pts);
        assert_eq!(sq.winding_number(), -1);
        assert!(!sq.is_counterclockwise());
    }

    #[test]
    fn test_self_intersecting_has_no_surface() {
        // 五角星的环绕数为2
        let pts = (0..5)
            .map(|i| {
                let a = 2.0 * PI * (2 * i) as f64 / 5.0;
                Coordinate::new(a.cos(), a.sin())
            })
            .collect();
        let star = PolygonData::new(pts);
        assert_eq!(star.winding_number().abs(), 2);
        assert!(star.surface().is_none());
    }

    #[test]
    fn test_point_in_polygon() {
        let sq = square();
        assert!(sq.is_in_polygon(&Coordinate::new(0.5, 0.5)));
        assert!(!sq.is_in_polygon(&Coordinate::new(1.5, 0.5)));
    }

    #[test]
    fn test_convex_hull() {
        let pts = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 0.0),
            Coordinate::new(1.0, 0.5),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(0.0, 2.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Coordinate::new(1.0, 0.5)));
        assert!(PolygonData::new(hull).is_counterclockwise());
    }

    #[test]
    fn test_line_equation() {
        let l = LineData::new(Coordinate::new(0.0, 1.0), Coordinate::new(1.0, 1.0));
        let (a, b, c) = l.equation();
        // y = 1  =>  0·x + 1·y - 1 = 0
        assert_eq!(a, 0.0);
        assert!((c / b + 1.0).abs() < 1e-12);
    }
}
