//! 曲线操作：点是否在曲线上、参数与点的互相转换
//!
//! 参数统一取在 [0,1] 上，约束点把参数存为常量父节点。

use super::ObjectImp;
use crate::config::EngineConfig;
use crate::geometry::LineData;
use crate::math::{invalid_coord, is_on_line, is_on_ray, is_on_segment, Coordinate};
use crate::numerics::RootParams;
use std::f64::consts::PI;

impl ObjectImp {
    /// 点 p 是否在曲线上；非曲线值总是返回 `false`
    pub fn contains_point(&self, p: &Coordinate, cfg: &EngineConfig) -> bool {
        let tol = cfg.contains_tolerance;
        match self {
            ObjectImp::Segment(l) => is_on_segment(p, &l.a, &l.b, tol),
            ObjectImp::Ray(l) => is_on_ray(p, &l.a, &l.b, tol),
            ObjectImp::Line(l) => is_on_line(p, &l.a, &l.b, tol),
            ObjectImp::Circle(c) => ((p - c.center).norm() - c.radius.abs()).abs() <= tol,
            ObjectImp::Conic(c) => c.polar.contains_point(p, tol),
            ObjectImp::Cubic(c) => c.contains_point(p, tol),
            _ => false,
        }
    }

    /// 曲线上离 p 最近的点对应的参数
    pub fn get_param(&self, p: &Coordinate, cfg: &EngineConfig) -> f64 {
        match self {
            ObjectImp::Segment(l) => projection(l, p).clamp(0.0, 1.0),
            ObjectImp::Ray(l) => {
                let s = projection(l, p).max(0.0);
                1.0 / (s + 1.0)
            }
            ObjectImp::Line(l) => {
                let x = projection(l, p);
                (x / (1.0 + x.abs()) + 1.0) / 2.0
            }
            ObjectImp::Circle(c) => {
                let d = p - c.center;
                let mut param = d.y.atan2(d.x) / (2.0 * PI);
                if param <= 0.0 {
                    param += 1.0;
                }
                param
            }
            ObjectImp::Conic(c) => c.polar.param_of(p),
            ObjectImp::Cubic(c) => c.param_of(p, RootParams::from(cfg), cfg.cubic_root_bound),
            _ => 0.0,
        }
    }

    /// 参数 t 对应的曲线上的点；非曲线值得到无效坐标
    pub fn get_point(&self, t: f64, cfg: &EngineConfig) -> Coordinate {
        match self {
            ObjectImp::Segment(l) => l.a + l.dir() * t.clamp(0.0, 1.0),
            ObjectImp::Ray(l) => {
                let t = t.clamp(1e-6, 1.0);
                l.a + l.dir() * (1.0 / t - 1.0)
            }
            ObjectImp::Line(l) => {
                let p = 2.0 * t.clamp(1e-6, 1.0 - 1e-6) - 1.0;
                let x = if p > 0.0 { p / (1.0 - p) } else { p / (1.0 + p) };
                l.a + l.dir() * x
            }
            ObjectImp::Circle(c) => {
                let (s, co) = (2.0 * PI * t).sin_cos();
                c.center + crate::math::Vector2::new(co, s) * c.radius
            }
            ObjectImp::Conic(c) => c.polar.point_at(t),
            ObjectImp::Cubic(c) => c.point_at(t, RootParams::from(cfg)),
            _ => invalid_coord(),
        }
    }
}

/// p 在直线上的投影参数，以 a 为 0、b 为 1
fn projection(l: &LineData, p: &Coordinate) -> f64 {
    let dir = l.dir();
    let len_sq = dir.norm_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    (p - l.a).dot(&dir) / len_sq
}
