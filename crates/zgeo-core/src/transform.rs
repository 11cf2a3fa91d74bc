//! 射影变换
//!
//! 变换以 3×3 齐次矩阵表示，齐次坐标放在第0位：点 (x, y) 对应 [1, x, y]。
//! 同时记录变换是否为位似（保持圆）以及是否为仿射（不把有限点送到无穷远）。

use crate::geometry::LineData;
use crate::math::{invalid_coord, Coordinate, Matrix3, Vector2, Vector3};
use crate::numerics::solve_homogeneous;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// 平面射影变换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    data: Matrix3<f64>,
    is_homothety: bool,
    is_affine: bool,
}

impl Transformation {
    fn from_matrix(data: Matrix3<f64>, is_homothety: bool, is_affine: bool) -> Self {
        Self {
            data,
            is_homothety,
            is_affine,
        }
    }

    /// 恒等变换
    pub fn identity() -> Self {
        Self::from_matrix(Matrix3::identity(), true, true)
    }

    /// 平移
    pub fn translation(v: &Vector2) -> Self {
        let mut ret = Self::identity();
        ret.data[(1, 0)] = v.x;
        ret.data[(2, 0)] = v.y;
        ret
    }

    /// 以点为中心的缩放
    pub fn scaling_over_point(factor: f64, center: &Coordinate) -> Self {
        let mut m = Matrix3::from_diagonal(&Vector3::new(1.0, factor, factor));
        m[(1, 0)] = center.x - factor * center.x;
        m[(2, 0)] = center.y - factor * center.y;
        Self::from_matrix(m, true, true)
    }

    /// 中心对称
    pub fn point_reflection(center: &Coordinate) -> Self {
        Self::scaling_over_point(-1.0, center)
    }

    /// 沿直线法向的缩放；只有因子为 ±1 时是位似
    pub fn scaling_over_line(factor: f64, line: &LineData) -> Self {
        let mut ret = Self::identity();
        let a = line.a;
        let d = line.dir();
        let dirnormsq = d.norm_squared();
        let m = &mut ret.data;
        m[(1, 1)] = (d.x * d.x + factor * d.y * d.y) / dirnormsq;
        m[(2, 2)] = (d.y * d.y + factor * d.x * d.x) / dirnormsq;
        m[(1, 2)] = (d.x * d.y - factor * d.x * d.y) / dirnormsq;
        m[(2, 1)] = m[(1, 2)];
        m[(1, 0)] = a.x - m[(1, 1)] * a.x - m[(1, 2)] * a.y;
        m[(2, 0)] = a.y - m[(2, 1)] * a.x - m[(2, 2)] * a.y;
        ret.is_homothety = (factor - 1.0).abs() < 1e-8 || (factor + 1.0).abs() < 1e-8;
        ret.is_affine = true;
        ret
    }

    /// 轴对称
    pub fn line_reflection(line: &LineData) -> Self {
        let mut ret = Self::scaling_over_line(-1.0, line);
        ret.is_homothety = true;
        ret
    }

    /// 绕点旋转 alpha 弧度
    pub fn rotation(alpha: f64, center: &Coordinate) -> Self {
        let mut ret = Self::identity();
        let (x, y) = (center.x, center.y);
        let (sin, cos) = alpha.sin_cos();
        let m = &mut ret.data;
        m[(1, 1)] = cos;
        m[(2, 2)] = cos;
        m[(1, 2)] = -sin;
        m[(2, 1)] = sin;
        m[(1, 0)] = x - m[(1, 1)] * x - m[(1, 2)] * y;
        m[(2, 0)] = y - m[(2, 1)] * x - m[(2, 2)] * y;
        ret
    }

    /// 相似变换：绕 center 旋转 theta 并缩放 factor
    pub fn similitude(center: &Coordinate, theta: f64, factor: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        let m = Matrix3::new(
            1.0,
            0.0,
            0.0,
            (1.0 - factor * cos) * center.x + factor * sin * center.y,
            factor * cos,
            -factor * sin,
            -factor * sin * center.x + (1.0 - factor * cos) * center.y,
            factor * sin,
            factor * cos,
        );
        Self::from_matrix(m, true, true)
    }

    /// 调和透射：以 center 为中心、axis 为轴的对合射影变换
    ///
    /// 矩阵为 (r·C)Id − 2(C⊗r)，r 是轴的齐次方程，C = [1, cx, cy]。
    pub fn harmonic_homology(center: &Coordinate, axis: &LineData) -> Self {
        let (pa, pb) = (axis.a, axis.b);
        let a = pa.y - pb.y;
        let b = pb.x - pa.x;
        let c = pa.x * pb.y - pa.y * pb.x;
        let (cx, cy) = (center.x, center.y);
        let scalprod = 0.5 * (a * cx + b * cy + c);
        let m = Matrix3::new(
            c - scalprod,
            a,
            b,
            c * cx,
            a * cx - scalprod,
            b * cx,
            c * cy,
            a * cy,
            b * cy - scalprod,
        );
        Self::from_matrix(m, false, false)
    }

    /// 把三个点分别送到另三个点的仿射变换
    ///
    /// 未知量依次为 m, t1, t2, T11, T12, T21, T22，解 t + T·Pi − m·Qi = 0。
    pub fn affinity_gi3p(from: &[Coordinate], to: &[Coordinate]) -> Option<Self> {
        if from.len() != 3 || to.len() != 3 {
            return None;
        }
        let mut matrix = vec![vec![0.0; 7]; 6];
        for i in 0..3 {
            let (p, q) = (from[i], to[i]);
            matrix[i][0] = -q.x;
            matrix[i][1] = 1.0;
            matrix[i][3] = p.x;
            matrix[i][4] = p.y;
            matrix[i + 3][0] = -q.y;
            matrix[i + 3][2] = 1.0;
            matrix[i + 3][5] = p.x;
            matrix[i + 3][6] = p.y;
        }
        let s = solve_homogeneous(matrix)?;
        let m = Matrix3::new(s[0], 0.0, 0.0, s[1], s[3], s[4], s[2], s[5], s[6]);
        Some(Self::from_matrix(m, false, true))
    }

    /// 把四个点分别送到另四个点的射影变换
    pub fn projectivity_gi4p(from: &[Coordinate], to: &[Coordinate]) -> Option<Self> {
        if from.len() != 4 || to.len() != 4 {
            return None;
        }
        let mut matrix = vec![vec![0.0; 13]; 12];
        for i in 0..4 {
            let (p, q) = (from[i], to[i]);
            matrix[i][0] = 1.0;
            matrix[4 + i][3] = 1.0;
            matrix[8 + i][6] = 1.0;
            matrix[i][1] = p.x;
            matrix[4 + i][4] = p.x;
            matrix[8 + i][7] = p.x;
            matrix[i][2] = p.y;
            matrix[4 + i][5] = p.y;
            matrix[8 + i][8] = p.y;
            matrix[i][9 + i] = -1.0;
            matrix[4 + i][9 + i] = -q.x;
            matrix[8 + i][9 + i] = -q.y;
        }
        // 9 之后的未知量只是比例因子
        let s = solve_homogeneous(matrix)?;
        let m = Matrix3::from_row_slice(&s[..9]);
        Some(Self::from_matrix(m, false, false))
    }

    /// 光源 lightsrc 在以 line 为地平线的平面上投下的影子
    pub fn cast_shadow(lightsrc: &Coordinate, line: &LineData) -> Self {
        // 先找一个把 line 送到 x 轴的反射
        let d = line.dir();
        let a = line.a;
        let mut k = d.norm();
        if d.x < 0.0 {
            k = -k;
        }
        let w = d + Vector2::new(k, 0.0);
        let ra = Coordinate::new(a.x + w.y * a.y / (2.0 * w.x), a.y / 2.0);
        let sym = Self::line_reflection(&LineData::new(ra, ra + w));

        let modlightsrc = sym.apply(lightsrc);
        // 光源到画面的距离，取负表示光源在画面之后
        let t = -1.0;
        let e = modlightsrc.y - t;
        let mut ret = Self::identity();
        ret.data[(0, 0)] = e;
        ret.data[(0, 2)] = -1.0;
        ret.data[(1, 1)] = e;
        ret.data[(1, 2)] = -modlightsrc.x;
        ret.data[(2, 2)] = -t;
        ret.is_homothety = false;
        ret.is_affine = false;
        sym * ret * sym
    }

    /// 射影平面内绕无穷远点的旋转，方向 d（单位向量），经过点 t
    pub fn projective_rotation(alpha: f64, d: &Vector2, t: &Coordinate) -> Self {
        let (sin, cos) = alpha.sin_cos();
        let m = Matrix3::new(
            cos,
            -sin * d.x,
            -sin * d.y,
            sin * d.x,
            cos * d.x * d.x + d.y * d.y,
            cos * d.x * d.y - d.x * d.y,
            sin * d.y,
            cos * d.x * d.y - d.x * d.y,
            cos * d.y * d.y + d.x * d.x,
        );
        let ret = Self::from_matrix(m, false, false);
        Self::translation(&t.coords) * ret * Self::translation(&-t.coords)
    }

    fn apply_hom(&self, x0: f64, x1: f64, x2: f64) -> Coordinate {
        let r = self.data * Vector3::new(x0, x1, x2);
        if r[0] == 0.0 {
            return invalid_coord();
        }
        Coordinate::new(r[1] / r[0], r[2] / r[0])
    }

    /// 变换一个点；送到无穷远时返回无效坐标
    pub fn apply(&self, p: &Coordinate) -> Coordinate {
        self.apply_hom(1.0, p.x, p.y)
    }

    /// 变换一个方向（无穷远点）
    pub fn apply0(&self, v: &Vector2) -> Coordinate {
        self.apply_hom(0.0, v.x, v.y)
    }

    /// 只作用于线性部分
    pub fn apply_2by2_only(&self, v: &Vector2) -> Vector2 {
        let m = &self.data;
        Vector2::new(
            m[(1, 1)] * v.x + m[(1, 2)] * v.y,
            m[(2, 1)] * v.x + m[(2, 2)] * v.y,
        )
    }

    /// 变换长度；只对位似有意义
    pub fn apply_length(&self, length: f64) -> Option<f64> {
        if !self.is_homothety {
            return None;
        }
        Some(self.affine_determinant().abs().sqrt() * length)
    }

    /// 逆变换；奇异时返回 `None`
    pub fn inverse(&self) -> Option<Self> {
        let inv = self.data.try_inverse()?;
        Some(Self::from_matrix(inv, self.is_homothety, self.is_affine))
    }

    /// 在临界线两侧取值异号；仿射变换始终同号
    pub fn projective_indicator(&self, c: &Coordinate) -> f64 {
        self.data[(0, 0)] + self.data[(0, 1)] * c.x + self.data[(0, 2)] * c.y
    }

    pub fn affine_determinant(&self) -> f64 {
        let m = &self.data;
        m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)]
    }

    pub fn rotation_angle(&self) -> f64 {
        self.data[(1, 2)].atan2(self.data[(1, 1)])
    }

    #[inline]
    pub fn data(&self, r: usize, c: usize) -> f64 {
        self.data[(r, c)]
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.data
    }

    pub fn is_homothetic(&self) -> bool {
        self.is_homothety
    }

    pub fn is_affine(&self) -> bool {
        self.is_affine
    }
}

impl Mul for Transformation {
    type Output = Transformation;

    fn mul(self, rhs: Transformation) -> Transformation {
        Transformation::from_matrix(
            self.data * rhs.data,
            self.is_homothety && rhs.is_homothety,
            self.is_affine && rhs.is_affine,
        )
    }
}
