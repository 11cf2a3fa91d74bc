//! 三次曲线数值计算
//!
//! 三次曲线用齐次多项式的10个系数表示，顺序为
//! 1, x, y, x², xy, y², x³, x²y, xy², y³。

use crate::geometry::LineData;
use crate::math::{invalid_coord, Coordinate, Vector2};
use crate::numerics::{calc_cubic_root, cubic_variations, solve_homogeneous, RootParams};
use crate::transform::Transformation;
use serde::{Deserialize, Serialize};

/// 三次曲线系数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicCartesianData {
    pub coeffs: [f64; 10],
}

impl CubicCartesianData {
    /// 创建并以最大系数绝对值归一化
    pub fn new(coeffs: [f64; 10]) -> Self {
        let mut ret = Self { coeffs };
        ret.normalize();
        ret
    }

    pub fn normalize(&mut self) {
        let norm = self.coeffs.iter().map(|c| c.abs()).fold(0.0, f64::max);
        if norm < 1e-8 {
            return;
        }
        for c in self.coeffs.iter_mut() {
            *c /= norm;
        }
    }

    pub fn valid(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_finite())
    }

    /// 多项式值及其梯度 (f, fx, fy)
    pub fn eval_with_gradient(&self, p: &Coordinate) -> (f64, f64, f64) {
        let [a000, a001, a002, a011, a012, a022, a111, a112, a122, a222] = self.coeffs;
        let (x, y) = (p.x, p.y);
        let f = a000
            + a001 * x
            + a002 * y
            + a011 * x * x
            + a012 * x * y
            + a022 * y * y
            + a111 * x * x * x
            + a112 * x * x * y
            + a122 * x * y * y
            + a222 * y * y * y;
        let fx = a001 + 2.0 * a011 * x + a012 * y + 3.0 * a111 * x * x + 2.0 * a112 * x * y + a122 * y * y;
        let fy = a002 + a012 * x + 2.0 * a022 * y + a112 * x * x + 2.0 * a122 * x * y + 3.0 * a222 * y * y;
        (f, fx, fy)
    }

    /// 点是否在曲线上：|f| / (|fx| + |fy|) 不超过阈值
    pub fn contains_point(&self, p: &Coordinate, threshold: f64) -> bool {
        let (f, fx, fy) = self.eval_with_gradient(p);
        f.abs() / (fx.abs() + fy.abs()) <= threshold
    }

    /// 竖直线 x 与曲线的第 `root` 个交点的 y 值
    pub fn y_value(&self, x: f64, root: usize, params: RootParams) -> Option<f64> {
        let [a000, a001, a002, a011, a012, a022, a111, a112, a122, a222] = self.coeffs;
        let a = a222;
        let b = a122 * x + a022;
        let c = a112 * x * x + a012 * x + a002;
        let d = a111 * x * x * x + a011 * x * x + a001 * x + a000;
        calc_cubic_root(f64::NEG_INFINITY, f64::INFINITY, a, b, c, d, root, params)
    }

    /// 参数 t ∈ [0,1] 对应的点
    ///
    /// t 的三等分决定取竖直线上的第几个交点，余下部分映射到整条 x 轴。
    pub fn point_at(&self, t: f64, params: RootParams) -> Coordinate {
        let mut p = t * 3.0;
        let root = p.floor().clamp(0.0, 2.0) as usize;
        p -= root as f64;
        if p <= 0.0 {
            p = 1e-6;
        }
        if p >= 1.0 {
            p = 1.0 - 1e-6;
        }
        let p = 2.0 * p - 1.0;
        let x = if p > 0.0 { p / (1.0 - p) } else { p / (1.0 + p) };

        match self.y_value(x, root + 1, params) {
            Some(y) if y.is_finite() => Coordinate::new(x, y),
            _ => invalid_coord(),
        }
    }

    /// 点在曲线上的投影参数
    ///
    /// 先沿梯度方向把点投影到曲线上，再在三条分支中选y最接近的一支。
    pub fn param_of(&self, p: &Coordinate, params: RootParams, bound: f64) -> f64 {
        let (mut x, mut y) = (p.x, p.y);
        let (f, fx, fy) = self.eval_with_gradient(p);
        if f != 0.0 {
            let mut v = Vector2::new(fx, fy);
            // 指向远离交点的方向
            if f < 0.0 {
                v = -v;
            }
            let (mut a, mut b, mut c, mut d) = calc_cubic_line_restriction(self, p, &v);
            if a < 0.0 {
                a = -a;
                b = -b;
                c = -c;
                d = -d;
            }
            // 取 0 左侧最近的根，即离 p 最近且在梯度反方向上的交点
            let variations = cubic_variations(0.0, a, b, c, d);
            if let Some(lambda) = calc_cubic_root(-bound, bound, a, b, c, d, variations, params) {
                let pnew = p + v * lambda;
                if crate::math::coord_valid(&pnew) {
                    x = pnew.x;
                    y = pnew.y;
                }
            }
        }

        let mut t = if x > 0.0 { x / (1.0 + x) } else { x / (1.0 - x) };
        t = 0.5 * (t + 1.0);
        t /= 3.0;

        let mut mint = t;
        let mut mindist = f64::INFINITY;
        for k in 0..3 {
            let tk = t + k as f64 / 3.0;
            let pk = self.point_at(tk, params);
            if crate::math::coord_valid(&pk) && (y - pk.y).abs() < mindist {
                mint = tk;
                mindist = (y - pk.y).abs();
            }
        }
        mint
    }
}

/// 补足方程个数时追加的约束行
#[derive(Debug, Clone, Copy)]
enum Padding {
    /// 第 i 个系数为零
    Zero(usize),
    /// x²y 与 xy² 的系数相等
    SymmetricMixed,
}

const THROUGH_POINTS_PADDING: [Padding; 7] = [
    Padding::SymmetricMixed,
    Padding::Zero(7),
    Padding::Zero(9),
    Padding::Zero(4),
    Padding::Zero(5),
    Padding::Zero(3),
    Padding::Zero(1),
];

const CUSP_PADDING: [Padding; 9] = [
    Padding::Zero(0),
    Padding::Zero(1),
    Padding::Zero(2),
    Padding::Zero(3),
    Padding::Zero(4),
    Padding::SymmetricMixed,
    Padding::Zero(7),
    Padding::Zero(9),
    Padding::Zero(6),
];

const NODE_PADDING: [Padding; 9] = [
    Padding::Zero(0),
    Padding::Zero(1),
    Padding::Zero(2),
    Padding::SymmetricMixed,
    Padding::Zero(7),
    Padding::Zero(9),
    Padding::Zero(4),
    Padding::Zero(5),
    Padding::Zero(3),
];

fn solve_cubic_with_padding(points: &[Coordinate], padding: &[Padding]) -> Option<CubicCartesianData> {
    if points.is_empty() || points.len() > 9 {
        return None;
    }
    let mut matrix: Vec<Vec<f64>> = points
        .iter()
        .map(|p| {
            let (x, y) = (p.x, p.y);
            vec![1.0, x, y, x * x, x * y, y * y, x * x * x, x * x * y, x * y * y, y * y * y]
        })
        .collect();

    for pad in padding {
        if matrix.len() >= 9 {
            break;
        }
        let mut row = vec![0.0; 10];
        match *pad {
            Padding::Zero(i) => row[i] = 1.0,
            Padding::SymmetricMixed => {
                row[7] = 1.0;
                row[8] = -1.0;
            }
        }
        matrix.push(row);
    }

    let s = solve_homogeneous(matrix)?;
    let mut coeffs = [0.0; 10];
    coeffs.copy_from_slice(&s[..10]);
    let ret = CubicCartesianData::new(coeffs);
    ret.valid().then_some(ret)
}

/// 过不超过9个点的三次曲线
pub fn calc_cubic_through_points(points: &[Coordinate]) -> Option<CubicCartesianData> {
    solve_cubic_with_padding(points, &THROUGH_POINTS_PADDING)
}

/// 以原点为尖点、过不超过4个点的三次曲线
pub fn calc_cubic_cusp_through_points(points: &[Coordinate]) -> Option<CubicCartesianData> {
    solve_cubic_with_padding(points, &CUSP_PADDING)
}

/// 以原点为结点、过不超过6个点的三次曲线
pub fn calc_cubic_node_through_points(points: &[Coordinate]) -> Option<CubicCartesianData> {
    solve_cubic_with_padding(points, &NODE_PADDING)
}

/// 三次曲线限制在直线 p + t·v 上得到的多项式 a·t³ + b·t² + c·t + d
pub fn calc_cubic_line_restriction(
    data: &CubicCartesianData,
    p: &Coordinate,
    v: &Vector2,
) -> (f64, f64, f64, f64) {
    let [a000, a001, a002, a011, a012, a022, a111, a112, a122, a222] = data.coeffs;
    let (mut a, mut b, mut c, mut d) = (0.0, 0.0, 0.0, 0.0);

    d += a000;

    d += a001 * p.x + a002 * p.y;
    c += a001 * v.x + a002 * v.y;

    d += a011 * p.x * p.x + a012 * p.x * p.y + a022 * p.y * p.y;
    c += 2.0 * a011 * p.x * v.x + a012 * (p.x * v.y + v.x * p.y) + 2.0 * a022 * p.y * v.y;
    b += a011 * v.x * v.x + a012 * v.x * v.y + a022 * v.y * v.y;

    d += a111 * p.x * p.x * p.x + a222 * p.y * p.y * p.y;
    c += 3.0 * (a111 * p.x * p.x * v.x + a222 * p.y * p.y * v.y);
    b += 3.0 * (a111 * p.x * v.x * v.x + a222 * p.y * v.y * v.y);
    a += a111 * v.x * v.x * v.x + a222 * v.y * v.y * v.y;

    d += a112 * p.x * p.x * p.y + a122 * p.x * p.y * p.y;
    c += a112 * (p.x * p.x * v.y + 2.0 * p.x * v.x * p.y) + a122 * (v.x * p.y * p.y + 2.0 * p.x * p.y * v.y);
    b += a112 * (v.x * v.x * p.y + 2.0 * v.x * p.x * v.y) + a122 * (p.x * v.y * v.y + 2.0 * v.x * v.y * p.y);
    a += a112 * v.x * v.x * v.y + a122 * v.x * v.y * v.y;

    (a, b, c, d)
}

/// 三次曲线与直线的第 `root` 个交点（1..3，按直线参数升序）
pub fn calc_cubic_line_intersect(
    cu: &CubicCartesianData,
    l: &LineData,
    root: usize,
    params: RootParams,
    bound: f64,
) -> Option<Coordinate> {
    if !(1..=3).contains(&root) {
        return None;
    }
    let (a, b, c, d) = calc_cubic_line_restriction(cu, &l.a, &l.dir());
    let param = calc_cubic_root(-bound, bound, a, b, c, d, root, params)?;
    let p = l.a + l.dir() * param;
    crate::math::coord_valid(&p).then_some(p)
}

/// 三次曲线在射影变换下的像
///
/// 系数展开成对称三阶张量后按逆变换做合同变换。
pub fn calc_cubic_transformation(
    data: &CubicCartesianData,
    t: &Transformation,
) -> Option<CubicCartesianData> {
    let mut a = [[[0.0; 3]; 3]; 3];
    let mut icount = 0;
    for i in 0..3 {
        for j in i..3 {
            for k in j..3 {
                let mut v = data.coeffs[icount];
                icount += 1;
                if i < k {
                    if i == j || j == k {
                        v /= 3.0;
                    } else {
                        v /= 6.0;
                    }
                }
                // 对称张量的所有排列
                for (x, y, z) in [(i, j, k), (i, k, j), (j, i, k), (j, k, i), (k, i, j), (k, j, i)] {
                    a[x][y][z] = v;
                }
            }
        }
    }

    let ti = t.inverse()?;

    let mut b = [[[0.0; 3]; 3]; 3];
    for (i, bi) in b.iter_mut().enumerate() {
        for (j, bij) in bi.iter_mut().enumerate() {
            for (k, bijk) in bij.iter_mut().enumerate() {
                let mut sum = 0.0;
                for (ii, aii) in a.iter().enumerate() {
                    for (jj, aiijj) in aii.iter().enumerate() {
                        for (kk, v) in aiijj.iter().enumerate() {
                            sum += v * ti.data(ii, i) * ti.data(jj, j) * ti.data(kk, k);
                        }
                    }
                }
                *bijk = sum;
            }
        }
    }

    let coeffs = [
        b[0][0][0],
        b[0][0][1] + b[0][1][0] + b[1][0][0],
        b[0][0][2] + b[0][2][0] + b[2][0][0],
        b[0][1][1] + b[1][0][1] + b[1][1][0],
        b[0][1][2] + b[0][2][1] + b[1][2][0] + b[1][0][2] + b[2][1][0] + b[2][0][1],
        b[0][2][2] + b[2][0][2] + b[2][2][0],
        b[1][1][1],
        b[1][1][2] + b[1][2][1] + b[2][1][1],
        b[1][2][2] + b[2][1][2] + b[2][2][1],
        b[2][2][2],
    ];
    let ret = CubicCartesianData::new(coeffs);
    ret.valid().then_some(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// y = x³ 即 x³ - y = 0
    fn simple_cubic() -> CubicCartesianData {
        CubicCartesianData::new([0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0])
    }

    #[test]
    fn test_contains_and_point_at() {
        let cu = simple_cubic();
        assert!(cu.contains_point(&Coordinate::new(2.0, 8.0), 1e-9));
        assert!(!cu.contains_point(&Coordinate::new(2.0, 7.0), 1e-6));
        // y³ 系数为零，竖直线上只有一个交点，落在第一段参数
        let p = cu.point_at(0.25, RootParams::default());
        assert!(crate::math::coord_valid(&p));
        assert!((p.y - p.x.powi(3)).abs() < 1e-6);
    }

    #[test]
    fn test_line_intersections() {
        let cu = simple_cubic();
        // y = x 与 y = x³ 交于 -1, 0, 1
        let l = LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0));
        let xs: Vec<f64> = (1..=3)
            .map(|r| calc_cubic_line_intersect(&cu, &l, r, RootParams::default(), 1e10).unwrap().x)
            .collect();
        assert!((xs[0] + 1.0).abs() < 1e-6);
        assert!(xs[1].abs() < 1e-6);
        assert!((xs[2] - 1.0).abs() < 1e-6);
        assert!(calc_cubic_line_intersect(&cu, &l, 4, RootParams::default(), 1e10).is_none());
    }

    #[test]
    fn test_cubic_through_nine_points() {
        let pts = [
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, -0.5),
            Coordinate::new(-1.0, 0.3),
            Coordinate::new(2.0, 1.7),
            Coordinate::new(-1.5, -2.0),
            Coordinate::new(0.7, 2.2),
            Coordinate::new(-0.4, -1.1),
            Coordinate::new(1.3, 0.9),
            Coordinate::new(-2.1, 1.4),
        ];
        let cu = calc_cubic_through_points(&pts).unwrap();
        for p in &pts {
            assert!(cu.contains_point(p, 1e-6));
        }
    }

    #[test]
    fn test_node_passes_through_origin() {
        let pts = [
            Coordinate::new(1.0, 0.5),
            Coordinate::new(-1.0, 2.0),
            Coordinate::new(2.0, -1.0),
            Coordinate::new(0.5, 3.0),
            Coordinate::new(-2.0, -0.5),
            Coordinate::new(1.5, 1.5),
        ];
        let cu = calc_cubic_node_through_points(&pts).unwrap();
        // 常数项和一次项都为零
        assert!(cu.coeffs[0].abs() < 1e-9);
        assert!(cu.coeffs[1].abs() < 1e-9);
        assert!(cu.coeffs[2].abs() < 1e-9);
    }

    #[test]
    fn test_cubic_transformation() {
        let cu = simple_cubic();
        let t = Transformation::translation(&Vector2::new(1.0, 2.0));
        let moved = calc_cubic_transformation(&cu, &t).unwrap();
        assert!(moved.contains_point(&Coordinate::new(3.0, 10.0), 1e-9));
    }
}
