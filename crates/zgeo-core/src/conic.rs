//! 圆锥曲线数值计算
//!
//! 圆锥曲线有两种表示：
//! - 直角坐标方程 a·x² + b·y² + c·xy + d·x + e·y + f = 0 ([`ConicCartesianData`])
//! - 以第一焦点为极点的极坐标方程 ρ = p / (1 − e·cos(θ − θ0)) ([`ConicPolarData`])
//!
//! 两种表示可以互相转换，各构造算法选用方便的一种。

use crate::geometry::LineData;
use crate::math::{invalid_coord, Coordinate, Vector2};
use crate::numerics::solve_homogeneous;
use crate::transform::Transformation;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 拟合圆锥曲线时补足方程个数的线性约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearConstraint {
    /// 无xy项
    ZeroTilt,
    /// 无xy项时退化为抛物线
    ParabolaIfZeroTilt,
    /// 无xy项时退化为圆
    CircleIfZeroTilt,
    /// 等轴双曲线
    Equilateral,
    /// 关于y轴对称
    YSymmetry,
    /// 关于x轴对称
    XSymmetry,
}

/// 圆锥曲线的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConicKind {
    Ellipse,
    Parabola,
    Hyperbola,
}

impl ConicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConicKind::Ellipse => "Ellipse",
            ConicKind::Parabola => "Parabola",
            ConicKind::Hyperbola => "Hyperbola",
        }
    }
}

/// 直角坐标方程系数 [a, b, c, d, e, f]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicCartesianData {
    pub coeffs: [f64; 6],
}

/// 极坐标数据
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicPolarData {
    /// 第一焦点
    pub focus1: Coordinate,
    /// 半通径 p
    pub pdimen: f64,
    /// e·cos θ0
    pub ecostheta0: f64,
    /// e·sin θ0
    pub esintheta0: f64,
}

impl ConicCartesianData {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self {
            coeffs: [a, b, c, d, e, f],
        }
    }

    pub fn valid(&self) -> bool {
        self.coeffs.iter().all(|c| c.is_finite())
    }

    /// 方程在点 p 处的值
    pub fn eval(&self, p: &Coordinate) -> f64 {
        let [a, b, c, d, e, f] = self.coeffs;
        a * p.x * p.x + b * p.y * p.y + c * p.x * p.y + d * p.x + e * p.y + f
    }

    pub fn from_polar(polar: &ConicPolarData) -> Self {
        let ec = polar.ecostheta0;
        let es = polar.esintheta0;
        let p = polar.pdimen;
        let fx = polar.focus1.x;
        let fy = polar.focus1.y;

        let a = 1.0 - ec * ec;
        let b = 1.0 - es * es;
        let c = -2.0 * ec * es;
        let mut d = -2.0 * p * ec;
        let mut e = -2.0 * p * es;
        let mut f = -p * p;

        f += a * fx * fx + b * fy * fy + c * fx * fy - d * fx - e * fy;
        d -= 2.0 * a * fx + c * fy;
        e -= 2.0 * b * fy + c * fx;

        Self::new(a, b, c, d, e, f)
    }
}

impl ConicPolarData {
    pub fn new(focus1: Coordinate, pdimen: f64, ecostheta0: f64, esintheta0: f64) -> Self {
        Self {
            focus1,
            pdimen,
            ecostheta0,
            esintheta0,
        }
    }

    pub fn valid(&self) -> bool {
        crate::math::coord_valid(&self.focus1)
            && self.pdimen.is_finite()
            && self.ecostheta0.is_finite()
            && self.esintheta0.is_finite()
    }

    pub fn from_cartesian(cart: &ConicCartesianData) -> Self {
        let [a, b, c, d, e, f] = cart.coeffs;

        let mut theta = c.atan2(b - a) / 2.0;
        let (mut sintheta, mut costheta) = theta.sin_cos();
        let rot_a = |s: f64, co: f64| a * co * co + b * s * s - c * s * co;
        let rot_b = |s: f64, co: f64| a * s * s + b * co * co + c * s * co;
        let mut aa = rot_a(sintheta, costheta);
        let mut bb = rot_b(sintheta, costheta);

        let flip = if aa * bb < 0.0 {
            // 双曲线需要检查朝向
            let dd = d * costheta - e * sintheta;
            let ee = d * sintheta + e * costheta;
            let xc = -dd / (2.0 * aa);
            let yc = -ee / (2.0 * bb);
            let ff = f + aa * xc * xc + bb * yc * yc + dd * xc + ee * yc;
            ff * aa > 0.0
        } else {
            bb.abs() < aa.abs()
        };
        if flip {
            if theta > 0.0 {
                theta -= PI / 2.0;
            } else {
                theta += PI / 2.0;
            }
            (sintheta, costheta) = theta.sin_cos();
            aa = rot_a(sintheta, costheta);
            bb = rot_b(sintheta, costheta);
        }

        let dd = d * costheta - e * sintheta;
        let ee = d * sintheta + e * costheta;

        // 以 b 归一化
        let a = aa / bb;
        let d = dd / bb;
        let e = ee / bb;
        let mut f = f / bb;

        let yf = -e / 2.0;
        f += yf * yf + e * yf;

        let eccentricity = (1.0 - a).max(0.0).sqrt();

        let mut sqrtdiscrim = (d * d - 4.0 * a * f).sqrt();
        if d < 0.0 {
            sqrtdiscrim = -sqrtdiscrim;
        }
        let xf = (4.0 * a * f - 4.0 * f - d * d) / (d + eccentricity * sqrtdiscrim) / 2.0;

        let focus1 = Coordinate::new(
            xf * costheta + yf * sintheta,
            -xf * sintheta + yf * costheta,
        );

        let mut pdimen = -sqrtdiscrim / 2.0;
        let mut ecostheta0 = eccentricity * costheta;
        let mut esintheta0 = -eccentricity * sintheta;
        if pdimen < 0.0 {
            pdimen = -pdimen;
            ecostheta0 = -ecostheta0;
            esintheta0 = -esintheta0;
        }
        Self::new(focus1, pdimen, ecostheta0, esintheta0)
    }

    #[inline]
    pub fn eccentricity_squared(&self) -> f64 {
        self.ecostheta0 * self.ecostheta0 + self.esintheta0 * self.esintheta0
    }

    /// 按离心率分类，`miss` 为判定抛物线的容差
    pub fn kind(&self, miss: f64) -> ConicKind {
        let esquare = self.eccentricity_squared();
        if esquare < 1.0 - miss {
            ConicKind::Ellipse
        } else if esquare > 1.0 + miss {
            ConicKind::Hyperbola
        } else {
            ConicKind::Parabola
        }
    }

    /// 第二焦点
    pub fn focus2(&self) -> Coordinate {
        let fact = 2.0 * self.pdimen / (1.0 - self.eccentricity_squared());
        self.focus1 + Vector2::new(self.ecostheta0, self.esintheta0) * fact
    }

    /// 参数 t ∈ [0,1) 对应的点
    pub fn point_at(&self, t: f64) -> Coordinate {
        let (sintheta, costheta) = (t * 2.0 * PI).sin_cos();
        let rho = self.pdimen / (1.0 - costheta * self.ecostheta0 - sintheta * self.esintheta0);
        self.focus1 + Vector2::new(costheta, sintheta) * rho
    }

    /// 点 p 在曲线上的投影参数
    pub fn param_of(&self, p: &Coordinate) -> f64 {
        let tmp = p - self.focus1;
        let l = tmp.norm();
        let mut theta = tmp.y.atan2(tmp.x);
        let (sintheta, costheta) = theta.sin_cos();
        let ecm = costheta * self.ecostheta0 + sintheta * self.esintheta0;
        let esm = sintheta * self.ecostheta0 - costheta * self.esintheta0;
        let oneplus = 1.0 + self.eccentricity_squared();
        // 焦半径与法线夹角 a 的 sin(a)·cos(a)
        let fact = esm * (1.0 - ecm) / (oneplus - 2.0 * ecm);
        let rho1 = self.pdimen / (1.0 - ecm);
        let rho2 = -self.pdimen / (1.0 + ecm);
        if (rho1 - l).abs() < (rho2 - l).abs() {
            theta += (rho1 - l) * fact / rho1;
            (theta / (2.0 * PI) + 1.0).rem_euclid(1.0)
        } else {
            theta += (rho2 - l) * fact / rho2;
            (theta / (2.0 * PI) + 0.5).rem_euclid(1.0)
        }
    }

    /// 点是否在曲线上，阈值相对于曲线尺寸
    pub fn contains_point(&self, p: &Coordinate, tolerance: f64) -> bool {
        self.internal_contains_point(p, tolerance * self.pdimen)
    }

    fn internal_contains_point(&self, p: &Coordinate, threshold: f64) -> bool {
        let pos = p - self.focus1;
        let len = pos.norm();
        let costheta = pos.x / len;
        let sintheta = pos.y / len;

        let ecm = costheta * self.ecostheta0 + sintheta * self.esintheta0;
        let oneplus = 1.0 + self.eccentricity_squared();

        // 乘上焦半径与法线夹角的余弦得到真实距离
        let rho = self.pdimen / (1.0 - ecm);
        let fact = (1.0 - ecm) / (oneplus - 2.0 * ecm).sqrt();
        if ((len - rho) * fact).abs() <= threshold {
            return true;
        }
        let rho = -self.pdimen / (1.0 + ecm);
        let fact = (1.0 + ecm) / (oneplus + 2.0 * ecm).sqrt();
        ((len - rho) * fact).abs() <= threshold
    }
}

/// 过不超过5个点的圆锥曲线，点数不足时依次追加约束
pub fn calc_conic_through_points(
    points: &[Coordinate],
    constraints: &[LinearConstraint],
) -> Option<ConicCartesianData> {
    if points.is_empty() || points.len() > 5 {
        return None;
    }
    let mut matrix: Vec<Vec<f64>> = points
        .iter()
        .map(|p| vec![p.x * p.x, p.y * p.y, p.x * p.y, p.x, p.y, 1.0])
        .collect();

    for constraint in constraints {
        if matrix.len() >= 5 {
            break;
        }
        let mut row = vec![0.0; 6];
        match constraint {
            LinearConstraint::ZeroTilt => row[2] = 1.0,
            LinearConstraint::ParabolaIfZeroTilt => row[1] = 1.0,
            LinearConstraint::CircleIfZeroTilt => {
                row[0] = 1.0;
                row[1] = -1.0;
            }
            LinearConstraint::Equilateral => {
                row[0] = 1.0;
                row[1] = 1.0;
            }
            LinearConstraint::YSymmetry => row[3] = 1.0,
            LinearConstraint::XSymmetry => row[4] = 1.0,
        }
        matrix.push(row);
    }

    let s = solve_homogeneous(matrix)?;
    let ret = ConicCartesianData::new(s[0], s[1], s[2], s[3], s[4], s[5]);
    ret.valid().then_some(ret)
}

/// 由两个焦点和可选的曲线上一点确定的椭圆（kind = 1）或双曲线（kind = -1）
///
/// 缺少第三点时椭圆取离心率0.7，双曲线取2.0。
pub fn calc_conic_bffp(args: &[Coordinate], kind: i32) -> Option<ConicPolarData> {
    if args.len() < 2 || args.len() > 3 {
        return None;
    }
    let f1 = args[0];
    let f2 = args[1];
    let f2f1 = f2 - f1;
    let f2f1l = f2f1.norm();
    if f2f1l == 0.0 {
        return None;
    }

    let (eccentricity, dl) = if let Some(d) = args.get(2) {
        let d1 = (d - f1).norm();
        let d2 = (d - f2).norm();
        let dl = (d1 + kind as f64 * d2).abs();
        (f2f1l / dl, dl)
    } else {
        let e = if kind > 0 { 0.7 } else { 2.0 };
        (e, f2f1l / e)
    };

    let rhomax = (dl + f2f1l) / 2.0;
    let ret = ConicPolarData::new(
        if kind == 1 { f1 } else { f2 },
        kind as f64 * (1.0 - eccentricity) * rhomax,
        f2f1.x / f2f1l * eccentricity,
        f2f1.y / f2f1l * eccentricity,
    );
    ret.valid().then_some(ret)
}

/// 由准线、焦点和曲线上一点确定的圆锥曲线
pub fn calc_conic_bdfp(
    directrix: &LineData,
    focus: &Coordinate,
    point: &Coordinate,
) -> Option<ConicPolarData> {
    let ba = directrix.dir();
    let bal = ba.norm();
    if bal == 0.0 {
        return None;
    }
    let pa = point - directrix.a;
    let distpf = (point - focus).norm();
    let distpd = (pa.y * ba.x - pa.x * ba.y) / bal;
    let eccentricity = distpf / distpd;

    let fa = focus - directrix.a;
    let pdimen = (fa.y * ba.x - fa.x * ba.y) / bal * eccentricity;
    let ret = ConicPolarData::new(
        *focus,
        pdimen,
        -ba.y / bal * eccentricity,
        ba.x / bal * eccentricity,
    );
    ret.valid().then_some(ret)
}

/// 点关于圆锥曲线的极线；极线为无穷远直线时返回 `None`
pub fn calc_conic_polar_line(data: &ConicCartesianData, pole: &Coordinate) -> Option<LineData> {
    let (x, y) = (pole.x, pole.y);
    let [a, b, c, d, e, f] = data.coeffs;

    let alpha = 2.0 * a * x + c * y + d;
    let beta = c * x + 2.0 * b * y + e;
    let gamma = d * x + e * y + 2.0 * f;

    let normsq = alpha * alpha + beta * beta;
    if normsq < 1e-10 {
        return None;
    }
    let reta = Coordinate::from(Vector2::new(alpha, beta) * (-gamma / normsq));
    let retb = reta + Vector2::new(-beta, alpha);
    Some(LineData::new(reta, retb))
}

/// 直线关于圆锥曲线的极点；极点在无穷远时返回无效坐标
pub fn calc_conic_polar_point(data: &ConicCartesianData, polar: &LineData) -> Coordinate {
    let (p1, p2) = (polar.a, polar.b);
    let alpha = p2.y - p1.y;
    let beta = p1.x - p2.x;
    let gamma = p1.y * p2.x - p1.x * p2.y;

    let a11 = data.coeffs[0];
    let a22 = data.coeffs[1];
    let a12 = data.coeffs[2] / 2.0;
    let a13 = data.coeffs[3] / 2.0;
    let a23 = data.coeffs[4] / 2.0;
    let a33 = data.coeffs[5];

    // 伴随矩阵
    let a11inv = a22 * a33 - a23 * a23;
    let a22inv = a11 * a33 - a13 * a13;
    let a33inv = a11 * a22 - a12 * a12;
    let a12inv = a23 * a13 - a12 * a33;
    let a23inv = a12 * a13 - a23 * a11;
    let a13inv = a12 * a23 - a13 * a22;

    let x = a11inv * alpha + a12inv * beta + a13inv * gamma;
    let y = a12inv * alpha + a22inv * beta + a23inv * gamma;
    let z = a13inv * alpha + a23inv * beta + a33inv * gamma;

    if z.abs() < 1e-10 {
        return invalid_coord();
    }
    Coordinate::new(x / z, y / z)
}

/// 圆锥曲线与直线交点的选择方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntersectionSide {
    /// 取两根之一，1 或 -1
    Side(i32),
    /// 已知一个交点的直线参数，求另一个
    Other(f64),
}

/// 圆锥曲线与直线的交点；判别式为负时返回 `None`
pub fn calc_conic_line_intersect(
    c: &ConicCartesianData,
    l: &LineData,
    side: IntersectionSide,
) -> Option<Coordinate> {
    let [aa, bb, cc, dd, ee, ff] = c.coeffs;
    let (x, y) = (l.a.x, l.a.y);
    let dir = l.dir();
    let (dx, dy) = (dir.x, dir.y);

    let aaa = aa * dx * dx + bb * dy * dy + cc * dx * dy;
    let bbb = 2.0 * aa * x * dx + 2.0 * bb * y * dy + cc * x * dy + cc * y * dx + dd * dx + ee * dy;
    let ccc = aa * x * x + bb * y * y + cc * x * y + dd * x + ee * y + ff;

    let t = match side {
        IntersectionSide::Other(knownparam) => -bbb / aaa - knownparam,
        IntersectionSide::Side(which) => {
            let discrim = bbb * bbb - 4.0 * aaa * ccc;
            if discrim < 0.0 {
                return None;
            }
            let which = which as f64;
            // 避免相近数相减
            if which * bbb > 0.0 {
                -2.0 * ccc / (bbb + which * discrim.sqrt())
            } else {
                (-bbb + which * discrim.sqrt()) / (2.0 * aaa)
            }
        }
    };
    let p = l.a + dir * t;
    crate::math::coord_valid(&p).then_some(p)
}

/// 圆锥曲线的渐近线，which 取 1 或 -1；非双曲线返回 `None`
pub fn calc_conic_asymptote(data: &ConicCartesianData, which: i32) -> Option<LineData> {
    let [mut a, mut b, mut c, d, e, _] = data.coeffs;

    let normabc = a * a + b * b + c * c;
    let delta = c * c - 4.0 * a * b;
    if delta.abs() < 1e-6 * normabc {
        return None;
    }

    let yc = (2.0 * a * e - c * d) / delta;
    let xc = (2.0 * b * d - c * e) / delta;
    if c < 0.0 {
        c = -c;
        a = -a;
        b = -b;
    }
    if delta < 0.0 {
        return None;
    }

    let sqrtdelta = delta.sqrt();
    let displacement = if which > 0 {
        Vector2::new(-2.0 * b, c + sqrtdelta)
    } else {
        Vector2::new(c + sqrtdelta, -2.0 * a)
    };
    let a = Coordinate::new(xc, yc);
    Some(LineData::new(a, a + displacement))
}

/// 以两条直线为渐近线并过点 p 的双曲线
pub fn calc_conic_by_asymptotes(
    line1: &LineData,
    line2: &LineData,
    p: &Coordinate,
) -> ConicCartesianData {
    let (a1, b1, c1) = line1.equation();
    let (a2, b2, c2) = line2.equation();

    let a = a1 * a2;
    let b = b1 * b2;
    let c = a1 * b2 + a2 * b1;
    let d = a1 * c2 + a2 * c1;
    let e = b1 * c2 + c1 * b2;
    let f = -(a * p.x * p.x + b * p.y * p.y + c * p.x * p.y + d * p.x + e * p.y);

    ConicCartesianData::new(a, b, c, d, e, f)
}

/// 两条圆锥曲线的根轴（公共弦所在直线）
///
/// 先求曲线束中退化成直线对的成员（一个三次方程的根，zeroindex 取 1..3），
/// 再用Householder反射把直线对拆开，which 取 1 或 -1 选择其中一条。
pub fn calc_conic_radical(
    cequation1: &ConicCartesianData,
    cequation2: &ConicCartesianData,
    which: i32,
    zeroindex: i32,
) -> Option<LineData> {
    if !(which == 1 || which == -1) || !(1..=3).contains(&zeroindex) {
        return None;
    }
    let [mut a, mut b, mut c, mut d, mut e, mut f] = cequation1.coeffs;
    let [a2, b2, c2, d2, e2, f2] = cequation2.coeffs;

    // 行列式 det(A1 + λ·A2) 关于 λ 的系数
    let mut df = 4.0 * a * b * f - a * e * e - b * d * d - c * c * f + c * d * e;
    let mut cf = 4.0 * a2 * b * f + 4.0 * a * b2 * f + 4.0 * a * b * f2
        - 2.0 * a * e * e2
        - 2.0 * b * d * d2
        - 2.0 * f * c * c2
        - a2 * e * e
        - b2 * d * d
        - f2 * c * c
        + c2 * d * e
        + c * d2 * e
        + c * d * e2;
    let mut bf = 4.0 * a * b2 * f2 + 4.0 * a2 * b * f2 + 4.0 * a2 * b2 * f
        - 2.0 * a2 * e2 * e
        - 2.0 * b2 * d2 * d
        - 2.0 * f2 * c2 * c
        - a * e2 * e2
        - b * d2 * d2
        - f * c2 * c2
        + c * d2 * e2
        + c2 * d * e2
        + c2 * d2 * e;
    let af = 4.0 * a2 * b2 * f2 - a2 * e2 * e2 - b2 * d2 * d2 - c2 * c2 * f2 + c2 * d2 * e2;

    df /= af;
    cf /= af;
    bf /= af;

    let p1a = 2.0 * bf * bf - 6.0 * cf;
    let p1b = bf * cf - 9.0 * df;
    let mut p0a = cf * p1a * p1a + p1b * (3.0 * p1b - 2.0 * bf * p1a);

    if p0a < 0.0 && p1a < 0.0 {
        return None;
    }

    // 从拐点出发
    let mut lambda = -bf / 3.0;
    let mut displace = 1.0;
    if p1a > 0.0 {
        displace += p1a.sqrt();
    }
    let mut fval = bf + lambda;
    fval = cf + lambda * fval;
    fval = df + lambda * fval;

    // 两条竖直抛物线相交时出现
    if p0a.abs() < 1e-7 {
        p0a = 1e-7;
    }
    if p0a < 0.0 {
        lambda += (2 - zeroindex) as f64 * displace;
    } else {
        if zeroindex > 1 {
            return None;
        }
        if fval > 0.0 {
            lambda -= displace;
        } else {
            lambda += displace;
        }
    }

    const MAX_ITERATIONS: usize = 30;
    let mut converged = false;
    for _ in 0..MAX_ITERATIONS {
        let mut fval = 1.0;
        let mut fpval = 1.0;
        fval = bf + lambda * fval;
        fpval = fval + lambda * fpval;
        fval = cf + lambda * fval;
        fpval = fval + lambda * fpval;
        fval = df + lambda * fval;

        let delta = fval / fpval;
        lambda -= delta;
        if delta.abs() < 1e-6 {
            converged = true;
            break;
        }
    }
    if !converged {
        return None;
    }

    a += lambda * a2;
    b += lambda * b2;
    c += lambda * c2;
    d += lambda * d2;
    e += lambda * e2;
    f += lambda * f2;

    // 选主元：判别式绝对值最大的2×2子式
    let mut dis1 = e * e - 4.0 * b * f;
    let mut dis2 = d * d - 4.0 * a * f;
    let mut dis3 = c * c - 4.0 * a * b;
    let mut maxind = 1;
    let mut maxval = dis1.abs();
    if dis2.abs() > maxval {
        maxval = dis2.abs();
        maxind = 2;
    }
    if dis3.abs() > maxval {
        maxind = 3;
    }
    match maxind {
        1 => {
            std::mem::swap(&mut a, &mut f);
            std::mem::swap(&mut c, &mut e);
            std::mem::swap(&mut dis1, &mut dis3);
        }
        2 => {
            std::mem::swap(&mut b, &mut f);
            std::mem::swap(&mut c, &mut d);
            std::mem::swap(&mut dis2, &mut dis3);
        }
        _ => {}
    }

    if dis3 < 0.0 {
        return None;
    }

    // 零空间方向
    let mut r = [2.0 * b * d - c * e, 2.0 * a * e - c * d, dis3];

    match maxind {
        1 => {
            std::mem::swap(&mut a, &mut f);
            std::mem::swap(&mut c, &mut e);
            r.swap(0, 2);
        }
        2 => {
            std::mem::swap(&mut b, &mut f);
            std::mem::swap(&mut c, &mut d);
            r.swap(1, 2);
        }
        _ => {}
    }

    let rnormsq = r[0] * r[0] + r[1] * r[1] + r[2] * r[2];
    let mut k = rnormsq.sqrt();
    if k * r[2] < 0.0 {
        k = -k;
    }
    let wnorm = (2.0 * rnormsq + 2.0 * k * r[2]).sqrt();
    let w = [r[0] / wnorm, r[1] / wnorm, (r[2] + k) / wnorm];

    let q0 = a * w[0] + c * w[1] / 2.0 + d * w[2] / 2.0;
    let q1 = b * w[1] + c * w[0] / 2.0 + e * w[2] / 2.0;
    let alpha = a * w[0] * w[0]
        + b * w[1] * w[1]
        + c * w[0] * w[1]
        + d * w[0] * w[2]
        + e * w[1] * w[2]
        + f * w[2] * w[2];
    let a00 = a - 4.0 * w[0] * q0 + 4.0 * w[0] * w[0] * alpha;
    let a11 = b - 4.0 * w[1] * q1 + 4.0 * w[1] * w[1] * alpha;
    let a01 = c / 2.0 - 2.0 * w[1] * q0 - 2.0 * w[0] * q1 + 4.0 * w[0] * w[1] * alpha;

    let dis = a01 * a01 - a00 * a11;
    if dis < 0.0 {
        return None;
    }
    let sqrtdis = dis.sqrt();
    let which = which as f64;
    let (px, py) = if which * a01 > 0.0 {
        (a01 + which * sqrtdis, a11)
    } else {
        (a00, a01 - which * sqrtdis)
    };
    let pscalw = w[0] * px + w[1] * py;
    let p = [
        px - 2.0 * pscalw * w[0],
        py - 2.0 * pscalw * w[1],
        -2.0 * pscalw * w[2],
    ];

    let pn = p[0] * p[0] + p[1] * p[1];
    if pn == 0.0 {
        return None;
    }
    let ra = Coordinate::from(Vector2::new(p[0], p[1]) * (-p[2] / pn));
    let ret = LineData::new(ra, ra + Vector2::new(-p[1], p[0]));
    ret.valid().then_some(ret)
}

/// 圆锥曲线在射影变换下的像
///
/// 系数矩阵按逆变换做合同变换，再以最大分量归一化。
pub fn calc_conic_transformation(
    data: &ConicCartesianData,
    t: &Transformation,
) -> Option<ConicCartesianData> {
    let mut a = [[0.0; 3]; 3];
    a[1][1] = data.coeffs[0];
    a[2][2] = data.coeffs[1];
    a[1][2] = data.coeffs[2] / 2.0;
    a[2][1] = a[1][2];
    a[0][1] = data.coeffs[3] / 2.0;
    a[1][0] = a[0][1];
    a[0][2] = data.coeffs[4] / 2.0;
    a[2][0] = a[0][2];
    a[0][0] = data.coeffs[5];

    let ti = t.inverse()?;

    let mut b = [[0.0; 3]; 3];
    let mut supnorm: f64 = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            for (ii, row) in a.iter().enumerate() {
                for (jj, v) in row.iter().enumerate() {
                    b[i][j] += v * ti.data(ii, i) * ti.data(jj, j);
                }
            }
            supnorm = supnorm.max(b[i][j].abs());
        }
    }
    if supnorm == 0.0 {
        return None;
    }
    for row in b.iter_mut() {
        for v in row.iter_mut() {
            *v /= supnorm;
        }
    }

    let ret = ConicCartesianData::new(
        b[1][1],
        b[2][2],
        b[1][2] + b[2][1],
        b[0][1] + b[1][0],
        b[0][2] + b[2][0],
        b[0][0],
    );
    ret.valid().then_some(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse_points() -> Vec<Coordinate> {
        (0..5)
            .map(|i| {
                let a = 0.3 + i as f64 * 1.1;
                Coordinate::new(2.0 * a.cos(), a.sin())
            })
            .collect()
    }

    #[test]
    fn test_conic_through_five_points() {
        let pts = ellipse_points();
        let conic = calc_conic_through_points(&pts, &[]).unwrap();
        // 所有点都在曲线上
        for p in &pts {
            let norm: f64 = conic.coeffs.iter().map(|c| c.abs()).fold(0.0, f64::max);
            assert!(conic.eval(p).abs() / norm < 1e-9);
        }
        let polar = ConicPolarData::from_cartesian(&conic);
        assert_eq!(polar.kind(1e-3), ConicKind::Ellipse);
        assert!(polar.contains_point(&Coordinate::new(0.0, -1.0), 1e-6));
    }

    #[test]
    fn test_polar_cartesian_roundtrip() {
        let polar = ConicPolarData::new(Coordinate::new(1.0, 2.0), 3.0, 0.3, 0.4);
        let cart = ConicCartesianData::from_polar(&polar);
        let back = ConicPolarData::from_cartesian(&cart);
        // 曲线上的点在转换后仍在曲线上
        for i in 0..8 {
            let p = polar.point_at(i as f64 / 8.0);
            assert!(back.contains_point(&p, 1e-6));
        }
    }

    #[test]
    fn test_point_param_roundtrip() {
        let polar = ConicPolarData::new(Coordinate::new(0.0, 0.0), 2.0, 0.5, 0.0);
        for i in 1..10 {
            let t = i as f64 / 10.0;
            let p = polar.point_at(t);
            assert!((polar.param_of(&p) - t).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bffp_ellipse() {
        let f1 = Coordinate::new(-1.0, 0.0);
        let f2 = Coordinate::new(1.0, 0.0);
        let p = Coordinate::new(0.0, 1.0);
        let polar = calc_conic_bffp(&[f1, f2, p], 1).unwrap();
        assert_eq!(polar.kind(1e-3), ConicKind::Ellipse);
        assert!(polar.contains_point(&p, 1e-6));
        assert!((polar.focus2() - f2).norm() < 1e-9);
    }

    #[test]
    fn test_line_intersection_and_other() {
        // 单位圆 x² + y² - 1 = 0 与 x 轴
        let c = ConicCartesianData::new(1.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        let l = LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        let p1 = calc_conic_line_intersect(&c, &l, IntersectionSide::Side(1)).unwrap();
        let p2 = calc_conic_line_intersect(&c, &l, IntersectionSide::Side(-1)).unwrap();
        assert!((p1.x.abs() - 1.0).abs() < 1e-12);
        assert!((p1.x + p2.x).abs() < 1e-12);
        // 已知 p1，求另一个交点
        let other = calc_conic_line_intersect(&c, &l, IntersectionSide::Other(p1.x)).unwrap();
        assert!((other - p2).norm() < 1e-12);
        // 不相交
        let far = LineData::new(Coordinate::new(0.0, 2.0), Coordinate::new(1.0, 2.0));
        assert!(calc_conic_line_intersect(&c, &far, IntersectionSide::Side(1)).is_none());
    }

    #[test]
    fn test_asymptotes_of_hyperbola() {
        // xy = 1 的渐近线是坐标轴
        let c = ConicCartesianData::new(0.0, 0.0, 1.0, 0.0, 0.0, -1.0);
        let l1 = calc_conic_asymptote(&c, 1).unwrap();
        let l2 = calc_conic_asymptote(&c, -1).unwrap();
        assert!(l1.is_orthogonal_to(&l2));
        // 椭圆没有渐近线
        let e = ConicCartesianData::new(1.0, 2.0, 0.0, 0.0, 0.0, -1.0);
        assert!(calc_conic_asymptote(&e, 1).is_none());
    }

    #[test]
    fn test_polar_line_and_point() {
        let c = ConicCartesianData::new(1.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        let pole = Coordinate::new(2.0, 0.0);
        let polar = calc_conic_polar_line(&c, &pole).unwrap();
        // x = 1/2
        assert!((polar.a.x - 0.5).abs() < 1e-12);
        assert!((polar.b.x - 0.5).abs() < 1e-12);
        let back = calc_conic_polar_point(&c, &polar);
        assert!((back - pole).norm() < 1e-9);
    }

    #[test]
    fn test_conic_radical_of_circles() {
        // 两个单位圆，圆心 (0,0) 与 (1,0)，公共弦为 x = 1/2
        let c1 = ConicCartesianData::new(1.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        let c2 = ConicCartesianData::new(1.0, 1.0, 0.0, -2.0, 0.0, 0.0);
        let found: Vec<LineData> = [1, -1]
            .iter()
            .filter_map(|&w| calc_conic_radical(&c1, &c2, w, 1))
            .collect();
        assert!(!found.is_empty());
        assert!(found.iter().any(|l| (l.a.x - 0.5).abs() < 1e-6 && (l.b.x - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_conic_transformation() {
        let polar = ConicPolarData::new(Coordinate::new(0.0, 0.0), 1.0, 0.5, 0.0);
        let cart = ConicCartesianData::from_polar(&polar);
        let t = Transformation::translation(&Vector2::new(3.0, -1.0));
        let moved = calc_conic_transformation(&cart, &t).unwrap();
        let p = polar.point_at(0.2);
        let q = t.apply(&p);
        let norm: f64 = moved.coeffs.iter().map(|c| c.abs()).fold(0.0, f64::max);
        assert!(moved.eval(&q).abs() / norm < 1e-9);
    }
}
