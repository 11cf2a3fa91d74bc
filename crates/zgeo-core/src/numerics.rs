//! 数值算法
//!
//! - 三次方程求根：Sturm序列隔离 + 二分 + 牛顿迭代
//! - 欠定齐次线性方程组：全主元高斯消元 + 回代

/// 求根参数
#[derive(Debug, Clone, Copy)]
pub struct RootParams {
    /// 收敛容差
    pub tolerance: f64,

    /// 牛顿迭代最大次数
    pub max_iterations: usize,
}

impl Default for RootParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

impl From<&crate::config::EngineConfig> for RootParams {
    fn from(cfg: &crate::config::EngineConfig) -> Self {
        Self {
            tolerance: cfg.root_tolerance,
            max_iterations: cfg.newton_max_iterations,
        }
    }
}

/// 求三次多项式 a·x³ + b·x² + c·x + d 在 [xmin, xmax] 内按升序第 `root` 个实根（从1开始）
///
/// 区间超出 ±1e8 时自动换成包含全部实根的界。
/// 退化为二次或一次时按低次方程处理。根不存在或牛顿迭代不收敛时返回 `None`。
#[allow(clippy::too_many_arguments)]
pub fn calc_cubic_root(
    mut xmin: f64,
    mut xmax: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    root: usize,
    params: RootParams,
) -> Option<f64> {
    // 归一化：首项为正，无穷范数为1
    let mut infnorm = a.abs().max(b.abs()).max(c.abs()).max(d.abs());
    if infnorm == 0.0 {
        return None;
    }
    if a < 0.0 {
        infnorm = -infnorm;
    }
    let (a, mut b, mut c, mut d) = (a / infnorm, b / infnorm, c / infnorm, d / infnorm);

    const SMALL: f64 = 1e-7;
    if a.abs() < SMALL {
        if b.abs() < SMALL {
            if c.abs() < SMALL {
                return None;
            }
            // 一次
            let rootval = -d / c;
            let mut numroots = 1;
            if rootval < xmin || xmax < rootval {
                numroots -= 1;
            }
            if root > numroots {
                return None;
            }
            return Some(rootval);
        }
        // 二次
        if b < 0.0 {
            b = -b;
            c = -c;
            d = -d;
        }
        let discrim = c * c - 4.0 * b * d;
        if discrim < 0.0 {
            return None;
        }
        let discrim = discrim.sqrt() / (2.0 * b.abs());
        let rootmiddle = -c / (2.0 * b);
        let mut numroots: i32 = 2;
        if rootmiddle - discrim < xmin {
            numroots -= 1;
        }
        if rootmiddle + discrim > xmax {
            numroots -= 1;
        }
        if rootmiddle + discrim < xmin {
            numroots -= 1;
        }
        if rootmiddle - discrim > xmax {
            numroots -= 1;
        }
        if root as i32 > numroots {
            return None;
        }
        if root == 2 || rootmiddle - discrim < xmin {
            return Some(rootmiddle + discrim);
        }
        return Some(rootmiddle - discrim);
    }

    if xmin < -1e8 || xmax > 1e8 {
        xmax = (d / a).abs();
        xmax = xmax.max((c / a).abs() + 1.0).max((b / a).abs() + 1.0);
        xmin = -xmax;
    }

    // Sturm序列系数
    let sturm = Sturm::new(a, b, c, d);

    let mut varbottom = sturm.variations(xmin);
    let mut vartop = sturm.variations(xmax);
    if root <= varbottom || root > vartop {
        return None;
    }

    // 二分直到区间只含所求的根
    let mut dx = (xmax - xmin) / 2.0;
    while vartop - varbottom > 1 {
        if dx.abs() < params.tolerance {
            return Some((xmin + xmax) / 2.0);
        }
        let xmiddle = xmin + dx;
        let varmiddle = sturm.variations(xmiddle);
        if varmiddle < root {
            xmin = xmiddle;
            varbottom = varmiddle;
        } else {
            xmax = xmiddle;
            vartop = varmiddle;
        }
        dx /= 2.0;
    }

    if vartop - varbottom == 1 {
        newton_in_bracket(xmin, xmax, a, b, c, d, params)
    } else {
        // 多半是重根
        Some((xmin + xmax) / 2.0)
    }
}

/// a·x³ + b·x² + c·x + d 在 x 左侧的实根个数
pub fn cubic_variations(x: f64, a: f64, b: f64, c: f64, d: f64) -> usize {
    Sturm::new(a, b, c, d).variations(x)
}

/// 三次多项式的Sturm序列
///
/// 第二项是导数的相反数，第三项为 p1a·x + p1b，第四项为常数 p0a。
struct Sturm {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    p1a: f64,
    p1b: f64,
    p0a: f64,
}

impl Sturm {
    fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        let p1a = 2.0 * b * b - 6.0 * a * c;
        let p1b = b * c - 9.0 * a * d;
        let p0a = c * p1a * p1a + p1b * (3.0 * a * p1b - 2.0 * b * p1a);
        Self {
            a,
            b,
            c,
            d,
            p1a,
            p1b,
            p0a,
        }
    }

    /// x 处的符号变化数，即 x 左侧的根数
    fn variations(&self, x: f64) -> usize {
        let mut fval = self.a;
        let mut fpval = self.a;
        fval = self.b + x * fval;
        fpval = fval + x * fpval;
        fval = self.c + x * fval;
        fpval = fval + x * fpval;
        fval = self.d + x * fval;

        let f1val = self.p1a * x + self.p1b;

        let f3pos = fval >= 0.0;
        let f2pos = fpval <= 0.0;
        let f1pos = f1val >= 0.0;
        let f0pos = self.p0a >= 0.0;

        [f3pos != f2pos, f2pos != f1pos, f1pos != f0pos]
            .iter()
            .filter(|&&v| v)
            .count()
    }
}

/// 返回 (f, f', f''/2)
#[inline]
fn cubic_derivatives(x: f64, a: f64, b: f64, c: f64, d: f64) -> (f64, f64, f64) {
    let mut fval = a;
    let mut fpval = a;
    let mut fppval = a;
    fval = b + x * fval;
    fpval = fval + x * fpval;
    fppval = fpval + x * fppval;
    fval = c + x * fval;
    fpval = fval + x * fpval;
    fval = d + x * fval;
    (fval, fpval, fppval)
}

/// 在已隔离单根的区间内求根
///
/// 一阶、二阶导数在区间内变号时先二分，否则从Fourier点开始牛顿迭代。
fn newton_in_bracket(
    mut xmin: f64,
    mut xmax: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    params: RootParams,
) -> Option<f64> {
    let (mut fval1, mut fpval1, mut fppval1) = cubic_derivatives(xmin, a, b, c, d);
    let (mut fval2, mut fpval2, mut fppval2) = cubic_derivatives(xmax, a, b, c, d);

    while xmax - xmin > params.tolerance {
        if fppval1 * fppval2 < 0.0 || fpval1 * fpval2 < 0.0 {
            let xmiddle = (xmin + xmax) / 2.0;
            let (fval, fpval, fppval) = cubic_derivatives(xmiddle, a, b, c, d);
            if fval1 * fval <= 0.0 {
                xmax = xmiddle;
                fval2 = fval;
                fpval2 = fpval;
                fppval2 = fppval;
            } else {
                xmin = xmiddle;
                fval1 = fval;
                fpval1 = fpval;
                fppval1 = fppval;
            }
        } else {
            let mut x = if fval2 * fppval2 > 0.0 { xmax } else { xmin };
            let mut p: f64 = 1.0;
            let mut iterations = 0;
            while p.abs() > params.tolerance {
                if iterations >= params.max_iterations {
                    return None;
                }
                iterations += 1;
                let (fval, fpval, _) = cubic_derivatives(x, a, b, c, d);
                p = fval / fpval;
                x -= p;
            }
            return x.is_finite().then_some(x);
        }
    }

    // 可能在拐点附近，取区间中点
    Some((xmin + xmax) / 2.0)
}

/// 全主元高斯消元（行数通常小于列数）
///
/// 列交换记录在 `exchange` 中，供 [`backward_substitution`] 还原。
/// 主元恰为零时返回 `false`。
pub fn gaussian_elimination(matrix: &mut [Vec<f64>], exchange: &mut [usize]) -> bool {
    let numrows = matrix.len();
    if numrows == 0 {
        return true;
    }
    let numcols = matrix[0].len();

    for k in 0..numrows {
        // 寻找模最大的元素
        let mut maxval = f64::NEG_INFINITY;
        let mut imax = k;
        let mut jmax = k;
        for (i, row) in matrix.iter().enumerate().skip(k) {
            for (j, v) in row.iter().enumerate().skip(k) {
                if v.abs() > maxval {
                    maxval = v.abs();
                    imax = i;
                    jmax = j;
                }
            }
        }

        // 行交换
        if imax != k {
            matrix.swap(k, imax);
        }

        // 列交换
        if jmax != k {
            for row in matrix.iter_mut() {
                row.swap(k, jmax);
            }
        }

        exchange[k] = jmax;

        if maxval == 0.0 {
            return false;
        }

        let (upper, lower) = matrix.split_at_mut(k + 1);
        let pivot_row = &upper[k];
        for row in lower.iter_mut() {
            let mik = row[k] / pivot_row[k];
            row[k] = mik;
            for j in k + 1..numcols {
                row[j] -= mik * pivot_row[j];
            }
        }
    }
    true
}

/// 欠定齐次上三角方程组的回代
///
/// 自由未知量取1，最后按 `exchange` 逆序还原列交换。
pub fn backward_substitution(matrix: &[Vec<f64>], exchange: &[usize]) -> Vec<f64> {
    let numrows = matrix.len();
    let numcols = matrix.first().map_or(0, Vec::len);
    let mut solution = vec![0.0; numcols];

    for s in solution.iter_mut().skip(numrows) {
        *s = 1.0;
    }

    for k in (0..numrows).rev() {
        let mut v = 0.0;
        for j in k + 1..numcols {
            v -= matrix[k][j] * solution[j];
        }
        solution[k] = v / matrix[k][k];
    }

    for k in (0..numrows).rev() {
        solution.swap(k, exchange[k]);
    }
    solution
}

/// 求解欠定齐次方程组 M·x = 0 的一个非零解
pub fn solve_homogeneous(mut matrix: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let mut exchange = vec![0usize; matrix.len()];
    if !gaussian_elimination(&mut matrix, &mut exchange) {
        return None;
    }
    let solution = backward_substitution(&matrix, &exchange);
    solution.iter().all(|v| v.is_finite()).then_some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(a: f64, b: f64, c: f64, d: f64, x: f64) -> f64 {
        ((a * x + b) * x + c) * x + d
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x-1)(x-2)(x-3) = x³ - 6x² + 11x - 6
        let p = RootParams::default();
        let roots: Vec<f64> = (1..=3)
            .map(|r| calc_cubic_root(-1e10, 1e10, 1.0, -6.0, 11.0, -6.0, r, p).unwrap())
            .collect();
        assert!((roots[0] - 1.0).abs() < 1e-6);
        assert!((roots[1] - 2.0).abs() < 1e-6);
        assert!((roots[2] - 3.0).abs() < 1e-6);
        assert!(calc_cubic_root(-1e10, 1e10, 1.0, -6.0, 11.0, -6.0, 4, p).is_none());
    }

    #[test]
    fn test_cubic_single_root() {
        // x³ + x + 1 只有一个实根
        let p = RootParams::default();
        let x = calc_cubic_root(-1e10, 1e10, 1.0, 0.0, 1.0, 1.0, 1, p).unwrap();
        assert!(eval(1.0, 0.0, 1.0, 1.0, x).abs() < 1e-6);
        assert!(calc_cubic_root(-1e10, 1e10, 1.0, 0.0, 1.0, 1.0, 2, p).is_none());
    }

    #[test]
    fn test_degenerate_quadratic() {
        // x² - 4 = 0
        let p = RootParams::default();
        let r1 = calc_cubic_root(-1e10, 1e10, 0.0, 1.0, 0.0, -4.0, 1, p).unwrap();
        let r2 = calc_cubic_root(-1e10, 1e10, 0.0, 1.0, 0.0, -4.0, 2, p).unwrap();
        assert!((r1 + 2.0).abs() < 1e-9);
        assert!((r2 - 2.0).abs() < 1e-9);
        // 没有实根
        assert!(calc_cubic_root(-1e10, 1e10, 0.0, 1.0, 0.0, 4.0, 1, p).is_none());
    }

    #[test]
    fn test_homogeneous_system() {
        // x + y - z = 0, x - y = 0  =>  x = y = z/2
        let m = vec![vec![1.0, 1.0, -1.0], vec![1.0, -1.0, 0.0]];
        let s = solve_homogeneous(m).unwrap();
        assert!((s[0] - s[1]).abs() < 1e-12);
        assert!((s[0] + s[1] - s[2]).abs() < 1e-12);
        assert!(s.iter().any(|v| v.abs() > 1e-6));
    }

    #[test]
    fn test_singular_elimination() {
        let mut m = vec![vec![0.0, 0.0, 0.0]];
        let mut ex = vec![0];
        assert!(!gaussian_elimination(&mut m, &mut ex));
    }
}
