//! 值的属性
//!
//! 每种值有一个有序且稳定的属性名列表，父类型的属性排在前面。
//! 属性计算节点按名字查到下标后再取值。

use super::{circle_cartesian, circle_polar, ImpType, ObjectImp};
use crate::config::EngineConfig;
use crate::conic::{ConicCartesianData, ConicPolarData};
use crate::cubic::CubicCartesianData;
use crate::geometry::{CircleData, LineData, PolygonData};
use crate::math::Coordinate;

const ANY: &[&str] = &["base-object-type"];

const POINT: &[&str] = &["base-object-type", "coordinate", "coordinate-x", "coordinate-y"];

const LINE: &[&str] = &["base-object-type", "slope", "equation"];

const SEGMENT: &[&str] = &[
    "base-object-type",
    "slope",
    "equation",
    "length",
    "mid-point",
    "golden-point",
    "support",
    "end-point-A",
    "end-point-B",
];

const RAY: &[&str] = &["base-object-type", "slope", "equation", "support", "end-point-A"];

const CONIC: &[&str] = &[
    "base-object-type",
    "type",
    "first-focus",
    "second-focus",
    "cartesian-equation",
    "polar-equation",
];

const CIRCLE: &[&str] = &[
    "base-object-type",
    "type",
    "first-focus",
    "second-focus",
    "cartesian-equation",
    "polar-equation",
    "surface",
    "circumference",
    "radius",
    "center",
    "cartesian-equation",
    "simply-cartesian-equation",
    "polar-equation",
];

const CUBIC: &[&str] = &["base-object-type", "cartesian-equation"];

const POLYGON: &[&str] = &[
    "base-object-type",
    "polygon-number-of-sides",
    "polygon-perimeter",
    "polygon-surface",
    "polygon-center-of-mass",
    "polygon-winding-number",
];

impl ImpType {
    /// 该类型的值具有的属性名；抽象类型只含所有子类型共有的部分
    pub fn property_names(self) -> &'static [&'static str] {
        match self {
            ImpType::Point => POINT,
            ImpType::Segment => SEGMENT,
            ImpType::Ray => RAY,
            ImpType::Line | ImpType::AbstractLine => LINE,
            ImpType::Conic => CONIC,
            ImpType::Circle => CIRCLE,
            ImpType::Cubic => CUBIC,
            ImpType::Polygon => POLYGON,
            _ => ANY,
        }
    }
}

impl ObjectImp {
    /// 属性内部名称列表
    pub fn properties(&self) -> &'static [&'static str] {
        self.imp_type().property_names()
    }

    /// 按名字查找属性下标，重名时取第一个
    pub fn property_index(&self, name: &str) -> Option<usize> {
        self.properties().iter().position(|p| *p == name)
    }

    /// 第 `index` 个属性的值；越界时为 `Invalid`
    pub fn property(&self, index: usize, cfg: &EngineConfig) -> ObjectImp {
        if index == 0 {
            return ObjectImp::String(self.imp_type().name().to_string());
        }
        match self {
            ObjectImp::Point(p) => point_property(p, index),
            ObjectImp::Segment(l) => segment_property(l, index),
            ObjectImp::Ray(l) => match index {
                1 | 2 => abstract_line_property(l, index),
                3 => ObjectImp::Line(*l),
                4 => ObjectImp::Point(l.a),
                _ => ObjectImp::Invalid,
            },
            ObjectImp::Line(l) => abstract_line_property(l, index),
            ObjectImp::Conic(c) => conic_property(&c.cartesian, &c.polar, None, index, cfg),
            ObjectImp::Circle(c) => {
                if index < CONIC.len() {
                    conic_property(&circle_cartesian(c), &circle_polar(c), Some(c), index, cfg)
                } else {
                    circle_property(c, index)
                }
            }
            ObjectImp::Cubic(c) if index == 1 => ObjectImp::String(cubic_cartesian_string(c)),
            ObjectImp::Polygon(p) => polygon_property(p, index),
            _ => ObjectImp::Invalid,
        }
    }
}

fn point_property(p: &Coordinate, index: usize) -> ObjectImp {
    match index {
        1 => ObjectImp::Point(*p),
        2 => ObjectImp::Double(p.x),
        3 => ObjectImp::Double(p.y),
        _ => ObjectImp::Invalid,
    }
}

fn abstract_line_property(l: &LineData, index: usize) -> ObjectImp {
    match index {
        1 => {
            let d = l.dir();
            ObjectImp::Double(d.y / d.x)
        }
        2 => ObjectImp::String(line_equation_string(l)),
        _ => ObjectImp::Invalid,
    }
}

fn segment_property(l: &LineData, index: usize) -> ObjectImp {
    match index {
        1 | 2 => abstract_line_property(l, index),
        3 => ObjectImp::Double(l.length()),
        4 => ObjectImp::Point(nalgebra::center(&l.a, &l.b)),
        5 => {
            let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
            ObjectImp::Point(l.a + l.dir() * ratio)
        }
        6 => ObjectImp::Line(*l),
        7 => ObjectImp::Point(l.a),
        8 => ObjectImp::Point(l.b),
        _ => ObjectImp::Invalid,
    }
}

fn conic_property(
    cart: &ConicCartesianData,
    polar: &ConicPolarData,
    circle: Option<&CircleData>,
    index: usize,
    cfg: &EngineConfig,
) -> ObjectImp {
    match index {
        1 => {
            let kind = match circle {
                Some(_) => "Circle",
                None => polar.kind(cfg.parabola_miss).as_str(),
            };
            ObjectImp::String(kind.to_string())
        }
        2 => ObjectImp::Point(polar.focus1),
        3 => match circle {
            Some(c) => ObjectImp::Point(c.center),
            None => {
                let f2 = polar.focus2();
                if crate::math::coord_valid(&f2) {
                    ObjectImp::Point(f2)
                } else {
                    ObjectImp::Invalid
                }
            }
        },
        4 => ObjectImp::String(conic_cartesian_string(cart)),
        5 => ObjectImp::String(conic_polar_string(polar)),
        _ => ObjectImp::Invalid,
    }
}

fn circle_property(c: &CircleData, index: usize) -> ObjectImp {
    match index - CONIC.len() {
        0 => ObjectImp::Double(c.surface()),
        1 => ObjectImp::Double(c.circumference()),
        2 => ObjectImp::Double(c.radius.abs()),
        3 => ObjectImp::Point(c.center),
        4 => ObjectImp::String(conic_cartesian_string(&circle_cartesian(c))),
        5 => ObjectImp::String(format!(
            "( x - {} )² + ( y - {} )² = {}",
            fmt_num(c.center.x),
            fmt_num(c.center.y),
            fmt_num(c.squared_radius())
        )),
        6 => ObjectImp::String(conic_polar_string(&circle_polar(c))),
        _ => ObjectImp::Invalid,
    }
}

fn polygon_property(p: &PolygonData, index: usize) -> ObjectImp {
    match index {
        1 => ObjectImp::Int(p.npoints() as i64),
        2 => ObjectImp::Double(p.perimeter()),
        3 => match p.surface() {
            Some(s) => ObjectImp::Double(s),
            None => ObjectImp::Invalid,
        },
        4 => ObjectImp::Point(p.center_of_mass),
        5 => ObjectImp::Int(p.winding_number() as i64),
        _ => ObjectImp::Invalid,
    }
}

fn fmt_num(v: f64) -> String {
    let r = (v * 1e4).round() / 1e4;
    if r == 0.0 {
        "0".to_string()
    } else {
        format!("{r}")
    }
}

/// 把 (系数, 单项式) 拼成 "a x² + b y - c = 0" 形式，跳过零系数
fn polynomial_string(terms: &[(f64, &str)]) -> String {
    let mut ret = String::new();
    for &(coeff, monomial) in terms {
        if coeff.abs() < 1e-12 {
            continue;
        }
        let sign = if coeff < 0.0 { "-" } else { "+" };
        if ret.is_empty() {
            if coeff < 0.0 {
                ret.push('-');
            }
        } else {
            ret.push_str(&format!(" {sign} "));
        }
        let abs = fmt_num(coeff.abs());
        if monomial.is_empty() {
            ret.push_str(&abs);
        } else if abs == "1" {
            ret.push_str(monomial);
        } else {
            ret.push_str(&format!("{abs} {monomial}"));
        }
    }
    if ret.is_empty() {
        ret.push('0');
    }
    ret.push_str(" = 0");
    ret
}

fn line_equation_string(l: &LineData) -> String {
    let d = l.dir();
    if d.x.abs() < 1e-12 {
        return format!("x = {}", fmt_num(l.a.x));
    }
    let m = d.y / d.x;
    let r = l.a.y - m * l.a.x;
    let rsign = if r < 0.0 { "-" } else { "+" };
    format!("y = {} x {} {}", fmt_num(m), rsign, fmt_num(r.abs()))
}

pub(super) fn conic_cartesian_string(c: &ConicCartesianData) -> String {
    let [a, b, cc, d, e, f] = c.coeffs;
    polynomial_string(&[
        (a, "x²"),
        (b, "y²"),
        (cc, "xy"),
        (d, "x"),
        (e, "y"),
        (f, ""),
    ])
}

fn conic_polar_string(p: &ConicPolarData) -> String {
    format!(
        "rho = {}/(1 + {} cos theta + {} sin theta)    [centered at ({}, {})]",
        fmt_num(p.pdimen),
        fmt_num(-p.ecostheta0),
        fmt_num(-p.esintheta0),
        fmt_num(p.focus1.x),
        fmt_num(p.focus1.y)
    )
}

pub(super) fn cubic_cartesian_string(c: &CubicCartesianData) -> String {
    let [a000, a001, a002, a011, a012, a022, a111, a112, a122, a222] = c.coeffs;
    polynomial_string(&[
        (a111, "x³"),
        (a222, "y³"),
        (a112, "x²y"),
        (a122, "xy²"),
        (a011, "x²"),
        (a022, "y²"),
        (a012, "xy"),
        (a001, "x"),
        (a002, "y"),
        (a000, ""),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_inherited_properties_come_first() {
        let seg = ObjectImp::Segment(LineData::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(3.0, 4.0),
        ));
        assert_eq!(&seg.properties()[..3], LINE);
        let length = seg.property(seg.property_index("length").unwrap(), &cfg());
        assert_eq!(length, ObjectImp::Double(5.0));
        let mid = seg.property(seg.property_index("mid-point").unwrap(), &cfg());
        assert_eq!(mid, ObjectImp::Point(Coordinate::new(1.5, 2.0)));
    }

    #[test]
    fn test_base_object_type() {
        let p = ObjectImp::Point(Coordinate::new(1.0, 2.0));
        assert_eq!(p.property(0, &cfg()), ObjectImp::String("point".into()));
        assert_eq!(p.property(2, &cfg()), ObjectImp::Double(1.0));
        assert_eq!(p.property(99, &cfg()), ObjectImp::Invalid);
    }

    #[test]
    fn test_circle_properties() {
        let c = ObjectImp::Circle(CircleData::new(Coordinate::new(1.0, -1.0), 2.0));
        let radius = c.property(c.property_index("radius").unwrap(), &cfg());
        assert_eq!(radius, ObjectImp::Double(2.0));
        let kind = c.property(c.property_index("type").unwrap(), &cfg());
        assert_eq!(kind, ObjectImp::String("Circle".into()));
        let simple = c.property(
            c.property_index("simply-cartesian-equation").unwrap(),
            &cfg(),
        );
        assert_eq!(
            simple,
            ObjectImp::String("( x - 1 )² + ( y - -1 )² = 4".into())
        );
    }

    #[test]
    fn test_polygon_surface_requires_simple_winding() {
        let sq = ObjectImp::Polygon(PolygonData::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 0.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(0.0, 2.0),
        ]));
        let idx = sq.property_index("polygon-surface").unwrap();
        assert_eq!(sq.property(idx, &cfg()), ObjectImp::Double(4.0));
        let sides = sq.property(sq.property_index("polygon-number-of-sides").unwrap(), &cfg());
        assert_eq!(sides, ObjectImp::Int(4));
    }

    #[test]
    fn test_line_equation_string() {
        let l = LineData::new(Coordinate::new(0.0, 1.0), Coordinate::new(1.0, 3.0));
        assert_eq!(line_equation_string(&l), "y = 2 x + 1");
        let v = LineData::new(Coordinate::new(2.0, 0.0), Coordinate::new(2.0, 5.0));
        assert_eq!(line_equation_string(&v), "x = 2");
    }

    #[test]
    fn test_conic_equation_string() {
        let c = ConicCartesianData::new(1.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        assert_eq!(conic_cartesian_string(&c), "x² + y² - 1 = 0");
    }
}
