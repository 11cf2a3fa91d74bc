//! 对象值 (Imp)
//!
//! 计算节点产出的不可变值。值只能整体替换，不会就地修改。
//!
//! # 类型层次
//!
//! ```text
//! Any ─┬─ Invalid / Double / Int / String / Point / Polygon
//!      └─ Curve ─┬─ AbstractLine ─┬─ Segment
//!                │                ├─ Ray
//!                │                └─ Line
//!                ├─ Conic ── Circle
//!                └─ Cubic
//! ```

mod curve;
mod properties;

use crate::conic::{calc_conic_transformation, ConicCartesianData, ConicPolarData};
use crate::cubic::{calc_cubic_transformation, CubicCartesianData};
use crate::geometry::{CircleData, LineData, PolygonData};
use crate::math::{coord_valid, invalid_coord, Coordinate};
use crate::transform::Transformation;
use serde::{Deserialize, Serialize};

/// 值的类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpType {
    Any,
    Invalid,
    Double,
    Int,
    String,
    Point,
    Curve,
    AbstractLine,
    Segment,
    Ray,
    Line,
    Conic,
    Circle,
    Cubic,
    Polygon,
}

impl ImpType {
    /// 直接父类型；`Any` 没有父类型
    pub fn parent(self) -> Option<ImpType> {
        use ImpType::*;
        match self {
            Any => None,
            Invalid | Double | Int | String | Point | Curve | Polygon => Some(Any),
            AbstractLine | Conic | Cubic => Some(Curve),
            Segment | Ray | Line => Some(AbstractLine),
            Circle => Some(Conic),
        }
    }

    /// `self` 是否是 `other` 或其子类型
    pub fn inherits(self, other: ImpType) -> bool {
        let mut cur = Some(self);
        while let Some(t) = cur {
            if t == other {
                return true;
            }
            cur = t.parent();
        }
        false
    }

    /// 两个可比较的类型中更具体的一个；不可比较时返回 `None`
    pub fn lowermost(a: ImpType, b: ImpType) -> Option<ImpType> {
        if a.inherits(b) {
            Some(a)
        } else if b.inherits(a) {
            Some(b)
        } else {
            None
        }
    }

    /// 内部名称，与序列化形式一致
    pub fn name(self) -> &'static str {
        use ImpType::*;
        match self {
            Any => "any",
            Invalid => "invalid",
            Double => "double",
            Int => "int",
            String => "string",
            Point => "point",
            Curve => "curve",
            AbstractLine => "abstract-line",
            Segment => "segment",
            Ray => "ray",
            Line => "line",
            Conic => "conic",
            Circle => "circle",
            Cubic => "cubic",
            Polygon => "polygon",
        }
    }

    pub fn from_name(name: &str) -> Option<ImpType> {
        use ImpType::*;
        [
            Any, Invalid, Double, Int, String, Point, Curve, AbstractLine, Segment, Ray, Line,
            Conic, Circle, Cubic, Polygon,
        ]
        .into_iter()
        .find(|t| t.name() == name)
    }
}

/// 圆锥曲线值，同时保存两种表示
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConicImp {
    pub cartesian: ConicCartesianData,
    pub polar: ConicPolarData,
}

impl ConicImp {
    /// 由直角坐标方程创建；数据无效时得到 `Invalid`
    pub fn from_cartesian(cartesian: ConicCartesianData) -> ObjectImp {
        let polar = ConicPolarData::from_cartesian(&cartesian);
        if cartesian.valid() && polar.valid() {
            ObjectImp::Conic(ConicImp { cartesian, polar })
        } else {
            ObjectImp::Invalid
        }
    }

    /// 由极坐标数据创建；数据无效时得到 `Invalid`
    pub fn from_polar(polar: ConicPolarData) -> ObjectImp {
        let cartesian = ConicCartesianData::from_polar(&polar);
        if cartesian.valid() && polar.valid() {
            ObjectImp::Conic(ConicImp { cartesian, polar })
        } else {
            ObjectImp::Invalid
        }
    }
}

/// 圆的直角坐标方程 x² + y² − 2cx·x − 2cy·y + (cx² + cy² − r²) = 0
pub fn circle_cartesian(c: &CircleData) -> ConicCartesianData {
    let (x, y) = (c.center.x, c.center.y);
    ConicCartesianData::new(
        1.0,
        1.0,
        0.0,
        -2.0 * x,
        -2.0 * y,
        x * x + y * y - c.squared_radius(),
    )
}

/// 圆的极坐标数据：焦点即圆心，离心率为0
pub fn circle_polar(c: &CircleData) -> ConicPolarData {
    ConicPolarData::new(c.center, c.radius.abs(), 0.0, 0.0)
}

/// 对象值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectImp {
    Invalid,
    Double(f64),
    Int(i64),
    String(String),
    Point(Coordinate),
    Segment(LineData),
    Ray(LineData),
    Line(LineData),
    Circle(CircleData),
    Conic(ConicImp),
    Cubic(CubicCartesianData),
    Polygon(PolygonData),
}

impl ObjectImp {
    pub fn imp_type(&self) -> ImpType {
        match self {
            ObjectImp::Invalid => ImpType::Invalid,
            ObjectImp::Double(_) => ImpType::Double,
            ObjectImp::Int(_) => ImpType::Int,
            ObjectImp::String(_) => ImpType::String,
            ObjectImp::Point(_) => ImpType::Point,
            ObjectImp::Segment(_) => ImpType::Segment,
            ObjectImp::Ray(_) => ImpType::Ray,
            ObjectImp::Line(_) => ImpType::Line,
            ObjectImp::Circle(_) => ImpType::Circle,
            ObjectImp::Conic(_) => ImpType::Conic,
            ObjectImp::Cubic(_) => ImpType::Cubic,
            ObjectImp::Polygon(_) => ImpType::Polygon,
        }
    }

    #[inline]
    pub fn inherits(&self, t: ImpType) -> bool {
        self.imp_type().inherits(t)
    }

    pub fn valid(&self) -> bool {
        !matches!(self, ObjectImp::Invalid)
    }

    pub fn as_point(&self) -> Option<Coordinate> {
        match self {
            ObjectImp::Point(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ObjectImp::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ObjectImp::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ObjectImp::String(s) => Some(s),
            _ => None,
        }
    }

    /// 线段、射线、直线共用的两点数据
    pub fn as_line(&self) -> Option<LineData> {
        match self {
            ObjectImp::Segment(l) | ObjectImp::Ray(l) | ObjectImp::Line(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_circle(&self) -> Option<CircleData> {
        match self {
            ObjectImp::Circle(c) => Some(*c),
            _ => None,
        }
    }

    /// 圆锥曲线（含圆）的直角坐标方程
    pub fn as_conic_cartesian(&self) -> Option<ConicCartesianData> {
        match self {
            ObjectImp::Conic(c) => Some(c.cartesian),
            ObjectImp::Circle(c) => Some(circle_cartesian(c)),
            _ => None,
        }
    }

    /// 圆锥曲线（含圆）的极坐标数据
    pub fn as_conic_polar(&self) -> Option<ConicPolarData> {
        match self {
            ObjectImp::Conic(c) => Some(c.polar),
            ObjectImp::Circle(c) => Some(circle_polar(c)),
            _ => None,
        }
    }

    pub fn as_cubic(&self) -> Option<CubicCartesianData> {
        match self {
            ObjectImp::Cubic(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&PolygonData> {
        match self {
            ObjectImp::Polygon(p) => Some(p),
            _ => None,
        }
    }

    /// 相对点附着的位置
    pub fn attach_point(&self) -> Coordinate {
        match self {
            ObjectImp::Point(p) => *p,
            ObjectImp::Segment(l) => nalgebra::center(&l.a, &l.b),
            ObjectImp::Circle(c) => c.center,
            ObjectImp::Polygon(p) => p.center_of_mass,
            _ => invalid_coord(),
        }
    }

    /// 应用变换
    ///
    /// 射影变换下跨越临界直线（无穷远线的原像）的有界对象变为无效。
    pub fn transform(&self, t: &Transformation) -> ObjectImp {
        let ret = match self {
            ObjectImp::Invalid => ObjectImp::Invalid,
            ObjectImp::Double(_) | ObjectImp::Int(_) | ObjectImp::String(_) => self.clone(),
            ObjectImp::Point(p) => ObjectImp::Point(t.apply(p)),
            ObjectImp::Segment(l) => {
                if !t.is_affine() {
                    let pa = t.projective_indicator(&l.a);
                    let pb = t.projective_indicator(&l.b);
                    if pa * pb < 0.0 {
                        return ObjectImp::Invalid;
                    }
                }
                ObjectImp::Segment(LineData::new(t.apply(&l.a), t.apply(&l.b)))
            }
            ObjectImp::Ray(l) => {
                if t.is_affine() {
                    ObjectImp::Ray(LineData::new(t.apply(&l.a), t.apply(&l.b)))
                } else {
                    // 非仿射变换把射线映成以无穷远点的像为端点的线段
                    let pa = t.projective_indicator(&l.a);
                    let mut pb = t.projective_indicator(&l.b);
                    if pa < 0.0 {
                        pb = -pb;
                    }
                    if pb < pa.abs() {
                        return ObjectImp::Invalid;
                    }
                    ObjectImp::Segment(LineData::new(t.apply(&l.a), t.apply0(&l.dir())))
                }
            }
            ObjectImp::Line(l) => ObjectImp::Line(LineData::new(t.apply(&l.a), t.apply(&l.b))),
            ObjectImp::Circle(c) => {
                if t.is_homothetic() {
                    match t.apply_length(c.radius) {
                        Some(r) => ObjectImp::Circle(CircleData::new(t.apply(&c.center), r)),
                        None => ObjectImp::Invalid,
                    }
                } else {
                    match calc_conic_transformation(&circle_cartesian(c), t) {
                        Some(cart) => ConicImp::from_cartesian(cart),
                        None => ObjectImp::Invalid,
                    }
                }
            }
            ObjectImp::Conic(c) => match calc_conic_transformation(&c.cartesian, t) {
                Some(cart) => ConicImp::from_cartesian(cart),
                None => ObjectImp::Invalid,
            },
            ObjectImp::Cubic(c) => match calc_cubic_transformation(c, t) {
                Some(data) => ObjectImp::Cubic(data),
                None => ObjectImp::Invalid,
            },
            ObjectImp::Polygon(poly) => {
                if !t.is_affine() {
                    let mut positive = false;
                    let mut negative = false;
                    for p in &poly.points {
                        let ind = t.projective_indicator(p);
                        positive |= ind > 0.0;
                        negative |= ind < 0.0;
                    }
                    if positive && negative {
                        return ObjectImp::Invalid;
                    }
                }
                ObjectImp::Polygon(PolygonData::new(
                    poly.points.iter().map(|p| t.apply(p)).collect(),
                ))
            }
        };
        if ret.has_invalid_coordinate() {
            ObjectImp::Invalid
        } else {
            ret
        }
    }

    fn has_invalid_coordinate(&self) -> bool {
        match self {
            ObjectImp::Point(p) => !coord_valid(p),
            ObjectImp::Segment(l) | ObjectImp::Ray(l) | ObjectImp::Line(l) => !l.valid(),
            ObjectImp::Circle(c) => !c.valid(),
            ObjectImp::Polygon(p) => !p.valid(),
            ObjectImp::Cubic(c) => !c.valid(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ObjectImp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectImp::Invalid => write!(f, "invalid"),
            ObjectImp::Double(d) => write!(f, "{d}"),
            ObjectImp::Int(i) => write!(f, "{i}"),
            ObjectImp::String(s) => write!(f, "{s}"),
            ObjectImp::Point(p) => write!(f, "({}, {})", p.x, p.y),
            ObjectImp::Segment(l) => {
                write!(f, "segment ({}, {}) - ({}, {})", l.a.x, l.a.y, l.b.x, l.b.y)
            }
            ObjectImp::Ray(l) => write!(f, "ray ({}, {}) -> ({}, {})", l.a.x, l.a.y, l.b.x, l.b.y),
            ObjectImp::Line(l) => {
                write!(f, "line ({}, {}) - ({}, {})", l.a.x, l.a.y, l.b.x, l.b.y)
            }
            ObjectImp::Circle(c) => write!(
                f,
                "circle center ({}, {}) radius {}",
                c.center.x, c.center.y, c.radius
            ),
            ObjectImp::Conic(c) => write!(f, "conic {}", properties::conic_cartesian_string(&c.cartesian)),
            ObjectImp::Cubic(c) => write!(f, "cubic {}", properties::cubic_cartesian_string(c)),
            ObjectImp::Polygon(p) => write!(f, "polygon with {} vertices", p.npoints()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2;

    #[test]
    fn test_inherits_lattice() {
        assert!(ImpType::Segment.inherits(ImpType::AbstractLine));
        assert!(ImpType::Segment.inherits(ImpType::Curve));
        assert!(ImpType::Circle.inherits(ImpType::Conic));
        assert!(ImpType::Polygon.inherits(ImpType::Any));
        assert!(!ImpType::Polygon.inherits(ImpType::Curve));
        assert!(!ImpType::Conic.inherits(ImpType::Circle));
    }

    #[test]
    fn test_lowermost() {
        assert_eq!(
            ImpType::lowermost(ImpType::Curve, ImpType::Circle),
            Some(ImpType::Circle)
        );
        assert_eq!(
            ImpType::lowermost(ImpType::Point, ImpType::Any),
            Some(ImpType::Point)
        );
        assert_eq!(ImpType::lowermost(ImpType::Point, ImpType::Segment), None);
    }

    #[test]
    fn test_type_names_roundtrip() {
        for t in [ImpType::AbstractLine, ImpType::Circle, ImpType::Any] {
            assert_eq!(ImpType::from_name(t.name()), Some(t));
        }
    }

    #[test]
    fn test_translate_circle_stays_circle() {
        let c = ObjectImp::Circle(CircleData::new(Coordinate::new(1.0, 1.0), 2.0));
        let t = Transformation::translation(&Vector2::new(3.0, -1.0));
        match c.transform(&t) {
            ObjectImp::Circle(r) => {
                assert!((r.center - Coordinate::new(4.0, 0.0)).norm() < 1e-12);
                assert!((r.radius - 2.0).abs() < 1e-12);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_under_affinity_becomes_conic() {
        let c = ObjectImp::Circle(CircleData::new(Coordinate::new(0.0, 0.0), 1.0));
        let t = Transformation::scaling_over_line(
            2.0,
            &LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)),
        );
        let r = c.transform(&t);
        assert_eq!(r.imp_type(), ImpType::Conic);
        let cart = r.as_conic_cartesian().unwrap();
        // 原点中心、半轴 1 和 2 的椭圆经过 (0, 2)
        assert!(cart.eval(&Coordinate::new(0.0, 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_scalars_are_unchanged_by_transform() {
        let t = Transformation::rotation(1.0, &Coordinate::new(0.0, 0.0));
        assert_eq!(ObjectImp::Double(2.5).transform(&t), ObjectImp::Double(2.5));
        assert_eq!(ObjectImp::Invalid.transform(&t), ObjectImp::Invalid);
    }

    /// (x, y) ↦ (x, y) / (1 + x)，临界线为 x = -1
    fn projectivity() -> Transformation {
        let from = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)].map(|(x, y)| Coordinate::new(x, y));
        let to = [(0.0, 0.0), (0.5, 0.0), (0.0, 1.0), (0.5, 0.5)].map(|(x, y)| Coordinate::new(x, y));
        Transformation::projectivity_gi4p(&from, &to).unwrap()
    }

    #[test]
    fn test_non_affine_ray_becomes_segment() {
        let t = projectivity();
        assert!(!t.is_affine());
        let ray = ObjectImp::Ray(LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)));
        match ray.transform(&t) {
            // 第二个端点是无穷远点 (1, 0) 方向的像
            ObjectImp::Segment(l) => {
                assert!(l.a.coords.norm() < 1e-9);
                assert!((l.b - Coordinate::new(1.0, 0.0)).norm() < 1e-9);
            }
            other => panic!("expected segment, got {other:?}"),
        }

        let towards_critical =
            ObjectImp::Ray(LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(-1.0, 0.5)));
        assert_eq!(towards_critical.transform(&t), ObjectImp::Invalid);
    }

    #[test]
    fn test_segment_straddling_critical_line_is_invalid() {
        let t = projectivity();
        let straddling =
            ObjectImp::Segment(LineData::new(Coordinate::new(0.0, 0.0), Coordinate::new(-2.0, 0.0)));
        assert_eq!(straddling.transform(&t), ObjectImp::Invalid);

        let one_side = ObjectImp::Segment(LineData::new(Coordinate::new(1.0, 0.0), Coordinate::new(3.0, 1.0)));
        let l = one_side.transform(&t).as_line().unwrap();
        assert!((l.a - Coordinate::new(0.5, 0.0)).norm() < 1e-9);
        assert!((l.b - Coordinate::new(0.75, 0.25)).norm() < 1e-9);
    }
}
