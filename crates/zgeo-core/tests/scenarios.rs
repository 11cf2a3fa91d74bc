//! 端到端场景：构造、退化、宏模板重放、三次曲线拟合、菱形依赖

use std::rc::Rc;
use zgeo_core::prelude::*;

fn point(x: f64, y: f64) -> CalcerRef {
    ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(x, y)))
}

fn build(reg: &TypeRegistry, name: &str, parents: Vec<CalcerRef>) -> CalcerRef {
    reg.build(name, parents, &Default::default()).unwrap()
}

#[test]
fn test_circle_through_three_points() {
    let reg = TypeRegistry::with_builtin_types();
    let cfg = EngineConfig::default();
    let p1 = point(1.0, 0.0);
    let p2 = point(-0.5, 2.0);
    let p3 = point(3.0, 4.0);
    let circle = build(&reg, "CircleBTP", vec![p1.clone(), p2.clone(), p3.clone()]);
    recalc(&calc_path(&[p1.clone(), p2.clone(), p3.clone()]), &cfg);

    let c = circle.imp().as_circle().unwrap();
    let radii: Vec<f64> = [&p1, &p2, &p3]
        .iter()
        .map(|p| (p.imp().as_point().unwrap() - c.center).norm())
        .collect();
    for r in &radii {
        assert!((r - radii[0]).abs() <= 1e-9 * radii[0]);
    }
}

#[test]
fn test_collinear_points_propagate_invalid() {
    let reg = TypeRegistry::with_builtin_types();
    let cfg = EngineConfig::default();
    let p1 = point(0.0, 0.0);
    let p2 = point(1.0, 1.0);
    let p3 = point(5.0, 0.0);
    let circle = build(&reg, "CircleBTP", vec![p1.clone(), p2.clone(), p3.clone()]);
    let radius = ObjectCalcer::new_property(circle.clone(), "radius");
    recalc(&calc_path(&[p1.clone(), p2.clone(), p3.clone()]), &cfg);
    assert!(circle.imp().valid());
    assert!(radius.imp().as_double().is_some());

    p3.set_imp(ObjectImp::Point(Coordinate::new(3.0, 3.0))).unwrap();
    recalc(&calc_path(&[p3.clone()]), &cfg);
    assert_eq!(*circle.imp(), ObjectImp::Invalid);
    assert_eq!(*radius.imp(), ObjectImp::Invalid);
}

#[test]
fn test_macro_replays_midpoint() {
    let reg = TypeRegistry::with_builtin_types();
    let cfg = EngineConfig::default();
    let a = point(0.0, 0.0);
    let b = point(4.0, 2.0);
    let mid = build(&reg, "MidPoint", vec![a.clone(), b.clone()]);
    let h = ObjectHierarchy::capture(&[a, b], &[mid]);

    let json = serde_json::to_string(&h.to_record().unwrap()).unwrap();
    let record: HierarchyRecord = serde_json::from_str(&json).unwrap();
    let (h2, skipped) = ObjectHierarchy::from_record(&record, &reg).unwrap();
    assert!(skipped.is_empty());

    let x = point(-3.0, 7.0);
    let y = point(5.0, 1.0);
    let r = h2.fill_up_and_calc(&[x, y], &cfg).unwrap();
    assert_eq!(r.finals[0].imp().as_point(), Some(Coordinate::new(1.0, 4.0)));
}

#[test]
fn test_cubic_through_nine_points() {
    let reg = TypeRegistry::with_builtin_types();
    let coords = [
        (0.0, 0.0),
        (1.0, 0.0),
        (0.0, 1.0),
        (2.0, 1.0),
        (1.0, 3.0),
        (-1.0, 2.0),
        (3.0, -1.0),
        (-2.0, -1.0),
        (2.0, 3.0),
    ];
    let points: Vec<CalcerRef> = coords.iter().map(|&(x, y)| point(x, y)).collect();
    let cubic = build(&reg, "CubicB9P", points.clone());
    cubic.calc(&EngineConfig::default());

    let data = cubic.imp().as_cubic().unwrap();
    for &(x, y) in &coords {
        let (f, _, _) = data.eval_with_gradient(&Coordinate::new(x, y));
        assert!(f.abs() < 1e-7, "f({x}, {y}) = {f}");
    }
}

#[test]
fn test_diamond_calc_path() {
    let reg = TypeRegistry::with_builtin_types();
    let root = point(0.0, 0.0);
    let other = point(2.0, 2.0);
    let a = build(&reg, "MidPoint", vec![root.clone(), other.clone()]);
    let b = build(&reg, "SegmentAB", vec![root.clone(), other.clone()]);
    let sink = build(&reg, "MidPoint", vec![a.clone(), b.clone()]);

    let path = calc_path(&[root.clone()]);
    assert_eq!(path.len(), 4);
    assert!(Rc::ptr_eq(&path[0], &root));
    assert!(Rc::ptr_eq(&path[3], &sink));
    let middle: Vec<bool> = path[1..3]
        .iter()
        .map(|c| Rc::ptr_eq(c, &a) || Rc::ptr_eq(c, &b))
        .collect();
    assert_eq!(middle, vec![true, true]);
}

#[test]
fn test_drag_fixed_point_updates_dependents() {
    let reg = TypeRegistry::with_builtin_types();
    let cfg = EngineConfig::default();
    let fixed = |x: f64, y: f64| {
        build(
            &reg,
            "FixedPoint",
            vec![
                ObjectCalcer::new_const(ObjectImp::Double(x)),
                ObjectCalcer::new_const(ObjectImp::Double(y)),
            ],
        )
    };
    let a = fixed(0.0, 0.0);
    let b = fixed(2.0, 0.0);
    let seg = build(&reg, "SegmentAB", vec![a.clone(), b.clone()]);
    let len = ObjectCalcer::new_property(seg.clone(), "length");
    let roots: Vec<CalcerRef> = a.parents().into_iter().chain(b.parents()).collect();
    recalc(&calc_path(&roots), &cfg);
    assert_eq!(*len.imp(), ObjectImp::Double(2.0));

    assert!(a.can_move());
    a.move_to(&Coordinate::new(2.0, 5.0), &cfg).unwrap();
    recalc(&calc_path(&a.movable_parents()), &cfg);
    assert_eq!(a.imp().as_point(), Some(Coordinate::new(2.0, 5.0)));
    assert_eq!(*len.imp(), ObjectImp::Double(5.0));
}

#[test]
fn test_line_conic_roots_are_separate_nodes() {
    let reg = TypeRegistry::with_builtin_types();
    let cfg = EngineConfig::default();
    let center = point(0.0, 0.0);
    let through = point(1.0, 0.0);
    let circle = build(&reg, "CircleBCP", vec![center.clone(), through.clone()]);
    let p = point(-2.0, 0.0);
    let q = point(2.0, 0.0);
    let line = build(&reg, "LineAB", vec![p.clone(), q.clone()]);

    let roots = build_intersection_roots(
        reg.get("ConicLineIntersection").unwrap(),
        &[circle, line],
        &[-1, 1],
    );
    assert_eq!(roots.len(), 2);
    recalc(&calc_path(&[center, through, p, q]), &cfg);
    let mut xs: Vec<f64> = roots
        .iter()
        .map(|r| r.imp().as_point().unwrap().x)
        .collect();
    xs.sort_by(f64::total_cmp);
    assert!((xs[0] + 1.0).abs() < 1e-12);
    assert!((xs[1] - 1.0).abs() < 1e-12);
}
