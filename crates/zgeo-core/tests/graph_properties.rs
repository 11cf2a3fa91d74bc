//! 计算图的性质测试：无环、重算顺序正确、重算幂等

use proptest::prelude::*;
use std::collections::HashSet;
use std::rc::Rc;
use zgeo_core::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// 以两个已有节点为父建中点
    Mid(usize, usize),
    /// 以已有点为父建线段，再取其长度
    Length(usize, usize),
    /// 把第一个节点（若是类型节点）的父节点换成另外两个
    Rewire(usize, usize, usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Mid(a, b)),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Length(a, b)),
        2 => (any::<usize>(), any::<usize>(), any::<usize>()).prop_map(|(n, a, b)| Op::Rewire(n, a, b)),
    ]
}

struct Graph {
    reg: TypeRegistry,
    roots: Vec<CalcerRef>,
    nodes: Vec<CalcerRef>,
}

impl Graph {
    fn new(coords: &[(f64, f64)]) -> Self {
        let roots: Vec<CalcerRef> = coords
            .iter()
            .map(|&(x, y)| ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(x, y))))
            .collect();
        Self {
            reg: TypeRegistry::with_builtin_types(),
            nodes: roots.clone(),
            roots,
        }
    }

    fn pick(&self, i: usize) -> CalcerRef {
        self.nodes[i % self.nodes.len()].clone()
    }

    fn apply(&mut self, op: &Op) {
        match *op {
            Op::Mid(a, b) => {
                let parents = vec![self.pick(a), self.pick(b)];
                let c = ObjectCalcer::new_type(self.reg.get("MidPoint").unwrap(), parents);
                self.nodes.push(c);
            }
            Op::Length(a, b) => {
                let parents = vec![self.pick(a), self.pick(b)];
                let seg = ObjectCalcer::new_type(self.reg.get("SegmentAB").unwrap(), parents);
                self.nodes.push(ObjectCalcer::new_property(seg.clone(), "length"));
                self.nodes.push(seg);
            }
            Op::Rewire(n, a, b) => {
                let node = self.pick(n);
                let parents = vec![self.pick(a), self.pick(b)];
                // 会成环或不是类型节点时被拒绝，图保持不变
                let _ = node.set_parents(parents);
            }
        }
    }
}

/// 从 `start` 沿父节点能否回到 `start`
fn reaches_itself(start: &CalcerRef) -> bool {
    let mut stack = start.parents();
    let mut seen = HashSet::new();
    while let Some(c) = stack.pop() {
        if Rc::ptr_eq(&c, start) {
            return true;
        }
        if seen.insert(Rc::as_ptr(&c)) {
            stack.extend(c.parents());
        }
    }
    false
}

fn coords() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-100.0..100.0f64, -100.0..100.0f64), 2..5)
}

proptest! {
    #[test]
    fn test_graph_stays_acyclic(coords in coords(), ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut g = Graph::new(&coords);
        for op in &ops {
            g.apply(op);
        }
        for n in &g.nodes {
            prop_assert!(!reaches_itself(n));
        }
    }

    #[test]
    fn test_calc_path_respects_ancestors(coords in coords(), ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut g = Graph::new(&coords);
        for op in &ops {
            g.apply(op);
        }
        let path = calc_path(&g.roots);
        let position = |c: &CalcerRef| path.iter().position(|p| Rc::ptr_eq(p, c));

        let unique: HashSet<_> = path.iter().map(Rc::as_ptr).collect();
        prop_assert_eq!(unique.len(), path.len());
        for (i, c) in path.iter().enumerate() {
            for p in c.parents() {
                if let Some(j) = position(&p) {
                    prop_assert!(j < i);
                }
            }
        }
    }

    #[test]
    fn test_recalc_is_idempotent(coords in coords(), ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut g = Graph::new(&coords);
        for op in &ops {
            g.apply(op);
        }
        let cfg = EngineConfig::default();
        let path = calc_path(&g.roots);
        recalc(&path, &cfg);
        let first: Vec<Rc<ObjectImp>> = path.iter().map(|c| c.imp()).collect();
        recalc(&path, &cfg);
        for (c, before) in path.iter().zip(&first) {
            prop_assert_eq!(&*c.imp(), &**before);
        }
    }
}
