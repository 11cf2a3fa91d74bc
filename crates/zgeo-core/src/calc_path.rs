//! 重算顺序
//!
//! 按子节点逐层向下展开，再从后往前去重：每个节点只保留最后一次出现，
//! 这一次一定排在它所有祖先之后。

use crate::calcer::{CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use std::collections::HashSet;
use std::rc::Rc;

/// `roots` 及其全部后代，按依赖顺序排列，每个节点恰好出现一次
pub fn calc_path(roots: &[CalcerRef]) -> Vec<CalcerRef> {
    let mut all: Vec<CalcerRef> = roots.to_vec();
    let mut layer: Vec<CalcerRef> = roots.to_vec();
    while !layer.is_empty() {
        let mut seen = HashSet::new();
        let mut next = Vec::new();
        for c in &layer {
            for child in c.children() {
                // 同一层内去重，避免菱形结构导致的指数增长
                if seen.insert(Rc::as_ptr(&child)) {
                    next.push(child);
                }
            }
        }
        all.extend(next.iter().cloned());
        layer = next;
    }

    let mut done = HashSet::new();
    let mut ret: Vec<CalcerRef> = all
        .into_iter()
        .rev()
        .filter(|c| done.insert(Rc::as_ptr(c)))
        .collect();
    ret.reverse();
    ret
}

/// 从 `roots` 往下到达 `target` 的路径上的节点
///
/// 结果按依赖顺序排列，不含 `roots` 本身和 `target`。
pub fn calc_path_to(roots: &[CalcerRef], target: &ObjectCalcer) -> Vec<CalcerRef> {
    let mut ancestors: HashSet<*const ObjectCalcer> = HashSet::new();
    let mut stack = target.parents();
    while let Some(c) = stack.pop() {
        if ancestors.insert(Rc::as_ptr(&c)) {
            stack.extend(c.parents());
        }
    }

    let below: Vec<CalcerRef> = roots.iter().flat_map(|r| r.children()).collect();
    calc_path(&below)
        .into_iter()
        .filter(|c| ancestors.contains(&Rc::as_ptr(c)))
        .collect()
}

/// 按给定顺序逐个重算
pub fn recalc(path: &[CalcerRef], cfg: &EngineConfig) {
    for c in path {
        c.calc(cfg);
    }
}
