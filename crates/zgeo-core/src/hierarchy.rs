//! 对象层次模板
//!
//! 从一组给定对象到若干结果对象之间的具体子图，抽象成可重放的模板。
//! 模板节点按依赖顺序存放：每个节点的父节点下标都小于它自己。

use crate::calcer::{CalcerKind, CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use crate::error::HierarchyError;
use crate::imp::{ImpType, ObjectImp};
use crate::registry::TypeRegistry;
use crate::types::{CopyType, ObjectType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

/// 模板节点
#[derive(Debug, Clone)]
pub enum HierarchyNode {
    /// 模板输入，只按位置区分
    Given { requirement: ImpType },
    /// 捕获时固化下来的值
    Const { imp: ObjectImp },
    ApplyType {
        ty: Rc<dyn ObjectType>,
        parents: Vec<usize>,
    },
    FetchProperty { parent: usize, property: String },
}

impl HierarchyNode {
    pub fn parents(&self) -> &[usize] {
        match self {
            HierarchyNode::Given { .. } | HierarchyNode::Const { .. } => &[],
            HierarchyNode::ApplyType { parents, .. } => parents,
            HierarchyNode::FetchProperty { parent, .. } => std::slice::from_ref(parent),
        }
    }

    fn is_given(&self) -> bool {
        matches!(self, HierarchyNode::Given { .. })
    }
}

/// 可重放的构造模板
#[derive(Debug, Clone)]
pub struct ObjectHierarchy {
    nodes: Vec<HierarchyNode>,
    finals: Vec<usize>,
}

/// `fill_up` 的结果
#[derive(Debug)]
pub struct FillUp {
    /// 新建的全部计算节点，按建立顺序
    pub built: Vec<CalcerRef>,
    /// 与模板结果一一对应的节点
    pub finals: Vec<CalcerRef>,
}

/// 加载模板时被跳过的元素
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedElement {
    pub id: usize,
    pub reason: String,
}

/// 模板的持久化形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyRecord {
    pub elements: Vec<ElementRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub id: usize,
    pub type_name: String,
    #[serde(default)]
    pub given: bool,
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub parents: Vec<usize>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

const GIVEN: &str = "Given";
const CONST: &str = "Const";
const FETCH_PROPERTY: &str = "FetchProperty";

type SeenMap = HashMap<*const ObjectCalcer, usize>;

/// 捕获过程的工作状态
struct Capture {
    nodes: Vec<HierarchyNode>,
    seen: SeenMap,
}

impl Capture {
    fn push(&mut self, node: HierarchyNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// 访问节点，返回它在模板中的下标
    ///
    /// 不依赖给定对象且不被需要的节点返回 `None`，由使用方固化成常量。
    fn visit(&mut self, o: &CalcerRef, needed: bool, needed_at_end: bool) -> Option<usize> {
        if let Some(&id) = self.seen.get(&Rc::as_ptr(o)) {
            if needed_at_end {
                // 已经出现过的结果在末尾再复制一次
                let copy: Rc<dyn ObjectType> = Rc::new(CopyType);
                return Some(self.push(HierarchyNode::ApplyType {
                    ty: copy,
                    parents: vec![id],
                }));
            }
            return Some(id);
        }

        let parents = o.parents();
        let parent_ids: Vec<Option<usize>> =
            parents.iter().map(|p| self.visit(p, false, false)).collect();
        if parent_ids.iter().all(Option::is_none) {
            if !needed {
                return None;
            }
            let id = self.push(HierarchyNode::Const {
                imp: (*o.imp()).clone(),
            });
            self.seen.insert(Rc::as_ptr(o), id);
            return Some(id);
        }
        Some(self.store(o, &parents, parent_ids))
    }

    fn store(&mut self, o: &CalcerRef, parents: &[CalcerRef], ids: Vec<Option<usize>>) -> usize {
        let mut resolved = Vec::with_capacity(ids.len());
        for (parent, id) in parents.iter().zip(ids) {
            let id = match id {
                Some(id) => id,
                None => {
                    let id = self.push(HierarchyNode::Const {
                        imp: (*parent.imp()).clone(),
                    });
                    self.seen.insert(Rc::as_ptr(parent), id);
                    id
                }
            };
            if let HierarchyNode::Given { requirement } = &mut self.nodes[id] {
                let req = o.imp_requirement(parent);
                *requirement = ImpType::lowermost(*requirement, req).unwrap_or(*requirement);
            }
            resolved.push(id);
        }

        let node = match o.kind() {
            CalcerKind::Type { ty, .. } => HierarchyNode::ApplyType {
                ty: ty.clone(),
                parents: resolved,
            },
            CalcerKind::Property { name, .. } => HierarchyNode::FetchProperty {
                parent: resolved[0],
                property: name.clone(),
            },
            CalcerKind::Const => HierarchyNode::Const {
                imp: (*o.imp()).clone(),
            },
        };
        let id = self.push(node);
        self.seen.insert(Rc::as_ptr(o), id);
        id
    }
}

impl ObjectHierarchy {
    /// 从具体子图捕获模板
    ///
    /// 给定对象占据前 `given.len()` 个位置；既不依赖给定对象、又被结果
    /// 直接用到的对象固化成常量。
    pub fn capture(given: &[CalcerRef], finals: &[CalcerRef]) -> Self {
        let mut cap = Capture {
            nodes: Vec::new(),
            seen: SeenMap::new(),
        };
        for g in given {
            let id = cap.push(HierarchyNode::Given {
                requirement: ImpType::Any,
            });
            cap.seen.insert(Rc::as_ptr(g), id);
        }
        for f in finals {
            for p in f.parents() {
                cap.visit(&p, true, false);
            }
        }
        let finals = finals
            .iter()
            .filter_map(|f| cap.visit(f, true, true))
            .collect();
        let ret = Self {
            nodes: cap.nodes,
            finals,
        };
        tracing::debug!(
            nodes = ret.nodes.len(),
            given = ret.number_of_args(),
            finals = ret.finals.len(),
            "hierarchy captured"
        );
        ret
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn finals(&self) -> &[usize] {
        &self.finals
    }

    fn given_indices(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_given())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn number_of_args(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_given()).count()
    }

    pub fn number_of_results(&self) -> usize {
        self.finals.len()
    }

    /// 各给定对象至少要是的类型，按位置
    pub fn arg_requirements(&self) -> Vec<ImpType> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                HierarchyNode::Given { requirement } => Some(*requirement),
                _ => None,
            })
            .collect()
    }

    /// 每个给定对象都被某个结果用到
    pub fn all_given_objects_used(&self) -> bool {
        let mut needed = vec![false; self.nodes.len()];
        for &f in &self.finals {
            needed[f] = true;
        }
        for i in (0..self.nodes.len()).rev() {
            if needed[i] {
                for &p in self.nodes[i].parents() {
                    needed[p] = true;
                }
            }
        }
        self.given_indices().into_iter().all(|i| needed[i])
    }

    /// 存在不依赖任何给定对象的结果
    pub fn result_does_not_depend_on_given(&self) -> bool {
        let mut depends = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            depends[i] = node.is_given() || node.parents().iter().any(|&p| depends[p]);
        }
        self.finals.iter().any(|&f| !depends[f])
    }

    /// 把前 `values.len()` 个给定对象固定成常量
    pub fn with_fixed_args(&self, values: &[ObjectImp]) -> Result<Self, HierarchyError> {
        let given = self.given_indices();
        if values.len() > given.len() {
            return Err(HierarchyError::GivenCountMismatch {
                expected: given.len(),
                got: values.len(),
            });
        }
        let mut ret = self.clone();
        for (&i, value) in given.iter().zip(values) {
            ret.nodes[i] = HierarchyNode::Const { imp: value.clone() };
        }
        Ok(ret)
    }

    /// 对新的给定对象重放模板
    ///
    /// 按层建立：父节点全部就绪的元素进入当前层。返回的节点尚未计算。
    pub fn fill_up(&self, givens: &[CalcerRef]) -> Result<FillUp, HierarchyError> {
        let given = self.given_indices();
        if givens.len() != given.len() {
            return Err(HierarchyError::GivenCountMismatch {
                expected: given.len(),
                got: givens.len(),
            });
        }

        let mut bound: Vec<Option<CalcerRef>> = vec![None; self.nodes.len()];
        for (&i, g) in given.iter().zip(givens) {
            bound[i] = Some(g.clone());
        }

        let mut built = Vec::new();
        let mut layer = 0;
        loop {
            let ready: Vec<usize> = (0..self.nodes.len())
                .filter(|&i| {
                    bound[i].is_none()
                        && self.nodes[i]
                            .parents()
                            .iter()
                            .all(|&p| bound.get(p).is_some_and(Option::is_some))
                })
                .collect();
            if ready.is_empty() {
                break;
            }
            tracing::debug!(layer, elements = ready.len(), "fill up layer");

            for i in ready {
                let bound_at = |p: usize| bound[p].clone();
                let calcer = match &self.nodes[i] {
                    HierarchyNode::Given { .. } => continue,
                    HierarchyNode::Const { imp } => ObjectCalcer::new_const(imp.clone()),
                    HierarchyNode::ApplyType { ty, parents } => {
                        let parents = parents.iter().filter_map(|&p| bound_at(p)).collect();
                        ObjectCalcer::new_type(ty.clone(), parents)
                    }
                    HierarchyNode::FetchProperty { parent: p, property } => {
                        let Some(parent) = bound_at(*p) else { continue };
                        ObjectCalcer::new_property(parent, property.clone())
                    }
                };
                built.push(calcer.clone());
                bound[i] = Some(calcer);
            }
            layer += 1;
        }

        let unbuilt: Vec<usize> = (0..self.nodes.len()).filter(|&i| bound[i].is_none()).collect();
        if !unbuilt.is_empty() {
            return Err(HierarchyError::Unbuildable(unbuilt));
        }
        let finals = self.finals.iter().filter_map(|&f| bound[f].clone()).collect();
        Ok(FillUp { built, finals })
    }

    /// `fill_up` 之后按建立顺序计算新节点
    pub fn fill_up_and_calc(
        &self,
        givens: &[CalcerRef],
        cfg: &EngineConfig,
    ) -> Result<FillUp, HierarchyError> {
        let ret = self.fill_up(givens)?;
        for c in &ret.built {
            c.calc(cfg);
        }
        Ok(ret)
    }

    /// 不建计算节点，直接由给定值算出各结果值
    pub fn calc(
        &self,
        args: &[&ObjectImp],
        cfg: &EngineConfig,
    ) -> Result<Vec<ObjectImp>, HierarchyError> {
        let given = self.given_indices();
        if args.len() != given.len() {
            return Err(HierarchyError::GivenCountMismatch {
                expected: given.len(),
                got: args.len(),
            });
        }

        let mut given_values = args.iter();
        let mut stack: Vec<ObjectImp> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = match node {
                HierarchyNode::Given { .. } => {
                    given_values.next().map_or(ObjectImp::Invalid, |a| (*a).clone())
                }
                HierarchyNode::Const { imp } => imp.clone(),
                HierarchyNode::ApplyType { ty, parents } => {
                    let args: Vec<&ObjectImp> = parents.iter().map(|&p| &stack[p]).collect();
                    if ty.check_args(&args) {
                        ty.calc(&args, cfg)
                    } else {
                        ObjectImp::Invalid
                    }
                }
                HierarchyNode::FetchProperty { parent, property } => {
                    let imp = &stack[*parent];
                    match imp.property_index(property) {
                        Some(i) if imp.valid() => imp.property(i, cfg),
                        _ => ObjectImp::Invalid,
                    }
                }
            };
            stack.push(value);
        }
        Ok(self.finals.iter().map(|&f| stack[f].clone()).collect())
    }

    /// 转成持久化形式；元素编号从 1 开始
    pub fn to_record(&self) -> Result<HierarchyRecord, HierarchyError> {
        let finals: HashSet<usize> = self.finals.iter().copied().collect();
        let mut elements = Vec::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            let mut params = BTreeMap::new();
            let type_name = match node {
                HierarchyNode::Given { requirement } => {
                    params.insert("requirement".to_owned(), requirement.name().to_owned());
                    GIVEN.to_owned()
                }
                HierarchyNode::Const { imp } => {
                    params.insert("value".to_owned(), serde_json::to_string(imp)?);
                    CONST.to_owned()
                }
                HierarchyNode::ApplyType { ty, .. } => ty.name().to_owned(),
                HierarchyNode::FetchProperty { property, .. } => {
                    params.insert("property".to_owned(), property.clone());
                    FETCH_PROPERTY.to_owned()
                }
            };
            elements.push(ElementRecord {
                id: i + 1,
                type_name,
                given: node.is_given(),
                is_final: finals.contains(&i),
                parents: node.parents().iter().map(|p| p + 1).collect(),
                params,
            });
        }
        Ok(HierarchyRecord { elements })
    }

    /// 从持久化形式恢复
    ///
    /// 引用未知类型、越界父节点或参数损坏的元素被跳过，依赖它们的元素
    /// 一并跳过；跳过的元素在返回值中列出。没有剩余结果时报错。
    pub fn from_record(
        record: &HierarchyRecord,
        registry: &TypeRegistry,
    ) -> Result<(Self, Vec<SkippedElement>), HierarchyError> {
        let known: HashSet<usize> = record.elements.iter().map(|e| e.id).collect();
        let mut index: HashMap<usize, usize> = HashMap::new();
        let mut nodes = Vec::new();
        let mut skipped = Vec::new();
        let skip = |skipped: &mut Vec<SkippedElement>, id: usize, reason: String| {
            tracing::warn!(id, %reason, "skipping template element");
            skipped.push(SkippedElement { id, reason });
        };

        for e in record.elements.iter().filter(|e| e.given) {
            let requirement = e
                .params
                .get("requirement")
                .and_then(|r| ImpType::from_name(r))
                .unwrap_or(ImpType::Any);
            index.insert(e.id, nodes.len());
            nodes.push(HierarchyNode::Given { requirement });
        }

        let mut pending: Vec<&ElementRecord> = Vec::new();
        for e in record.elements.iter().filter(|e| !e.given) {
            match e.parents.iter().find(|p| !known.contains(p)) {
                Some(&parent) => skip(
                    &mut skipped,
                    e.id,
                    HierarchyError::ParentOutOfRange {
                        element: e.id,
                        parent,
                    }
                    .to_string(),
                ),
                None => pending.push(e),
            }
        }

        loop {
            let (ready, rest): (Vec<&ElementRecord>, Vec<&ElementRecord>) = pending
                .into_iter()
                .partition(|e| e.parents.iter().all(|p| index.contains_key(p)));
            pending = rest;
            if ready.is_empty() {
                break;
            }
            for e in ready {
                let parents: Vec<usize> = e.parents.iter().map(|p| index[p]).collect();
                match Self::node_from_record(e, parents, registry) {
                    Ok(node) => {
                        index.insert(e.id, nodes.len());
                        nodes.push(node);
                    }
                    Err(err) => skip(&mut skipped, e.id, err.to_string()),
                }
            }
        }
        for e in pending {
            skip(
                &mut skipped,
                e.id,
                "depends on an element that could not be loaded".to_owned(),
            );
        }

        let finals: Vec<usize> = record
            .elements
            .iter()
            .filter(|e| e.is_final)
            .filter_map(|e| index.get(&e.id).copied())
            .collect();
        if finals.is_empty() {
            return Err(HierarchyError::NoFinals);
        }
        Ok((Self { nodes, finals }, skipped))
    }

    fn node_from_record(
        e: &ElementRecord,
        parents: Vec<usize>,
        registry: &TypeRegistry,
    ) -> Result<HierarchyNode, HierarchyError> {
        let param = |name: &str| {
            e.params.get(name).ok_or_else(|| HierarchyError::BadParameter {
                element: e.id,
                param: name.to_owned(),
            })
        };
        match e.type_name.as_str() {
            CONST => {
                let value = param("value")?;
                let imp = serde_json::from_str(value).map_err(|_| HierarchyError::BadParameter {
                    element: e.id,
                    param: "value".to_owned(),
                })?;
                Ok(HierarchyNode::Const { imp })
            }
            FETCH_PROPERTY => match parents.as_slice() {
                [parent] => Ok(HierarchyNode::FetchProperty {
                    parent: *parent,
                    property: param("property")?.clone(),
                }),
                _ => Err(HierarchyError::BadParameter {
                    element: e.id,
                    param: "parents".to_owned(),
                }),
            },
            name => {
                let ty = registry
                    .get(name)
                    .ok_or_else(|| HierarchyError::UnknownType(name.to_owned()))?;
                Ok(HierarchyNode::ApplyType { ty, parents })
            }
        }
    }
}
