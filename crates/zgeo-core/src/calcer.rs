//! 计算节点
//!
//! 依赖图的节点分三种：常量节点直接持有值；类型节点由构造类型从父节点的
//! 值算出自己的值；属性节点取父节点值的某个属性。
//!
//! 所有权：子节点强引用父节点，父节点只弱引用子节点。没有外部持有者
//! 也没有子节点的计算节点随即被释放，释放时从父节点的子节点表中注销。

use crate::calc_path::calc_path;
use crate::config::EngineConfig;
use crate::error::CalcerError;
use crate::imp::{ImpType, ObjectImp};
use crate::math::{invalid_coord, Coordinate};
use crate::types::ObjectType;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

/// 计算节点的共享引用
pub type CalcerRef = Rc<ObjectCalcer>;

/// 计算节点的种类
pub enum CalcerKind {
    /// 值由外部设置
    Const,
    /// 值由构造类型计算
    Type {
        ty: Rc<dyn ObjectType>,
        parents: RefCell<Vec<CalcerRef>>,
    },
    /// 值是父节点值的一个属性
    Property {
        parent: CalcerRef,
        name: String,
        /// 上次解析属性名时父值的类型及得到的下标
        cache: Cell<Option<(ImpType, Option<usize>)>>,
    },
}

/// 计算节点
pub struct ObjectCalcer {
    imp: RefCell<Rc<ObjectImp>>,
    children: RefCell<Vec<Weak<ObjectCalcer>>>,
    kind: CalcerKind,
}

impl ObjectCalcer {
    fn new(kind: CalcerKind, imp: ObjectImp) -> CalcerRef {
        let calcer = Rc::new(Self {
            imp: RefCell::new(Rc::new(imp)),
            children: RefCell::new(Vec::new()),
            kind,
        });
        // Rc 建好后再登记到父节点，中途失败时由 Drop 注销已登记的部分
        for parent in calcer.parents() {
            parent.children.borrow_mut().push(Rc::downgrade(&calcer));
        }
        calcer
    }

    /// 常量节点
    pub fn new_const(imp: ObjectImp) -> CalcerRef {
        Self::new(CalcerKind::Const, imp)
    }

    /// 类型节点；值在第一次 `calc` 之前为 `Invalid`
    pub fn new_type(ty: Rc<dyn ObjectType>, parents: Vec<CalcerRef>) -> CalcerRef {
        tracing::debug!(ty = ty.name(), parents = parents.len(), "new type calcer");
        Self::new(
            CalcerKind::Type {
                ty,
                parents: RefCell::new(parents),
            },
            ObjectImp::Invalid,
        )
    }

    /// 属性节点
    pub fn new_property(parent: CalcerRef, name: impl Into<String>) -> CalcerRef {
        Self::new(
            CalcerKind::Property {
                parent,
                name: name.into(),
                cache: Cell::new(None),
            },
            ObjectImp::Invalid,
        )
    }

    /// 当前值
    pub fn imp(&self) -> Rc<ObjectImp> {
        self.imp.borrow().clone()
    }

    pub fn kind(&self) -> &CalcerKind {
        &self.kind
    }

    pub fn parents(&self) -> Vec<CalcerRef> {
        match &self.kind {
            CalcerKind::Const => Vec::new(),
            CalcerKind::Type { parents, .. } => parents.borrow().clone(),
            CalcerKind::Property { parent, .. } => vec![parent.clone()],
        }
    }

    /// 仍然存活的子节点；同一子节点多次引用本节点时出现多次
    pub fn children(&self) -> Vec<CalcerRef> {
        self.children
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn is_const(&self) -> bool {
        matches!(self.kind, CalcerKind::Const)
    }

    pub fn object_type(&self) -> Option<&Rc<dyn ObjectType>> {
        match &self.kind {
            CalcerKind::Type { ty, .. } => Some(ty),
            _ => None,
        }
    }

    pub fn property_name(&self) -> Option<&str> {
        match &self.kind {
            CalcerKind::Property { name, .. } => Some(name),
            _ => None,
        }
    }

    /// 改写常量节点的值；调用方随后需要沿 `calc_path` 重算后代
    pub fn set_imp(&self, imp: ObjectImp) -> Result<(), CalcerError> {
        if !self.is_const() {
            return Err(CalcerError::NotAConstCalcer);
        }
        *self.imp.borrow_mut() = Rc::new(imp);
        Ok(())
    }

    /// 替换类型节点的父节点
    ///
    /// 新父节点不能是本节点或其后代。调用方随后需要重算本节点及其后代。
    pub fn set_parents(self: &CalcerRef, new_parents: Vec<CalcerRef>) -> Result<(), CalcerError> {
        let CalcerKind::Type { parents, .. } = &self.kind else {
            return Err(CalcerError::NotATypeCalcer);
        };

        let descendants: HashSet<*const ObjectCalcer> =
            calc_path(std::slice::from_ref(self)).iter().map(Rc::as_ptr).collect();
        if new_parents.iter().any(|p| descendants.contains(&Rc::as_ptr(p))) {
            tracing::warn!("rejected set_parents: would create a cycle");
            return Err(CalcerError::WouldCreateCycle);
        }

        let me = Rc::as_ptr(self);
        let old = std::mem::replace(&mut *parents.borrow_mut(), new_parents.clone());
        for p in &old {
            p.remove_child(me);
        }
        for p in &new_parents {
            p.children.borrow_mut().push(Rc::downgrade(self));
        }
        tracing::debug!(old = old.len(), new = new_parents.len(), "calcer reparented");
        Ok(())
    }

    /// 注销一条指向 `child` 的子节点记录
    fn remove_child(&self, child: *const ObjectCalcer) {
        let mut children = self.children.borrow_mut();
        if let Some(pos) = children.iter().position(|w| Weak::as_ptr(w) == child) {
            children.remove(pos);
        }
    }

    /// 由父节点的当前值重算本节点的值；常量节点不变
    pub fn calc(&self, cfg: &EngineConfig) {
        let new = match &self.kind {
            CalcerKind::Const => return,
            CalcerKind::Type { ty, parents } => {
                let imps: Vec<Rc<ObjectImp>> = parents.borrow().iter().map(|p| p.imp()).collect();
                let args: Vec<&ObjectImp> = imps.iter().map(Rc::as_ref).collect();
                if ty.check_args(&args) {
                    ty.calc(&args, cfg)
                } else {
                    ObjectImp::Invalid
                }
            }
            CalcerKind::Property {
                parent,
                name,
                cache,
            } => {
                let parent_imp = parent.imp();
                if !parent_imp.valid() {
                    ObjectImp::Invalid
                } else {
                    let kind = parent_imp.imp_type();
                    let index = match cache.get() {
                        Some((cached_kind, index)) if cached_kind == kind => index,
                        _ => {
                            let index = parent_imp.property_index(name);
                            cache.set(Some((kind, index)));
                            index
                        }
                    };
                    index.map_or(ObjectImp::Invalid, |i| parent_imp.property(i, cfg))
                }
            }
        };
        *self.imp.borrow_mut() = Rc::new(new);
    }

    /// `parent` 作为本节点参数时至少要是什么类型；出现多次时取最具体的要求
    pub fn imp_requirement(&self, parent: &ObjectCalcer) -> ImpType {
        match &self.kind {
            CalcerKind::Const => ImpType::Any,
            CalcerKind::Type { ty, parents } => parents
                .borrow()
                .iter()
                .enumerate()
                .filter(|(_, p)| std::ptr::eq(Rc::as_ptr(p), parent))
                .map(|(i, _)| ty.imp_requirement(i))
                .fold(ImpType::Any, |acc, req| ImpType::lowermost(acc, req).unwrap_or(acc)),
            CalcerKind::Property { parent: p, name, .. } => {
                if !std::ptr::eq(Rc::as_ptr(p), parent) {
                    return ImpType::Any;
                }
                // 沿类型层次上溯到仍具有该属性的最一般类型
                let mut t = p.imp().imp_type();
                if !t.property_names().contains(&name.as_str()) {
                    return ImpType::Any;
                }
                while let Some(up) = t.parent() {
                    if !up.property_names().contains(&name.as_str()) {
                        break;
                    }
                    t = up;
                }
                t
            }
        }
    }

    /// 本节点是否落在 `parent` 上或经过它
    pub fn is_defined_on_or_through(&self, parent: &ObjectCalcer) -> bool {
        match &self.kind {
            CalcerKind::Type { ty, parents } => parents
                .borrow()
                .iter()
                .enumerate()
                .any(|(i, p)| std::ptr::eq(Rc::as_ptr(p), parent) && ty.is_defined_on_or_through(i)),
            _ => false,
        }
    }

    pub fn can_move(&self) -> bool {
        self.object_type().is_some_and(|ty| ty.can_move(self))
    }

    pub fn is_freely_translatable(&self) -> bool {
        self.object_type().is_some_and(|ty| ty.is_freely_translatable(self))
    }

    /// 把本节点移到 `to`，通过改写祖先常量实现
    ///
    /// 调用方随后需要对 `movable_parents` 的 `calc_path` 重算。
    pub fn move_to(&self, to: &Coordinate, cfg: &EngineConfig) -> Result<(), CalcerError> {
        match self.object_type() {
            Some(ty) => ty.move_object(self, to, cfg),
            None => Err(CalcerError::NotATypeCalcer),
        }
    }

    pub fn move_reference_point(&self) -> Coordinate {
        self.object_type()
            .map_or_else(invalid_coord, |ty| ty.move_reference_point(self))
    }

    /// 拖动本节点时会被改写的祖先
    pub fn movable_parents(&self) -> Vec<CalcerRef> {
        self.object_type()
            .map_or_else(Vec::new, |ty| ty.movable_parents(self))
    }
}

impl Drop for ObjectCalcer {
    fn drop(&mut self) {
        let me: *const ObjectCalcer = self;
        match &self.kind {
            CalcerKind::Const => {}
            CalcerKind::Type { parents, .. } => {
                for p in parents.borrow().iter() {
                    p.remove_child(me);
                }
            }
            CalcerKind::Property { parent, .. } => parent.remove_child(me),
        }
    }
}

impl std::fmt::Debug for ObjectCalcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ObjectCalcer");
        match &self.kind {
            CalcerKind::Const => s.field("kind", &"Const"),
            CalcerKind::Type { ty, parents } => s
                .field("type", &ty.name())
                .field("parents", &parents.borrow().len()),
            CalcerKind::Property { name, .. } => s.field("property", name),
        };
        s.field("imp", &self.imp.borrow()).finish()
    }
}
