//! 类型注册表与宏
//!
//! 启动时填入内置类型；定义宏时追加；模板加载和 `build` 时按名字查询。

use crate::calcer::{CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use crate::error::{HierarchyError, MacroError};
use crate::hierarchy::{FillUp, HierarchyNode, HierarchyRecord, ObjectHierarchy, SkippedElement};
use crate::imp::{ImpType, ObjectImp};
use crate::types::{builtin_types, ObjectType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// 按名字查找构造类型
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, Rc<dyn ObjectType>>,
    macros: Vec<Rc<MacroDefinition>>,
}

impl TypeRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 填入全部内置类型
    pub fn with_builtin_types() -> Self {
        let mut ret = Self::new();
        for ty in builtin_types() {
            ret.register(ty);
        }
        ret
    }

    /// 注册类型；同名的旧类型被替换
    pub fn register(&mut self, ty: Rc<dyn ObjectType>) {
        self.types.insert(ty.name().to_owned(), ty);
    }

    pub fn get(&self, name: &str) -> Option<Rc<dyn ObjectType>> {
        self.types.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// 按名字建立计算节点
    ///
    /// `Const` 从 `value` 参数（JSON）取值；`FetchProperty` 需要恰好一个
    /// 父节点和 `property` 参数；其余名字查注册表。
    pub fn build(
        &self,
        name: &str,
        parents: Vec<CalcerRef>,
        params: &BTreeMap<String, String>,
    ) -> Result<CalcerRef, HierarchyError> {
        let bad = |param: &str| HierarchyError::BadParameter {
            element: 0,
            param: param.to_owned(),
        };
        match name {
            "Const" => {
                let value = params.get("value").ok_or_else(|| bad("value"))?;
                let imp: ObjectImp = serde_json::from_str(value)?;
                Ok(ObjectCalcer::new_const(imp))
            }
            "FetchProperty" => {
                let property = params.get("property").ok_or_else(|| bad("property"))?;
                let [parent]: [CalcerRef; 1] = parents.try_into().map_err(|_| bad("parents"))?;
                Ok(ObjectCalcer::new_property(parent, property.clone()))
            }
            _ => {
                let ty = self
                    .get(name)
                    .ok_or_else(|| HierarchyError::UnknownType(name.to_owned()))?;
                Ok(ObjectCalcer::new_type(ty, parents))
            }
        }
    }

    /// 注册宏，同时把它作为一个构造类型登记
    pub fn register_macro(&mut self, def: MacroDefinition) -> Result<(), MacroError> {
        if self.types.contains_key(&def.action_name) {
            return Err(MacroError::DuplicateName(def.action_name));
        }
        let def = Rc::new(def);
        tracing::debug!(name = %def.action_name, args = def.hierarchy.number_of_args(), "macro registered");
        self.register(Rc::new(MacroType { def: def.clone() }));
        self.macros.push(def);
        Ok(())
    }

    pub fn macro_by_name(&self, name: &str) -> Option<&MacroDefinition> {
        self.macros
            .iter()
            .find(|m| m.action_name == name)
            .map(Rc::as_ref)
    }

    pub fn macros(&self) -> impl Iterator<Item = &MacroDefinition> {
        self.macros.iter().map(Rc::as_ref)
    }

    /// 对新的给定对象重放宏，返回未计算的新节点
    pub fn instantiate_macro(&self, name: &str, givens: &[CalcerRef]) -> Result<FillUp, MacroError> {
        let def = self
            .macro_by_name(name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_owned()))?;
        Ok(def.hierarchy.fill_up(givens)?)
    }
}

/// 宏的持久化形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRecord {
    pub action_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub hierarchy: HierarchyRecord,
}

/// 用户定义的宏：恰好一个结果的层次模板
#[derive(Debug, Clone)]
pub struct MacroDefinition {
    pub action_name: String,
    pub description: String,
    pub icon: Option<String>,
    hierarchy: ObjectHierarchy,
}

impl MacroDefinition {
    pub fn new(
        action_name: impl Into<String>,
        description: impl Into<String>,
        hierarchy: ObjectHierarchy,
    ) -> Result<Self, MacroError> {
        if hierarchy.number_of_results() != 1 {
            return Err(MacroError::FinalCount(hierarchy.number_of_results()));
        }
        Ok(Self {
            action_name: action_name.into(),
            description: description.into(),
            icon: None,
            hierarchy,
        })
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn hierarchy(&self) -> &ObjectHierarchy {
        &self.hierarchy
    }

    /// 从持久化形式恢复；模板中被跳过的元素一并返回
    pub fn from_record(
        record: &MacroRecord,
        registry: &TypeRegistry,
    ) -> Result<(Self, Vec<SkippedElement>), MacroError> {
        let finals = record.hierarchy.elements.iter().filter(|e| e.is_final).count();
        if finals != 1 {
            return Err(MacroError::FinalCount(finals));
        }
        let (hierarchy, skipped) = ObjectHierarchy::from_record(&record.hierarchy, registry)?;
        let mut def = Self::new(&*record.action_name, &*record.description, hierarchy)?;
        def.icon = record.icon.clone();
        Ok((def, skipped))
    }

    pub fn to_record(&self) -> Result<MacroRecord, MacroError> {
        Ok(MacroRecord {
            action_name: self.action_name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            hierarchy: self.hierarchy.to_record()?,
        })
    }
}

/// 把宏当作构造类型使用
struct MacroType {
    def: Rc<MacroDefinition>,
}

impl ObjectType for MacroType {
    fn name(&self) -> &str {
        &self.def.action_name
    }

    fn result_type(&self) -> ImpType {
        let h = &self.def.hierarchy;
        match h.finals().first().map(|&f| &h.nodes()[f]) {
            Some(HierarchyNode::ApplyType { ty, .. }) => ty.result_type(),
            Some(HierarchyNode::Const { imp }) => imp.imp_type(),
            _ => ImpType::Any,
        }
    }

    fn check_args(&self, args: &[&ObjectImp]) -> bool {
        let reqs = self.def.hierarchy.arg_requirements();
        args.len() == reqs.len() && args.iter().zip(&reqs).all(|(a, &r)| a.inherits(r))
    }

    fn calc(&self, args: &[&ObjectImp], cfg: &EngineConfig) -> ObjectImp {
        match self.def.hierarchy.calc(args, cfg) {
            Ok(results) => results.into_iter().next().unwrap_or(ObjectImp::Invalid),
            Err(err) => {
                tracing::warn!(name = %self.def.action_name, %err, "macro calc failed");
                ObjectImp::Invalid
            }
        }
    }

    fn imp_requirement(&self, index: usize) -> ImpType {
        self.def
            .hierarchy
            .arg_requirements()
            .get(index)
            .copied()
            .unwrap_or(ImpType::Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Coordinate;

    fn point(x: f64, y: f64) -> CalcerRef {
        ObjectCalcer::new_const(ObjectImp::Point(Coordinate::new(x, y)))
    }

    fn midpoint_macro(reg: &TypeRegistry) -> MacroDefinition {
        let a = point(0.0, 0.0);
        let b = point(1.0, 0.0);
        let m = ObjectCalcer::new_type(reg.get("MidPoint").unwrap(), vec![a.clone(), b.clone()]);
        let h = ObjectHierarchy::capture(&[a, b], &[m]);
        MacroDefinition::new("Middle", "Midpoint of two points", h).unwrap()
    }

    #[test]
    fn test_builtin_lookup() {
        let reg = TypeRegistry::with_builtin_types();
        assert!(reg.get("CircleBTP").is_some());
        assert!(reg.get("Copy").is_some());
        assert!(reg.get("NoSuchType").is_none());
    }

    #[test]
    fn test_build_const_and_property() {
        let reg = TypeRegistry::with_builtin_types();
        let mut params = BTreeMap::new();
        params.insert("value".to_owned(), r#"{"Double":2.5}"#.to_owned());
        let c = reg.build("Const", Vec::new(), &params).unwrap();
        assert_eq!(*c.imp(), ObjectImp::Double(2.5));

        let a = point(0.0, 0.0);
        let b = point(0.0, 3.0);
        let seg = reg.build("SegmentAB", vec![a, b], &BTreeMap::new()).unwrap();
        seg.calc(&EngineConfig::default());
        let mut params = BTreeMap::new();
        params.insert("property".to_owned(), "length".to_owned());
        let len = reg.build("FetchProperty", vec![seg], &params).unwrap();
        len.calc(&EngineConfig::default());
        assert_eq!(*len.imp(), ObjectImp::Double(3.0));

        assert!(matches!(
            reg.build("FetchProperty", Vec::new(), &params),
            Err(HierarchyError::BadParameter { .. })
        ));
        assert!(matches!(
            reg.build("Nope", Vec::new(), &BTreeMap::new()),
            Err(HierarchyError::UnknownType(_))
        ));
    }

    #[test]
    fn test_macro_registers_as_type() {
        let mut reg = TypeRegistry::with_builtin_types();
        let def = midpoint_macro(&reg);
        reg.register_macro(def).unwrap();

        let ty = reg.get("Middle").unwrap();
        assert_eq!(ty.result_type(), ImpType::Point);
        let cfg = EngineConfig::default();
        let p = ObjectImp::Point(Coordinate::new(2.0, 4.0));
        let q = ObjectImp::Point(Coordinate::new(4.0, 0.0));
        assert_eq!(ty.calc(&[&p, &q], &cfg), ObjectImp::Point(Coordinate::new(3.0, 2.0)));
        assert!(!ty.check_args(&[&p, &ObjectImp::Double(1.0)]));

        let again = midpoint_macro(&reg);
        assert!(matches!(reg.register_macro(again), Err(MacroError::DuplicateName(_))));
    }

    #[test]
    fn test_instantiate_macro() {
        let mut reg = TypeRegistry::with_builtin_types();
        reg.register_macro(midpoint_macro(&reg)).unwrap();
        let x = point(-1.0, 5.0);
        let y = point(3.0, 1.0);
        let r = reg.instantiate_macro("Middle", &[x, y]).unwrap();
        for c in &r.built {
            c.calc(&EngineConfig::default());
        }
        assert_eq!(*r.finals[0].imp(), ObjectImp::Point(Coordinate::new(1.0, 3.0)));

        assert!(matches!(
            reg.instantiate_macro("Unknown", &[]),
            Err(MacroError::UnknownMacro(_))
        ));
        assert!(matches!(
            reg.instantiate_macro("Middle", &[point(0.0, 0.0)]),
            Err(MacroError::Hierarchy(HierarchyError::GivenCountMismatch { .. }))
        ));
    }

    #[test]
    fn test_macro_needs_one_final() {
        let reg = TypeRegistry::with_builtin_types();
        let a = point(0.0, 0.0);
        let b = point(1.0, 0.0);
        let m = ObjectCalcer::new_type(reg.get("MidPoint").unwrap(), vec![a.clone(), b.clone()]);
        let s = ObjectCalcer::new_type(reg.get("SegmentAB").unwrap(), vec![a.clone(), b.clone()]);
        let h = ObjectHierarchy::capture(&[a, b], &[m, s]);
        assert!(matches!(
            MacroDefinition::new("Two", "", h),
            Err(MacroError::FinalCount(2))
        ));
    }

    #[test]
    fn test_macro_record_round_trip() {
        let reg = TypeRegistry::with_builtin_types();
        let def = midpoint_macro(&reg).with_icon("middle");
        let record = def.to_record().unwrap();
        let json = serde_json::to_string_pretty(&record).unwrap();
        let back: MacroRecord = serde_json::from_str(&json).unwrap();
        let (def2, skipped) = MacroDefinition::from_record(&back, &reg).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(def2.action_name, "Middle");
        assert_eq!(def2.icon.as_deref(), Some("middle"));
        assert_eq!(def2.hierarchy().arg_requirements(), vec![ImpType::Point; 2]);
    }
}
