//! 对象持有者
//!
//! 文档和画布实际保存、遍历的单位：一个共享的计算节点加上显示属性。

use crate::calcer::{CalcerRef, ObjectCalcer};
use crate::config::EngineConfig;
use crate::error::HolderError;
use crate::imp::ObjectImp;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLUE: Self = Self::new(0, 0, 255);
    pub const RED: Self = Self::new(255, 0, 0);
}

/// 线型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dash,
    Dot,
    DashDot,
    DashDotDot,
}

/// 点的样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointStyle {
    #[default]
    RoundFilled,
    Round,
    RectangularFilled,
    Rectangular,
    Cross,
}

/// 显示属性；宽度为 `None` 时由画布决定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingAttributes {
    pub color: Color,
    pub width: Option<u32>,
    pub shown: bool,
    pub line_style: LineStyle,
    pub point_style: PointStyle,
}

impl Default for DrawingAttributes {
    fn default() -> Self {
        Self {
            color: Color::BLUE,
            width: None,
            shown: true,
            line_style: LineStyle::default(),
            point_style: PointStyle::default(),
        }
    }
}

/// 计算节点与显示属性的组合
#[derive(Debug, Clone)]
pub struct ObjectHolder {
    calcer: CalcerRef,
    pub attributes: DrawingAttributes,
    name: Option<CalcerRef>,
}

impl ObjectHolder {
    pub fn new(calcer: CalcerRef) -> Self {
        Self::with_attributes(calcer, DrawingAttributes::default())
    }

    pub fn with_attributes(calcer: CalcerRef, attributes: DrawingAttributes) -> Self {
        Self {
            calcer,
            attributes,
            name: None,
        }
    }

    /// 附带名字节点；名字节点的值必须是字符串
    pub fn with_name(mut self, name: CalcerRef) -> Result<Self, HolderError> {
        if !matches!(*name.imp(), ObjectImp::String(_)) {
            return Err(HolderError::NameNotString);
        }
        self.name = Some(name);
        Ok(self)
    }

    pub fn calcer(&self) -> &CalcerRef {
        &self.calcer
    }

    pub fn name_calcer(&self) -> Option<&CalcerRef> {
        self.name.as_ref()
    }

    pub fn imp(&self) -> Rc<ObjectImp> {
        self.calcer.imp()
    }

    pub fn valid(&self) -> bool {
        self.calcer.imp().valid()
    }

    pub fn shown(&self) -> bool {
        self.attributes.shown
    }

    pub fn name(&self) -> Option<String> {
        let name = self.name.as_ref()?;
        name.imp().as_str().map(str::to_owned)
    }

    /// 重算名字节点和对象节点
    pub fn calc(&self, cfg: &EngineConfig) {
        if let Some(name) = &self.name {
            name.calc(cfg);
        }
        self.calcer.calc(cfg);
    }

    pub fn set_shown(&mut self, shown: bool) {
        self.attributes.shown = shown;
    }

    pub fn set_color(&mut self, color: Color) {
        self.attributes.color = color;
    }

    /// 是否持有同一个计算节点
    pub fn holds(&self, calcer: &ObjectCalcer) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.calcer), calcer)
    }
}
