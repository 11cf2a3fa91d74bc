//! 错误类型
//!
//! 退化的几何输入不是错误，只会得到 `ObjectImp::Invalid`；
//! 这里的错误表示对计算图或模板的结构性误用。

use thiserror::Error;

/// 计算节点操作错误
#[derive(Error, Debug)]
pub enum CalcerError {
    #[error("Setting these parents would create a cycle")]
    WouldCreateCycle,

    #[error("Only type calcers can have their parents replaced")]
    NotATypeCalcer,

    #[error("Only const calcers can have their value replaced")]
    NotAConstCalcer,
}

/// 层次模板错误
#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("Expected {expected} given objects, got {got}")]
    GivenCountMismatch { expected: usize, got: usize },

    #[error("Unknown object type: {0}")]
    UnknownType(String),

    #[error("Element {element} refers to unknown parent {parent}")]
    ParentOutOfRange { element: usize, parent: usize },

    #[error("Elements could not be built: {0:?}")]
    Unbuildable(Vec<usize>),

    #[error("Hierarchy has no final objects")]
    NoFinals,

    #[error("Element {element} is missing parameter '{param}'")]
    BadParameter { element: usize, param: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 宏定义错误
#[derive(Error, Debug)]
pub enum MacroError {
    #[error("A macro must have exactly one final object, found {0}")]
    FinalCount(usize),

    #[error("A macro named '{0}' is already registered")]
    DuplicateName(String),

    #[error("Unknown macro: {0}")]
    UnknownMacro(String),

    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),
}

/// 对象持有者错误
#[derive(Error, Debug)]
pub enum HolderError {
    #[error("Name calcer must hold a string value")]
    NameNotString,
}
