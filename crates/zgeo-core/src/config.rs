//! 引擎数值配置
//!
//! 每次 `calc` 都会收到一份 [`EngineConfig`]，其中收集了各构造类型
//! 需要的容差与迭代上限。

use serde::{Deserialize, Serialize};

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// 判断点是否在曲线上的容差
    pub contains_tolerance: f64,

    /// 圆锥曲线分类时离心率平方与1比较的容差
    pub parabola_miss: f64,

    /// 三次方程求根的收敛容差
    pub root_tolerance: f64,

    /// 牛顿迭代最大次数
    pub newton_max_iterations: usize,

    /// 多边形求交时沿边界行走的最大步数
    pub polygon_walk_limit: usize,

    /// 三次曲线与直线求交时参数搜索区间的半宽
    pub cubic_root_bound: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            contains_tolerance: 1e-6,
            parabola_miss: 1e-3,
            root_tolerance: 1e-8,
            newton_max_iterations: 100,
            polygon_walk_limit: 1000,
            cubic_root_bound: 1e10,
        }
    }
}

impl EngineConfig {
    /// 从JSON字符串加载配置，缺失字段取默认值
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// 序列化为JSON字符串
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
