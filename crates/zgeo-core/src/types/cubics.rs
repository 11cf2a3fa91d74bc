//! 三次曲线的构造

use super::args::points;
use super::{through, ArgsParser, StandardType};
use crate::config::EngineConfig;
use crate::cubic::{
    calc_cubic_cusp_through_points, calc_cubic_node_through_points, calc_cubic_through_points,
    CubicCartesianData,
};
use crate::imp::{ImpType, ObjectImp};

const THROUGH_POINT: &str = "Select a point for the new cubic to go through";

pub(super) fn types() -> Vec<StandardType> {
    let n_points = |n: usize| ArgsParser::new(vec![through(ImpType::Point, THROUGH_POINT); n]).with_min(2);
    vec![
        StandardType::new("CubicB9P", ImpType::Cubic, n_points(9), cubic_b9p),
        StandardType::new("CubicNodeB6P", ImpType::Cubic, n_points(6), cubic_node_b6p),
        StandardType::new("CubicCuspB4P", ImpType::Cubic, n_points(4), cubic_cusp_b4p),
    ]
}

fn cubic_or_invalid(data: Option<CubicCartesianData>) -> ObjectImp {
    match data {
        Some(d) if d.valid() => ObjectImp::Cubic(d),
        _ => ObjectImp::Invalid,
    }
}

fn cubic_b9p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    cubic_or_invalid(calc_cubic_through_points(&points(args)))
}

fn cubic_node_b6p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    cubic_or_invalid(calc_cubic_node_through_points(&points(args)))
}

fn cubic_cusp_b4p(args: &[&ObjectImp], _cfg: &EngineConfig) -> ObjectImp {
    cubic_or_invalid(calc_cubic_cusp_through_points(&points(args)))
}
