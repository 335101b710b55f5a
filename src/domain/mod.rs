// Domain layer: tabular model, format selectors and ports (interfaces).

pub mod format;
pub mod model;
pub mod ports;
