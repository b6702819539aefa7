//! Parser module for YAML, source locations and expression handling

mod expressions;
mod location;
mod yaml;

pub use expressions::{scan_expressions, Expression};
pub use location::{build_location_map, join_path, Location, LocationIndex};
pub use yaml::parse_yaml;
