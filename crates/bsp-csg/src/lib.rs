//! Boolean operations on polygonal solids using BSP trees.
//!
//! A solid is a list of convex planar [`Polygon`]s facing outward. [`union`],
//! [`subtract`] and [`intersect`] combine two solids; every operation takes a
//! [`CsgConfig`] carrying the tolerances it works with.

mod boolean;
mod config;
mod error;
mod fuzzy;
mod measure;
mod plane;
mod polygon;
mod retessellate;
mod split;
mod vertex;

pub mod bsp;

#[cfg(test)]
mod test_support;

pub use boolean::{
    boolean, intersect, intersect_all, subtract, subtract_all, union, union_all, BooleanOp,
};
pub use config::{CsgConfig, DEFAULT_ANGLE_EPSILON, DEFAULT_EPSILON, DEFAULT_MAX_DEPTH};
pub use error::{CsgError, Result};
pub use fuzzy::{Canonicalizer, FuzzyFactory};
pub use measure::{surface_area, volume, Aabb};
pub use plane::{Classification, Plane, PlaneSide};
pub use polygon::{Polygon, Shared, SharedKey};
pub use retessellate::merge_coplanar;
pub use split::{split_polygon, SplitResult};
pub use vertex::Vertex;
