//! Boolean operations on polygon solids.
//!
//! Each operation copies its operands into two fresh [`Tree`]s, runs the
//! classical clip/invert sequence on them, and post-processes the survivors:
//! the [`Canonicalizer`] snaps them onto shared vertices, planes and tags, and
//! [`merge_coplanar`] glues split faces back together when
//! [`CsgConfig::retessellate`] is set.
//!
//! Operands whose bounding boxes are more than `epsilon` apart skip all of
//! this and are combined directly.

use tracing::debug;

use crate::bsp::Tree;
use crate::fuzzy::Canonicalizer;
use crate::measure::Aabb;
use crate::retessellate::merge_coplanar;
use crate::{CsgConfig, Polygon, Result};

/// A boolean operation on two solids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    /// Points in either solid
    Union,
    /// Points in the first solid but not the second
    Subtract,
    /// Points in both solids
    Intersect,
}

/// Applies `op` to two solids.
pub fn boolean(
    op: BooleanOp,
    a: &[Polygon],
    b: &[Polygon],
    config: &CsgConfig,
) -> Result<Vec<Polygon>> {
    match op {
        BooleanOp::Union => union(a, b, config),
        BooleanOp::Subtract => subtract(a, b, config),
        BooleanOp::Intersect => intersect(a, b, config),
    }
}

/// Returns the union of two solids.
///
/// # Errors
/// [`CsgError::InvalidConfig`](crate::CsgError::InvalidConfig) for a bad
/// configuration, [`CsgError::DepthLimitExceeded`](crate::CsgError::DepthLimitExceeded)
/// if a BSP grows too deep.
pub fn union(a: &[Polygon], b: &[Polygon], config: &CsgConfig) -> Result<Vec<Polygon>> {
    config.validate()?;
    debug!(polygons_a = a.len(), polygons_b = b.len(), "union");
    if !may_overlap(a, b, config) {
        debug!("bounding boxes do not overlap, concatenating operands");
        return Ok(a.iter().chain(b).cloned().collect());
    }

    let mut a = Tree::new(a.to_vec(), config)?;
    let mut b = Tree::new(b.to_vec(), config)?;
    a.clip_to(&b, false);
    b.clip_to(&a, false);
    b.invert();
    b.clip_to(&a, false);
    b.invert();
    a.add_polygons(b.all_polygons())?;

    Ok(finish("union", a.all_polygons(), config))
}

/// Returns the first solid with the second carved out of it.
///
/// # Errors
/// Same as [`union`].
pub fn subtract(a: &[Polygon], b: &[Polygon], config: &CsgConfig) -> Result<Vec<Polygon>> {
    config.validate()?;
    debug!(polygons_a = a.len(), polygons_b = b.len(), "subtract");
    if !may_overlap(a, b, config) {
        debug!("bounding boxes do not overlap, keeping first operand");
        return Ok(a.to_vec());
    }

    let mut a = Tree::new(a.to_vec(), config)?;
    let mut b = Tree::new(b.to_vec(), config)?;
    a.invert();
    a.clip_to(&b, false);
    b.clip_to(&a, false);
    b.invert();
    b.clip_to(&a, false);
    b.invert();
    a.add_polygons(b.all_polygons())?;
    a.invert();

    Ok(finish("subtract", a.all_polygons(), config))
}

/// Returns the region common to both solids.
///
/// # Errors
/// Same as [`union`].
pub fn intersect(a: &[Polygon], b: &[Polygon], config: &CsgConfig) -> Result<Vec<Polygon>> {
    config.validate()?;
    debug!(polygons_a = a.len(), polygons_b = b.len(), "intersect");
    if !may_overlap(a, b, config) {
        debug!("bounding boxes do not overlap, result is empty");
        return Ok(Vec::new());
    }

    let mut a = Tree::new(a.to_vec(), config)?;
    let mut b = Tree::new(b.to_vec(), config)?;
    a.invert();
    b.clip_to(&a, false);
    b.invert();
    a.clip_to(&b, false);
    b.clip_to(&a, false);
    a.add_polygons(b.all_polygons())?;
    a.invert();

    Ok(finish("intersect", a.all_polygons(), config))
}

/// Unions any number of solids, left to right.
pub fn union_all<S: AsRef<[Polygon]>>(solids: &[S], config: &CsgConfig) -> Result<Vec<Polygon>> {
    fold(BooleanOp::Union, solids, config)
}

/// Subtracts every following solid from the first.
pub fn subtract_all<S: AsRef<[Polygon]>>(solids: &[S], config: &CsgConfig) -> Result<Vec<Polygon>> {
    fold(BooleanOp::Subtract, solids, config)
}

/// Intersects any number of solids, left to right.
pub fn intersect_all<S: AsRef<[Polygon]>>(
    solids: &[S],
    config: &CsgConfig,
) -> Result<Vec<Polygon>> {
    fold(BooleanOp::Intersect, solids, config)
}

fn fold<S: AsRef<[Polygon]>>(
    op: BooleanOp,
    solids: &[S],
    config: &CsgConfig,
) -> Result<Vec<Polygon>> {
    let Some((first, rest)) = solids.split_first() else {
        return Ok(Vec::new());
    };
    rest.iter().try_fold(first.as_ref().to_vec(), |acc, next| {
        boolean(op, &acc, next.as_ref(), config)
    })
}

fn may_overlap(a: &[Polygon], b: &[Polygon], config: &CsgConfig) -> bool {
    match (Aabb::from_polygons(a), Aabb::from_polygons(b)) {
        (Some(a), Some(b)) => a.may_overlap(&b, config.epsilon),
        _ => false,
    }
}

fn finish(op: &str, polygons: Vec<Polygon>, config: &CsgConfig) -> Vec<Polygon> {
    let raw = polygons.len();
    let canonical = Canonicalizer::new(config).canonicalize(&polygons);
    let result = if config.retessellate {
        merge_coplanar(canonical, config)
    } else {
        canonical
    };
    debug!(op, raw, polygons = result.len(), "boolean finished");
    result
}
