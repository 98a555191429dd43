//! Tolerance-based deduplication of vertices, planes and surface tags.
//!
//! Splitting computes every cut vertex independently, so two fragments that
//! meet along a seam can carry positions a few ulps apart. Snapping all of
//! them to one representative per tolerance cell restores exact equality,
//! which the coplanar merge pass relies on.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::plane::newell_normal;
use crate::{CsgConfig, Plane, Polygon, Shared, SharedKey, Vertex};

/// Bucket coordinates of a key.
type Cell<const N: usize> = [i64; N];

/// Maps `N`-dimensional float keys to values, merging keys that agree
/// within a tolerance on every dimension.
///
/// Each entry lives in the cell `round(key / tolerance)`. A lookup scans the
/// `3^N` cells around the query, so a match is found even when the two keys
/// round to neighboring cells. Cell coordinates saturate, so keys too large
/// for the bucket grid share the outermost cells and are still compared
/// exactly.
#[derive(Debug, Clone)]
pub struct FuzzyFactory<T, const N: usize> {
    tolerance: f64,
    cells: HashMap<Cell<N>, Vec<([f64; N], T)>>,
    len: usize,
}

impl<T: Clone, const N: usize> FuzzyFactory<T, N> {
    /// Creates an empty factory.
    ///
    /// # Panics
    /// If `tolerance` is not finite and positive.
    pub fn new(tolerance: f64) -> Self {
        assert!(
            tolerance.is_finite() && tolerance > 0.0,
            "fuzzy tolerance must be finite and positive"
        );
        Self {
            tolerance,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Returns the stored value matching `key`, creating one if none exists.
    ///
    /// The first value stored for a region wins: later keys within tolerance
    /// get that value back, and `create` is not called for them.
    pub fn lookup_or_create<F>(&mut self, key: &[f64; N], create: F) -> T
    where
        F: FnOnce(&[f64; N]) -> T,
    {
        if let Some(found) = self.lookup(key) {
            return found.clone();
        }
        let value = create(key);
        let cell = self.cell_of(key);
        self.cells
            .entry(cell)
            .or_default()
            .push((*key, value.clone()));
        self.len += 1;
        value
    }

    /// Returns the stored value matching `key`, if any.
    pub fn lookup(&self, key: &[f64; N]) -> Option<&T> {
        let center = self.cell_of(key);
        let neighbors = 3usize.pow(N as u32);
        for offset in 0..neighbors {
            let mut cell = center;
            let mut rest = offset;
            for coordinate in cell.iter_mut() {
                *coordinate = coordinate.saturating_add((rest % 3) as i64 - 1);
                rest /= 3;
            }
            let Some(entries) = self.cells.get(&cell) else {
                continue;
            };
            let hit = entries.iter().find(|(stored, _)| {
                stored
                    .iter()
                    .zip(key)
                    .all(|(a, b)| (a - b).abs() <= self.tolerance)
            });
            if let Some((_, value)) = hit {
                return Some(value);
            }
        }
        None
    }

    /// Number of distinct values stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, key: &[f64; N]) -> Cell<N> {
        key.map(|value| (value / self.tolerance).round() as i64)
    }
}

/// Snaps the vertices, planes and tags of a polygon soup to shared
/// representatives.
///
/// Repeated calls on the same `Canonicalizer` keep using the representatives
/// chosen so far, so canonicalizing the same input twice yields identical
/// polygons, tags included (by pointer).
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    vertices: FuzzyFactory<Vertex, 3>,
    planes: FuzzyFactory<Plane, 4>,
    tags: HashMap<SharedKey, Arc<Shared>>,
    area_epsilon: f64,
}

impl Canonicalizer {
    pub fn new(config: &CsgConfig) -> Self {
        Self {
            vertices: FuzzyFactory::new(config.fuzzy_tolerance),
            planes: FuzzyFactory::new(config.fuzzy_tolerance),
            tags: HashMap::new(),
            area_epsilon: config.area_epsilon,
        }
    }

    /// Canonicalizes every polygon, dropping those that collapse.
    pub fn canonicalize(&mut self, polygons: &[Polygon]) -> Vec<Polygon> {
        polygons
            .iter()
            .filter_map(|polygon| self.canonicalize_polygon(polygon))
            .collect()
    }

    /// Canonicalizes one polygon.
    ///
    /// Returns `None` when snapping leaves fewer than three distinct vertices
    /// or no area.
    pub fn canonicalize_polygon(&mut self, polygon: &Polygon) -> Option<Polygon> {
        let mut vertices: Vec<Vertex> = polygon
            .vertices()
            .iter()
            .map(|vertex| self.vertex(vertex))
            .collect();
        vertices.dedup_by(|next, prev| next.pos() == prev.pos());
        while vertices.len() > 1 && vertices[0].pos() == vertices[vertices.len() - 1].pos() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            tracing::trace!(vertices = vertices.len(), "canonicalization collapsed a polygon");
            return None;
        }
        let area2 = newell_normal(vertices.iter().map(Vertex::pos))
            .map_or(0.0, |(normal, _)| normal.norm());
        if area2 < self.area_epsilon {
            tracing::trace!(area = 0.5 * area2, "canonicalization collapsed a polygon");
            return None;
        }

        let plane = self.plane(polygon.plane());
        let shared = self.shared(polygon.shared());
        Some(Polygon::from_parts(vertices, plane, shared))
    }

    /// Returns the representative of a vertex (matched on position).
    pub fn vertex(&mut self, vertex: &Vertex) -> Vertex {
        let pos = vertex.pos();
        self.vertices
            .lookup_or_create(&[pos.x, pos.y, pos.z], |_| *vertex)
    }

    /// Returns the representative of a plane (matched on normal and offset).
    pub fn plane(&mut self, plane: &Plane) -> Plane {
        self.planes
            .lookup_or_create(&plane.coefficients(), |_| *plane)
    }

    /// Returns the single tag allocation for this tag's contents.
    pub fn shared(&mut self, shared: &Arc<Shared>) -> Arc<Shared> {
        Arc::clone(
            self.tags
                .entry(shared.key())
                .or_insert_with(|| Arc::clone(shared)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cube;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn keys_within_tolerance_share_a_value() {
        let mut factory = FuzzyFactory::<usize, 3>::new(1e-3);
        let a = factory.lookup_or_create(&[1.0, 2.0, 3.0], |_| 1);
        let b = factory.lookup_or_create(&[1.0005, 2.0, 2.9995], |_| 2);
        let c = factory.lookup_or_create(&[1.01, 2.0, 3.0], |_| 3);
        assert_eq!((a, b, c), (1, 1, 3));
        assert_eq!(factory.len(), 2);
    }

    #[test]
    fn neighbor_cells_are_searched() {
        // 0.0014 and 0.0016 round to different cells at tolerance 1e-3.
        let mut factory = FuzzyFactory::<&str, 1>::new(1e-3);
        factory.lookup_or_create(&[0.0014], |_| "first");
        assert_eq!(factory.lookup(&[0.0016]), Some(&"first"));
    }

    #[test]
    fn every_dimension_must_match() {
        let mut factory = FuzzyFactory::<u8, 4>::new(1e-5);
        factory.lookup_or_create(&[0.0, 0.0, 1.0, 5.0], |_| 0);
        assert!(factory.lookup(&[0.0, 0.0, 1.0, 5.0 + 1e-4]).is_none());
        assert!(factory.lookup(&[0.0, 0.0, 1.0, 5.0 + 1e-6]).is_some());
    }

    #[test]
    fn create_receives_the_query_key() {
        let mut factory = FuzzyFactory::<f64, 2>::new(0.5);
        let sum = factory.lookup_or_create(&[1.0, 2.0], |key| key[0] + key[1]);
        assert_eq!(sum, 3.0);
        assert!(!factory.is_empty());
    }

    #[test]
    fn match_is_independent_of_insertion_order() {
        let first = [0.0, 0.0, 1.0];
        let second = [0.0, 0.0, 1.0 + 5e-6];

        let mut forward = FuzzyFactory::<&str, 3>::new(1e-5);
        let a = forward.lookup_or_create(&first, |_| "first");
        let b = forward.lookup_or_create(&second, |_| "second");
        assert_eq!(a, b);

        let mut backward = FuzzyFactory::<&str, 3>::new(1e-5);
        let b = backward.lookup_or_create(&second, |_| "second");
        let a = backward.lookup_or_create(&first, |_| "first");
        assert_eq!(a, b);
        assert_eq!(backward.len(), 1);
    }

    #[test]
    fn keys_beyond_the_cell_range() {
        let mut factory = FuzzyFactory::<u8, 3>::new(1e-5);
        assert_eq!(factory.lookup_or_create(&[1e14, 0.0, 0.0], |_| 1), 1);
        assert_eq!(factory.lookup_or_create(&[1e14, 0.0, 0.0], |_| 2), 1);
        assert_eq!(factory.lookup_or_create(&[-1e14, 0.0, 0.0], |_| 3), 3);
        assert_eq!(factory.lookup_or_create(&[1e14 + 1.0, 0.0, 0.0], |_| 4), 4);
        assert_eq!(factory.len(), 3);
    }

    #[test]
    #[should_panic(expected = "fuzzy tolerance")]
    fn zero_tolerance_panics() {
        let _ = FuzzyFactory::<u8, 1>::new(0.0);
    }

    #[test]
    fn near_duplicate_vertices_are_snapped() {
        let config = CsgConfig::default();
        let mut canonicalizer = Canonicalizer::new(&config);
        let a = Polygon::from_positions(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &config,
        )
        .unwrap();
        let b = Polygon::from_positions(
            &[[1.0 + 1e-7, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0 - 1e-7, 0.0]],
            &config,
        )
        .unwrap();

        let out = canonicalizer.canonicalize(&[a, b]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].vertices()[0].pos(), Point3::new(1.0, 0.0, 0.0));
        assert_eq!(out[1].vertices()[2].pos(), Point3::new(0.0, 1.0, 0.0));
        assert_eq!(out[0].plane(), out[1].plane());
    }

    #[test]
    fn collapsed_polygon_is_dropped() {
        let config = CsgConfig::default();
        let mut canonicalizer = Canonicalizer::new(&config);
        let collapsing = Polygon::from_parts(
            vec![
                Vertex::from([0.0, 0.0, 0.0]),
                Vertex::from([1.0, 0.0, 0.0]),
                Vertex::from([3e-6, 2e-6, 0.0]),
            ],
            Plane::new(Vector3::z(), 0.0).unwrap(),
            Arc::new(Shared::new()),
        );
        assert!(canonicalizer.canonicalize_polygon(&collapsing).is_none());
    }

    #[test]
    fn equal_tags_become_one_allocation() {
        let config = CsgConfig::default();
        let mut canonicalizer = Canonicalizer::new(&config);
        let red = || Arc::new(Shared::new().with_color([1.0, 0.0, 0.0, 1.0]));
        let first = canonicalizer.shared(&red());
        let second = canonicalizer.shared(&red());
        let blue = canonicalizer.shared(&Arc::new(Shared::new().with_color([0.0, 0.0, 1.0, 1.0])));
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &blue));
    }

    #[test]
    fn canonicalization_is_deterministic() {
        let config = CsgConfig::default();
        let input = cube(Point3::new(0.25, 0.5, 0.75), 1.0);
        let mut canonicalizer = Canonicalizer::new(&config);
        let first = canonicalizer.canonicalize(&input);
        let second = canonicalizer.canonicalize(&input);
        assert_eq!(first, second);
        for (a, b) in first.iter().zip(&second) {
            assert!(a.shares_tag_with(b));
        }
        assert_eq!(canonicalizer.vertices.len(), 8);
        assert_eq!(canonicalizer.planes.len(), 6);
    }

    #[test]
    fn far_cube_with_fine_tolerance() {
        let config = CsgConfig::default().with_fuzzy_tolerance(1e-12);
        let input = cube(Point3::new(1e7, -1e7, 1e7), 1.0);
        let mut canonicalizer = Canonicalizer::new(&config);
        assert_eq!(canonicalizer.canonicalize(&input), input);
        assert_eq!(canonicalizer.vertices.len(), 8);
        assert_eq!(canonicalizer.planes.len(), 6);
    }
}
