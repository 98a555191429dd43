//! Bounding boxes and mass properties of polygon solids.

use nalgebra::{Point3, Vector3};

use crate::Polygon;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Bounds of every vertex of every polygon, or `None` for no polygons.
    pub fn from_polygons(polygons: &[Polygon]) -> Option<Self> {
        polygons
            .iter()
            .map(Polygon::bounds)
            .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.inf(&min_b), max_a.sup(&max_b)))
            .map(|(min, max)| Self { min, max })
    }

    /// Returns `true` unless the boxes are separated by more than `epsilon`
    /// along some axis. Touching boxes may overlap.
    pub fn may_overlap(&self, other: &Aabb, epsilon: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] <= other.max[axis] + epsilon
                && other.min[axis] <= self.max[axis] + epsilon
        })
    }

    /// Returns the edge lengths of the box.
    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Returns the box center.
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// Signed volume enclosed by a closed, outward-facing polygon set.
///
/// Each polygon is fanned into triangles and every triangle contributes the
/// signed volume of the tetrahedron it spans with the origin. An inverted
/// solid measures negative.
pub fn volume(polygons: &[Polygon]) -> f64 {
    polygons
        .iter()
        .map(|polygon| {
            let vertices = polygon.vertices();
            let p0 = vertices[0].pos().coords;
            vertices
                .windows(2)
                .skip(1)
                .map(|pair| p0.dot(&pair[0].pos().coords.cross(&pair[1].pos().coords)))
                .sum::<f64>()
        })
        .sum::<f64>()
        / 6.0
}

/// Total area of all polygons.
pub fn surface_area(polygons: &[Polygon]) -> f64 {
    polygons.iter().map(Polygon::area).sum()
}
