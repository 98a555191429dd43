//! Convex planar polygons and their shared surface tags.

use std::sync::Arc;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::plane::newell_normal;
use crate::{CsgConfig, CsgError, Plane, Result, Vertex};

/// Surface attributes shared by many polygons (color, material).
///
/// Polygons hold their tag behind an [`Arc`]: identity comparison is
/// [`Arc::ptr_eq`], and the canonicalization pass collapses tags with equal
/// contents into a single allocation using [`SharedKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shared {
    color: Option<[f32; 4]>,
    material: Option<u32>,
}

impl Shared {
    /// A tag carrying no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with an RGBA color.
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = Some(color);
        self
    }

    /// Returns a copy with a material id.
    pub fn with_material(mut self, material: u32) -> Self {
        self.material = Some(material);
        self
    }

    #[inline]
    pub fn color(&self) -> Option<[f32; 4]> {
        self.color
    }

    #[inline]
    pub fn material(&self) -> Option<u32> {
        self.material
    }

    /// Hashable content key; equal keys mean interchangeable tags.
    pub fn key(&self) -> SharedKey {
        SharedKey {
            color: self.color.map(|c| c.map(f32::to_bits)),
            material: self.material,
        }
    }
}

/// Content hash key of a [`Shared`] tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedKey {
    color: Option<[u32; 4]>,
    material: Option<u32>,
}

/// A convex polygon in 3D space, defined by an ordered list of vertices.
///
/// Vertices are in counter-clockwise winding order when viewed from the
/// front (the direction the plane normal points). Every vertex lies on
/// `plane` within the tolerance the polygon was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
    plane: Plane,
    shared: Arc<Shared>,
}

impl Polygon {
    /// Creates a polygon, deriving its plane with Newell's method.
    ///
    /// # Errors
    /// - [`CsgError::TooFewVertices`] for fewer than 3 vertices
    /// - [`CsgError::RepeatedVertex`] if a vertex repeats its predecessor
    /// - [`CsgError::DegeneratePlane`] if the polygon has no area
    /// - [`CsgError::NonPlanar`] if a vertex is off the fitted plane
    pub fn new(vertices: Vec<Vertex>, shared: Arc<Shared>, config: &CsgConfig) -> Result<Self> {
        check_ring(&vertices, config)?;
        let (normal, centroid) = check_area(&vertices, config)?;
        let length = normal.norm();
        let plane = Plane::from_point_and_normal(centroid, normal)
            .ok_or(CsgError::DegeneratePlane { length })?;
        check_planar(&vertices, &plane, config)?;
        Ok(Self {
            vertices,
            plane,
            shared,
        })
    }

    /// Creates a polygon on a caller-supplied plane.
    ///
    /// # Errors
    /// Same as [`Polygon::new`], checked against `plane` instead of a fitted one.
    pub fn with_plane(
        vertices: Vec<Vertex>,
        plane: Plane,
        shared: Arc<Shared>,
        config: &CsgConfig,
    ) -> Result<Self> {
        check_ring(&vertices, config)?;
        check_area(&vertices, config)?;
        check_planar(&vertices, &plane, config)?;
        Ok(Self {
            vertices,
            plane,
            shared,
        })
    }

    /// Convenience constructor from raw positions with an empty tag.
    pub fn from_positions(positions: &[[f64; 3]], config: &CsgConfig) -> Result<Self> {
        let vertices = positions.iter().copied().map(Vertex::from).collect();
        Self::new(vertices, Arc::new(Shared::new()), config)
    }

    /// Assembles a polygon without validation. Used for split fragments and
    /// merged faces, which inherit a plane already known to fit.
    pub(crate) fn from_parts(vertices: Vec<Vertex>, plane: Plane, shared: Arc<Shared>) -> Self {
        debug_assert!(vertices.len() >= 3, "Polygon must have at least 3 vertices");
        Self {
            vertices,
            plane,
            shared,
        }
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false for a constructed polygon.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns the plane that this polygon lies on.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the shared surface tag.
    #[inline]
    pub fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Returns `true` if both polygons point at the same tag allocation.
    #[inline]
    pub fn shares_tag_with(&self, other: &Polygon) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Replaces the tag.
    pub fn with_shared(mut self, shared: Arc<Shared>) -> Self {
        self.shared = shared;
        self
    }

    /// Reverses winding and plane, turning the polygon inside out.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        self.plane.flip();
    }

    /// Returns a flipped copy.
    pub fn flipped(&self) -> Self {
        let mut polygon = self.clone();
        polygon.flip();
        polygon
    }

    /// Computes the centroid (vertex average) of the polygon.
    pub fn centroid(&self) -> Point3<f64> {
        let sum: Vector3<f64> = self.vertices.iter().map(|v| v.pos().coords).sum();
        Point3::from(sum / self.vertices.len() as f64)
    }

    /// Area enclosed by the ring, measured along the plane normal.
    pub fn area(&self) -> f64 {
        newell_normal(self.vertices.iter().map(Vertex::pos))
            .map_or(0.0, |(normal, _)| 0.5 * normal.dot(&self.plane.normal()).abs())
    }

    /// Center and radius of a sphere enclosing every vertex.
    ///
    /// Centered on the bounding-box midpoint, which is cheap and tight enough
    /// for quick front/back rejection.
    pub fn bounding_sphere(&self) -> (Point3<f64>, f64) {
        let (min, max) = self.bounds();
        let center = nalgebra::center(&min, &max);
        let radius = self
            .vertices
            .iter()
            .map(|v| (v.pos() - center).norm())
            .fold(0.0, f64::max);
        (center, radius)
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        let first = self.vertices[0].pos();
        self.vertices
            .iter()
            .skip(1)
            .fold((first, first), |(min, max), v| {
                (min.inf(&v.pos()), max.sup(&v.pos()))
            })
    }

    /// Applies an affine transform, refitting the plane.
    ///
    /// Mirroring transforms (negative determinant) reverse the winding so the
    /// polygon keeps facing outward.
    pub fn transformed(&self, matrix: &Matrix4<f64>, config: &CsgConfig) -> Result<Self> {
        let mut vertices: Vec<Vertex> = self
            .vertices
            .iter()
            .map(|v| v.transformed(matrix))
            .collect();
        if matrix.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
            vertices.reverse();
        }
        Self::new(vertices, Arc::clone(&self.shared), config)
    }
}

/// Vertex count and consecutive-repeat checks.
fn check_ring(vertices: &[Vertex], config: &CsgConfig) -> Result<()> {
    if vertices.len() < 3 {
        return Err(CsgError::TooFewVertices {
            count: vertices.len(),
        });
    }
    let n = vertices.len();
    for index in 0..n {
        let previous = vertices[(index + n - 1) % n].pos();
        if (vertices[index].pos() - previous).norm() <= config.epsilon {
            return Err(CsgError::RepeatedVertex { index });
        }
    }
    Ok(())
}

/// Newell normal and centroid of a ring enclosing at least `area_epsilon`.
fn check_area(vertices: &[Vertex], config: &CsgConfig) -> Result<(Vector3<f64>, Point3<f64>)> {
    let (normal, centroid) =
        newell_normal(vertices.iter().map(Vertex::pos)).ok_or(CsgError::TooFewVertices {
            count: vertices.len(),
        })?;
    let length = normal.norm();
    if !(length >= config.area_epsilon) {
        return Err(CsgError::DegeneratePlane { length });
    }
    Ok((normal, centroid))
}

fn check_planar(vertices: &[Vertex], plane: &Plane, config: &CsgConfig) -> Result<()> {
    for (index, vertex) in vertices.iter().enumerate() {
        let distance = plane.signed_distance(&vertex.pos()).abs();
        if distance > config.epsilon {
            return Err(CsgError::NonPlanar {
                index,
                distance,
                tolerance: config.epsilon,
            });
        }
    }
    Ok(())
}
