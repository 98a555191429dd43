//! Polygon corner points.

use nalgebra::{Matrix4, Point3, Vector2};

/// A polygon vertex: a position plus an optional surface parameterization.
///
/// Vertices are immutable values; every operation returns a new vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pos: Point3<f64>,
    uv: Option<Vector2<f64>>,
}

impl Vertex {
    /// Creates a vertex without UV coordinates.
    pub fn new(pos: Point3<f64>) -> Self {
        Self { pos, uv: None }
    }

    /// Creates a vertex carrying UV coordinates.
    pub fn with_uv(pos: Point3<f64>, uv: Vector2<f64>) -> Self {
        Self { pos, uv: Some(uv) }
    }

    /// Returns the position.
    #[inline]
    pub fn pos(&self) -> Point3<f64> {
        self.pos
    }

    /// Returns the UV coordinates, if any.
    #[inline]
    pub fn uv(&self) -> Option<Vector2<f64>> {
        self.uv
    }

    /// Linearly interpolates towards `other`; `t = 0` is `self`.
    ///
    /// UV is interpolated only when both ends carry it.
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        let pos = self.pos + (other.pos - self.pos) * t;
        let uv = match (self.uv, other.uv) {
            (Some(a), Some(b)) => Some(a + (b - a) * t),
            _ => None,
        };
        Vertex { pos, uv }
    }

    /// Applies an affine transform to the position. UV is carried unchanged.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Vertex {
        Vertex {
            pos: matrix.transform_point(&self.pos),
            uv: self.uv,
        }
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(pos: Point3<f64>) -> Self {
        Self::new(pos)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from(pos: [f64; 3]) -> Self {
        Self::new(Point3::from(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn interpolate_position_and_uv() {
        let a = Vertex::with_uv(Point3::new(0.0, 0.0, 0.0), Vector2::new(0.0, 0.0));
        let b = Vertex::with_uv(Point3::new(2.0, 4.0, 0.0), Vector2::new(1.0, 1.0));

        let mid = a.interpolate(&b, 0.25);
        assert_relative_eq!(mid.pos(), Point3::new(0.5, 1.0, 0.0));
        assert_relative_eq!(mid.uv().unwrap(), Vector2::new(0.25, 0.25));
    }

    #[test]
    fn interpolate_drops_uv_when_one_side_lacks_it() {
        let a = Vertex::with_uv(Point3::origin(), Vector2::new(1.0, 0.0));
        let b = Vertex::new(Point3::new(1.0, 0.0, 0.0));
        assert!(a.interpolate(&b, 0.5).uv().is_none());
    }

    #[test]
    fn transformed_returns_new_vertex() {
        let v = Vertex::new(Point3::new(1.0, 2.0, 3.0));
        let moved = v.transformed(&Matrix4::new_translation(&Vector3::new(1.0, 0.0, -1.0)));
        assert_relative_eq!(moved.pos(), Point3::new(2.0, 2.0, 2.0));
        assert_relative_eq!(v.pos(), Point3::new(1.0, 2.0, 3.0));
    }
}
