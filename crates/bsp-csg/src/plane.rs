//! Plane representation and point classification.

use nalgebra::{Point3, Vector3};

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a polygon relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// All vertices on the plane, polygon normal agrees with the plane normal
    CoplanarFront,
    /// All vertices on the plane, polygon normal opposes the plane normal
    CoplanarBack,
    /// No vertex behind the plane
    Front,
    /// No vertex in front of the plane
    Back,
    /// Vertices on both sides
    Spanning,
}

/// A plane in 3D space, represented as `normal · point = w`.
///
/// The normal is always unit length; every constructor normalizes and
/// refuses a (near) zero normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3<f64>,
    w: f64,
}

impl Plane {
    /// Creates a plane from a normal vector and offset, normalizing both.
    ///
    /// Returns `None` if the normal is shorter than `f64::EPSILON`.
    pub fn new(normal: Vector3<f64>, w: f64) -> Option<Self> {
        let norm = normal.norm();
        if !(norm > f64::EPSILON) {
            return None;
        }
        Some(Self {
            normal: normal / norm,
            w: w / norm,
        })
    }

    /// Creates a plane from a point on the plane and a normal vector.
    pub fn from_point_and_normal(point: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        let norm = normal.norm();
        if !(norm > f64::EPSILON) {
            return None;
        }
        let unit_normal = normal / norm;
        Some(Self {
            normal: unit_normal,
            w: unit_normal.dot(&point.coords),
        })
    }

    /// Creates a plane from three points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// Returns `None` for collinear points.
    pub fn from_points(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<Self> {
        Self::from_point_and_normal(a, (b - a).cross(&(c - a)))
    }

    /// Fits a plane to a closed ring of points with Newell's method.
    ///
    /// Every edge contributes to the normal, so near-collinear leading points
    /// do not skew the result. The offset is taken through the centroid.
    /// Returns `None` if the accumulated normal is shorter than `min_length`
    /// (it equals twice the enclosed area for a planar ring).
    pub fn from_newell<I>(points: I, min_length: f64) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f64>>,
        I::IntoIter: Clone,
    {
        let (normal, centroid) = newell_normal(points)?;
        if !(normal.norm() >= min_length) {
            return None;
        }
        Self::from_point_and_normal(centroid, normal)
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f64> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn w(&self) -> f64 {
        self.w
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        self.normal.dot(&point.coords) - self.w
    }

    /// Classifies which side of the plane a point lies on.
    pub fn classify_point(&self, point: &Point3<f64>, epsilon: f64) -> PlaneSide {
        side_of_distance(self.signed_distance(point), epsilon)
    }

    /// Returns a new plane with the normal flipped (facing the opposite direction).
    #[inline]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Flips the plane in place.
    #[inline]
    pub fn flip(&mut self) {
        *self = self.flipped();
    }

    /// Projects a point onto the plane (finds the closest point on the plane).
    #[inline]
    pub fn project_point(&self, point: &Point3<f64>) -> Point3<f64> {
        point - self.normal * self.signed_distance(point)
    }

    /// Returns `true` if both planes agree on every coefficient within `epsilon`.
    pub fn approx_eq(&self, other: &Plane, epsilon: f64) -> bool {
        (self.w - other.w).abs() <= epsilon
            && (self.normal - other.normal).iter().all(|d| d.abs() <= epsilon)
    }

    /// The plane as `[nx, ny, nz, w]`, the key used for fuzzy deduplication.
    #[inline]
    pub fn coefficients(&self) -> [f64; 4] {
        [self.normal.x, self.normal.y, self.normal.z, self.w]
    }

    /// Rebuilds a plane from `[nx, ny, nz, w]`, renormalizing.
    pub fn from_coefficients(c: [f64; 4]) -> Option<Self> {
        Self::new(Vector3::new(c[0], c[1], c[2]), c[3])
    }
}

/// Maps a signed distance onto a plane side.
#[inline]
pub(crate) fn side_of_distance(distance: f64, epsilon: f64) -> PlaneSide {
    if distance > epsilon {
        PlaneSide::Front
    } else if distance < -epsilon {
        PlaneSide::Back
    } else {
        PlaneSide::OnPlane
    }
}

/// Newell normal (unnormalized, length = twice the area) and centroid of a ring.
pub(crate) fn newell_normal<I>(points: I) -> Option<(Vector3<f64>, Point3<f64>)>
where
    I: IntoIterator<Item = Point3<f64>>,
    I::IntoIter: Clone,
{
    let iter = points.into_iter();
    let next = iter.clone().cycle().skip(1);

    let mut normal = Vector3::zeros();
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for (current, next) in iter.zip(next) {
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
        sum += current.coords;
        count += 1;
    }
    if count < 3 {
        return None;
    }
    Some((normal, Point3::from(sum / count as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-5;

    #[test]
    fn new_normalizes() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 2.0), 4.0).unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z());
        assert_relative_eq!(plane.w(), 2.0);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::new(Vector3::zeros(), 1.0).is_none());
        assert!(
            Plane::from_points(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0)
            )
            .is_none()
        );
    }

    #[test]
    fn from_points_follows_right_hand_rule() {
        let plane = Plane::from_points(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z());
        assert_relative_eq!(plane.w(), 1.0);
    }

    #[test]
    fn newell_ignores_collinear_leading_points() {
        // First three points are collinear; a three-point fit would fail.
        let ring = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(2.0, 0.0, 2.0),
            Point3::new(2.0, 2.0, 2.0),
            Point3::new(0.0, 2.0, 2.0),
        ];
        let plane = Plane::from_newell(ring, 1e-12).unwrap();
        assert_relative_eq!(plane.normal(), Vector3::z(), epsilon = 1e-12);
        assert_relative_eq!(plane.w(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn newell_rejects_zero_area() {
        let ring = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(Plane::from_newell(ring, 1e-12).is_none());
    }

    #[test]
    fn classify_point_with_tolerance() {
        let plane = Plane::new(Vector3::y(), 0.0).unwrap();
        assert_eq!(plane.classify_point(&Point3::new(0.0, 1.0, 0.0), EPS), PlaneSide::Front);
        assert_eq!(plane.classify_point(&Point3::new(0.0, -1.0, 0.0), EPS), PlaneSide::Back);
        assert_eq!(plane.classify_point(&Point3::new(5.0, 1e-6, 0.0), EPS), PlaneSide::OnPlane);
        assert_eq!(plane.classify_point(&Point3::new(5.0, 1e-6, 0.0), 1e-7), PlaneSide::Front);
    }

    #[test]
    fn flipped_reverses_sides() {
        let plane = Plane::new(Vector3::x(), 1.0).unwrap();
        let flipped = plane.flipped();
        let p = Point3::new(3.0, 0.0, 0.0);
        assert_relative_eq!(plane.signed_distance(&p), -flipped.signed_distance(&p));

        let mut again = flipped;
        again.flip();
        assert_eq!(again, plane);
    }

    #[test]
    fn project_point_lands_on_plane() {
        let plane = Plane::new(Vector3::new(1.0, 1.0, 0.0), 1.0).unwrap();
        let projected = plane.project_point(&Point3::new(4.0, -2.0, 7.0));
        assert_relative_eq!(plane.signed_distance(&projected), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn approx_eq_and_coefficients() {
        let a = Plane::new(Vector3::z(), 1.0).unwrap();
        let b = Plane::from_coefficients([0.0, 1e-7, 1.0, 1.0 + 1e-7]).unwrap();
        assert!(a.approx_eq(&b, EPS));
        assert!(!a.approx_eq(&a.flipped(), EPS));
        assert_eq!(a.coefficients(), [0.0, 0.0, 1.0, 1.0]);
    }
}
