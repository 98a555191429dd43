//! Polygon classification and splitting against a plane.

use crate::plane::{newell_normal, side_of_distance};
use crate::{Classification, CsgConfig, Plane, PlaneSide, Polygon, Vertex};

/// Outcome of classifying (and possibly cutting) a polygon by a plane.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitResult {
    /// On the plane, facing the same way.
    CoplanarFront,
    /// On the plane, facing the other way.
    CoplanarBack,
    /// Entirely in front; the polygon is unchanged.
    Front,
    /// Entirely behind; the polygon is unchanged.
    Back,
    /// Cut in two. A side is `None` when its fragment degenerated and was
    /// dropped.
    Spanning {
        front: Option<Polygon>,
        back: Option<Polygon>,
    },
}

impl SplitResult {
    /// The classification without the fragments.
    pub fn classification(&self) -> Classification {
        match self {
            SplitResult::CoplanarFront => Classification::CoplanarFront,
            SplitResult::CoplanarBack => Classification::CoplanarBack,
            SplitResult::Front => Classification::Front,
            SplitResult::Back => Classification::Back,
            SplitResult::Spanning { .. } => Classification::Spanning,
        }
    }
}

impl Polygon {
    /// Classifies this polygon relative to a plane.
    ///
    /// Returns:
    /// - `CoplanarFront`/`CoplanarBack` if all vertices lie on the plane,
    ///   chosen by the sign of the dot product of the two normals
    /// - `Front` if no vertex is behind the plane
    /// - `Back` if no vertex is in front of the plane
    /// - `Spanning` if vertices are on both sides
    pub fn classify(&self, plane: &Plane, epsilon: f64) -> Classification {
        if self.plane() == plane {
            return Classification::CoplanarFront;
        }
        if *self.plane() == plane.flipped() {
            return Classification::CoplanarBack;
        }

        let mut front = 0;
        let mut back = 0;
        for vertex in self.vertices() {
            match plane.classify_point(&vertex.pos(), epsilon) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (0, 0) => {
                if self.plane().normal().dot(&plane.normal()) >= 0.0 {
                    Classification::CoplanarFront
                } else {
                    Classification::CoplanarBack
                }
            }
            (_, 0) => Classification::Front,
            (0, _) => Classification::Back,
            _ => Classification::Spanning,
        }
    }

    /// Splits this polygon by a plane. See [`split_polygon`].
    #[inline]
    pub fn split(&self, plane: &Plane, config: &CsgConfig) -> SplitResult {
        split_polygon(self, plane, config)
    }
}

/// Classifies `polygon` against `plane` and cuts it when it spans the plane.
///
/// Uses a variant of the Sutherland-Hodgman algorithm:
/// walks the polygon edges and builds two vertex lists,
/// adding intersection points when edges cross the plane.
/// Both fragments keep the parent's plane and shared tag, and the cut
/// vertex of an edge is computed once and pushed to both lists, so the two
/// fragments agree bit-for-bit along the seam.
pub fn split_polygon(polygon: &Polygon, plane: &Plane, config: &CsgConfig) -> SplitResult {
    let epsilon = config.epsilon;
    match polygon.classify(plane, epsilon) {
        Classification::CoplanarFront => return SplitResult::CoplanarFront,
        Classification::CoplanarBack => return SplitResult::CoplanarBack,
        Classification::Front => return SplitResult::Front,
        Classification::Back => return SplitResult::Back,
        Classification::Spanning => {}
    }

    let vertices = polygon.vertices();
    let n = vertices.len();

    let mut front_verts = Vec::with_capacity(n + 1);
    let mut back_verts = Vec::with_capacity(n + 1);

    // Classify all vertices upfront
    let distances: Vec<f64> = vertices
        .iter()
        .map(|v| plane.signed_distance(&v.pos()))
        .collect();
    let sides: Vec<PlaneSide> = distances
        .iter()
        .map(|d| side_of_distance(*d, epsilon))
        .collect();

    for i in 0..n {
        let j = (i + 1) % n;
        let current = vertices[i];

        match sides[i] {
            PlaneSide::Front => front_verts.push(current),
            PlaneSide::Back => back_verts.push(current),
            PlaneSide::OnPlane => {
                // On-plane vertices go to both sides
                front_verts.push(current);
                back_verts.push(current);
            }
        }

        // Only a strict front/back change crosses the plane
        let crosses = matches!(
            (sides[i], sides[j]),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );
        if crosses {
            let t = distances[i] / (distances[i] - distances[j]);
            let intersection = current.interpolate(&vertices[j], t);
            front_verts.push(intersection);
            back_verts.push(intersection);
        }
    }

    SplitResult::Spanning {
        front: build_fragment(front_verts, polygon, config),
        back: build_fragment(back_verts, polygon, config),
    }
}

/// Turns a fragment ring into a polygon, or drops it if it degenerated.
fn build_fragment(
    mut vertices: Vec<Vertex>,
    parent: &Polygon,
    config: &CsgConfig,
) -> Option<Polygon> {
    remove_repeated_vertices(&mut vertices, config.epsilon);
    if vertices.len() < 3 {
        tracing::trace!(vertices = vertices.len(), "dropping split fragment");
        return None;
    }
    let area2 = newell_normal(vertices.iter().map(Vertex::pos))
        .map_or(0.0, |(normal, _)| normal.norm());
    if area2 < config.area_epsilon {
        tracing::trace!(area = 0.5 * area2, "dropping split fragment");
        return None;
    }
    Some(Polygon::from_parts(
        vertices,
        *parent.plane(),
        parent.shared().clone(),
    ))
}

/// Collapses runs of vertices closer than `epsilon`, including across the
/// wrap from last to first.
pub(crate) fn remove_repeated_vertices(vertices: &mut Vec<Vertex>, epsilon: f64) {
    vertices.dedup_by(|next, prev| (next.pos() - prev.pos()).norm() < epsilon);
    while vertices.len() > 1 {
        let first = vertices[0].pos();
        let last = vertices[vertices.len() - 1].pos();
        if (last - first).norm() < epsilon {
            vertices.pop();
        } else {
            break;
        }
    }
}
