//! Fixtures shared by the unit tests.

use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::{CsgConfig, Polygon, Shared, Vertex};

/// Corner indices of each face, counter-clockwise seen from outside.
/// Bit 0 of a corner index selects +x, bit 1 +y, bit 2 +z.
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 4, 6, 2],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 6, 7, 3],
    [0, 2, 3, 1],
    [4, 5, 7, 6],
];

/// Axis-aligned cube of half-extent `radius`, six quads facing outward.
pub(crate) fn cube(center: Point3<f64>, radius: f64) -> Vec<Polygon> {
    cube_with_tag(center, radius, Arc::new(Shared::new()))
}

/// Same as [`cube`], with every face carrying `shared`.
pub(crate) fn cube_with_tag(center: Point3<f64>, radius: f64, shared: Arc<Shared>) -> Vec<Polygon> {
    let config = CsgConfig::default();
    let corner = |index: usize| {
        let sign = |bit: usize| if index & bit != 0 { 1.0 } else { -1.0 };
        Vertex::new(center + Vector3::new(sign(1), sign(2), sign(4)) * radius)
    };
    CUBE_FACES
        .iter()
        .map(|face| {
            let vertices = face.iter().map(|&index| corner(index)).collect();
            Polygon::new(vertices, Arc::clone(&shared), &config)
                .expect("cube faces are valid polygons")
        })
        .collect()
}
