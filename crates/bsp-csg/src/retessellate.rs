//! Coplanar merge pass run after a boolean.
//!
//! Clipping leaves faces cut into many convex pieces. Pieces on the same
//! plane with the same tag that meet along a full edge are glued back
//! together whenever the union stays convex.

use std::sync::Arc;

use hashbrown::HashMap;
use nalgebra::Vector3;

use crate::{CsgConfig, Plane, Polygon, SharedKey, Vertex};

/// Grouping key: exact plane bits plus tag contents.
type GroupKey = ([u64; 4], SharedKey);

/// Merges adjacent coplanar polygons.
///
/// Expects canonicalized input: shared edges are found by exact vertex
/// equality and groups by exact plane equality. Groups come out in the order
/// their first polygon appeared.
pub fn merge_coplanar(polygons: Vec<Polygon>, config: &CsgConfig) -> Vec<Polygon> {
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<Polygon>> = Vec::new();
    for polygon in polygons {
        let key = (
            polygon.plane().coefficients().map(f64::to_bits),
            polygon.shared().key(),
        );
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(polygon);
    }

    let before: usize = groups.iter().map(Vec::len).sum();
    let result: Vec<Polygon> = groups
        .into_iter()
        .flat_map(|group| merge_group(group, config))
        .collect();
    tracing::trace!(before, after = result.len(), "retessellated");
    result
}

/// Repeatedly merges pairs in one coplanar group until nothing changes.
fn merge_group(mut group: Vec<Polygon>, config: &CsgConfig) -> Vec<Polygon> {
    if group.len() < 2 {
        return group;
    }
    let mut merged = true;
    while merged {
        merged = false;
        let mut next_group = Vec::with_capacity(group.len());
        let mut used = vec![false; group.len()];

        for i in 0..group.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            let mut current = group[i].clone();

            for j in (i + 1)..group.len() {
                if used[j] {
                    continue;
                }
                if let Some(joined) = try_merge(&current, &group[j], config) {
                    current = joined;
                    used[j] = true;
                    merged = true;
                }
            }
            next_group.push(current);
        }
        group = next_group;
    }
    group
}

/// Glues two polygons along a shared edge if the result is convex.
fn try_merge(first: &Polygon, second: &Polygon, config: &CsgConfig) -> Option<Polygon> {
    let a = first.vertices();
    let b = second.vertices();
    let (n, m) = (a.len(), b.len());

    for i in 0..n {
        let (start, end) = (a[i].pos(), a[(i + 1) % n].pos());
        // The neighbor walks the shared edge in the opposite direction.
        let shared_edge = (0..m).find(|&j| b[j].pos() == end && b[(j + 1) % m].pos() == start);
        let Some(j) = shared_edge else {
            continue;
        };

        let mut ring: Vec<Vertex> = Vec::with_capacity(n + m - 2);
        ring.extend_from_slice(&a[..=i]);
        ring.extend((2..m).map(|k| b[(j + k) % m]));
        ring.extend_from_slice(&a[i + 1..]);

        let plane = first.plane();
        remove_collinear(&mut ring, config.epsilon);
        if ring.len() < 3 || !is_convex(&ring, plane, config.epsilon) {
            return None;
        }
        return Some(Polygon::from_parts(ring, *plane, Arc::clone(first.shared())));
    }
    None
}

/// Drops vertices lying on the segment between their neighbors.
fn remove_collinear(ring: &mut Vec<Vertex>, epsilon: f64) {
    let mut i = 0;
    while ring.len() > 3 && i < ring.len() {
        let n = ring.len();
        let prev = ring[(i + n - 1) % n].pos();
        let curr = ring[i].pos();
        let next = ring[(i + 1) % n].pos();

        let base = next - prev;
        let length = base.norm();
        let off_line = if length > 0.0 {
            (curr - prev).cross(&base).norm() / length
        } else {
            0.0
        };
        let between = (curr - prev).dot(&base) > 0.0 && (next - curr).dot(&base) > 0.0;
        if off_line <= epsilon && between {
            ring.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Every corner turns the same way as the plane normal (within tolerance).
fn is_convex(ring: &[Vertex], plane: &Plane, epsilon: f64) -> bool {
    let n = ring.len();
    let normal = plane.normal();
    (0..n).all(|i| {
        let prev = ring[(i + n - 1) % n].pos();
        let curr = ring[i].pos();
        let next = ring[(i + 1) % n].pos();
        let incoming: Vector3<f64> = curr - prev;
        let outgoing: Vector3<f64> = next - curr;
        let scale = incoming.norm() * outgoing.norm();
        scale == 0.0 || incoming.cross(&outgoing).dot(&normal) >= -epsilon * scale
    })
}
