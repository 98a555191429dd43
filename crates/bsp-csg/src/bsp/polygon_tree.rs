//! Provenance tree recording how each input polygon was cut into fragments.
//!
//! The BSP nodes never own polygons; they hold [`PolygonKey`]s into this
//! arena. Splitting a polygon attaches children to its entry instead of
//! replacing it, so keys held elsewhere stay valid: a key whose polygon has
//! been split simply forwards later work to its live fragments. The split
//! entry keeps its original polygon until one of its fragments is removed,
//! so a polygon cut into pieces that all survive comes back whole.

use slotmap::SlotMap;

use crate::split::split_polygon;
use crate::{CsgConfig, Plane, Polygon, SplitResult};

slotmap::new_key_type! {
    /// Handle to an entry of a [`PolygonTree`].
    pub struct PolygonKey;
}

/// Where a split placed a polygon-tree entry relative to the cutting plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    CoplanarFront,
    CoplanarBack,
    Front,
    Back,
}

#[derive(Debug, Clone)]
struct PolygonTreeNode {
    parent: Option<PolygonKey>,
    children: Vec<PolygonKey>,
    polygon: Option<Polygon>,
    removed: bool,
}

impl PolygonTreeNode {
    fn new(parent: Option<PolygonKey>, polygon: Option<Polygon>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            polygon,
            removed: false,
        }
    }
}

/// Arena of polygon-tree entries under a single polygon-less root.
///
/// An entry is either a live leaf holding a polygon, an inner entry whose
/// children partition its original area, or removed. An inner entry still
/// holds its polygon while no descendant has been removed. Entries are never
/// freed while the tree lives.
#[derive(Debug, Clone)]
pub struct PolygonTree {
    nodes: SlotMap<PolygonKey, PolygonTreeNode>,
    root: PolygonKey,
}

impl Default for PolygonTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PolygonTree {
    /// Creates a tree holding only its root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(PolygonTreeNode::new(None, None));
        Self { nodes, root }
    }

    /// Returns the root key.
    #[inline]
    pub fn root(&self) -> PolygonKey {
        self.root
    }

    /// Adds each polygon as a new leaf under the root, in order.
    pub fn add_polygons(&mut self, polygons: Vec<Polygon>) -> Vec<PolygonKey> {
        let root = self.root;
        polygons
            .into_iter()
            .map(|polygon| self.add_child(root, polygon))
            .collect()
    }

    fn add_child(&mut self, parent: PolygonKey, polygon: Polygon) -> PolygonKey {
        let child = self
            .nodes
            .insert(PolygonTreeNode::new(Some(parent), Some(polygon)));
        self.nodes[parent].children.push(child);
        child
    }

    /// Returns `true` if the entry was removed (or never existed).
    #[inline]
    pub fn is_removed(&self, key: PolygonKey) -> bool {
        self.nodes.get(key).is_none_or(|node| node.removed)
    }

    /// Returns the polygon of a live leaf.
    pub fn polygon(&self, key: PolygonKey) -> Option<&Polygon> {
        self.nodes
            .get(key)
            .filter(|node| !node.removed && node.children.is_empty())
            .and_then(|node| node.polygon.as_ref())
    }

    /// Returns the children of an entry (empty for leaves).
    pub fn children(&self, key: PolygonKey) -> &[PolygonKey] {
        self.nodes
            .get(key)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    /// Returns the first live polygon at or below `key`, depth-first.
    pub fn first_live_polygon(&self, key: PolygonKey) -> Option<&Polygon> {
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            let node = self.nodes.get(key)?;
            if node.removed {
                continue;
            }
            if node.children.is_empty() {
                if let Some(polygon) = node.polygon.as_ref() {
                    return Some(polygon);
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Classifies an entry against `plane`, cutting it when it spans.
    ///
    /// Every resulting live leaf is reported to `sink` with its placement:
    /// - coplanar/front/back leaves are reported under their own key, so the
    ///   caller can keep mutating the same entry later
    /// - a spanning leaf gets one child per surviving fragment, and the
    ///   children are reported as front/back
    /// - an entry that was already split forwards to its live leaves
    /// - a removed entry reports nothing
    pub fn split_by_plane<F>(
        &mut self,
        key: PolygonKey,
        plane: &Plane,
        config: &CsgConfig,
        sink: &mut F,
    ) where
        F: FnMut(Placement, PolygonKey),
    {
        let mut pending = vec![key];
        while let Some(key) = pending.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if node.removed {
                continue;
            }
            if !node.children.is_empty() {
                pending.extend(node.children.iter().rev().copied());
                continue;
            }
            let Some(polygon) = node.polygon.as_ref() else {
                continue;
            };

            // Bounding-sphere quick reject before the per-vertex walk.
            let (center, radius) = polygon.bounding_sphere();
            let distance = plane.signed_distance(&center);
            let reach = radius + config.epsilon;
            if distance > reach {
                sink(Placement::Front, key);
                continue;
            }
            if distance < -reach {
                sink(Placement::Back, key);
                continue;
            }

            match split_polygon(polygon, plane, config) {
                SplitResult::CoplanarFront => sink(Placement::CoplanarFront, key),
                SplitResult::CoplanarBack => sink(Placement::CoplanarBack, key),
                SplitResult::Front => sink(Placement::Front, key),
                SplitResult::Back => sink(Placement::Back, key),
                SplitResult::Spanning { front, back } => {
                    if front.is_none() && back.is_none() {
                        self.remove(key);
                        continue;
                    }
                    if let Some(front) = front {
                        let child = self.add_child(key, front);
                        sink(Placement::Front, child);
                    }
                    if let Some(back) = back {
                        let child = self.add_child(key, back);
                        sink(Placement::Back, child);
                    }
                }
            }
        }
    }

    /// Removes an entry.
    ///
    /// When this leaves every child of the parent removed, the parent is
    /// removed as well, walking up until a parent with a live child or the
    /// root is reached. The root itself is never removed. Every ancestor
    /// drops the original polygon it was holding, since its fragments no
    /// longer cover it.
    pub fn remove(&mut self, key: PolygonKey) {
        if key == self.root {
            return;
        }
        let Some(node) = self.nodes.get_mut(key) else {
            return;
        };
        if node.removed {
            return;
        }
        node.removed = true;
        node.polygon = None;

        let mut ancestor = node.parent;
        while let Some(current) = ancestor {
            let node = &mut self.nodes[current];
            node.polygon = None;
            ancestor = node.parent;
        }

        let mut current = key;
        while let Some(parent) = self.nodes[current].parent {
            if parent == self.root {
                return;
            }
            let all_removed = self.nodes[parent]
                .children
                .iter()
                .all(|child| self.nodes[*child].removed);
            if !all_removed {
                return;
            }
            self.nodes[parent].removed = true;
            current = parent;
        }
    }

    /// Flips every polygon in the tree in place.
    pub fn invert(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(polygon) = node.polygon.as_mut() {
                polygon.flip();
            }
        }
    }

    /// Collects the live polygons depth-first in insertion order.
    ///
    /// An entry still holding its polygon is reported whole, without
    /// descending into its fragments.
    pub fn polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let node = &self.nodes[key];
            if node.removed {
                continue;
            }
            if let Some(polygon) = node.polygon.as_ref() {
                result.push(polygon.clone());
                continue;
            }
            stack.extend(node.children.iter().rev().copied());
        }
        result
    }

    /// Number of live leaves.
    pub fn live_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| !node.removed && node.children.is_empty() && node.polygon.is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn config() -> CsgConfig {
        CsgConfig::default()
    }

    fn square(z: f64) -> Polygon {
        Polygon::from_positions(
            &[[0.0, 0.0, z], [2.0, 0.0, z], [2.0, 2.0, z], [0.0, 2.0, z]],
            &config(),
        )
        .unwrap()
    }

    fn plane(normal: [f64; 3], w: f64) -> Plane {
        Plane::new(Vector3::from(normal), w).unwrap()
    }

    fn collect(
        tree: &mut PolygonTree,
        key: PolygonKey,
        plane: &Plane,
    ) -> Vec<(Placement, PolygonKey)> {
        let mut out = Vec::new();
        tree.split_by_plane(key, plane, &config(), &mut |placement, key| {
            out.push((placement, key))
        });
        out
    }

    #[test]
    fn add_polygons_creates_leaves_in_order() {
        let mut tree = PolygonTree::new();
        let keys = tree.add_polygons(vec![square(0.0), square(1.0)]);
        assert_eq!(keys.len(), 2);
        assert_eq!(tree.children(tree.root()), keys.as_slice());
        assert_eq!(tree.live_count(), 2);

        let polygons = tree.polygons();
        assert_eq!(polygons[0], square(0.0));
        assert_eq!(polygons[1], square(1.0));
    }

    #[test]
    fn unsplit_placements_report_own_key() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];

        let out = collect(&mut tree, key, &plane([0.0, 0.0, 1.0], -1.0));
        assert_eq!(out, vec![(Placement::Front, key)]);

        let out = collect(&mut tree, key, &plane([0.0, 0.0, 1.0], 1.0));
        assert_eq!(out, vec![(Placement::Back, key)]);

        let out = collect(&mut tree, key, &plane([0.0, 0.0, 1.0], 0.0));
        assert_eq!(out, vec![(Placement::CoplanarFront, key)]);

        let out = collect(&mut tree, key, &plane([0.0, 0.0, -1.0], 0.0));
        assert_eq!(out, vec![(Placement::CoplanarBack, key)]);
        assert!(tree.children(key).is_empty());
    }

    #[test]
    fn spanning_split_attaches_children() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];

        let out = collect(&mut tree, key, &plane([1.0, 0.0, 0.0], 1.0));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].0, Placement::Front);
        assert_eq!(out[1].0, Placement::Back);
        assert_eq!(tree.children(key), &[out[0].1, out[1].1]);
        assert!(tree.polygon(key).is_none());
        assert!(!tree.is_removed(key));
        assert_eq!(tree.live_count(), 2);
    }

    #[test]
    fn split_entry_forwards_to_fragments() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];
        collect(&mut tree, key, &plane([1.0, 0.0, 0.0], 1.0));

        // Splitting the parent again reaches both halves.
        let out = collect(&mut tree, key, &plane([0.0, 1.0, 0.0], 1.0));
        assert_eq!(out.len(), 4);
        assert_eq!(tree.live_count(), 4);
        let fronts = out.iter().filter(|(p, _)| *p == Placement::Front).count();
        assert_eq!(fronts, 2);
    }

    #[test]
    fn intact_split_comes_back_whole() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];
        collect(&mut tree, key, &plane([1.0, 0.0, 0.0], 1.0));
        let quarters = collect(&mut tree, key, &plane([0.0, 1.0, 0.0], 1.0));
        assert_eq!(quarters.len(), 4);
        assert_eq!(tree.live_count(), 4);
        assert_eq!(tree.polygons(), vec![square(0.0)]);

        // Dropping the x > 1, y > 1 quarter splits up only the half it was in.
        tree.remove(quarters[0].1);
        let polygons = tree.polygons();
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[1].len(), 4);
        let area: f64 = polygons.iter().map(Polygon::area).sum();
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn remove_collapses_dead_parents() {
        let mut tree = PolygonTree::new();
        let keys = tree.add_polygons(vec![square(0.0), square(5.0)]);
        let out = collect(&mut tree, keys[0], &plane([1.0, 0.0, 0.0], 1.0));
        let (front, back) = (out[0].1, out[1].1);

        tree.remove(front);
        assert!(tree.is_removed(front));
        assert!(!tree.is_removed(keys[0]));

        tree.remove(back);
        assert!(tree.is_removed(keys[0]), "parent dies with its last child");
        assert!(!tree.is_removed(tree.root()));
        assert_eq!(tree.polygons(), vec![square(5.0)]);

        tree.remove(keys[1]);
        assert!(!tree.is_removed(tree.root()));
        assert!(tree.polygons().is_empty());
    }

    #[test]
    fn removed_entry_is_skipped_by_split() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];
        tree.remove(key);
        assert!(collect(&mut tree, key, &plane([1.0, 0.0, 0.0], 1.0)).is_empty());
        assert!(tree.first_live_polygon(key).is_none());
    }

    #[test]
    fn invert_flips_every_polygon() {
        let mut tree = PolygonTree::new();
        tree.add_polygons(vec![square(0.0)]);
        tree.invert();
        assert_eq!(tree.polygons(), vec![square(0.0).flipped()]);
    }

    #[test]
    fn first_live_polygon_descends_into_fragments() {
        let mut tree = PolygonTree::new();
        let key = tree.add_polygons(vec![square(0.0)])[0];
        let out = collect(&mut tree, key, &plane([1.0, 0.0, 0.0], 1.0));
        tree.remove(out[0].1);

        let first = tree.first_live_polygon(key).unwrap();
        assert_eq!(Some(first), tree.polygon(out[1].1));
    }
}
