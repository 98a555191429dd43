//! BSP node arena: partitioning, inversion and clipping.

use slotmap::SlotMap;

use super::polygon_tree::{Placement, PolygonKey, PolygonTree};
use crate::{CsgConfig, CsgError, Plane, Result};

slotmap::new_key_type! {
    /// Handle to a node of a [`BspTree`].
    pub struct NodeKey;
}

/// A node in the BSP tree.
///
/// Each node partitions space using a splitting plane and refers to the
/// polygon-tree entries that are coplanar with that plane. A node without a
/// plane is an empty leaf and has no children; the first polygon that
/// reaches it fixes its plane for good.
///
/// # Coplanar Polygon Storage
///
/// Entries facing either way are kept together in `polygon_nodes`. They are
/// keys into a [`PolygonTree`], not owned polygons.
#[derive(Debug, Clone, Default)]
pub struct BspNode {
    /// The splitting plane for this node.
    plane: Option<Plane>,

    /// Subtree on the FRONT side of the splitting plane.
    front: Option<NodeKey>,

    /// Subtree on the BACK side of the splitting plane.
    back: Option<NodeKey>,

    /// Polygon-tree entries lying on the plane.
    polygon_nodes: Vec<PolygonKey>,

    /// Distance from the root (the root is 0).
    depth: usize,
}

impl BspNode {
    fn with_depth(depth: usize) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Returns the splitting plane, if the node has been partitioned.
    #[inline]
    pub fn plane(&self) -> Option<&Plane> {
        self.plane.as_ref()
    }

    /// Returns the front child key.
    #[inline]
    pub fn front(&self) -> Option<NodeKey> {
        self.front
    }

    /// Returns the back child key.
    #[inline]
    pub fn back(&self) -> Option<NodeKey> {
        self.back
    }

    /// Returns the coplanar polygon-tree entries of this node.
    #[inline]
    pub fn polygon_nodes(&self) -> &[PolygonKey] {
        &self.polygon_nodes
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// Distance from the root.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Arena holding the nodes of one BSP tree.
///
/// All walks use explicit work stacks, so depth is limited only by
/// [`CsgConfig::max_depth`], never by the native call stack.
#[derive(Debug, Clone)]
pub struct BspTree {
    nodes: SlotMap<NodeKey, BspNode>,
    root: NodeKey,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BspTree {
    /// Creates a tree consisting of one empty leaf.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(BspNode::with_depth(0));
        Self { nodes, root }
    }

    /// Returns the root key.
    #[inline]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Returns a node by key.
    #[inline]
    pub fn node(&self, key: NodeKey) -> Option<&BspNode> {
        self.nodes.get(key)
    }

    /// Iterates over every node (in creation order).
    pub fn nodes(&self) -> impl Iterator<Item = &BspNode> {
        self.nodes.values()
    }

    /// Returns `true` if no polygon has ever reached the root.
    pub fn is_empty(&self) -> bool {
        self.nodes[self.root].plane.is_none()
    }

    /// Returns the maximum depth of the tree (0 for an empty tree).
    pub fn depth(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| node.plane.is_some())
            .map(|node| node.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Total number of coplanar entries referenced by the tree.
    pub fn polygon_node_count(&self) -> usize {
        self.nodes.values().map(|n| n.polygon_nodes.len()).sum()
    }

    fn child_or_insert(&mut self, key: NodeKey, front: bool) -> NodeKey {
        let existing = if front {
            self.nodes[key].front
        } else {
            self.nodes[key].back
        };
        if let Some(child) = existing {
            return child;
        }
        let depth = self.nodes[key].depth + 1;
        let child = self.nodes.insert(BspNode::with_depth(depth));
        if front {
            self.nodes[key].front = Some(child);
        } else {
            self.nodes[key].back = Some(child);
        }
        child
    }

    /// Inserts polygon-tree entries, partitioning space as needed.
    ///
    /// An empty node takes the plane of the first live polygon among the
    /// entries that reach it. Coplanar entries (either facing) stay on the
    /// node; front and back entries descend into children created on demand.
    ///
    /// # Errors
    /// [`CsgError::DepthLimitExceeded`] if a child would sit deeper than
    /// `config.max_depth`.
    pub fn add_polygon_tree_nodes(
        &mut self,
        polygons: &mut PolygonTree,
        keys: Vec<PolygonKey>,
        config: &CsgConfig,
    ) -> Result<()> {
        let mut stack = vec![(self.root, keys)];
        while let Some((node_key, keys)) = stack.pop() {
            if keys.is_empty() {
                continue;
            }
            if self.nodes[node_key].depth >= config.max_depth {
                return Err(CsgError::DepthLimitExceeded {
                    limit: config.max_depth,
                });
            }

            let plane = match self.nodes[node_key].plane {
                Some(plane) => plane,
                None => {
                    let first = keys
                        .iter()
                        .find_map(|key| polygons.first_live_polygon(*key))
                        .map(|polygon| *polygon.plane());
                    let Some(plane) = first else {
                        continue;
                    };
                    self.nodes[node_key].plane = Some(plane);
                    plane
                }
            };

            let mut coplanar = Vec::new();
            let mut front = Vec::new();
            let mut back = Vec::new();
            for key in keys {
                polygons.split_by_plane(key, &plane, config, &mut |placement, key| {
                    match placement {
                        Placement::CoplanarFront | Placement::CoplanarBack => coplanar.push(key),
                        Placement::Front => front.push(key),
                        Placement::Back => back.push(key),
                    }
                });
            }
            self.nodes[node_key].polygon_nodes.extend(coplanar);

            if !back.is_empty() {
                let child = self.child_or_insert(node_key, false);
                stack.push((child, back));
            }
            if !front.is_empty() {
                let child = self.child_or_insert(node_key, true);
                stack.push((child, front));
            }
        }
        Ok(())
    }

    /// Flips every splitting plane and swaps front and back subtrees.
    ///
    /// The coplanar entries are keys; their polygons are flipped by
    /// [`PolygonTree::invert`].
    pub fn invert(&mut self) {
        for node in self.nodes.values_mut() {
            if let Some(plane) = node.plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(&mut node.front, &mut node.back);
        }
    }

    /// Removes the parts of the given entries that lie inside this tree's solid.
    ///
    /// The entries belong to `polygons`, the provenance tree of a different
    /// solid. Pieces that end up in front of a node without a front child are
    /// outside and kept; pieces behind a node without a back child are inside
    /// and removed from `polygons`. Coplanar pieces facing the same way as a
    /// node travel with the front pieces, or with the back pieces when
    /// `also_remove_coplanar_front` is set. An empty tree keeps everything.
    pub fn clip_polygons(
        &self,
        polygons: &mut PolygonTree,
        keys: &[PolygonKey],
        also_remove_coplanar_front: bool,
        config: &CsgConfig,
    ) {
        let mut stack = vec![(self.root, keys.to_vec())];
        while let Some((node_key, keys)) = stack.pop() {
            let node = &self.nodes[node_key];
            let Some(plane) = node.plane else {
                continue;
            };

            let mut front = Vec::new();
            let mut back = Vec::new();
            for key in keys {
                if polygons.is_removed(key) {
                    continue;
                }
                polygons.split_by_plane(key, &plane, config, &mut |placement, key| {
                    match placement {
                        Placement::CoplanarFront if also_remove_coplanar_front => back.push(key),
                        Placement::CoplanarFront | Placement::Front => front.push(key),
                        Placement::CoplanarBack | Placement::Back => back.push(key),
                    }
                });
            }

            if let Some(child) = node.front {
                if !front.is_empty() {
                    stack.push((child, front));
                }
            }
            match node.back {
                Some(child) => {
                    if !back.is_empty() {
                        stack.push((child, back));
                    }
                }
                None => {
                    for key in back {
                        polygons.remove(key);
                    }
                }
            }
        }
    }
}
