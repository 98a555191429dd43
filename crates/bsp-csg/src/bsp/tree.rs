//! One solid under construction: provenance tree plus BSP.

use super::node::BspTree;
use super::polygon_tree::{PolygonKey, PolygonTree};
use crate::{CsgConfig, Polygon, Result};

/// A solid held as a [`PolygonTree`] indexed by a [`BspTree`].
///
/// Boolean operations copy each operand into its own `Tree`, then clip and
/// invert the two trees against each other before collecting survivors.
#[derive(Debug, Clone)]
pub struct Tree {
    polygons: PolygonTree,
    bsp: BspTree,
    config: CsgConfig,
}

impl Tree {
    /// Builds a tree from the polygons of one solid.
    ///
    /// # Errors
    /// Fails if the BSP would grow deeper than `config.max_depth`.
    pub fn new(polygons: Vec<Polygon>, config: &CsgConfig) -> Result<Self> {
        let mut tree = Self {
            polygons: PolygonTree::new(),
            bsp: BspTree::new(),
            config: *config,
        };
        tree.add_polygons(polygons)?;
        Ok(tree)
    }

    /// Returns the configuration the tree was built with.
    #[inline]
    pub fn config(&self) -> &CsgConfig {
        &self.config
    }

    #[inline]
    pub fn polygon_tree(&self) -> &PolygonTree {
        &self.polygons
    }

    #[inline]
    pub fn bsp(&self) -> &BspTree {
        &self.bsp
    }

    /// Adds polygons to the provenance tree and files them into the BSP.
    pub fn add_polygons(&mut self, polygons: Vec<Polygon>) -> Result<()> {
        let keys = self.polygons.add_polygons(polygons);
        self.bsp
            .add_polygon_tree_nodes(&mut self.polygons, keys, &self.config)
    }

    /// Swaps inside and outside.
    pub fn invert(&mut self) {
        self.polygons.invert();
        self.bsp.invert();
    }

    /// Removes everything of this solid that lies inside `other`.
    ///
    /// See [`BspTree::clip_polygons`] for the handling of coplanar faces.
    pub fn clip_to(&mut self, other: &Tree, also_remove_coplanar_front: bool) {
        let keys: Vec<PolygonKey> = self
            .bsp
            .nodes()
            .flat_map(|node| node.polygon_nodes().iter().copied())
            .collect();
        other.bsp.clip_polygons(
            &mut self.polygons,
            &keys,
            also_remove_coplanar_front,
            &self.config,
        );
    }

    /// Collects the surviving polygons.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        self.polygons.polygons()
    }
}
