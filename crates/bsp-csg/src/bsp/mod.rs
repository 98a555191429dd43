//! Binary Space Partitioning trees for boolean operations on polygon solids.
//!
//! A solid is filed into a BSP tree whose splitting planes are taken from its
//! own polygons. Because every polygon of a closed solid faces outward, a
//! point is inside the solid exactly when it ends up behind a node that has
//! no back subtree. Clipping another solid's polygons against the tree
//! therefore separates them into inside and outside pieces.
//!
//! # Example
//!
//! ```
//! use bsp_csg::bsp::Tree;
//! use bsp_csg::{CsgConfig, Polygon};
//!
//! let config = CsgConfig::default();
//! let square = Polygon::from_positions(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     &config,
//! )?;
//! let mut tree = Tree::new(vec![square], &config)?;
//! tree.invert();
//! assert_eq!(tree.all_polygons().len(), 1);
//! # Ok::<(), bsp_csg::CsgError>(())
//! ```
//!
//! # Architecture
//!
//! - [`PolygonTree`]: arena recording how each polygon was cut into fragments
//! - [`BspTree`]: arena of [`BspNode`]s holding splitting planes and keys into
//!   the polygon tree
//! - [`Tree`]: one solid, pairing a polygon tree with its BSP tree

mod node;
mod polygon_tree;
mod tree;

// Re-export main types
pub use node::{BspNode, BspTree, NodeKey};
pub use polygon_tree::{Placement, PolygonKey, PolygonTree};
pub use tree::Tree;
