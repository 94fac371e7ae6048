//! Adaptive simplification of grid-shaped meshes
//!
//! Depth meshes produced from a vertex grid are mostly flat. This crate
//! collapses flat rectangular regions of the grid into single quads:
//! - Quadtree simplification with crack repair and vertex compaction
//! - An incremental, step-at-a-time variant for visualising the process
//! - A distance field and region-bounds cache, shared by both passes

pub mod bounds;
pub mod quadtree;
pub mod incremental;

pub use bounds::*;
pub use quadtree::*;
pub use incremental::*;
