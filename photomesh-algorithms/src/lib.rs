//! # Photomesh Algorithms
//!
//! Dense-grid stages of the depth-photo meshing pipeline.
//!
//! This crate turns sampled depth and foreground images into a vertex grid,
//! cleans it with neighbourhood filters, splits it into foreground and
//! background triangle lists and synthesises the extended background that
//! fills occlusion holes and widens the field of view.

pub mod projection;
pub mod filtering;
pub mod topology;
pub mod synthesis;

// Re-export commonly used items
pub use projection::*;
pub use filtering::*;
pub use topology::*;
pub use synthesis::*;
