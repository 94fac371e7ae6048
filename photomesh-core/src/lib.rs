//! Core data structures and traits for photomesh
//!
//! This crate provides the fundamental types shared by every stage of the
//! depth-photo meshing pipeline: pixel grids and their bilinear sampler,
//! dense vertex grids, quadtree regions, textured meshes, generation
//! settings and the traits through which finished meshes leave the core.

pub mod image;
pub mod grid;
pub mod mesh;
pub mod settings;
pub mod traits;
pub mod error;

pub use image::*;
pub use grid::*;
pub use mesh::*;
pub use settings::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector2, Vector3};

/// A 3D vertex position
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A texture coordinate in `[0, 1]²`
pub type Uv = Vector2<f32>;

/// Triangle as three indices into a vertex buffer
pub type Face = [usize; 3];
