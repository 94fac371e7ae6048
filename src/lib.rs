//! # Photomesh
//!
//! Turn a colour photo, a depth map and a foreground matte into a layered
//! 3D mesh for parallax viewing.
//!
//! This is the umbrella crate that provides convenient access to all photomesh
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Pixel grids, vertex grids, regions, meshes, settings and sink traits
//! - **Algorithms**: Depth projection, vertex filters, topology splitting, hole synthesis
//! - **Simplification**: Quadtree simplification with crack repair, and its incremental variant
//! - **Pipeline**: The full generation pass and an in-memory sink
//!
//! ## Quick Start
//!
//! ```rust
//! use photomesh::prelude::*;
//!
//! let color = RgbaImage::filled(4, 4, Rgba::WHITE).unwrap();
//! let depth = RgbaImage::filled(4, 4, Rgba::gray(0.5)).unwrap();
//! let matte = RgbaImage::filled(4, 4, Rgba::TRANSPARENT).unwrap();
//!
//! let pipeline = PhotoPipeline::new(Settings::default()).unwrap();
//! let mut sink = MemorySink::new();
//! let inputs = PhotoInputs { color: &color, depth: &depth, foreground: &matte, fov: CameraFov::default() };
//! let photo = pipeline.generate(inputs, &mut sink).unwrap();
//! assert!(photo.background.is_some());
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables algorithms, simplification and pipeline
//! - `algorithms`: Dense-grid stages
//! - `simplification`: Quadtree simplifiers
//! - `pipeline`: End-to-end generation (pulls in the other two)
//! - `all`: Enables all features

// Re-export core functionality
pub use photomesh_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use photomesh_algorithms as algorithms;

#[cfg(feature = "simplification")]
pub use photomesh_simplification as simplification;

#[cfg(feature = "pipeline")]
pub use photomesh_pipeline as pipeline;

/// Convenient imports for common use cases
pub mod prelude {
    pub use photomesh_core::*;

    #[cfg(feature = "algorithms")]
    pub use photomesh_algorithms::*;

    #[cfg(feature = "simplification")]
    pub use photomesh_simplification::*;

    #[cfg(feature = "pipeline")]
    pub use photomesh_pipeline::*;
}
