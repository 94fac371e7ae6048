//! 3D photo generation
//!
//! This crate wires the dense-grid stages and the simplifier into one
//! generation pass:
//! - Project and filter the dense vertex grid
//! - Split it into foreground and background topology
//! - Synthesise the extended background and its texture
//! - Simplify each mesh and hand it, with its textures, to the caller's sinks

pub mod pipeline;
pub mod sink;

pub use pipeline::*;
pub use sink::*;
