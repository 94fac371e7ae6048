//! Core traits for photomesh
//!
//! The core never decodes, encodes or displays anything. Finished meshes and
//! generated textures are handed to the collaborators behind these traits.

use crate::{Result, RgbaImage, TexturedMesh};

/// Receives generated textures (alpha = 0 marks texels for external inpainting)
pub trait TextureSink {
    /// Handle the sink returns for a stored texture
    type TextureHandle: Clone;

    /// Persist `texture` under `name`
    fn store_texture(&mut self, name: &str, texture: &RgbaImage) -> Result<Self::TextureHandle>;
}

/// Texture a mesh should be drawn with
#[derive(Debug, Clone, PartialEq)]
pub enum MeshTexture<H> {
    /// The caller's original colour photo
    SourceColor,
    /// A texture previously stored through a [`TextureSink`]
    Stored(H),
}

/// Material a mesh should be drawn with
#[derive(Debug, Clone, PartialEq)]
pub enum MeshMaterial<H> {
    /// Plain unlit textured material
    Unlit,
    /// Alpha-feathered material using a stored feather mask
    Feathered { feather_mask: H },
}

/// Receives finished meshes and instantiates them in the caller's scene
pub trait MeshSink<H> {
    /// Handle to an instantiated object
    type MeshHandle;

    /// Create an empty parent object
    fn create_root(&mut self, name: &str) -> Result<Self::MeshHandle>;

    /// Instantiate `mesh` as a child of `parent`
    fn create_mesh(
        &mut self,
        name: &str,
        mesh: &TexturedMesh,
        texture: MeshTexture<H>,
        material: MeshMaterial<H>,
        parent: Option<&Self::MeshHandle>,
    ) -> Result<Self::MeshHandle>;
}
