//! In-memory sinks
//!
//! `MemorySink` records every texture and object handed to it. Handles are
//! plain indices into its `textures` and `objects` lists.

use photomesh_core::{
    Error, MeshMaterial, MeshSink, MeshTexture, Result, RgbaImage, TextureSink, TexturedMesh,
};

/// A texture stored through [`TextureSink::store_texture`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTexture {
    pub name: String,
    pub image: RgbaImage,
}

/// An object created through [`MeshSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: String,
    /// `None` for empty parent objects
    pub mesh: Option<TexturedMesh>,
    pub texture: Option<MeshTexture<usize>>,
    pub material: Option<MeshMaterial<usize>>,
    pub parent: Option<usize>,
}

/// Texture and mesh sink that keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub textures: Vec<StoredTexture>,
    pub objects: Vec<SceneObject>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the most recently stored texture named `name`
    pub fn texture_handle(&self, name: &str) -> Option<usize> {
        self.textures.iter().rposition(|t| t.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&RgbaImage> {
        self.texture_handle(name).map(|i| &self.textures[i].image)
    }

    /// Most recently created object named `name`
    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().rev().find(|o| o.name == name)
    }

    /// Objects parented to `handle`
    pub fn children(&self, handle: usize) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(move |o| o.parent == Some(handle))
    }
}

impl TextureSink for MemorySink {
    type TextureHandle = usize;

    fn store_texture(&mut self, name: &str, texture: &RgbaImage) -> Result<usize> {
        self.textures.push(StoredTexture {
            name: name.to_string(),
            image: texture.clone(),
        });
        Ok(self.textures.len() - 1)
    }
}

impl MeshSink<usize> for MemorySink {
    type MeshHandle = usize;

    fn create_root(&mut self, name: &str) -> Result<usize> {
        self.objects.push(SceneObject {
            name: name.to_string(),
            mesh: None,
            texture: None,
            material: None,
            parent: None,
        });
        Ok(self.objects.len() - 1)
    }

    fn create_mesh(
        &mut self,
        name: &str,
        mesh: &TexturedMesh,
        texture: MeshTexture<usize>,
        material: MeshMaterial<usize>,
        parent: Option<&usize>,
    ) -> Result<usize> {
        if let MeshTexture::Stored(handle) = texture {
            if handle >= self.textures.len() {
                return Err(Error::Sink(format!("unknown texture handle {}", handle)));
            }
        }
        if let Some(&parent) = parent {
            if parent >= self.objects.len() {
                return Err(Error::Sink(format!("unknown parent handle {}", parent)));
            }
        }

        self.objects.push(SceneObject {
            name: name.to_string(),
            mesh: Some(mesh.clone()),
            texture: Some(texture),
            material: Some(material),
            parent: parent.copied(),
        });
        Ok(self.objects.len() - 1)
    }
}
