//! Textured mesh produced by the pipeline

use crate::{Error, Face, Point3f, Result, Uv, Vector3f};
use serde::{Deserialize, Serialize};

/// A triangle mesh with one texture coordinate per vertex
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TexturedMesh {
    pub positions: Vec<Point3f>,
    pub uvs: Vec<Uv>,
    pub faces: Vec<Face>,
}

impl TexturedMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh from its buffers
    pub fn from_parts(positions: Vec<Point3f>, uvs: Vec<Uv>, faces: Vec<Face>) -> Result<Self> {
        Error::check_len("mesh uvs", positions.len(), uvs.len())?;
        if let Some(&bad) = faces.iter().flatten().find(|&&i| i >= positions.len()) {
            return Err(Error::InvalidData(format!(
                "face index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }
        Ok(Self { positions, uvs, faces })
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh, returning its index
    pub fn add_vertex(&mut self, position: Point3f, uv: Uv) -> usize {
        let index = self.positions.len();
        self.positions.push(position);
        self.uvs.push(uv);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    /// Flat `u32` index buffer, three entries per face
    pub fn triangle_indices(&self) -> Vec<u32> {
        self.faces
            .iter()
            .flat_map(|f| f.iter().map(|&i| i as u32))
            .collect()
    }

    /// Per-vertex displacement `self - target`, for use as a blend shape on `target`
    pub fn blend_shape_deltas(&self, target: &TexturedMesh) -> Result<Vec<Vector3f>> {
        Error::check_len("blend shape vertices", self.vertex_count(), target.vertex_count())?;
        Ok(self
            .positions
            .iter()
            .zip(&target.positions)
            .map(|(s, t)| s - t)
            .collect())
    }
}
