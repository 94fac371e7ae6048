//! Foreground/background topology splitting
//!
//! Every grid cell is covered by two triangles, `(C, B, A)` and `(C, D, B)`,
//! where A/B are its top corners and C/D its bottom corners. A triangle is
//! kept by a mesh only when all three of its corners belong to that mesh.

use photomesh_core::{cell_corners, quad_triangles, Face, VertexGrid};

/// Triangle lists produced by [`split_topology`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitTriangles {
    pub foreground: Vec<Face>,
    pub background: Vec<Face>,
}

/// Emit every cell triangle of a `width × height` vertex grid whose three
/// corners satisfy `keep`
pub fn grid_triangles(width: usize, height: usize, keep: impl Fn(usize) -> bool) -> Vec<Face> {
    let mut faces = Vec::new();
    for row in 1..height {
        for col in 1..width {
            for face in quad_triangles(cell_corners(width, row, col)) {
                if face.iter().all(|&i| keep(i)) {
                    faces.push(face);
                }
            }
        }
    }
    faces
}

/// Every cell triangle of the grid, with no membership test
pub fn all_triangles(width: usize, height: usize) -> Vec<Face> {
    grid_triangles(width, height, |_| true)
}

/// Split the grid's triangles into foreground-only and background-only lists.
///
/// Triangles with corners on both sides of the silhouette are dropped; the
/// resulting gap is what the synthesised background later fills.
pub fn split_topology(grid: &VertexGrid) -> SplitTriangles {
    let (width, height) = (grid.width(), grid.height());
    let mut split = SplitTriangles::default();

    for row in 1..height {
        for col in 1..width {
            for face in quad_triangles(cell_corners(width, row, col)) {
                let flags = face.map(|i| grid.background[i]);
                if flags.iter().all(|&bg| bg) {
                    split.background.push(face);
                } else if flags.iter().all(|&bg| !bg) {
                    split.foreground.push(face);
                }
            }
        }
    }

    log::debug!(
        "Topology split: {} foreground, {} background triangles",
        split.foreground.len(),
        split.background.len()
    );
    split
}
