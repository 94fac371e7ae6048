//! Dense vertex grids and quadtree regions
//!
//! A `W×H` pixel depth map produces a `(W+1)×(H+1)` vertex grid, one vertex
//! per pixel corner. All per-vertex buffers are row-major with
//! `index = row * width + col`, where `width` is the vertex count per row.

use crate::{Error, Point3f, Result, Uv};
use serde::{Deserialize, Serialize};

/// A dense grid of vertices with parallel position, UV and mask buffers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexGrid {
    width: usize,
    height: usize,
    pub positions: Vec<Point3f>,
    pub uvs: Vec<Uv>,
    /// `true` for background vertices (or, on an extended grid, any vertex that is part of the background mesh)
    pub background: Vec<bool>,
}

impl VertexGrid {
    /// Create a grid with every vertex at the origin, UV zero and marked foreground
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            positions: vec![Point3f::origin(); len],
            uvs: vec![Uv::zeros(); len],
            background: vec![false; len],
        }
    }

    /// Assemble a grid from its parallel buffers, checking every length
    pub fn from_parts(
        width: usize,
        height: usize,
        positions: Vec<Point3f>,
        uvs: Vec<Uv>,
        background: Vec<bool>,
    ) -> Result<Self> {
        let grid = Self { width, height, positions, uvs, background };
        grid.validate()?;
        Ok(grid)
    }

    /// Check that every parallel buffer has exactly `width * height` entries
    pub fn validate(&self) -> Result<()> {
        let expected = self.width * self.height;
        Error::check_len("vertex positions", expected, self.positions.len())?;
        Error::check_len("vertex uvs", expected, self.uvs.len())?;
        Error::check_len("vertex mask", expected, self.background.len())?;
        Ok(())
    }

    /// Vertices per row
    pub fn width(&self) -> usize {
        self.width
    }

    /// Vertices per column
    pub fn height(&self) -> usize {
        self.height
    }

    /// Total number of vertices
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of the vertex at `(row, col)`
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Distance of vertex `index` from the projection origin
    pub fn distance(&self, index: usize) -> f32 {
        self.positions[index].coords.norm()
    }

    /// Number of background vertices
    pub fn background_count(&self) -> usize {
        self.background.iter().filter(|&&b| b).count()
    }

    /// Whether the foreground vertex at `(row, col)` touches the background
    pub fn is_foreground_border(&self, row: usize, col: usize) -> bool {
        is_foreground_border(&self.background, self.width, self.height, row, col)
    }
}

/// Whether the vertex at `(row, col)` has at least one 8-connected neighbour
/// whose `background` flag is set.
///
/// Callers use this on foreground vertices to find the silhouette.
pub fn is_foreground_border(
    background: &[bool],
    width: usize,
    height: usize,
    row: usize,
    col: usize,
) -> bool {
    let row_lo = row.saturating_sub(1);
    let row_hi = (row + 1).min(height - 1);
    let col_lo = col.saturating_sub(1);
    let col_hi = (col + 1).min(width - 1);

    for r in row_lo..=row_hi {
        for c in col_lo..=col_hi {
            if (r, c) != (row, col) && background[r * width + c] {
                return true;
            }
        }
    }
    false
}

/// Corner indices `[A, B, C, D]` (top-left, top-right, bottom-left,
/// bottom-right) of the grid cell whose bottom-right corner is `(row, col)`
pub fn cell_corners(width: usize, row: usize, col: usize) -> [usize; 4] {
    let d = row * width + col;
    [d - 1 - width, d - width, d - 1, d]
}

/// The two triangles covering a quad with corners `[A, B, C, D]`, wound `(C, B, A)` and `(C, D, B)`
pub fn quad_triangles(corners: [usize; 4]) -> [[usize; 3]; 2] {
    let [a, b, c, d] = corners;
    [[c, b, a], [c, d, b]]
}

/// Axis-aligned rectangle of grid coordinates with inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x1: usize,
    pub x2: usize,
    pub y1: usize,
    pub y2: usize,
}

impl Region {
    pub fn new(x1: usize, x2: usize, y1: usize, y2: usize) -> Self {
        Self { x1, x2, y1, y2 }
    }

    /// The region spanning a whole `width × height` vertex grid
    pub fn whole(width: usize, height: usize) -> Self {
        Self::new(0, width.saturating_sub(1), 0, height.saturating_sub(1))
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1
    }

    /// Number of grid cells covered
    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    /// Split at the midpoint of each axis into top-left, top-right,
    /// bottom-left and bottom-right quadrants; the midpoint row and column
    /// are shared between neighbours
    pub fn quadrants(&self) -> [Region; 4] {
        let xm = (self.x1 + self.x2) / 2;
        let ym = (self.y1 + self.y2) / 2;
        [
            Region::new(self.x1, xm, self.y1, ym),
            Region::new(xm, self.x2, self.y1, ym),
            Region::new(self.x1, xm, ym, self.y2),
            Region::new(xm, self.x2, ym, self.y2),
        ]
    }

    /// Whether the grid point `(col, row)` lies inside or on the border
    pub fn contains(&self, col: usize, row: usize) -> bool {
        col >= self.x1 && col <= self.x2 && row >= self.y1 && row <= self.y2
    }

    /// Corner indices `[A, B, C, D]` into a grid `grid_width` vertices wide
    pub fn corners(&self, grid_width: usize) -> [usize; 4] {
        [
            self.y1 * grid_width + self.x1,
            self.y1 * grid_width + self.x2,
            self.y2 * grid_width + self.x1,
            self.y2 * grid_width + self.x2,
        ]
    }

    /// Flat indices of every grid point in the region, row by row
    pub fn indices(&self, grid_width: usize) -> impl Iterator<Item = usize> + '_ {
        (self.y1..=self.y2)
            .flat_map(move |row| (self.x1..=self.x2).map(move |col| row * grid_width + col))
    }
}
