//! Occlusion-hole and out-of-frame background synthesis
//!
//! The extended background is a square vertex grid, about 10% larger than
//! the dense grid, with the dense grid centred inside it. Original
//! background vertices are copied through. Foreground vertices are replaced
//! by hallucinated vertices pushed back to the surrounding background
//! distance (inpainting), and the padding ring is filled by extrapolating
//! the field of view outwards (outpainting). Every hallucinated texel is
//! left fully transparent for an external content-fill tool.

use crate::projection::viewing_direction;
use crate::topology::grid_triangles;
use photomesh_core::{
    CameraFov, Error, Face, ImageSource, Point3f, Result, Rgba, RgbaImage, Settings, Uv,
    VertexGrid,
};

/// Fraction of each dimension added as outpainting padding
pub const PADDING_FRACTION: f32 = 0.1;

/// How far behind a foreground vertex a hole vertex is pushed when the
/// surrounding background would otherwise land in front of it
pub const HOLE_DEPTH_EPSILON: f32 = 0.01;

/// Distance assumed when a row scan finds no background vertex
pub const DEFAULT_HOLE_DISTANCE: f32 = 1.0;

/// Which kinds of geometry to synthesise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Fill the holes behind the foreground
    pub inpaint: bool,
    /// Extend the grid beyond the original field of view
    pub outpaint: bool,
}

impl From<&Settings> for SynthesisOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            inpaint: settings.generate_inpainted,
            outpaint: settings.generate_outpainted,
        }
    }
}

/// Counts describing one synthesis pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    /// Original background vertices copied through
    pub copied: usize,
    /// Hallucinated vertices behind the foreground
    pub inpainted: usize,
    /// Hallucinated vertices outside the original frame
    pub outpainted: usize,
    /// Hole vertices pushed behind their foreground vertex
    pub pushed_behind: usize,
    /// Row scans that reached the grid edge without finding background
    pub missing_samples: usize,
}

/// Background distance estimate for one hole vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoleFill {
    pub distance: f32,
    /// Number of row scans (left, right) that found no background vertex
    pub missing_samples: usize,
}

/// Extended background grid and its texture
#[derive(Debug, Clone)]
pub struct ExtendedBackground {
    /// Vertex grid; `background` marks valid (copied or hallucinated) vertices
    pub grid: VertexGrid,
    /// Vertices with no direct depth sample
    pub hallucinated: Vec<bool>,
    /// Texture with alpha = 0 wherever content must be filled externally
    pub texture: RgbaImage,
    /// Triangles whose three corners are all valid
    pub faces: Vec<Face>,
    /// Row of the extended grid where the dense grid starts
    pub start_row: usize,
    /// Column of the extended grid where the dense grid starts
    pub start_col: usize,
    pub stats: SynthesisStats,
}

/// Size of the extended grid for a `width × height` dense grid.
///
/// With outpainting the result is square: the larger padded dimension on
/// both axes. Without it the dense size is kept.
pub fn extended_size(width: usize, height: usize, outpaint: bool) -> (usize, usize) {
    if !outpaint {
        return (width, height);
    }
    let padded_width = width + (PADDING_FRACTION * width as f32) as usize;
    let padded_height = height + (PADDING_FRACTION * height as f32) as usize;
    let side = padded_width.max(padded_height);
    (side, side)
}

/// Estimate the background distance behind the foreground vertex at
/// `(row, col)` by inverse-distance weighting the nearest background
/// vertices to its left and right on the same row.
pub fn estimate_background_distance(grid: &VertexGrid, row: usize, col: usize) -> HoleFill {
    let scan = |cols: &mut dyn Iterator<Item = usize>| {
        cols.enumerate()
            .find(|&(_, c)| grid.background[grid.index(row, c)])
            .map(|(step, c)| (grid.distance(grid.index(row, c)), (step + 1) as f32))
    };

    let left = scan(&mut (0..col).rev());
    let right = scan(&mut (col + 1..grid.width()));
    let missing_samples = left.is_none() as usize + right.is_none() as usize;

    let (d_left, n_left) = left.unwrap_or((DEFAULT_HOLE_DISTANCE, 1.0));
    let (d_right, n_right) = right.unwrap_or((DEFAULT_HOLE_DISTANCE, 1.0));
    let (w_left, w_right) = (1.0 / n_left, 1.0 / n_right);

    HoleFill {
        distance: (d_left * w_left + d_right * w_right) / (w_left + w_right),
        missing_samples,
    }
}

/// Build the extended background for a dense grid.
///
/// `color` is sampled at the original UVs to fill the centred part of the
/// texture. Triangles are formed like the dense grid's but only tested
/// against the validity mask.
pub fn synthesize_extended_background<C>(
    grid: &VertexGrid,
    color: &C,
    fov: CameraFov,
    options: SynthesisOptions,
) -> Result<ExtendedBackground>
where
    C: ImageSource,
{
    grid.validate()?;
    if grid.is_empty() {
        return Err(Error::InvalidData("cannot extend an empty grid".to_string()));
    }

    let (width, height) = (grid.width(), grid.height());
    let (ext_width, ext_height) = extended_size(width, height, options.outpaint);
    let start_row = (ext_height - height) / 2;
    let start_col = (ext_width - width) / 2;

    let mut extended = VertexGrid::new(ext_width, ext_height);
    let mut hallucinated = vec![false; extended.len()];
    let mut colors = vec![Rgba::TRANSPARENT; extended.len()];
    let mut stats = SynthesisStats::default();

    let degrees_per_col = fov.horizontal / width as f32;
    let degrees_per_row = fov.vertical / height as f32;

    for row in 0..ext_height {
        for col in 0..ext_width {
            let index = extended.index(row, col);
            extended.uvs[index] = Uv::new(col as f32 / ext_width as f32, row as f32 / ext_height as f32);

            let inside = (start_row..start_row + height).contains(&row)
                && (start_col..start_col + width).contains(&col);

            if inside {
                let (orig_row, orig_col) = (row - start_row, col - start_col);
                let orig = grid.index(orig_row, orig_col);
                colors[index] = color.sample(grid.uvs[orig]);

                if grid.background[orig] {
                    extended.positions[index] = grid.positions[orig];
                    extended.background[index] = true;
                    stats.copied += 1;
                    continue;
                }
                if !options.inpaint {
                    continue;
                }

                let fill = estimate_background_distance(grid, orig_row, orig_col);
                stats.missing_samples += fill.missing_samples;

                let foreground_distance = grid.distance(orig);
                let mut distance = fill.distance;
                if distance < foreground_distance {
                    distance = foreground_distance + HOLE_DEPTH_EPSILON;
                    stats.pushed_behind += 1;
                }

                let direction = grid.positions[orig].coords.normalize();
                extended.positions[index] = Point3f::from(direction * distance);
                stats.inpainted += 1;
            } else {
                // Distance from the nearest dense-grid vertex, direction from the extrapolated FOV
                let near_row = row.clamp(start_row, start_row + height - 1) - start_row;
                let near_col = col.clamp(start_col, start_col + width - 1) - start_col;
                let distance = grid.distance(grid.index(near_row, near_col));

                let angle_x = (col as f32 - start_col as f32) * degrees_per_col - fov.horizontal / 2.0;
                let angle_y = (row as f32 - start_row as f32) * degrees_per_row - fov.vertical / 2.0;
                extended.positions[index] = Point3f::from(viewing_direction(angle_x, angle_y) * distance);
                stats.outpainted += 1;
            }

            colors[index] = Rgba::TRANSPARENT;
            extended.background[index] = true;
            hallucinated[index] = true;
        }
    }

    if stats.missing_samples > 0 {
        log::warn!(
            "{} hole-fill row scans found no background; used default distance {}",
            stats.missing_samples,
            DEFAULT_HOLE_DISTANCE
        );
    }
    log::debug!(
        "Extended background {}x{}: {} copied, {} inpainted, {} outpainted",
        ext_width,
        ext_height,
        stats.copied,
        stats.inpainted,
        stats.outpainted
    );

    let faces = grid_triangles(ext_width, ext_height, |i| extended.background[i]);
    let texture = RgbaImage::new(ext_width, ext_height, colors)?;

    Ok(ExtendedBackground {
        grid: extended,
        hallucinated,
        texture,
        faces,
        start_row,
        start_col,
        stats,
    })
}
