//! Neighbourhood filters over vertex grids and images
//!
//! All filters read from an immutable input and return a fresh buffer, so a
//! vertex never sees a neighbour that was already rewritten in the same pass.
//! Window samples that fall outside the grid, or whose mask disagrees with
//! the centre, are replaced by the centre sample itself.

use crate::projection::BACKGROUND_ALPHA_THRESHOLD;
use itertools::iproduct;
use photomesh_core::{
    is_foreground_border, Error, ImageSource, Point3f, Result, Rgba, RgbaImage, Uv, VertexGrid,
};
use rayon::prelude::*;

/// How a filter window is reduced to one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Arithmetic mean of the window
    Mean,
    /// Middle element of the sorted window
    Median,
}

impl FilterKind {
    fn reduce(self, values: &mut [f32]) -> f32 {
        match self {
            FilterKind::Mean => values.iter().sum::<f32>() / values.len() as f32,
            FilterKind::Median => {
                values.sort_by(f32::total_cmp);
                values[values.len() / 2]
            }
        }
    }
}

/// Radius used for foreground silhouette smoothing
pub const BORDER_FILTER_RADIUS: usize = 1;

/// Radius of the feather ramp around the foreground silhouette, in pixels
pub const FEATHER_RADIUS: usize = 3;

/// Clamp `center + offset` into `[0, len)`, or `None` when it falls outside
fn offset_index(center: usize, offset: isize, len: usize) -> Option<usize> {
    center.checked_add_signed(offset).filter(|&i| i < len)
}

/// Rescale `position` so its distance from the origin becomes `distance`
fn with_distance(position: Point3f, distance: f32) -> Point3f {
    let current = position.coords.norm();
    if current > 0.0 {
        position * (distance / current)
    } else {
        position
    }
}

/// Filter the distance of every vertex whose background flag equals
/// `target_background`, keeping its direction.
///
/// Each vertex gathers the distances in a `(2r+1)²` window; out-of-grid and
/// other-mask neighbours contribute the centre distance instead.
pub fn filter_vertices(
    grid: &VertexGrid,
    target_background: bool,
    radius: usize,
    kind: FilterKind,
) -> Vec<Point3f> {
    let (width, height) = (grid.width(), grid.height());
    let r = radius as isize;

    (0..grid.len())
        .into_par_iter()
        .map(|index| {
            let position = grid.positions[index];
            if grid.background[index] != target_background {
                return position;
            }
            let (row, col) = (index / width, index % width);
            let center = position.coords.norm();

            let mut window: Vec<f32> = iproduct!(-r..=r, -r..=r)
                .map(|(dy, dx)| {
                    match (offset_index(row, dy, height), offset_index(col, dx, width)) {
                        (Some(nr), Some(nc)) if grid.background[nr * width + nc] == target_background => {
                            grid.distance(nr * width + nc)
                        }
                        _ => center,
                    }
                })
                .collect();

            with_distance(position, kind.reduce(&mut window))
        })
        .collect()
}

/// Smooth the foreground silhouette by replacing every foreground border
/// vertex with the mean or median XYZ of the border vertices around it.
///
/// Neighbours that are off-grid, background, or interior foreground
/// contribute the centre vertex instead. Mask and UVs are unchanged.
pub fn filter_foreground_border_vertices(
    grid: &VertexGrid,
    radius: usize,
    kind: FilterKind,
) -> Vec<Point3f> {
    let (width, height) = (grid.width(), grid.height());
    let r = radius as isize;
    let on_border = |row: usize, col: usize| {
        !grid.background[row * width + col]
            && is_foreground_border(&grid.background, width, height, row, col)
    };

    (0..grid.len())
        .into_par_iter()
        .map(|index| {
            let position = grid.positions[index];
            let (row, col) = (index / width, index % width);
            if !on_border(row, col) {
                return position;
            }

            let samples: Vec<Point3f> = iproduct!(-r..=r, -r..=r)
                .map(|(dy, dx)| {
                    match (offset_index(row, dy, height), offset_index(col, dx, width)) {
                        (Some(nr), Some(nc)) if on_border(nr, nc) => grid.positions[nr * width + nc],
                        _ => position,
                    }
                })
                .collect();

            let mut xs: Vec<f32> = samples.iter().map(|p| p.x).collect();
            let mut ys: Vec<f32> = samples.iter().map(|p| p.y).collect();
            let mut zs: Vec<f32> = samples.iter().map(|p| p.z).collect();
            Point3f::new(kind.reduce(&mut xs), kind.reduce(&mut ys), kind.reduce(&mut zs))
        })
        .collect()
}

/// Filter the colour channels of an image.
///
/// When a `mask` is given only pixels where `mask[i] != invert_mask` are
/// filtered, and excluded window samples contribute the centre pixel. Edges
/// clamp. Filtered pixels come out opaque.
pub fn filter_image(
    image: &RgbaImage,
    mask: Option<&[bool]>,
    invert_mask: bool,
    radius: usize,
    kind: FilterKind,
) -> Result<RgbaImage> {
    let (width, height) = (image.width(), image.height());
    if let Some(mask) = mask {
        Error::check_len("image filter mask", width * height, mask.len())?;
    }
    let included = |index: usize| mask.map_or(true, |m| m[index] != invert_mask);
    let r = radius as isize;

    let pixels: Vec<Rgba> = (0..width * height)
        .into_par_iter()
        .map(|index| {
            let center = image.pixels()[index];
            if !included(index) {
                return center;
            }
            let (row, col) = (index / width, index % width);

            let samples: Vec<Rgba> = iproduct!(-r..=r, -r..=r)
                .map(|(dy, dx)| {
                    let nr = row.saturating_add_signed(dy).min(height - 1);
                    let nc = col.saturating_add_signed(dx).min(width - 1);
                    let neighbour = nr * width + nc;
                    if included(neighbour) {
                        image.pixels()[neighbour]
                    } else {
                        center
                    }
                })
                .collect();

            let mut rs: Vec<f32> = samples.iter().map(|p| p.r).collect();
            let mut gs: Vec<f32> = samples.iter().map(|p| p.g).collect();
            let mut bs: Vec<f32> = samples.iter().map(|p| p.b).collect();
            Rgba::new(kind.reduce(&mut rs), kind.reduce(&mut gs), kind.reduce(&mut bs), 1.0)
        })
        .collect();

    RgbaImage::new(width, height, pixels)
}

/// Build a `width × height` feather mask from a foreground alpha image.
///
/// Background pixels are black. Foreground pixels within `radius` of a
/// background pixel ramp from black to white with their distance to the
/// nearest one; every other foreground pixel is white.
pub fn feather_mask<F>(foreground: &F, width: usize, height: usize, radius: usize) -> Result<RgbaImage>
where
    F: ImageSource + Sync,
{
    let is_background = |col: usize, row: usize| {
        let uv = Uv::new(col as f32 / width as f32, row as f32 / height as f32);
        foreground.sample(uv).a < BACKGROUND_ALPHA_THRESHOLD
    };
    let r = radius as isize;

    let pixels: Vec<Rgba> = (0..width * height)
        .into_par_iter()
        .map(|index| {
            let (row, col) = (index / width, index % width);
            if is_background(col, row) {
                return Rgba::BLACK;
            }

            let nearest = iproduct!(-r..=r, -r..=r)
                .filter(|&(dy, dx)| (dy, dx) != (0, 0))
                .filter_map(|(dy, dx)| {
                    let nr = offset_index(row, dy, height)?;
                    let nc = offset_index(col, dx, width)?;
                    is_background(nc, nr).then(|| ((dx * dx + dy * dy) as f32).sqrt())
                })
                .min_by(f32::total_cmp);

            match nearest {
                Some(distance) => Rgba::BLACK.lerp(Rgba::WHITE, (distance / radius as f32).min(1.0)),
                None => Rgba::WHITE,
            }
        })
        .collect();

    RgbaImage::new(width, height, pixels)
}
