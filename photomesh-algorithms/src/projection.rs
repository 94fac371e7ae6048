//! Depth-to-3D vertex projection
//!
//! Every pixel corner of the depth map becomes a vertex. Its depth (after an
//! optional disparity conversion) becomes the distance along a viewing ray,
//! and the foreground mask decides whether it belongs to the background.

use itertools::Itertools;
use photomesh_core::{
    CameraFov, Error, ImageSource, Point3f, Result, Settings, Uv, Vector3f, VertexGrid,
};
use rayon::prelude::*;

/// Added to every depth so no vertex lands on the projection origin
pub const DEPTH_OFFSET: f32 = 1.0;

/// Foreground-mask alpha below which a vertex is background
pub const BACKGROUND_ALPHA_THRESHOLD: f32 = 0.01;

/// Position in the descending background-distance ordering used as the outlier threshold
pub const OUTLIER_PERCENTILE: f32 = 0.9;

/// Convert a raw depth-map sample to a depth value.
///
/// With disparity conversion the result lies in `[0, max_distance]`:
/// `1 / (disparity + 1 / max_depth)` is rescaled from `[0.5, max_depth]`.
/// Without it the sample is treated as inverted depth, `1 - disparity`.
pub fn disparity_to_depth(disparity: f32, settings: &Settings) -> f32 {
    if settings.convert_disparity_to_depth {
        let max_depth = settings.max_depth;
        let depth = 1.0 / (disparity + 1.0 / max_depth);
        (depth - 0.5) / (max_depth - 0.5) * settings.max_distance
    } else {
        1.0 - disparity
    }
}

/// Unit viewing direction for horizontal and vertical angles in degrees
pub fn viewing_direction(angle_x: f32, angle_y: f32) -> Vector3f {
    let (ax, ay) = (angle_x.to_radians(), angle_y.to_radians());
    Vector3f::new(ax.sin(), ay.sin(), ax.cos()).normalize()
}

/// Place a vertex with texture coordinate `uv` at `depth`
pub fn project_vertex(uv: Uv, depth: f32, fov: CameraFov, project_from_origin: bool) -> Point3f {
    if project_from_origin {
        let direction = viewing_direction(
            (uv.x - 0.5) * fov.horizontal,
            (uv.y - 0.5) * fov.vertical,
        );
        Point3f::from(direction * (depth + DEPTH_OFFSET))
    } else {
        Point3f::new(uv.x * 2.0 - 1.0, uv.y * 2.0 - 1.0, depth + DEPTH_OFFSET)
    }
}

/// Build the dense vertex grid for a depth map.
///
/// The grid has one vertex per pixel corner, `(W+1)×(H+1)` for a `W×H`
/// depth map. Depth comes from the red channel of `depth`; a vertex is
/// background when the alpha of `foreground` is below
/// [`BACKGROUND_ALPHA_THRESHOLD`].
pub fn project_vertices<D, F>(
    depth: &D,
    foreground: &F,
    fov: CameraFov,
    settings: &Settings,
) -> Result<VertexGrid>
where
    D: ImageSource + Sync,
    F: ImageSource + Sync,
{
    if depth.width() == 0 || depth.height() == 0 {
        return Err(Error::InvalidData("depth map must not be empty".to_string()));
    }

    let width = depth.width() + 1;
    let height = depth.height() + 1;

    let vertices: Vec<(Point3f, Uv, bool)> = (0..width * height)
        .into_par_iter()
        .map(|index| {
            let col = index % width;
            let row = index / width;
            let uv = Uv::new(col as f32 / width as f32, row as f32 / height as f32);

            let disparity = settings
                .depth_override
                .unwrap_or_else(|| depth.sample(uv).r);
            let vertex_depth = disparity_to_depth(disparity, settings);
            let is_background = foreground.sample(uv).a < BACKGROUND_ALPHA_THRESHOLD;

            (
                project_vertex(uv, vertex_depth, fov, settings.project_from_origin),
                uv,
                is_background,
            )
        })
        .collect();

    let (positions, uvs, background): (Vec<_>, Vec<_>, Vec<_>) =
        vertices.into_iter().multiunzip();

    let grid = VertexGrid::from_parts(width, height, positions, uvs, background)?;
    log::debug!(
        "Projected {}x{} vertex grid ({} background vertices)",
        width,
        height,
        grid.background_count()
    );
    Ok(grid)
}

/// Outcome of [`remove_background_outliers`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierStats {
    /// Distance every nearer background vertex was pushed out to
    pub threshold: f32,
    /// Number of vertices that were moved
    pub clamped: usize,
}

/// Push background vertices nearer than the outlier threshold out to it.
///
/// Background distances are sorted in descending order and the one at
/// [`OUTLIER_PERCENTILE`] of the way down becomes the threshold. Vertices
/// keep their direction. Returns `None` when the grid has no background.
pub fn remove_background_outliers(grid: &mut VertexGrid) -> Option<OutlierStats> {
    let mut distances: Vec<f32> = grid
        .positions
        .iter()
        .zip(&grid.background)
        .filter(|(_, bg)| **bg)
        .map(|(p, _)| p.coords.norm())
        .collect();
    if distances.is_empty() {
        return None;
    }

    distances.sort_by(|a, b| b.total_cmp(a));
    let threshold = distances[(distances.len() as f32 * OUTLIER_PERCENTILE) as usize];

    let mut clamped = 0;
    for (position, _) in grid
        .positions
        .iter_mut()
        .zip(&grid.background)
        .filter(|(_, bg)| **bg)
    {
        let distance = position.coords.norm();
        if distance > 0.0 && distance < threshold {
            *position *= threshold / distance;
            clamped += 1;
        }
    }

    log::debug!(
        "Outlier removal clamped {} background vertices to distance {:.4}",
        clamped,
        threshold
    );
    Some(OutlierStats { threshold, clamped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use photomesh_core::{Rgba, RgbaImage};

    fn flat_depth(width: usize, height: usize, value: f32) -> RgbaImage {
        RgbaImage::filled(width, height, Rgba::gray(value)).unwrap()
    }

    fn transparent(width: usize, height: usize) -> RgbaImage {
        RgbaImage::filled(width, height, Rgba::TRANSPARENT).unwrap()
    }

    #[test]
    fn test_disparity_conversion() {
        let settings = Settings::default();
        // max_depth = 1: disparity 0 -> depth 1 -> max_distance
        assert_relative_eq!(disparity_to_depth(0.0, &settings), 1.0);
        // disparity 1 -> depth 0.5 -> 0
        assert_abs_diff_eq!(disparity_to_depth(1.0, &settings), 0.0, epsilon = 1e-6);

        let mut settings = Settings::default();
        settings.convert_disparity_to_depth = false;
        assert_relative_eq!(disparity_to_depth(0.25, &settings), 0.75);
    }

    #[test]
    fn test_center_vertex_looks_down_z() {
        let fov = CameraFov::default();
        let p = project_vertex(Uv::new(0.5, 0.5), 0.5, fov, true);
        assert_abs_diff_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 1.5);
    }

    #[test]
    fn test_projection_distance_is_depth_plus_offset() {
        let fov = CameraFov::new(60.0, 40.0);
        for uv in [Uv::new(0.0, 0.0), Uv::new(0.9, 0.2), Uv::new(0.3, 0.7)] {
            let p = project_vertex(uv, 0.25, fov, true);
            assert_relative_eq!(p.coords.norm(), 1.25, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_orthographic_projection() {
        let p = project_vertex(Uv::new(0.25, 1.0), 0.5, CameraFov::default(), false);
        assert_relative_eq!(p, Point3f::new(-0.5, 1.0, 1.5));
    }

    #[test]
    fn test_project_vertices_dimensions_and_mask() {
        let depth = flat_depth(4, 3, 0.5);
        let mut fg = transparent(4, 3);
        fg.set_pixel(0, 0, Rgba::WHITE);

        let grid = project_vertices(&depth, &fg, CameraFov::default(), &Settings::default()).unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 4);
        assert_eq!(grid.positions.len(), 20);
        assert_eq!(grid.uvs.len(), 20);
        assert_eq!(grid.background.len(), 20);
        assert!(!grid.background[0]);
        assert!(grid.background[19]);
        assert_relative_eq!(grid.uvs[6], Uv::new(0.2, 0.25));
    }

    #[test]
    fn test_depth_override() {
        let depth = flat_depth(2, 2, 0.0);
        let fg = transparent(2, 2);
        let mut settings = Settings::default();
        settings.depth_override = Some(1.0);
        let grid = project_vertices(&depth, &fg, CameraFov::default(), &settings).unwrap();
        for i in 0..grid.len() {
            assert_abs_diff_eq!(grid.distance(i), DEPTH_OFFSET, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_outlier_removal_clamps_near_background() {
        let depth = flat_depth(9, 1, 0.0);
        let fg = transparent(9, 1);
        let mut settings = Settings::default();
        settings.convert_disparity_to_depth = false;
        let mut grid = project_vertices(&depth, &fg, CameraFov::default(), &settings).unwrap();

        // Pull one vertex in; it must be pushed back out
        grid.positions[3] *= 0.5;
        let stats = remove_background_outliers(&mut grid).unwrap();
        assert!(stats.clamped >= 1);
        assert_relative_eq!(stats.threshold, 2.0, epsilon = 1e-5);
        assert_relative_eq!(grid.distance(3), 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_outlier_removal_without_background() {
        let mut grid = VertexGrid::new(2, 2);
        assert!(remove_background_outliers(&mut grid).is_none());
    }
}
