//! Distance field and region bounds
//!
//! The simplifier measures flatness on the distance of every vertex from
//! the projection origin. Vertices outside the active selection carry an
//! infinite distance, which makes every region containing them too rough
//! to collapse.

use photomesh_core::{Region, VertexGrid};
use std::collections::HashMap;

/// Regions with fewer cells than this have their bounds computed directly and memoised
pub const LEAF_CACHE_AREA: usize = 32;

/// Distance assigned to vertices a pass must not simplify
pub const EXCLUDED_DISTANCE: f32 = f32::INFINITY;

/// Which vertices of a grid a simplification pass works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSelection {
    /// Mask value a vertex needs to be simplified
    pub background: bool,
    /// Also exclude selected vertices with an 8-connected neighbour outside the selection
    pub skip_border: bool,
}

impl VertexSelection {
    /// Background (or extended background) vertices, border included
    pub fn background() -> Self {
        Self { background: true, skip_border: false }
    }

    /// Foreground vertices, keeping the silhouette at full resolution
    pub fn foreground() -> Self {
        Self { background: false, skip_border: true }
    }

    /// Whether vertex `index` of `grid` takes part in simplification
    pub fn includes(&self, grid: &VertexGrid, index: usize) -> bool {
        if grid.background[index] != self.background {
            return false;
        }
        if !self.skip_border {
            return true;
        }
        let (width, height) = (grid.width(), grid.height());
        let (row, col) = (index / width, index % width);
        !neighbours(width, height, row, col).any(|n| grid.background[n] != self.background)
    }
}

/// Flat indices of the 8-connected neighbours of `(row, col)`
fn neighbours(width: usize, height: usize, row: usize, col: usize) -> impl Iterator<Item = usize> {
    let rows = row.saturating_sub(1)..=(row + 1).min(height - 1);
    rows.flat_map(move |r| {
        (col.saturating_sub(1)..=(col + 1).min(width - 1))
            .filter(move |&c| (r, c) != (row, col))
            .map(move |c| r * width + c)
    })
}

/// Per-vertex distance from the origin, [`EXCLUDED_DISTANCE`] for vertices
/// outside `selection`
pub fn distance_field(grid: &VertexGrid, selection: VertexSelection) -> Vec<f32> {
    (0..grid.len())
        .map(|i| {
            if selection.includes(grid, i) {
                grid.distance(i)
            } else {
                EXCLUDED_DISTANCE
            }
        })
        .collect()
}

/// Memoised `(min, max)` distance bounds of small regions.
///
/// Regions of at least [`LEAF_CACHE_AREA`] cells are never stored: their
/// bounds are merged from their four quadrants on every call, which keeps
/// the map proportional to the number of leaf regions.
#[derive(Debug, Clone, Default)]
pub struct RegionBoundsCache {
    entries: HashMap<Region, (f32, f32)>,
}

impl RegionBoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoised regions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(min, max)` of `distances` over `region`.
    ///
    /// If the region holds an excluded vertex the result is
    /// `(-∞, +∞)`, so its spread can never pass a flatness test.
    pub fn bounds(&mut self, region: Region, distances: &[f32], grid_width: usize) -> (f32, f32) {
        if region.area() >= LEAF_CACHE_AREA {
            return region
                .quadrants()
                .iter()
                .map(|&quadrant| self.bounds(quadrant, distances, grid_width))
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), (min, max)| {
                    (lo.min(min), hi.max(max))
                });
        }

        if let Some(&bounds) = self.entries.get(&region) {
            return bounds;
        }

        let (min, max) = region
            .indices(grid_width)
            .map(|i| distances[i])
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));
        let bounds = if max == EXCLUDED_DISTANCE {
            (f32::NEG_INFINITY, f32::INFINITY)
        } else {
            (min, max)
        };

        self.entries.insert(region, bounds);
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use photomesh_core::Point3f;

    fn make_grid(size: usize, distance: impl Fn(usize, usize) -> f32) -> VertexGrid {
        let mut grid = VertexGrid::new(size, size);
        for row in 0..size {
            for col in 0..size {
                let i = grid.index(row, col);
                grid.positions[i] = Point3f::new(0.0, 0.0, distance(row, col));
                grid.background[i] = true;
            }
        }
        grid
    }

    #[test]
    fn test_foreground_selection_skips_border() {
        let mut grid = make_grid(5, |_, _| 1.0);
        for row in 1..4 {
            for col in 1..4 {
                let i = grid.index(row, col);
                grid.background[i] = false;
            }
        }
        let field = distance_field(&grid, VertexSelection::foreground());
        // Only the centre foreground vertex is away from the background
        let included: Vec<usize> = (0..field.len()).filter(|&i| field[i].is_finite()).collect();
        assert_eq!(included, vec![12]);

        let field = distance_field(&grid, VertexSelection::background());
        assert_eq!(field.iter().filter(|d| d.is_finite()).count(), 16);
    }

    #[test]
    fn test_bounds_merge_matches_direct_scan() {
        let grid = make_grid(17, |row, col| 1.0 + (row * 17 + col) as f32 * 0.001);
        let field = distance_field(&grid, VertexSelection::background());
        let mut cache = RegionBoundsCache::new();

        let (min, max) = cache.bounds(Region::whole(17, 17), &field, 17);
        assert_relative_eq!(min, 1.0);
        assert_relative_eq!(max, 1.0 + 288.0 * 0.001);
        // Only leaf-sized regions are memoised
        assert!(!cache.is_empty());
        assert!(!cache.entries.contains_key(&Region::whole(17, 17)));
        assert!(cache.entries.keys().all(|r| r.area() < LEAF_CACHE_AREA));
    }

    #[test]
    fn test_excluded_vertex_poisons_region() {
        let mut grid = make_grid(9, |_, _| 1.0);
        grid.background[40] = false;
        let field = distance_field(&grid, VertexSelection::background());
        let mut cache = RegionBoundsCache::new();

        let (min, max) = cache.bounds(Region::whole(9, 9), &field, 9);
        assert_eq!(min, f32::NEG_INFINITY);
        assert_eq!(max, f32::INFINITY);

        // A quadrant away from the excluded vertex stays flat
        let (min, max) = cache.bounds(Region::new(0, 2, 0, 2), &field, 9);
        assert_relative_eq!(max - min, 0.0);
    }
}
