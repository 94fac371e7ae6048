//! Step-by-step quadtree simplification for visualisation
//!
//! Walks the same quadtree as [`QuadtreeSimplifier`] with an explicit
//! stack instead of recursion, editing one triangle list in place. Each
//! call to [`Iterator::next`] runs until exactly one region collapses, so
//! a caller can render the partial mesh between steps. Vertices are never
//! compacted and cracks are not repaired.

use crate::bounds::{distance_field, RegionBoundsCache, VertexSelection};
use crate::quadtree::{QuadtreeSimplifier, MIN_SPLIT_AREA};
use photomesh_core::{quad_triangles, Error, Face, Region, Result, VertexGrid};

/// One region collapse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollapseStep {
    pub region: Region,
    /// Triangles lying entirely inside the region that were removed
    pub removed_triangles: usize,
}

/// Iterator over the collapses of a quadtree simplification
#[derive(Debug, Clone)]
pub struct IncrementalSimplifier {
    simplifier: QuadtreeSimplifier,
    width: usize,
    distances: Vec<f32>,
    cache: RegionBoundsCache,
    pending: Vec<Region>,
    faces: Vec<Face>,
    regions: Vec<Region>,
}

impl IncrementalSimplifier {
    /// Prepare to simplify `faces` (indices into `grid`) over the
    /// `selection` part of `grid`
    pub fn new(
        simplifier: QuadtreeSimplifier,
        grid: &VertexGrid,
        faces: Vec<Face>,
        selection: VertexSelection,
    ) -> Result<Self> {
        grid.validate()?;
        if faces.iter().flatten().any(|&i| i >= grid.len()) {
            return Err(Error::InvalidData(
                "triangle index out of range for grid".to_string(),
            ));
        }

        let pending = if grid.is_empty() {
            Vec::new()
        } else {
            vec![Region::whole(grid.width(), grid.height())]
        };

        Ok(Self {
            simplifier,
            width: grid.width(),
            distances: distance_field(grid, selection),
            cache: RegionBoundsCache::new(),
            pending,
            faces,
            regions: Vec::new(),
        })
    }

    /// Current triangle list, indices into the source grid
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Regions collapsed so far, in collapse order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Whether every region has been processed
    pub fn is_finished(&self) -> bool {
        self.pending.is_empty()
    }

    /// Run to completion and return the final triangle list
    pub fn finish(mut self) -> Vec<Face> {
        self.by_ref().for_each(drop);
        self.faces
    }

    fn collapse(&mut self, region: Region) -> CollapseStep {
        let width = self.width;
        let before = self.faces.len();
        self.faces.retain(|face| {
            !face.iter().all(|&i| region.contains(i % width, i / width))
        });
        let removed_triangles = before - self.faces.len();

        self.faces.extend(quad_triangles(region.corners(width)));
        self.regions.push(region);
        CollapseStep { region, removed_triangles }
    }
}

impl Iterator for IncrementalSimplifier {
    type Item = CollapseStep;

    fn next(&mut self) -> Option<CollapseStep> {
        while let Some(region) = self.pending.pop() {
            if region.area() < MIN_SPLIT_AREA {
                continue;
            }

            let bounds = self.cache.bounds(region, &self.distances, self.width);
            if self.simplifier.can_collapse(region, bounds) {
                let step = self.collapse(region);
                log::trace!("Collapsed {:?}, removed {} triangles", region, step.removed_triangles);
                return Some(step);
            }
            self.pending.extend(region.quadrants());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photomesh_core::{cell_corners, Point3f};

    fn make_plane_grid(size: usize, distance: impl Fn(usize, usize) -> f32) -> (VertexGrid, Vec<Face>) {
        let mut grid = VertexGrid::new(size, size);
        for row in 0..size {
            for col in 0..size {
                let i = grid.index(row, col);
                grid.positions[i] = Point3f::new(0.0, 0.0, distance(row, col));
                grid.background[i] = true;
            }
        }
        let mut faces = Vec::new();
        for row in 1..size {
            for col in 1..size {
                faces.extend(quad_triangles(cell_corners(size, row, col)));
            }
        }
        (grid, faces)
    }

    #[test]
    fn test_flat_grid_collapses_in_one_step() {
        let (grid, faces) = make_plane_grid(5, |_, _| 1.0);
        let mut steps =
            IncrementalSimplifier::new(QuadtreeSimplifier::new(), &grid, faces, VertexSelection::background())
                .unwrap();

        let step = steps.next().unwrap();
        assert_eq!(step.region, Region::whole(5, 5));
        assert_eq!(step.removed_triangles, 32);
        assert_eq!(steps.faces().len(), 2);
        assert!(steps.next().is_none());
        assert!(steps.is_finished());
    }

    #[test]
    fn test_last_quadrant_is_processed_first() {
        // Only the bottom-right quadrant is rough
        let (grid, faces) = make_plane_grid(9, |row, col| {
            if row > 4 && col > 4 { 1.0 + ((row + col) % 2) as f32 } else { 1.0 }
        });
        let simplifier = QuadtreeSimplifier::new();
        let steps: Vec<CollapseStep> =
            IncrementalSimplifier::new(simplifier, &grid, faces, VertexSelection::background())
                .unwrap()
                .collect();

        let regions: Vec<Region> = steps.iter().map(|s| s.region).collect();
        assert_eq!(
            regions,
            vec![Region::new(0, 4, 4, 8), Region::new(4, 8, 0, 4), Region::new(0, 4, 0, 4)]
        );
        assert!(steps.iter().all(|s| s.removed_triangles == 32));
    }

    #[test]
    fn test_matches_quadtree_regions() {
        let (grid, faces) = make_plane_grid(17, |row, col| 1.0 + ((row / 4) * (col / 4)) as f32 * 0.02);
        let simplifier = QuadtreeSimplifier::with_params(256, 0.025);

        let mut bulk = simplifier
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap()
            .regions;
        let stepper =
            IncrementalSimplifier::new(simplifier, &grid, faces, VertexSelection::background()).unwrap();
        let mut stepped: Vec<Region> = stepper.clone().map(|s| s.region).collect();

        let key = |r: &Region| (r.y1, r.x1, r.y2, r.x2);
        bulk.sort_by_key(key);
        stepped.sort_by_key(key);
        assert_eq!(bulk, stepped);

        let final_faces = stepper.finish();
        assert!(final_faces.len() < 2 * 16 * 16);
    }
}
