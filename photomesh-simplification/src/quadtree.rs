//! Quadtree grid simplification
//!
//! Starting from the whole grid, a region whose distance spread is below
//! the flatness threshold (and whose area is below the size cap) is
//! replaced by its four corners and two triangles. Otherwise it is split
//! into quadrants, down to 2×2-cell leaves which keep every vertex.
//!
//! Neighbouring regions simplified to different resolutions leave
//! T-junctions along their shared edges. These are repaired by snapping
//! the vertices on every collapsed region's border onto the straight edge
//! between its corners, largest regions first, each vertex at most once.

use crate::bounds::{distance_field, RegionBoundsCache, VertexSelection};
use photomesh_core::{
    quad_triangles, Error, Face, Point3f, Region, Result, Settings, TexturedMesh, Uv, VertexGrid,
};

/// Regions with fewer cells than this are never subdivided further
pub const MIN_SPLIT_AREA: usize = 4;

/// Counts describing one simplification pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplificationStats {
    pub input_vertices: usize,
    pub input_triangles: usize,
    pub output_vertices: usize,
    pub output_triangles: usize,
    /// Regions replaced by a single quad
    pub collapsed_regions: usize,
    /// Irreducible regions whose vertices were kept verbatim
    pub leaf_regions: usize,
    /// Vertices snapped onto a coarser neighbour's edge
    pub repaired_vertices: usize,
    /// Emitted vertices no surviving triangle referenced
    pub culled_vertices: usize,
}

/// Result of a quadtree simplification pass
#[derive(Debug, Clone)]
pub struct SimplifiedMesh {
    pub mesh: TexturedMesh,
    /// Every collapsed region, largest first
    pub regions: Vec<Region>,
    pub stats: SimplificationStats,
}

/// Quadtree simplifier for grid-shaped meshes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadtreeSimplifier {
    /// Side length cap, in cells; only regions with area below its square collapse
    pub largest_region_size: usize,
    /// A region is flat when `max - min` of its distances is below this
    pub maximum_delta_distance: f32,
}

impl Default for QuadtreeSimplifier {
    fn default() -> Self {
        Self {
            largest_region_size: 256,
            maximum_delta_distance: 0.025,
        }
    }
}

impl QuadtreeSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(largest_region_size: usize, maximum_delta_distance: f32) -> Self {
        Self {
            largest_region_size,
            maximum_delta_distance,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_params(
            settings.largest_simplified_region_size,
            settings.maximum_delta_distance,
        )
    }

    /// Regions must cover fewer cells than this to collapse
    pub fn largest_region_area(&self) -> usize {
        self.largest_region_size.saturating_mul(self.largest_region_size)
    }

    /// Whether `region` with distance `bounds` may be replaced by a single quad
    pub fn can_collapse(&self, region: Region, bounds: (f32, f32)) -> bool {
        let (min, max) = bounds;
        max - min < self.maximum_delta_distance && region.area() < self.largest_region_area()
    }

    /// Simplify the `selection` part of `grid`.
    ///
    /// `faces` index into `grid`; those whose corners all survive are
    /// re-emitted next to the collapsed quads. The output is compacted so
    /// every vertex is referenced by at least one triangle.
    pub fn simplify(
        &self,
        grid: &VertexGrid,
        faces: &[Face],
        selection: VertexSelection,
    ) -> Result<SimplifiedMesh> {
        grid.validate()?;
        if let Some(&index) = faces.iter().flatten().find(|&&i| i >= grid.len()) {
            return Err(Error::InvalidData(format!(
                "triangle index {} out of range for {} grid vertices",
                index,
                grid.len()
            )));
        }

        let mut stats = SimplificationStats {
            input_vertices: grid.len(),
            input_triangles: faces.len(),
            ..Default::default()
        };
        if grid.is_empty() {
            return Ok(SimplifiedMesh {
                mesh: TexturedMesh::new(),
                regions: Vec::new(),
                stats,
            });
        }

        let distances = distance_field(grid, selection);
        let mut walk = RegionWalk::new(self, grid, &distances);
        walk.visit(Region::whole(grid.width(), grid.height()));

        // Original triangles survive only if every corner was emitted
        for face in faces {
            if let [Some(a), Some(b), Some(c)] = face.map(|i| walk.new_index[i]) {
                walk.faces.push([a, b, c]);
            }
        }

        stats.collapsed_regions = walk.regions.len();
        stats.leaf_regions = walk.leaves;
        log::debug!(
            "Quadtree walk: {} collapsed regions, {} leaves, {} cached bounds",
            walk.regions.len(),
            walk.leaves,
            walk.cache.len()
        );

        let RegionWalk {
            new_index,
            mut positions,
            uvs,
            faces: new_faces,
            mut regions,
            ..
        } = walk;

        stats.repaired_vertices = repair_cracks(&mut positions, &new_index, &mut regions, grid.width());

        let emitted = positions.len();
        let mesh = compact(&positions, &uvs, &new_faces);
        stats.culled_vertices = emitted - mesh.vertex_count();
        stats.output_vertices = mesh.vertex_count();
        stats.output_triangles = mesh.face_count();

        Ok(SimplifiedMesh { mesh, regions, stats })
    }
}

/// Recursive state of one simplification pass
struct RegionWalk<'a> {
    simplifier: &'a QuadtreeSimplifier,
    grid: &'a VertexGrid,
    distances: &'a [f32],
    cache: RegionBoundsCache,
    /// Output index of each grid vertex; assigned once
    new_index: Vec<Option<usize>>,
    positions: Vec<Point3f>,
    uvs: Vec<Uv>,
    faces: Vec<Face>,
    regions: Vec<Region>,
    leaves: usize,
}

impl<'a> RegionWalk<'a> {
    fn new(simplifier: &'a QuadtreeSimplifier, grid: &'a VertexGrid, distances: &'a [f32]) -> Self {
        Self {
            simplifier,
            grid,
            distances,
            cache: RegionBoundsCache::new(),
            new_index: vec![None; grid.len()],
            positions: Vec::new(),
            uvs: Vec::new(),
            faces: Vec::new(),
            regions: Vec::new(),
            leaves: 0,
        }
    }

    /// Output index of grid vertex `old`, emitting it on first use
    fn emit(&mut self, old: usize) -> usize {
        if let Some(index) = self.new_index[old] {
            return index;
        }
        let index = self.positions.len();
        self.positions.push(self.grid.positions[old]);
        self.uvs.push(self.grid.uvs[old]);
        self.new_index[old] = Some(index);
        index
    }

    fn visit(&mut self, region: Region) {
        let width = self.grid.width();

        if region.area() < MIN_SPLIT_AREA {
            for old in region.indices(width) {
                self.emit(old);
            }
            self.leaves += 1;
            return;
        }

        let bounds = self.cache.bounds(region, self.distances, width);
        if self.simplifier.can_collapse(region, bounds) {
            let corners = region.corners(width).map(|old| self.emit(old));
            self.faces.extend(quad_triangles(corners));
            self.regions.push(region);
        } else {
            for quadrant in region.quadrants() {
                self.visit(quadrant);
            }
        }
    }
}

/// Snap the border vertices of every collapsed region onto its edges.
///
/// `regions` is sorted by area, largest first, and processed in that
/// order; corners are read from the already-repaired `positions`. Each
/// output vertex moves at most once. Returns the number of moved vertices.
pub fn repair_cracks(
    positions: &mut [Point3f],
    new_index: &[Option<usize>],
    regions: &mut [Region],
    grid_width: usize,
) -> usize {
    regions.sort_by(|a, b| b.area().cmp(&a.area()));
    let mut modified = vec![false; positions.len()];
    let mut moved = 0;

    for region in regions.iter() {
        let Some([a, b, c, d]) = corner_positions(positions, new_index, region, grid_width) else {
            continue;
        };
        let (w, h) = (region.width() as f32, region.height() as f32);

        let mut snap = |row: usize, col: usize, from: Point3f, to: Point3f, t: f32| {
            if let Some(i) = new_index[row * grid_width + col] {
                if !modified[i] {
                    positions[i] = Point3f::from(from.coords.lerp(&to.coords, t));
                    modified[i] = true;
                    moved += 1;
                }
            }
        };

        for col in region.x1..=region.x2 {
            let t = (col - region.x1) as f32 / w;
            snap(region.y1, col, a, b, t);
        }
        for col in region.x1..=region.x2 {
            let t = (col - region.x1) as f32 / w;
            snap(region.y2, col, c, d, t);
        }
        for row in region.y1..=region.y2 {
            let t = (row - region.y1) as f32 / h;
            snap(row, region.x1, a, c, t);
        }
        for row in region.y1..=region.y2 {
            let t = (row - region.y1) as f32 / h;
            snap(row, region.x2, b, d, t);
        }
    }

    moved
}

fn corner_positions(
    positions: &[Point3f],
    new_index: &[Option<usize>],
    region: &Region,
    grid_width: usize,
) -> Option<[Point3f; 4]> {
    let [a, b, c, d] = region.corners(grid_width);
    Some([
        positions[new_index[a]?],
        positions[new_index[b]?],
        positions[new_index[c]?],
        positions[new_index[d]?],
    ])
}

/// Rebuild the vertex buffers in first-use order of `faces`, dropping
/// every vertex no triangle references
pub fn compact(positions: &[Point3f], uvs: &[Uv], faces: &[Face]) -> TexturedMesh {
    let mut old_to_new: Vec<Option<usize>> = vec![None; positions.len()];
    let mut mesh = TexturedMesh::new();

    for face in faces {
        let remapped = face.map(|old| match old_to_new[old] {
            Some(new) => new,
            None => {
                let new = mesh.add_vertex(positions[old], uvs[old]);
                old_to_new[old] = Some(new);
                new
            }
        });
        mesh.add_face(remapped);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use photomesh_core::cell_corners;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    /// Background grid on the z = distance plane with every cell triangle
    fn make_plane_grid(size: usize, distance: impl Fn(usize, usize) -> f32) -> (VertexGrid, Vec<Face>) {
        let mut grid = VertexGrid::new(size, size);
        for row in 0..size {
            for col in 0..size {
                let i = grid.index(row, col);
                let uv = Uv::new(col as f32 / size as f32, row as f32 / size as f32);
                grid.positions[i] = Point3f::new(uv.x * 0.01, uv.y * 0.01, distance(row, col));
                grid.uvs[i] = uv;
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

    fn noisy_grid(size: usize, seed: u64) -> (VertexGrid, Vec<Face>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise: Vec<f32> = (0..size * size).map(|_| rng.gen_range(0.0..0.5)).collect();
        make_plane_grid(size, |row, col| 1.0 + noise[row * size + col])
    }

    /// Twice the signed area of a face projected onto the image plane
    fn signed_area(positions: &[Point3f], face: &Face) -> f32 {
        let [a, b, c] = face.map(|i| positions[i]);
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    }

    #[test]
    fn test_flat_grid_collapses_to_single_quad() {
        let (grid, faces) = make_plane_grid(5, |_, _| 1.5);
        let result = QuadtreeSimplifier::new()
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        assert_eq!(result.mesh.vertex_count(), 4);
        assert_eq!(result.mesh.face_count(), 2);
        assert_eq!(result.regions, vec![Region::whole(5, 5)]);
        assert_eq!(result.stats.collapsed_regions, 1);
        assert_eq!(result.stats.culled_vertices, 0);
    }

    #[test]
    fn test_zero_delta_never_collapses() {
        let (grid, faces) = noisy_grid(9, 7);
        let result = QuadtreeSimplifier::with_params(256, 0.0)
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        assert!(result.regions.is_empty());
        assert_eq!(result.mesh.vertex_count(), grid.len());
        assert_eq!(result.mesh.face_count(), faces.len());
        assert_eq!(result.stats.repaired_vertices, 0);
    }

    #[test]
    fn test_size_cap_limits_collapse() {
        let (grid, faces) = make_plane_grid(17, |_, _| 1.0);
        // 16×16 cells, cap of 8 allows only areas below 64
        let result = QuadtreeSimplifier::with_params(8, 0.1)
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        assert_eq!(result.regions.len(), 16);
        assert!(result.regions.iter().all(|r| r.area() == 16));
        assert_eq!(result.mesh.vertex_count(), 25);
        assert_eq!(result.mesh.face_count(), 32);
    }

    #[test]
    fn test_collapsed_regions_are_flat_and_small() {
        let (grid, faces) = make_plane_grid(33, |row, col| {
            if row < 16 && col < 16 { 1.0 } else { 1.0 + (row * col) as f32 * 0.01 }
        });
        let simplifier = QuadtreeSimplifier::with_params(64, 0.025);
        let result = simplifier
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        assert!(!result.regions.is_empty());
        for region in &result.regions {
            let distances: Vec<f32> = region.indices(33).map(|i| grid.distance(i)).collect();
            let min = distances.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = distances.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            assert!(max - min < simplifier.maximum_delta_distance);
            assert!(region.area() < simplifier.largest_region_area());
        }
    }

    #[test]
    fn test_subdivided_regions_are_rough_or_large() {
        let (grid, faces) = make_plane_grid(33, |row, col| {
            if row < 16 && col < 16 { 1.0 } else { 1.0 + (row * col) as f32 * 0.01 }
        });
        let simplifier = QuadtreeSimplifier::with_params(8, 0.025);
        let result = simplifier
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        // Replay the walk from the output: every region that was neither
        // collapsed nor a leaf must have been split
        fn split_regions(region: Region, collapsed: &[Region], split: &mut Vec<Region>) {
            if collapsed.contains(&region) || region.area() < MIN_SPLIT_AREA {
                return;
            }
            split.push(region);
            for quadrant in region.quadrants() {
                split_regions(quadrant, collapsed, split);
            }
        }
        let mut split = Vec::new();
        split_regions(Region::whole(33, 33), &result.regions, &mut split);

        assert!(!split.is_empty());
        assert!(!result.regions.is_empty());
        let mut cache = RegionBoundsCache::new();
        let field = distance_field(&grid, VertexSelection::background());
        for region in &split {
            let distances: Vec<f32> = region.indices(33).map(|i| grid.distance(i)).collect();
            let min = distances.iter().cloned().fold(f32::INFINITY, f32::min);
            let max = distances.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            assert!(
                max - min >= simplifier.maximum_delta_distance
                    || region.area() >= simplifier.largest_region_area()
            );
            assert!(!simplifier.can_collapse(*region, cache.bounds(*region, &field, 33)));
        }
    }

    #[test]
    fn test_huge_size_cap_does_not_overflow() {
        let (grid, faces) = make_plane_grid(5, |_, _| 1.0);
        let simplifier = QuadtreeSimplifier::with_params(1 << (usize::BITS / 2), 0.1);
        assert_eq!(simplifier.largest_region_area(), usize::MAX);

        let result = simplifier
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();
        assert_eq!(result.regions, vec![Region::whole(5, 5)]);
    }

    #[test]
    fn test_excluded_vertices_keep_full_resolution() {
        let (mut grid, faces) = make_plane_grid(9, |_, _| 1.0);
        let hole = grid.index(4, 4);
        grid.background[hole] = false;
        let faces: Vec<Face> = faces.into_iter().filter(|f| !f.contains(&hole)).collect();

        let result = QuadtreeSimplifier::new()
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();
        // No collapsed region may contain the masked-out vertex
        assert!(result.regions.iter().all(|r| !r.contains(4, 4)));
        assert!(result.mesh.face_count() > 0);
        // The masked vertex was emitted by a leaf but is culled by compaction
        assert!(result.stats.culled_vertices >= 1);
        let hole_position = grid.positions[hole];
        assert!(!result.mesh.positions.contains(&hole_position));
    }

    #[test]
    fn test_crack_repair_snaps_to_coarse_edge() {
        // Left half flat, right half rough: the shared column must lie on the coarse edge
        let (grid, faces) = make_plane_grid(9, |row, col| {
            if col <= 4 { 1.0 + row as f32 * 0.001 } else { 1.0 + ((row * 7 + col * 3) % 5) as f32 * 0.1 }
        });
        let result = QuadtreeSimplifier::with_params(256, 0.025)
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        let coarse = result.regions[0];
        assert_eq!((coarse.x1, coarse.x2), (0, 4));
        let top = grid.positions[grid.index(coarse.y1, 4)];
        let bottom = grid.positions[grid.index(coarse.y2, 4)];
        for row in coarse.y1..=coarse.y2 {
            let t = (row - coarse.y1) as f32 / coarse.height() as f32;
            let expected = Point3f::from(top.coords.lerp(&bottom.coords, t));
            let found = result.mesh.positions.iter().any(|p| (p - expected).norm() < 1e-5);
            assert!(found, "row {} not on the coarse edge", row);
        }
    }

    #[test]
    fn test_repair_moves_each_vertex_once() {
        let mut positions = vec![Point3f::origin(); 9];
        for (i, p) in positions.iter_mut().enumerate() {
            *p = Point3f::new((i % 3) as f32, (i / 3) as f32, i as f32);
        }
        let new_index: Vec<Option<usize>> = (0..9).map(Some).collect();
        // Overlapping regions sharing the middle column
        let mut regions = vec![Region::new(1, 2, 0, 2), Region::new(0, 2, 0, 2)];
        let moved = repair_cracks(&mut positions, &new_index, &mut regions, 3);

        assert_eq!(regions[0], Region::new(0, 2, 0, 2));
        // The larger region claims its 8 border vertices; the smaller one only gets the centre
        assert_eq!(moved, 9);
        assert_relative_eq!(positions[1].z, 1.0);
        assert_relative_eq!(positions[4].z, 4.0);
    }

    #[test]
    fn test_winding_is_preserved() {
        let (grid, faces) = noisy_grid(17, 3);
        let reference = signed_area(&grid.positions, &faces[0]).signum();
        let result = QuadtreeSimplifier::with_params(256, 0.45)
            .simplify(&grid, &faces, VertexSelection::background())
            .unwrap();

        assert!(result.stats.collapsed_regions > 0);
        for face in &result.mesh.faces {
            let area = signed_area(&result.mesh.positions, face);
            if area.abs() > 1e-12 {
                assert_eq!(area.signum(), reference);
            }
        }
    }

    #[test]
    fn test_out_of_range_face_is_rejected() {
        let (grid, _) = make_plane_grid(3, |_, _| 1.0);
        let result = QuadtreeSimplifier::new().simplify(&grid, &[[0, 1, 9]], VertexSelection::background());
        assert!(result.is_err());
    }

    #[test]
    fn test_compact_follows_triangle_order() {
        let positions: Vec<Point3f> = (0..5).map(|i| Point3f::new(i as f32, 0.0, 0.0)).collect();
        let uvs = vec![Uv::zeros(); 5];
        let mesh = compact(&positions, &uvs, &[[4, 2, 0], [0, 2, 3]]);

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [2, 1, 3]]);
        assert_relative_eq!(mesh.positions[0].x, 4.0);
        assert_relative_eq!(mesh.positions[3].x, 3.0);
    }
}
