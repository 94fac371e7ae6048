//! Benchmarks for QuadtreeSimplifier and the incremental stepper

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use photomesh_core::{cell_corners, quad_triangles, Face, Point3f, Uv, VertexGrid};
use photomesh_simplification::{IncrementalSimplifier, QuadtreeSimplifier, VertexSelection};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Smooth bump with a little noise so some regions collapse and some split
fn generate_depth_grid(size: usize) -> (VertexGrid, Vec<Face>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut grid = VertexGrid::new(size, size);
    for row in 0..size {
        for col in 0..size {
            let fx = col as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let fy = row as f32 / (size - 1) as f32 * std::f32::consts::PI;
            let noise = if rng.gen_bool(0.05) { rng.gen_range(0.0..0.1) } else { 0.0 };
            let i = grid.index(row, col);
            grid.positions[i] = Point3f::new(0.0, 0.0, 1.0 + fx.sin() * fy.sin() * 0.5 + noise);
            grid.uvs[i] = Uv::new(col as f32 / size as f32, row as f32 / size as f32);
            grid.background[i] = true;
        }
    }
    let mut faces = Vec::with_capacity((size - 1) * (size - 1) * 2);
    for row in 1..size {
        for col in 1..size {
            faces.extend(quad_triangles(cell_corners(size, row, col)));
        }
    }
    (grid, faces)
}

fn bench_simplification(c: &mut Criterion) {
    let sizes = [65, 129, 257];
    let deltas = [0.01, 0.025, 0.1];

    let mut group = c.benchmark_group("quadtree");

    for &size in &sizes {
        let (grid, faces) = generate_depth_grid(size);

        for &delta in &deltas {
            let simplifier = QuadtreeSimplifier::with_params(256, delta);

            group.bench_with_input(
                BenchmarkId::new("bulk", format!("{}v_d{}", size, delta)),
                &(&grid, &faces),
                |b, &(grid, faces)| {
                    b.iter(|| {
                        let result = simplifier
                            .simplify(black_box(grid), faces, VertexSelection::background())
                            .unwrap();
                        black_box(result);
                    });
                },
            );

            group.bench_with_input(
                BenchmarkId::new("incremental", format!("{}v_d{}", size, delta)),
                &(&grid, &faces),
                |b, &(grid, faces)| {
                    b.iter(|| {
                        let stepper = IncrementalSimplifier::new(
                            simplifier,
                            black_box(grid),
                            faces.clone(),
                            VertexSelection::background(),
                        )
                        .unwrap();
                        black_box(stepper.finish());
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_simplification);
criterion_main!(benches);
