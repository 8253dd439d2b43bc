use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use murmur_core::spatial_hash::{SpatialHash, SpatialIndex};
use murmur_data::{AgentId, MapBounds};

const BOUNDS: MapBounds = MapBounds { x: 100.0, z: 100.0 };

fn grid_entries(n: u32) -> Vec<(AgentId, Vec3)> {
    (0..n)
        .map(|i| {
            let x = (i % 100) as f32 * 2.0 - 100.0;
            let z = (i / 100) as f32 * 2.0 - 100.0;
            (AgentId::new(i, 0), Vec3::new(x, 0.0, z))
        })
        .collect()
}

fn bench_spatial_hash_build(c: &mut Criterion) {
    let entries = grid_entries(10_000);

    c.bench_function("spatial_hash_build_10000", |b| {
        b.iter(|| {
            let mut spatial = SpatialHash::new(4.0, BOUNDS).unwrap();
            spatial.build(&entries);
            black_box(spatial)
        })
    });
}

fn bench_spatial_hash_query(c: &mut Criterion) {
    let mut spatial = SpatialHash::new(4.0, BOUNDS).unwrap();
    spatial.build(&grid_entries(10_000));

    c.bench_function("spatial_hash_query_radius_6", |b| {
        let mut results = Vec::new();
        b.iter(|| {
            spatial.query_radius_into(Vec3::ZERO, 6.0, &mut results);
            black_box(results.len())
        })
    });
}

fn bench_spatial_hash_region(c: &mut Criterion) {
    let mut spatial = SpatialHash::new(4.0, BOUNDS).unwrap();
    spatial.build(&grid_entries(10_000));
    let half = Vec3::new(15.0, 0.0, 15.0);

    c.bench_function("spatial_hash_region_30x30", |b| {
        b.iter(|| {
            let found = spatial.region_query(-half, half, &mut |_| true);
            black_box(found.len())
        })
    });
}

criterion_group!(
    benches,
    bench_spatial_hash_build,
    bench_spatial_hash_query,
    bench_spatial_hash_region
);
criterion_main!(benches);
