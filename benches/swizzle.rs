use criterion::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use wiiu_swizzle::{deswizzle, get_surface_info, swizzle, SurfaceDim, TiledSurface};

use criterion::BenchmarkId;
use criterion::Throughput;

fn tiled_surface(size: u32, tile_mode: u32) -> (TiledSurface, usize) {
    // GX2_SURFACE_FORMAT_TCS_R8_G8_B8_A8_UNORM
    let layout = get_surface_info(0x1a, size, size, 1, SurfaceDim::D2, tile_mode, 0, 0).unwrap();
    (
        TiledSurface::from_layout(&layout, size, size, 0x1a, 0),
        layout.surf_size as usize,
    )
}

fn swizzle_benchmark(c: &mut Criterion) {
    for (name, tile_mode) in [("linear", 1), ("1d_thin1", 2), ("2d_thin1", 4)] {
        let mut group = c.benchmark_group(format!("swizzle_{name}"));
        for size in [64, 256, 1024] {
            let (surface, surf_size) = tiled_surface(size, tile_mode);
            let source = vec![0u8; surf_size];

            group.throughput(Throughput::Bytes((size * size * 4) as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| swizzle(black_box(&surface), &source))
            });
        }
        group.finish();
    }
}

fn deswizzle_benchmark(c: &mut Criterion) {
    for (name, tile_mode) in [("linear", 1), ("1d_thin1", 2), ("2d_thin1", 4)] {
        let mut group = c.benchmark_group(format!("deswizzle_{name}"));
        for size in [64, 256, 1024] {
            let (surface, surf_size) = tiled_surface(size, tile_mode);
            let source = vec![0u8; surf_size];

            group.throughput(Throughput::Bytes((size * size * 4) as u64));
            group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
                b.iter(|| deswizzle(black_box(&surface), &source))
            });
        }
        group.finish();
    }
}

criterion_group!(benches, swizzle_benchmark, deswizzle_benchmark);
criterion_main!(benches);
