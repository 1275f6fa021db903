use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};
use piccolor::{ExtractOptions, Grouping, extract_colors, extract_colors_with};

fn photo_like(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        Rgb([
            (x * 255 / w) as u8,
            (y * 255 / h) as u8,
            ((x ^ y) & 0xF0) as u8,
        ])
    })
}

fn benchmark_extract(c: &mut Criterion) {
    let small = photo_like(640, 480);
    let large = photo_like(4000, 3000);

    c.bench_function("extract_exact_640x480", |b| {
        b.iter(|| extract_colors(black_box(&small), 16, 100))
    });

    c.bench_function("extract_exact_4000x3000", |b| {
        b.iter(|| extract_colors(black_box(&large), 16, 100))
    });

    let kmeans = ExtractOptions {
        grouping: Grouping::KMeans,
        ..ExtractOptions::default()
    };
    c.bench_function("extract_kmeans_640x480", |b| {
        b.iter(|| extract_colors_with(black_box(&small), &kmeans))
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = benchmark_extract
}
criterion_main!(benches);
