//! Performance benchmarks for mappero-lib
//!
//! Run with: cargo bench --package mappero-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mappero_lib::codec::{Gpx, GpxWriteOptions, Kml, PathReader, PathWriter, XmlTokens};
use mappero_lib::{GeoPoint, PathData, PathPoint};
use std::hint::black_box;

/// Generate a realistic track with the specified number of points.
fn generate_path(num_points: usize, base_lat: f64, base_lon: f64) -> PathData {
    let mut path = PathData::new();
    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        if i > 0 && i % 1000 == 0 {
            path.break_segment();
        }
        path.append_point(
            PathPoint::new(GeoPoint::new(lat, lon))
                .with_altitude(100.0 + (t * 10.0).sin() as f32)
                .with_time(1_330_000_000 + i as u32),
        );
    }
    path
}

fn to_gpx(path: &PathData) -> Vec<u8> {
    let mut out = Vec::new();
    Gpx::with_options(GpxWriteOptions::default())
        .write(&mut out, path)
        .expect("writing to memory cannot fail");
    out
}

fn to_kml(path: &PathData) -> String {
    let coordinates: Vec<String> = path
        .points()
        .iter()
        .map(|p| format!("{},{},{}", p.geo.lon, p.geo.lat, p.altitude))
        .collect();
    format!(
        "<kml><Document><Placemark><LineString><coordinates>{}</coordinates></LineString></Placemark></Document></kml>",
        coordinates.join(" ")
    )
}

fn bench_gpx(c: &mut Criterion) {
    let mut group = c.benchmark_group("gpx");
    for &size in &[1_000usize, 10_000, 100_000] {
        let path = generate_path(size, 51.5, -0.1);
        let document = to_gpx(&path);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("read", size), &document, |b, doc| {
            b.iter(|| {
                let mut data = PathData::new();
                Gpx::default()
                    .read(&mut XmlTokens::new(doc.as_slice()), &mut data)
                    .unwrap();
                black_box(data)
            })
        });

        group.bench_with_input(BenchmarkId::new("write", size), &path, |b, path| {
            b.iter(|| black_box(to_gpx(path)))
        });
    }
    group.finish();
}

fn bench_kml(c: &mut Criterion) {
    let mut group = c.benchmark_group("kml");
    for &size in &[1_000usize, 10_000] {
        let document = to_kml(&generate_path(size, 60.1, 24.9));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("read", size), &document, |b, doc| {
            b.iter(|| {
                let mut data = PathData::new();
                Kml.read(&mut XmlTokens::new(doc.as_bytes()), &mut data)
                    .unwrap();
                black_box(data)
            })
        });
    }
    group.finish();
}

fn bench_path_metrics(c: &mut Criterion) {
    let path = generate_path(100_000, 51.5, -0.1);
    c.bench_function("path_length_100k", |b| b.iter(|| black_box(path.length())));
    c.bench_function("path_bounding_box_100k", |b| {
        b.iter(|| black_box(path.bounding_box()))
    });
}

criterion_group!(benches, bench_gpx, bench_kml, bench_path_metrics);
criterion_main!(benches);
