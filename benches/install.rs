//! Install and serve benchmarks for assetd.
//!
//! Run with: cargo bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use assetd::bundle::{self, pack};
use assetd::config::InstallConfig;
use assetd::{AssetRouter, ExtensionManager, MemoryStore};

/// A bundle with `files` entries of `size` bytes spread over a few directories.
fn make_bundle(files: usize, size: usize) -> Vec<u8> {
    let mut entries: Vec<(String, Vec<u8>)> =
        vec![("manifest.json".to_string(), br#"{"id": "bench"}"#.to_vec())];
    for i in 0..files {
        entries.push((format!("dir{}/file{}.js", i % 8, i), vec![b'x'; size]));
    }
    pack::zip_bundle(&entries).expect("bench bundle packs")
}

/// Benchmark archive decoding alone.
fn bench_unpack(c: &mut Criterion) {
    let mut group = c.benchmark_group("unpack");

    for files in [10, 100, 500] {
        let data = make_bundle(files, 1024);
        group.bench_with_input(BenchmarkId::from_parameter(files), &data, |b, data| {
            b.iter(|| black_box(bundle::unpack(black_box(data)).expect("unpacks")))
        });
    }

    group.finish();
}

/// Benchmark a full install into a fresh memory store.
fn bench_install(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("install");

    for files in [10, 100, 500] {
        let data = make_bundle(files, 1024);
        group.bench_with_input(BenchmarkId::from_parameter(files), &data, |b, data| {
            b.to_async(&rt).iter(|| async {
                let manager = ExtensionManager::new(
                    Arc::new(MemoryStore::new()),
                    &InstallConfig::default(),
                );
                black_box(manager.install(data).await)
            })
        });
    }

    group.finish();
}

/// Benchmark serving one file through the router.
fn bench_serve(c: &mut Criterion) {
    let rt = Runtime::new().expect("tokio runtime");
    let store = Arc::new(MemoryStore::new());
    let manager = ExtensionManager::new(store.clone(), &InstallConfig::default());
    rt.block_on(manager.install(&make_bundle(100, 4096)));
    let router = AssetRouter::new(store);

    c.bench_function("serve_hit", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(router.serve("/internal/extensions/bench/dir3/file3.js").await)
        })
    });

    c.bench_function("serve_miss", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(router.serve("/internal/extensions/bench/missing.js").await)
        })
    });
}

criterion_group!(benches, bench_unpack, bench_install, bench_serve);
criterion_main!(benches);
