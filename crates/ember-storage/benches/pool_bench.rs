//! Page pool benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ember_common::config::PageLayout;
use ember_common::types::PageId;
use ember_storage::buffer::LruPool;
use tempfile::tempdir;

const PAGE_SIZE: usize = 8 * 1024;

fn hit_path_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let layout = PageLayout::from_ranges([(PAGE_SIZE, 64)]);
    let pool = LruPool::open(dir.path().join("bench.db"), &layout).unwrap();

    let mut buf = vec![0u8; PAGE_SIZE];
    pool.write_page(PageId::new(0), &buf).unwrap();

    c.bench_function("read_page_hit", |b| {
        b.iter(|| {
            let n = pool.read_page(PageId::new(0), &mut buf).unwrap();
            black_box(n)
        })
    });
}

fn miss_path_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let layout = PageLayout::from_ranges([(PAGE_SIZE, 8)]);
    let pool = LruPool::open(dir.path().join("bench.db"), &layout).unwrap();

    // Cycling through more pages than frames makes every access a miss
    // with an eviction.
    let mut buf = vec![0u8; PAGE_SIZE];
    let mut next = 0u32;

    c.bench_function("read_page_miss_evict", |b| {
        b.iter(|| {
            let no = PageId::new(next % 64);
            next = next.wrapping_add(9);
            let n = pool.read_page(no, &mut buf).unwrap();
            black_box(n)
        })
    });
}

fn write_path_benchmark(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let layout = PageLayout::from_ranges([(PAGE_SIZE, 64)]);
    let pool = LruPool::open(dir.path().join("bench.db"), &layout).unwrap();

    let buf = vec![0xA5u8; PAGE_SIZE];

    c.bench_function("write_page_hit", |b| {
        b.iter(|| {
            let n = pool.write_page(PageId::new(1), &buf).unwrap();
            black_box(n)
        })
    });
}

criterion_group!(
    benches,
    hit_path_benchmark,
    miss_path_benchmark,
    write_path_benchmark,
);
criterion_main!(benches);
