//! Benchmarks for segment index construction
//!
//! Parses synthetic fragmented MP4 and Matroska files of increasing size
//! from memory.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mediaseek_common::ContainerFormat;
use mediaseek_media::SegmentIndex;

#[path = "../tests/common/mod.rs"]
mod common;

fn mp4_with_fragments(count: usize) -> Vec<u8> {
    let fragments: Vec<(usize, u64)> = (0..count)
        .map(|i| (1000 + i * 4096, i as u64 * 180_000))
        .collect();
    fragmented_total(&fragments)
}

fn fragmented_total(fragments: &[(usize, u64)]) -> Vec<u8> {
    let total = fragments.last().map_or(2000, |&(offset, _)| offset + 4096);
    common::fragmented_mp4(90_000, fragments, total)
}

fn matroska_with_clusters(count: usize) -> Vec<u8> {
    let clusters: Vec<(u64, usize)> = (0..count)
        .map(|i| (i as u64 * 2000, 500 + i * 1024))
        .collect();
    common::matroska_with_cluster_ends(1_000_000, &clusters)
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    for count in [10usize, 100, 1000] {
        let mp4 = Bytes::from(mp4_with_fragments(count));
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("mp4_fragments", count), &mp4, |b, src| {
            b.iter(|| SegmentIndex::parse(black_box(src), ContainerFormat::Mp4).unwrap())
        });
    }

    for count in [10usize, 100, 1000] {
        let mkv = Bytes::from(matroska_with_clusters(count));
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(
            BenchmarkId::new("matroska_clusters", count),
            &mkv,
            |b, src| {
                b.iter(|| SegmentIndex::parse(black_box(src), ContainerFormat::Matroska).unwrap())
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_index);
criterion_main!(benches);
