//! Benchmarks the LRW reference policy's eviction cost at the spec's
//! own default bound (`limit.size = 500`, `reclaim = 0.1`), plus a
//! larger bound to see how the oldest-`touched`-first scan scales.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wardenkv::entry::Entry;
use wardenkv::keyspace::Keyspace;
use wardenkv::policy::lrw::Lrw;
use wardenkv::policy::Policy;

fn fill(size: usize) -> Keyspace<u64, u64> {
    let ks = Keyspace::new();
    for i in 0..size as u64 {
        ks.insert(i, Entry::new(i, None, i));
    }
    ks
}

fn bench_lrw_overflow(c: &mut Criterion) {
    let mut group = c.benchmark_group("lrw_overflow");

    for &size in &[500usize, 5_000, 50_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || fill(size + size / 10),
                |ks| {
                    Lrw.on_write(black_box(&ks), size, 0.1, 500);
                    ks
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lrw_overflow);
criterion_main!(benches);
