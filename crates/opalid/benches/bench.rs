use core::hint::black_box;
use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use opalid::{IdCompressor, IdCreationRange, CreationRangeIds, SessionId};

// Number of operations per benchmark iteration.
const TOTAL_OPS: usize = 4096;

fn local_session() -> SessionId {
    "8e3b4e2a-889d-4b34-9e6d-bd79e9267a9b".parse().unwrap()
}

fn remote_session() -> SessionId {
    "e5f11e49-5b6c-4bb5-a554-e2e9bdbd8c54".parse().unwrap()
}

/// A compressor whose tail cluster has enough live slack that every mint
/// takes the eager-final fast path.
fn eager_compressor() -> IdCompressor {
    let mut compressor = IdCompressor::new_with_session_id(local_session());
    compressor
        .set_cluster_capacity(opalid::MAX_CLUSTER_CAPACITY)
        .unwrap();
    compressor.generate_next_id().unwrap();
    let range = compressor.take_next_creation_range();
    compressor.finalize_creation_range(&range).unwrap();
    compressor
}

fn bench_generate_local(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate/local");
    group.throughput(Throughput::Elements(TOTAL_OPS as u64));
    group.bench_function(format!("elems/{TOTAL_OPS}"), |b| {
        b.iter_batched(
            || IdCompressor::new_with_session_id(local_session()),
            |mut compressor| {
                for _ in 0..TOTAL_OPS {
                    black_box(compressor.generate_next_id().unwrap());
                }
                compressor
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_generate_eager_final(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate/eager_final");
    group.throughput(Throughput::Elements(TOTAL_OPS as u64));
    group.bench_function(format!("elems/{TOTAL_OPS}"), |b| {
        b.iter_batched(
            eager_compressor,
            |mut compressor| {
                for _ in 0..TOTAL_OPS {
                    black_box(compressor.generate_next_id().unwrap());
                }
                compressor
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let ranges: Vec<IdCreationRange> = (0..TOTAL_OPS as u64)
        .map(|i| IdCreationRange {
            session_id: remote_session(),
            ids: Some(CreationRangeIds {
                first_gen_count: i * 8 + 1,
                last_gen_count: i * 8 + 8,
            }),
        })
        .collect();

    let mut group = c.benchmark_group("finalize");
    group.throughput(Throughput::Elements(TOTAL_OPS as u64));
    group.bench_function(format!("ranges/{TOTAL_OPS}"), |b| {
        b.iter_batched(
            || IdCompressor::new_with_session_id(local_session()),
            |mut compressor| {
                for range in &ranges {
                    compressor.finalize_creation_range(black_box(range)).unwrap();
                }
                compressor
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

fn bench_normalize_and_decompress(c: &mut Criterion) {
    let mut compressor = IdCompressor::new_with_session_id(local_session());
    let ids: Vec<_> = (0..TOTAL_OPS)
        .map(|_| compressor.generate_next_id().unwrap())
        .collect();
    let range = compressor.take_next_creation_range();
    compressor.finalize_creation_range(&range).unwrap();

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(TOTAL_OPS as u64));
    group.bench_function(format!("to_op_space/{TOTAL_OPS}"), |b| {
        b.iter(|| {
            for id in &ids {
                black_box(compressor.normalize_to_op_space(black_box(*id)).unwrap());
            }
        });
    });
    group.bench_function(format!("decompress/{TOTAL_OPS}"), |b| {
        b.iter(|| {
            for id in &ids {
                black_box(compressor.decompress(black_box(*id)).unwrap());
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_local,
    bench_generate_eager_final,
    bench_finalize,
    bench_normalize_and_decompress
);
criterion_main!(benches);
