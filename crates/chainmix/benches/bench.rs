use chainmix::{
    BenchConfig, CancellationToken, factorize,
    conduit::SENTINEL,
    config::{DEFAULT_STAGE_BUFFER_SIZE, TASK_N},
    pipeline::Pipeline,
    run_benchmark,
};
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use futures::future::join_all;
use tokio::runtime::{Builder, Runtime};

const TOKENS: u64 = 1_000;

fn runtime() -> Runtime {
    Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
}

/// Feeds `tokens + 1` tokens (sentinel included) through a fresh chain and
/// waits until every stage has been joined.
async fn drain_pipeline(ring_size: usize, tokens: u64) {
    let cancel = CancellationToken::new();
    let Pipeline {
        entry,
        mut exit,
        tasks,
    } = Pipeline::build(ring_size, DEFAULT_STAGE_BUFFER_SIZE, &cancel);

    let feeder = tokio::spawn(async move {
        for token in (SENTINEL..=tokens).rev() {
            entry.send(token).await.expect("pipeline entry closed");
        }
    });

    while let Some(token) = exit.recv().await {
        if black_box(token) == SENTINEL {
            break;
        }
    }

    feeder.await.expect("feeder panicked");
    tasks.join().await.expect("pipeline failed");
}

fn bench_pipeline(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("pipeline/drain");

    for ring_size in [0, 10, 100, 1_000] {
        // Every token crosses every stage once.
        group.throughput(Throughput::Elements((TOKENS + 1) * (ring_size as u64).max(1)));
        group.bench_function(format!("stages/{ring_size}/tokens/{TOKENS}"), |b| {
            b.to_async(&rt).iter(|| drain_pipeline(ring_size, TOKENS));
        });
    }

    group.finish();
}

fn bench_concurrent_pipelines(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("pipeline/concurrent");
    let ring_size = 100;

    for chains in [1, 4, 16, 64] {
        group.throughput(Throughput::Elements(
            (TOKENS + 1) * ring_size as u64 * chains as u64,
        ));
        group.bench_function(format!("chains/{chains}/stages/{ring_size}"), |b| {
            b.to_async(&rt).iter(|| async move {
                join_all((0..chains).map(|_| drain_pipeline(ring_size, TOKENS))).await;
            });
        });
    }

    group.finish();
}

fn bench_factorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("factorize");
    group.sample_size(10);
    group.bench_function("fixture", |b| {
        b.iter(|| factorize(black_box(TASK_N)));
    });
    group.finish();
}

fn bench_mixed_case(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("mixed_case");
    group.sample_size(10);

    for (num_rings, ring_size) in [(1, 10), (4, 50), (16, 100)] {
        let config = BenchConfig::new(num_rings, ring_size, TOKENS, 1);
        group.bench_function(format!("rings/{num_rings}/stages/{ring_size}"), |b| {
            b.to_async(&rt).iter(|| async move {
                let report = run_benchmark(config, CancellationToken::new())
                    .await
                    .expect("benchmark failed");
                black_box(report);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_pipeline,
    bench_concurrent_pipelines,
    bench_factorize,
    bench_mixed_case
);
criterion_main!(benches);
