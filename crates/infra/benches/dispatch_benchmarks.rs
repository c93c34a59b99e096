use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use fibcalc_core::{Computation, Index, IndexLimit, RecursiveFibonacci};
use fibcalc_events::{InMemoryMessageBus, MessageBus};
use fibcalc_infra::cache::InMemoryResultCache;
use fibcalc_infra::durable_store::InMemoryDurableStore;
use fibcalc_infra::job_dispatcher::JobDispatcher;
use std::sync::Arc;

/// Cost of the submit path (validate + append + placeholder + publish) with
/// in-memory adapters and one subscriber draining nothing.
fn bench_submit(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    let bus = Arc::new(InMemoryMessageBus::new());
    let _sub = rt.block_on(bus.subscribe("insert")).expect("subscribe");
    let dispatcher = JobDispatcher::new(
        Arc::new(InMemoryDurableStore::new()),
        Arc::new(InMemoryResultCache::new()),
        bus,
        IndexLimit::default(),
    );

    c.bench_function("dispatch/submit", |b| {
        b.iter(|| rt.block_on(dispatcher.submit(black_box("17"))).expect("submit"))
    });
}

/// Growth of the naive computation; shows why the index limit exists.
fn bench_compute(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute/recursive_fibonacci");
    for n in [10u32, 15, 20, 25] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| RecursiveFibonacci.compute(black_box(Index::from_stored(n))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_submit, bench_compute);
criterion_main!(benches);
