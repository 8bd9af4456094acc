//! Engine performance benchmarks (Criterion).
//!
//! Run: `cargo bench` or `cargo bench --bench engine`.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use toy_stock_exchange::flow_gen::{self, FlowConfig, FlowGenerator};
use toy_stock_exchange::Engine;

fn untimed_config(seed: u64, num_actions: usize, num_traders: usize) -> FlowConfig {
    FlowConfig {
        seed,
        num_actions,
        num_traders,
        cancel_ratio: 0.0,
        tick_every: 0,
        ..Default::default()
    }
}

fn bench_place_throughput(c: &mut Criterion) {
    const N: usize = 1000;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("place_1000", |b| {
        b.iter_batched(
            || {
                let config = untimed_config(42, N, 50);
                let mut engine = Engine::new();
                let tokens = flow_gen::populate(&mut engine, &config).unwrap();
                let actions = FlowGenerator::new(config.clone()).all_actions();
                (engine, config, tokens, actions)
            },
            |(mut engine, config, tokens, actions)| {
                for a in actions {
                    let _ = engine.place(&tokens[a.trader], &config.instrument, a.price, a.quantity, a.side);
                }
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_tick_crossed_book(c: &mut Criterion) {
    const TRADERS: usize = 500;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(TRADERS as u64));
    group.bench_function("tick_500_traders_resting", |b| {
        b.iter_batched(
            || {
                let config = untimed_config(123, TRADERS * 2, TRADERS);
                let mut engine = Engine::new();
                let tokens = flow_gen::populate(&mut engine, &config).unwrap();
                for a in FlowGenerator::new(config.clone()).all_actions() {
                    let _ = engine.place(&tokens[a.trader], &config.instrument, a.price, a.quantity, a.side);
                }
                engine
            },
            |mut engine| engine.tick(),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_replay_with_ticks(c: &mut Criterion) {
    const N: usize = 2000;
    let mut group = c.benchmark_group("engine");
    group.throughput(Throughput::Elements(N as u64));
    group.bench_function("replay_2000_tick_every_10", |b| {
        b.iter_batched(
            || {
                let config = FlowConfig {
                    seed: 456,
                    num_actions: N,
                    num_traders: 20,
                    ..Default::default()
                };
                let mut engine = Engine::new();
                let tokens = flow_gen::populate(&mut engine, &config).unwrap();
                let actions = FlowGenerator::new(config.clone()).all_actions();
                (engine, config, tokens, actions)
            },
            |(mut engine, config, tokens, actions)| flow_gen::replay(&mut engine, &config, &tokens, actions),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_place_throughput,
    bench_tick_crossed_book,
    bench_replay_with_ticks
);
criterion_main!(benches);
