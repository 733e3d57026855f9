//! Tick throughput benchmarks for the analytics engine, candle aggregator
//! and full pipeline.
//!
//! Run with: `cargo bench --package quantstream-bench`

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quantstream_bench::{TickGenerator, memory_pipeline};
use quantstream_lib::{
    AnalyticsConfig, AnalyticsEngine, CandleAggregator, ChannelSource, Config, CorrelationMethod,
    IngestionConfig, IngestionSession, Timeframe,
};
use std::hint::black_box;

const SYMBOLS: [&str; 4] = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT"];
const BATCH: usize = 10_000;

fn analytics_benchmark(c: &mut Criterion) {
    let ticks = TickGenerator::new(&SYMBOLS, 100, 7).take(BATCH);
    let mut group = c.benchmark_group("analytics");
    group.throughput(Throughput::Elements(BATCH as u64));

    for window in [100, 1_000] {
        group.bench_with_input(BenchmarkId::new("update", window), &window, |b, &window| {
            b.iter_batched(
                || {
                    AnalyticsEngine::new(AnalyticsConfig {
                        window_size: window,
                        ..AnalyticsConfig::default()
                    })
                },
                |engine| {
                    for tick in &ticks {
                        black_box(engine.update(tick));
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }

    let engine = AnalyticsEngine::new(AnalyticsConfig::default());
    for tick in &ticks {
        engine.update(tick);
    }
    group.throughput(Throughput::Elements(1));
    group.bench_function("correlation_matrix", |b| {
        b.iter(|| black_box(engine.get_correlation_matrix()));
    });
    group.bench_function("all_correlations_spearman", |b| {
        b.iter(|| black_box(engine.get_all_correlations(CorrelationMethod::Spearman)));
    });
    group.bench_function("adf_test", |b| {
        b.iter(|| black_box(engine.get_adf_test("BTCUSDT")));
    });
    group.finish();
}

fn candle_benchmark(c: &mut Criterion) {
    let ticks = TickGenerator::new(&SYMBOLS, 100, 11).take(BATCH);
    let mut group = c.benchmark_group("candles");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("add_tick", |b| {
        b.iter_batched(
            || CandleAggregator::new(Timeframe::all().iter().copied()),
            |aggregator| {
                for tick in &ticks {
                    black_box(aggregator.add_tick(tick));
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

fn pipeline_benchmark(c: &mut Criterion) {
    let ticks = TickGenerator::new(&SYMBOLS, 100, 13).take(BATCH);
    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(BATCH as u64));

    group.bench_function("route", |b| {
        b.iter_batched(
            || memory_pipeline(Config::default()),
            |pipeline| {
                if let Some(pipeline) = pipeline {
                    for tick in &ticks {
                        black_box(pipeline.route(tick));
                    }
                }
            },
            BatchSize::LargeInput,
        );
    });

    let runtime = tokio::runtime::Runtime::new().unwrap();
    group.bench_function("session", |b| {
        b.to_async(&runtime).iter_batched(
            || memory_pipeline(Config::default()),
            |pipeline| {
                let ticks = ticks.clone();
                async move {
                    let Some(pipeline) = pipeline else { return };
                    let (sender, source) = ChannelSource::new("bench", 1_024);
                    let producer = tokio::spawn(async move {
                        for tick in ticks {
                            if sender.send(tick).await.is_err() {
                                break;
                            }
                        }
                    });
                    let mut session = IngestionSession::new(source, IngestionConfig::default());
                    black_box(session.run(pipeline.router()).await.ok());
                    let _ = producer.await;
                }
            },
            BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(benches, analytics_benchmark, candle_benchmark, pipeline_benchmark);
criterion_main!(benches);
