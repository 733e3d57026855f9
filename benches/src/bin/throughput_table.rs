//! Prints a throughput table for each pipeline stage.
//!
//! Run with: `cargo run --release --bin throughput_table`

use quantstream_bench::{TickGenerator, measure, memory_pipeline};
use quantstream_lib::{AnalyticsConfig, AnalyticsEngine, CandleAggregator, Config, Timeframe};

const SYMBOLS: [&str; 4] = ["BTCUSDT", "ETHUSDT", "SOLUSDT", "BNBUSDT"];

fn main() {
    let sizes = [10_000, 100_000];

    println!(
        "{:<12} {:<12} {:>14} {:>12}",
        "STAGE", "TICKS", "TICKS/SEC", "US/TICK"
    );
    println!("{}", "-".repeat(54));

    for size in sizes {
        let ticks = TickGenerator::new(&SYMBOLS, 100, 42).take(size);

        let engine = AnalyticsEngine::new(AnalyticsConfig::default());
        let analytics = measure("analytics", &ticks, |tick| {
            let _ = engine.update(tick);
        });

        let aggregator = CandleAggregator::new(Timeframe::defaults());
        let candles = measure("candles", &ticks, |tick| {
            let _ = aggregator.add_tick(tick);
        });

        let Some(pipeline) = memory_pipeline(Config::default()) else {
            eprintln!("Failed to build pipeline");
            return;
        };
        let full = measure("pipeline", &ticks, |tick| {
            let _ = pipeline.route(tick);
        });

        for result in [analytics, candles, full] {
            println!(
                "{:<12} {:<12} {:>14.0} {:>12.2}",
                result.stage,
                result.ticks,
                result.ticks_per_sec(),
                result.micros_per_tick()
            );
        }
    }
}
