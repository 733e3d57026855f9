//! Summary output for the quantstream CLI.

use anyhow::Result;
use quantstream_lib::{FlushReport, PipelineSummary, SessionEnd, SessionReport};
use serde_json::json;

/// Prints a human-readable run summary.
pub(crate) fn print_summary(
    session: &SessionReport,
    flushed: &FlushReport,
    summary: &PipelineSummary,
    notifications: u64,
) {
    let end = match session.end {
        SessionEnd::SourceFinished => "end of input",
        SessionEnd::StopRequested => "interrupted",
    };

    println!("Ingestion finished ({end})");
    println!("{}", "-".repeat(50));
    println!("{:<28} {:>20}", "Ticks routed", summary.ticks_routed);
    println!("{:<28} {:>20}", "Ticks rejected", session.rejected);
    println!("{:<28} {:>20}", "Handler failures", summary.handler_failures);
    println!("{:<28} {:>20}", "Alerts fired", summary.alerts_fired);
    println!("{:<28} {:>20}", "Notifications", notifications);
    println!("{:<28} {:>20}", "Candles flushed", flushed.candles);
    println!("{:<28} {:>20}", "Ticks flushed", flushed.ticks);
    println!("{:<28} {:>20}", "Stored ticks", summary.store.ticks);
    println!("{:<28} {:>20}", "Stored candles", summary.store.ohlcv);
    println!("{:<28} {:>20}", "Stored alerts", summary.store.alerts);
    if summary.dropped_writes > 0 {
        println!("{:<28} {:>20}", "Dropped writes", summary.dropped_writes);
    }

    if summary.analytics.latest_prices.is_empty() {
        return;
    }
    println!("\n{:<15} {:>15} {:>12}", "SYMBOL", "LAST PRICE", "TICKS");
    println!("{}", "-".repeat(44));
    for (symbol, price) in &summary.analytics.latest_prices {
        let ticks = summary.buffer.per_symbol.get(symbol).copied().unwrap_or(0);
        println!("{symbol:<15} {price:>15.4} {ticks:>12}");
    }
}

/// Prints the run summary as a single JSON document.
pub(crate) fn print_json(
    session: &SessionReport,
    flushed: &FlushReport,
    summary: &PipelineSummary,
) -> Result<()> {
    let document = json!({
        "session": session,
        "flushed": flushed,
        "pipeline": summary,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
