//! Run command implementation.
//!
//! Streams newline-delimited JSON ticks from standard input or a file through
//! the pipeline, stops on end of input or Ctrl-C, then flushes open candles
//! and pending writes before printing a summary.

use anyhow::{Context, Result};
use quantstream_lib::{
    Config, IngestError, IngestionConfig, IngestionSession, LogNotifier, NdjsonSource, Notifier,
    Pipeline, SessionReport, TickSource,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use crate::display;

/// Runs the pipeline over `input`, or standard input when `None`.
pub(crate) async fn run(config: Config, input: Option<PathBuf>, json: bool) -> Result<()> {
    let notifier = Arc::new(LogNotifier::new());
    let ingestion = config.ingestion;
    let pipeline = Pipeline::open(config, Arc::clone(&notifier) as Arc<dyn Notifier>)
        .context("Failed to start pipeline")?;

    let session = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let source = NdjsonSource::new(path.display().to_string(), BufReader::new(file));
            drive(source, &pipeline, ingestion).await
        }
        None => drive(NdjsonSource::stdin(), &pipeline, ingestion).await,
    };

    // Flush even when ingestion failed so buffered candles and ticks are kept
    let flushed = pipeline.shutdown().await;
    let session = session.context("Ingestion failed")?;

    let summary = pipeline.summary();
    if json {
        display::print_json(&session, &flushed, &summary)?;
    } else {
        display::print_summary(&session, &flushed, &summary, notifier.notification_count());
    }
    Ok(())
}

/// Drives `source` into the pipeline until it ends or Ctrl-C is pressed.
async fn drive<S: TickSource>(
    source: S,
    pipeline: &Pipeline,
    config: IngestionConfig,
) -> Result<SessionReport, IngestError> {
    let mut session = IngestionSession::new(source, config);
    let stop = session.stop_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping ingestion");
            stop.stop();
        }
    });

    let result = session.run(pipeline.router()).await;
    interrupt.abort();
    result
}
