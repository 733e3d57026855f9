//! Newline-delimited JSON store.

use parking_lot::Mutex;
use quantstream_aggregate::Ohlcv;
use quantstream_types::{Alert, AlertSeverity, Tick, Timeframe};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{MemoryStore, Result, Store, StoreCounts, StoreError};

const TICKS_FILE: &str = "ticks.ndjson";
const OHLCV_FILE: &str = "ohlcv.ndjson";
const ALERTS_FILE: &str = "alerts.ndjson";

#[derive(Debug)]
struct RecordFile {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RecordFile {
    fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::WriteFile {
                path: path.clone(),
                source: e,
            })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    fn append<T: Serialize>(&mut self, records: &[T]) -> Result<()> {
        for record in records {
            serde_json::to_writer(&mut self.writer, record)?;
            writeln!(self.writer).map_err(|e| self.write_error(e))?;
        }
        self.writer.flush().map_err(|e| self.write_error(e))
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::WriteFile {
            path: self.path.clone(),
            source,
        }
    }
}

#[derive(Debug)]
struct Files {
    ticks: RecordFile,
    ohlcv: RecordFile,
    alerts: RecordFile,
}

/// Appends records as newline-delimited JSON under a directory.
///
/// Records go to `ticks.ndjson`, `ohlcv.ndjson` and `alerts.ndjson`. Candle
/// upserts append a new line, so the last line for a key wins when reading
/// the file back. Queries are served from a bounded in-memory index of what
/// this instance has written.
#[derive(Debug)]
pub struct NdjsonStore {
    dir: PathBuf,
    files: Mutex<Files>,
    index: MemoryStore,
}

impl NdjsonStore {
    /// Opens (creating if needed) a store under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or files cannot be created.
    pub fn open(dir: impl Into<PathBuf>, index_capacity: usize) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| StoreError::CreateDir {
                path: dir.clone(),
                source: e,
            })?;
        }

        let files = Files {
            ticks: RecordFile::open(dir.join(TICKS_FILE))?,
            ohlcv: RecordFile::open(dir.join(OHLCV_FILE))?,
            alerts: RecordFile::open(dir.join(ALERTS_FILE))?,
        };
        info!(dir = %dir.display(), "ndjson store opened");

        Ok(Self {
            dir,
            files: Mutex::new(files),
            index: MemoryStore::new(index_capacity),
        })
    }

    /// Returns the storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Store for NdjsonStore {
    fn name(&self) -> &str {
        "ndjson"
    }

    fn insert_ticks(&self, ticks: &[Tick]) -> Result<()> {
        self.files.lock().ticks.append(ticks)?;
        self.index.insert_ticks(ticks)
    }

    fn insert_ohlcv(&self, candle: &Ohlcv) -> Result<()> {
        self.files.lock().ohlcv.append(std::slice::from_ref(candle))?;
        self.index.insert_ohlcv(candle)
    }

    fn insert_alert(&self, alert: &Alert) -> Result<()> {
        self.files.lock().alerts.append(std::slice::from_ref(alert))?;
        self.index.insert_alert(alert)
    }

    fn query_ticks(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<Tick>> {
        self.index.query_ticks(symbol, limit)
    }

    fn query_ohlcv(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<Vec<Ohlcv>> {
        self.index.query_ohlcv(symbol, timeframe, limit)
    }

    fn query_alerts(
        &self,
        symbol: Option<&str>,
        severity: Option<AlertSeverity>,
        limit: usize,
    ) -> Result<Vec<Alert>> {
        self.index.query_alerts(symbol, severity, limit)
    }

    fn counts(&self) -> StoreCounts {
        self.index.counts()
    }
}
