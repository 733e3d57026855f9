//! Tick sources.

use async_trait::async_trait;
use chrono::DateTime;
use quantstream_types::Tick;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::SourceError;

/// An async producer of ticks that may disconnect.
#[async_trait]
pub trait TickSource: Send {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Establishes (or re-establishes) the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be reached.
    async fn connect(&mut self) -> Result<(), SourceError>;

    /// Waits for the next tick. `Ok(None)` marks a clean end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection is lost.
    async fn next_tick(&mut self) -> Result<Option<Tick>, SourceError>;
}

/// Exchange trade event: `{"e":"trade","s":..,"p":"..","q":"..","T":..}`.
#[derive(Deserialize)]
struct TradeEvent {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
    #[serde(rename = "T")]
    trade_time: i64,
    #[serde(rename = "t", default)]
    trade_id: Option<u64>,
    #[serde(rename = "m", default)]
    is_buyer_maker: Option<bool>,
}

impl TradeEvent {
    fn into_tick(self) -> Result<Tick, SourceError> {
        let malformed = |field: &str, raw: &str| SourceError::Malformed(format!("{field}: {raw}"));
        let price = self
            .price
            .parse::<f64>()
            .map_err(|_| malformed("price", &self.price))?;
        let size = self
            .quantity
            .parse::<f64>()
            .map_err(|_| malformed("quantity", &self.quantity))?;
        let timestamp = DateTime::from_timestamp_millis(self.trade_time)
            .ok_or_else(|| malformed("trade time", &self.trade_time.to_string()))?;

        Ok(Tick {
            symbol: self.symbol.to_uppercase(),
            timestamp,
            price,
            size,
            trade_id: self.trade_id,
            is_buyer_maker: self.is_buyer_maker,
        })
    }
}

/// Decodes one JSON message into a tick.
///
/// Accepts a serialized [`Tick`], an exchange trade event, or either wrapped
/// in a combined-stream envelope (`{"stream": .., "data": ..}`).
///
/// # Errors
///
/// Returns [`SourceError::Malformed`] when the message matches no format.
pub fn parse_message(message: &str) -> Result<Tick, SourceError> {
    let mut value: Value =
        serde_json::from_str(message).map_err(|e| SourceError::Malformed(e.to_string()))?;
    if value.get("stream").is_some()
        && let Some(data) = value.get_mut("data")
    {
        value = data.take();
    }

    if value.get("e").and_then(Value::as_str) == Some("trade") {
        serde_json::from_value::<TradeEvent>(value)
            .map_err(|e| SourceError::Malformed(e.to_string()))?
            .into_tick()
    } else {
        serde_json::from_value::<Tick>(value).map_err(|e| SourceError::Malformed(e.to_string()))
    }
}

/// Ticks pushed through an in-process channel.
///
/// The stream ends cleanly once every sender is dropped.
#[derive(Debug)]
pub struct ChannelSource {
    name: String,
    receiver: mpsc::Receiver<Tick>,
}

impl ChannelSource {
    /// Creates a source and the sender that feeds it.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: usize) -> (mpsc::Sender<Tick>, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (sender, Self::from_receiver(name, receiver))
    }

    /// Wraps an existing receiver.
    #[must_use]
    pub fn from_receiver(name: impl Into<String>, receiver: mpsc::Receiver<Tick>) -> Self {
        Self {
            name: name.into(),
            receiver,
        }
    }
}

#[async_trait]
impl TickSource for ChannelSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        Ok(self.receiver.recv().await)
    }
}

/// Newline-delimited JSON messages read from an async reader.
///
/// Blank lines are ignored; lines that are not UTF-8 or fail
/// [`parse_message`] are logged and skipped.
#[derive(Debug)]
pub struct NdjsonSource<R> {
    name: String,
    reader: R,
    line: Vec<u8>,
    line_number: u64,
    skipped: u64,
}

impl<R: AsyncBufRead + Unpin + Send> NdjsonSource<R> {
    /// Creates a source reading from `reader`.
    #[must_use]
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
            line: Vec::new(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Returns the number of malformed lines skipped.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl NdjsonSource<BufReader<Stdin>> {
    /// Creates a source reading standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new("stdin", BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> TickSource for NdjsonSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        debug!(source = %self.name, line = self.line_number, "reading ndjson ticks");
        Ok(())
    }

    async fn next_tick(&mut self) -> Result<Option<Tick>, SourceError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let text = match std::str::from_utf8(&self.line) {
                Ok(text) => text.trim(),
                Err(e) => {
                    self.skipped += 1;
                    warn!(source = %self.name, line = self.line_number, error = %e, "skipping non-UTF-8 line");
                    continue;
                }
            };
            if text.is_empty() {
                continue;
            }
            match parse_message(text) {
                Ok(tick) => return Ok(Some(tick)),
                Err(e) => {
                    self.skipped += 1;
                    warn!(source = %self.name, line = self.line_number, error = %e, "skipping malformed line");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_tick_json() {
        let tick = parse_message(
            r#"{"symbol":"BTCUSDT","timestamp":"2024-01-15T12:30:45Z","price":42000.5,"size":0.1}"#,
        )
        .unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.timestamp, Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap());
        assert_eq!(tick.price, 42000.5);
    }

    #[test]
    fn test_parse_trade_event() {
        let tick = parse_message(
            r#"{"e":"trade","E":1705321845123,"s":"ethusdt","t":42,"p":"2500.10","q":"1.5","T":1705321845100,"m":true}"#,
        )
        .unwrap();
        assert_eq!(tick.symbol, "ETHUSDT");
        assert_eq!(tick.price, 2500.10);
        assert_eq!(tick.size, 1.5);
        assert_eq!(tick.trade_id, Some(42));
        assert_eq!(tick.is_buyer_maker, Some(true));
        assert_eq!(tick.timestamp.timestamp_millis(), 1_705_321_845_100);
    }

    #[test]
    fn test_parse_combined_stream() {
        let tick = parse_message(
            r#"{"stream":"btcusdt@trade","data":{"e":"trade","s":"BTCUSDT","p":"1","q":"2","T":0}}"#,
        )
        .unwrap();
        assert_eq!(tick.symbol, "BTCUSDT");
        assert_eq!(tick.size, 2.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_message("not json"), Err(SourceError::Malformed(_))));
        assert!(matches!(
            parse_message(r#"{"e":"trade","s":"X","p":"abc","q":"1","T":0}"#),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(
            parse_message(r#"{"symbol":"X","timestamp":"yesterday","price":1,"size":1}"#),
            Err(SourceError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_ndjson_source_skips_bad_lines() {
        let input = concat!(
            r#"{"symbol":"X","timestamp":0,"price":1.0,"size":1.0}"#,
            "\n\n",
            "garbage\n",
            r#"{"symbol":"X","timestamp":1000,"price":2.0,"size":1.0}"#,
            "\n",
        );
        let mut source = NdjsonSource::new("test", input.as_bytes());
        source.connect().await.unwrap();

        assert_eq!(source.next_tick().await.unwrap().unwrap().price, 1.0);
        assert_eq!(source.next_tick().await.unwrap().unwrap().price, 2.0);
        assert!(source.next_tick().await.unwrap().is_none());
        assert_eq!(source.skipped(), 1);
    }

    #[tokio::test]
    async fn test_ndjson_source_skips_invalid_utf8() {
        let mut input = Vec::new();
        input.extend_from_slice(br#"{"symbol":"X","timestamp":0,"price":1.0,"size":1.0}"#);
        input.extend_from_slice(b"\n\xff\xfe\n");
        input.extend_from_slice(br#"{"symbol":"X","timestamp":1000,"price":2.0,"size":1.0}"#);
        input.push(b'\n');
        let mut source = NdjsonSource::new("bytes", input.as_slice());
        source.connect().await.unwrap();

        assert_eq!(source.next_tick().await.unwrap().unwrap().price, 1.0);
        assert_eq!(source.next_tick().await.unwrap().unwrap().price, 2.0);
        assert!(source.next_tick().await.unwrap().is_none());
        assert_eq!(source.skipped(), 1);
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (sender, mut source) = ChannelSource::new("chan", 4);
        let tick = Tick::new("X", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 1.0, 1.0);
        sender.send(tick.clone()).await.unwrap();
        drop(sender);

        assert_eq!(source.name(), "chan");
        assert_eq!(source.next_tick().await.unwrap(), Some(tick));
        assert_eq!(source.next_tick().await.unwrap(), None);
    }
}
