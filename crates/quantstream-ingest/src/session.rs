//! Reconnecting ingestion session.
//!
//! A session drives one [`TickSource`] into a [`DataRouter`] through the
//! state machine
//!
//! ```text
//! Connecting -> Connected -> Backoff -> Connecting ...
//!                         \-> Stopped            (stop requested or end of stream)
//!            Backoff  -----> Exhausted          (max_reconnect_attempts consecutive failures)
//! ```
//!
//! The attempt counter resets whenever a connection succeeds.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{DataRouter, IngestError, SourceError, TickSource};

/// Reconnect and receive timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Delay before the first reconnect, doubled on each further failure.
    pub reconnect_delay_ms: u64,
    /// Upper bound on the reconnect delay.
    pub max_reconnect_delay_ms: u64,
    /// Consecutive failures after which the session gives up.
    pub max_reconnect_attempts: u32,
    /// Longest single wait for a tick before the stop flag is rechecked.
    pub recv_timeout_ms: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
            max_reconnect_delay_ms: 60_000,
            max_reconnect_attempts: 10,
            recv_timeout_ms: 30_000,
        }
    }
}

impl IngestionConfig {
    /// Returns the delay before reconnect attempt `attempt` (1-based).
    ///
    /// Exponential in the attempt, capped at `max_reconnect_delay_ms`, with a
    /// deterministic jitter of up to ±25%.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .reconnect_delay_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
        let capped = exp_delay.min(self.max_reconnect_delay_ms.max(self.reconnect_delay_ms));

        let jitter_range = capped / 4;
        let delay = if jitter_range > 0 {
            let offset = (u64::from(attempt) * 17) % (jitter_range * 2);
            capped - jitter_range + offset
        } else {
            capped
        };
        Duration::from_millis(delay)
    }

    const fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}

/// Position in the reconnect state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Not started.
    #[default]
    Idle,
    /// Connecting to the source.
    Connecting,
    /// Receiving ticks.
    Connected,
    /// Waiting before the next connect.
    Backoff,
    /// Gave up after too many consecutive failures.
    Exhausted,
    /// Finished because of a stop request or end of stream.
    Stopped,
}

impl SessionState {
    /// Returns the state as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Backoff => "backoff",
            Self::Exhausted => "exhausted",
            Self::Stopped => "stopped",
        }
    }

    /// Returns true for `Exhausted` and `Stopped`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Stopped)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooperative cancellation for a running session.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    fn new() -> Self {
        Self {
            sender: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Asks the session to stop at its next wait point.
    pub fn stop(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once a stop was requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once a stop is requested.
    async fn stopped(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender is owned by self, so the channel cannot close here
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

/// Read-only view of a session's progress, usable while it runs.
#[derive(Debug, Clone, Default)]
pub struct SessionMonitor {
    state: Arc<Mutex<SessionState>>,
    ticks: Arc<AtomicU64>,
    attempts: Arc<AtomicU64>,
}

impl SessionMonitor {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Returns the number of ticks routed so far.
    #[must_use]
    pub fn ticks_received(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Returns the current run of consecutive failed attempts.
    #[must_use]
    pub fn failed_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn set_state(&self, state: SessionState) {
        *self.state.lock() = state;
    }
}

/// Why a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    /// The source reported a clean end of stream.
    SourceFinished,
    /// A stop was requested.
    StopRequested,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    /// How the session ended.
    pub end: SessionEnd,
    /// Ticks routed.
    pub ticks: u64,
    /// Ticks rejected by validation.
    pub rejected: u64,
    /// Successful connects.
    pub connects: u64,
}

enum Receive {
    Finished,
    Stopped,
    Lost(SourceError),
}

/// Drives a [`TickSource`] into a [`DataRouter`], reconnecting on failure.
#[derive(Debug)]
pub struct IngestionSession<S> {
    source: S,
    config: IngestionConfig,
    stop: StopHandle,
    monitor: SessionMonitor,
}

impl<S: TickSource> IngestionSession<S> {
    /// Creates a session for `source`.
    #[must_use]
    pub fn new(source: S, config: IngestionConfig) -> Self {
        Self {
            source,
            config,
            stop: StopHandle::new(),
            monitor: SessionMonitor::default(),
        }
    }

    /// Returns a handle that stops the session.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns a view of the session's progress.
    #[must_use]
    pub fn monitor(&self) -> SessionMonitor {
        self.monitor.clone()
    }

    /// Returns the source.
    #[must_use]
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Runs until the source ends, a stop is requested, or reconnects are
    /// exhausted. Invalid ticks are logged and not routed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::RetriesExhausted`] after
    /// `max_reconnect_attempts` consecutive connect or receive failures.
    pub async fn run(&mut self, router: &DataRouter) -> Result<SessionReport, IngestError> {
        let name = self.source.name().to_string();
        let mut report = SessionReport {
            end: SessionEnd::StopRequested,
            ticks: 0,
            rejected: 0,
            connects: 0,
        };
        let mut attempts: u32 = 0;

        loop {
            if self.stop.is_stopped() {
                return Ok(self.finish(&name, report, SessionEnd::StopRequested));
            }

            self.monitor.set_state(SessionState::Connecting);
            debug!(source = %name, attempt = attempts + 1, "connecting");
            let failure = match self.source.connect().await {
                Ok(()) => {
                    attempts = 0;
                    self.monitor.attempts.store(0, Ordering::Relaxed);
                    report.connects += 1;
                    self.monitor.set_state(SessionState::Connected);
                    info!(source = %name, "source connected");

                    match self.receive(&name, router, &mut report).await {
                        Receive::Finished => {
                            return Ok(self.finish(&name, report, SessionEnd::SourceFinished));
                        }
                        Receive::Stopped => {
                            return Ok(self.finish(&name, report, SessionEnd::StopRequested));
                        }
                        Receive::Lost(e) => {
                            warn!(source = %name, error = %e, "source disconnected");
                            e
                        }
                    }
                }
                Err(e) => {
                    warn!(source = %name, error = %e, "connect failed");
                    e
                }
            };

            attempts += 1;
            self.monitor
                .attempts
                .store(u64::from(attempts), Ordering::Relaxed);
            if attempts >= self.config.max_reconnect_attempts {
                self.monitor.set_state(SessionState::Exhausted);
                error!(source = %name, attempts, "max reconnection attempts reached");
                return Err(IngestError::RetriesExhausted {
                    name,
                    attempts,
                    last_error: failure,
                });
            }

            let delay = self.config.backoff_delay(attempts);
            self.monitor.set_state(SessionState::Backoff);
            info!(source = %name, attempts, delay_ms = delay.as_millis() as u64, "reconnecting after delay");
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = self.stop.stopped() => {}
            }
        }
    }

    async fn receive(
        &mut self,
        name: &str,
        router: &DataRouter,
        report: &mut SessionReport,
    ) -> Receive {
        let timeout = self.config.recv_timeout();
        loop {
            if self.stop.is_stopped() {
                return Receive::Stopped;
            }

            let next = tokio::select! {
                next = tokio::time::timeout(timeout, self.source.next_tick()) => next,
                () = self.stop.stopped() => return Receive::Stopped,
            };

            match next {
                Err(_elapsed) => continue,
                Ok(Ok(Some(tick))) => {
                    if let Err(e) = tick.validate() {
                        report.rejected += 1;
                        warn!(source = %name, error = %e, "rejected invalid tick");
                        continue;
                    }
                    router.route(&tick);
                    report.ticks += 1;
                    self.monitor.ticks.fetch_add(1, Ordering::Relaxed);
                }
                Ok(Ok(None)) => return Receive::Finished,
                Ok(Err(e)) => return Receive::Lost(e),
            }
        }
    }

    fn finish(&self, name: &str, mut report: SessionReport, end: SessionEnd) -> SessionReport {
        report.end = end;
        self.monitor.set_state(SessionState::Stopped);
        info!(source = %name, ticks = report.ticks, end = ?end, "ingestion stopped");
        report
    }
}
