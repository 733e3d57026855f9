//! Alert delivery.

use quantstream_types::{Alert, AlertSeverity};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info, warn};

/// Receives every fired alert.
///
/// Delivery is fire-and-forget; implementations handle their own failures.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Delivers an alert.
    fn notify(&self, alert: &Alert);
}

/// Emits alerts as log events at a level matching their severity.
#[derive(Debug, Default)]
pub struct LogNotifier {
    count: AtomicU64,
}

impl LogNotifier {
    /// Creates a notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Returns the number of alerts delivered.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, alert: &Alert) {
        let symbol = alert.symbol.as_str();
        let kind = alert.kind.as_str();
        let severity = alert.severity.as_str();
        match alert.severity {
            AlertSeverity::Critical | AlertSeverity::High => {
                error!(symbol, kind, severity, value = alert.triggered_value, "ALERT {}", alert.message);
            }
            AlertSeverity::Medium => {
                warn!(symbol, kind, severity, value = alert.triggered_value, "ALERT {}", alert.message);
            }
            AlertSeverity::Low => {
                info!(symbol, kind, severity, value = alert.triggered_value, "ALERT {}", alert.message);
            }
        }
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}
