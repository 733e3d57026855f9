//! Fan-out of ticks to registered handlers.

use parking_lot::RwLock;
use quantstream_types::Tick;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Error returned by a failing handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer of routed ticks.
///
/// Closures of type `Fn(&Tick) -> Result<(), HandlerError>` implement this
/// trait directly.
pub trait TickHandler: Send + Sync {
    /// Returns a short name for logging.
    fn name(&self) -> &str {
        "handler"
    }

    /// Processes one tick.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the router; delivery to the remaining
    /// handlers continues.
    fn handle(&self, tick: &Tick) -> Result<(), HandlerError>;
}

impl<F> TickHandler for F
where
    F: Fn(&Tick) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
        self(tick)
    }
}

/// Identifier of a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandlerId(u64);

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Outcome of routing one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteReport {
    /// Handlers that accepted the tick.
    pub delivered: usize,
    /// Handlers that returned an error.
    pub failed: usize,
}

type HandlerList = Arc<Vec<(HandlerId, Arc<dyn TickHandler>)>>;

/// Delivers each tick to every registered handler in registration order.
///
/// Registration swaps in a new handler list; [`route`](Self::route) clones
/// the current list pointer and invokes handlers without holding the lock,
/// so handlers may register or unregister handlers themselves.
pub struct DataRouter {
    handlers: RwLock<HandlerList>,
    next_id: AtomicU64,
    routed: AtomicU64,
    failures: AtomicU64,
}

impl DataRouter {
    /// Creates a router with no handlers.
    #[must_use]
    pub fn new() -> Self {
        info!("data router initialized");
        Self {
            handlers: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(0),
            routed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Registers a handler after the existing ones.
    pub fn register(&self, handler: Arc<dyn TickHandler>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write();
        let mut next = Vec::clone(&handlers);
        let name = handler.name().to_string();
        next.push((id, handler));
        *handlers = Arc::new(next);
        info!(handler = %name, %id, total = handlers.len(), "handler registered");
        id
    }

    /// Removes a handler. Returns false if it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.write();
        if !handlers.iter().any(|(handler_id, _)| *handler_id == id) {
            return false;
        }
        let next: Vec<_> = handlers
            .iter()
            .filter(|(handler_id, _)| *handler_id != id)
            .cloned()
            .collect();
        *handlers = Arc::new(next);
        info!(%id, total = handlers.len(), "handler unregistered");
        true
    }

    /// Removes every handler.
    pub fn clear_handlers(&self) {
        *self.handlers.write() = Arc::new(Vec::new());
        info!("all handlers cleared");
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Delivers a tick to every handler registered at the time of the call.
    pub fn route(&self, tick: &Tick) -> RouteReport {
        let handlers = Arc::clone(&self.handlers.read());

        let mut report = RouteReport::default();
        for (id, handler) in handlers.iter() {
            match handler.handle(tick) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        handler = handler.name(),
                        %id,
                        symbol = %tick.symbol,
                        error = %e,
                        "handler failed"
                    );
                }
            }
        }

        self.routed.fetch_add(1, Ordering::Relaxed);
        if report.failed > 0 {
            self.failures
                .fetch_add(report.failed as u64, Ordering::Relaxed);
        }
        report
    }

    /// Returns the number of ticks routed.
    #[must_use]
    pub fn routed_count(&self) -> u64 {
        self.routed.load(Ordering::Relaxed)
    }

    /// Returns the number of handler failures.
    #[must_use]
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

impl Default for DataRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DataRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read();
        let names: Vec<&str> = handlers.iter().map(|(_, h)| h.name()).collect();
        f.debug_struct("DataRouter")
            .field("handlers", &names)
            .field("routed", &self.routed_count())
            .field("failures", &self.failure_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use parking_lot::Mutex;

    fn tick(price: f64) -> Tick {
        Tick::new("X", DateTime::from_timestamp(0, 0).unwrap(), price, 1.0)
    }

    #[derive(Default)]
    struct Recorder {
        prices: Mutex<Vec<f64>>,
    }

    impl TickHandler for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn handle(&self, tick: &Tick) -> Result<(), HandlerError> {
            self.prices.lock().push(tick.price);
            Ok(())
        }
    }

    #[test]
    fn test_delivers_to_all_handlers() {
        let router = DataRouter::new();
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        router.register(first.clone());
        router.register(second.clone());

        let report = router.route(&tick(1.0));
        router.route(&tick(2.0));

        assert_eq!(report, RouteReport { delivered: 2, failed: 0 });
        assert_eq!(*first.prices.lock(), vec![1.0, 2.0]);
        assert_eq!(*second.prices.lock(), vec![1.0, 2.0]);
        assert_eq!(router.routed_count(), 2);
    }

    #[test]
    fn test_failing_handler_is_isolated() {
        let router = DataRouter::new();
        let failing = |_: &Tick| -> Result<(), HandlerError> { Err("boom".into()) };
        let after = Arc::new(Recorder::default());
        router.register(Arc::new(failing));
        router.register(after.clone());

        let report = router.route(&tick(1.0));
        assert_eq!(report, RouteReport { delivered: 1, failed: 1 });
        assert_eq!(*after.prices.lock(), vec![1.0]);
        assert_eq!(router.failure_count(), 1);
        assert_eq!(router.routed_count(), 1);
    }

    #[test]
    fn test_unregister() {
        let router = DataRouter::new();
        let recorder = Arc::new(Recorder::default());
        let id = router.register(recorder.clone());
        let other = router.register(Arc::new(|_: &Tick| -> Result<(), HandlerError> { Ok(()) }));
        assert_eq!(router.handler_count(), 2);

        assert!(router.unregister(id));
        assert!(!router.unregister(id));
        router.route(&tick(1.0));
        assert!(recorder.prices.lock().is_empty());

        assert!(router.unregister(other));
        assert_eq!(router.handler_count(), 0);
        assert_eq!(router.route(&tick(1.0)), RouteReport::default());
    }

    #[test]
    fn test_clear_handlers() {
        let router = DataRouter::default();
        router.register(Arc::new(Recorder::default()));
        router.register(Arc::new(Recorder::default()));
        router.clear_handlers();
        assert_eq!(router.handler_count(), 0);
        assert!(format!("{router:?}").contains("DataRouter"));
    }

    #[test]
    fn test_handler_can_register_during_route() {
        let router = Arc::new(DataRouter::new());
        let inner = Arc::clone(&router);
        router.register(Arc::new(move |_: &Tick| -> Result<(), HandlerError> {
            if inner.handler_count() < 3 {
                inner.register(Arc::new(Recorder::default()));
            }
            Ok(())
        }));

        // The handler added during routing is not part of this delivery
        assert_eq!(router.route(&tick(1.0)).delivered, 1);
        assert_eq!(router.route(&tick(2.0)).delivered, 2);
    }

    #[test]
    fn test_concurrent_routing() {
        let router = Arc::new(DataRouter::new());
        let recorder = Arc::new(Recorder::default());
        router.register(recorder.clone());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let router = Arc::clone(&router);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        router.route(&tick(f64::from(i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(router.routed_count(), 1_000);
        assert_eq!(recorder.prices.lock().len(), 1_000);
    }
}
