//! Cooldown-gated alert engine.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use quantstream_analytics::{PriceStats, ZScoreResult};
use quantstream_store::Store;
use quantstream_types::{Alert, AlertKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::{AlertCandidate, AlertConfig, AlertRule, Notifier, RuleInput};

/// Identifier of a rule registered with an [`AlertEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(u64);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule-{}", self.0)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    rules: Vec<(RuleId, AlertRule)>,
    next_id: u64,
    /// Last fire time per `(kind, symbol)`.
    cooldowns: HashMap<(AlertKind, String), DateTime<Utc>>,
}

/// Evaluates alert rules against analytics snapshots.
///
/// A candidate is dropped when the same `(kind, symbol)` fired less than
/// `cooldown_seconds` ago. The cooldown is checked and claimed under the
/// engine lock; notifier and store delivery happen after it is released.
#[derive(Debug)]
pub struct AlertEngine {
    config: AlertConfig,
    notifier: Arc<dyn Notifier>,
    store: Option<Arc<dyn Store>>,
    state: Mutex<EngineState>,
    alert_count: AtomicU64,
}

impl AlertEngine {
    /// Creates an engine with no rules.
    #[must_use]
    pub fn new(
        config: AlertConfig,
        notifier: Arc<dyn Notifier>,
        store: Option<Arc<dyn Store>>,
    ) -> Self {
        info!(
            cooldown_seconds = config.cooldown_seconds,
            store = store.as_ref().map(|s| s.name()),
            "alert engine initialized"
        );
        Self {
            config,
            notifier,
            store,
            state: Mutex::new(EngineState::default()),
            alert_count: AtomicU64::new(0),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Registers a rule.
    pub fn add_rule(&self, rule: AlertRule) -> RuleId {
        let mut state = self.state.lock();
        let id = RuleId(state.next_id);
        state.next_id += 1;
        state.rules.push((id, rule));
        id
    }

    /// Registers several rules.
    pub fn add_rules(&self, rules: impl IntoIterator<Item = AlertRule>) -> Vec<RuleId> {
        let mut state = self.state.lock();
        let ids: Vec<RuleId> = rules
            .into_iter()
            .map(|rule| {
                let id = RuleId(state.next_id);
                state.next_id += 1;
                state.rules.push((id, rule));
                id
            })
            .collect();
        info!(count = ids.len(), "alert rules added");
        ids
    }

    /// Removes a rule, returning it if it was registered.
    pub fn remove_rule(&self, id: RuleId) -> Option<AlertRule> {
        let mut state = self.state.lock();
        let index = state.rules.iter().position(|(rule_id, _)| *rule_id == id)?;
        Some(state.rules.remove(index).1)
    }

    /// Enables or disables a rule. Returns false if the rule is unknown.
    pub fn set_rule_enabled(&self, id: RuleId, enabled: bool) -> bool {
        let mut state = self.state.lock();
        match state.rules.iter_mut().find(|(rule_id, _)| *rule_id == id) {
            Some((_, rule)) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Returns every registered rule.
    #[must_use]
    pub fn rules(&self) -> Vec<(RuleId, AlertRule)> {
        self.state.lock().rules.clone()
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.state.lock().rules.iter().filter(|(_, r)| r.enabled).count()
    }

    /// Returns the number of alerts fired.
    #[must_use]
    pub fn alert_count(&self) -> u64 {
        self.alert_count.load(Ordering::Relaxed)
    }

    /// Returns up to `limit` most recent alerts from the store.
    ///
    /// Empty without a store.
    #[must_use]
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        store.query_alerts(None, None, limit).unwrap_or_else(|e| {
            warn!(store = store.name(), error = %e, "alert query failed");
            Vec::new()
        })
    }

    /// Runs every enabled rule for the snapshot's symbol.
    pub fn evaluate_stats(&self, stats: &PriceStats) -> Vec<Alert> {
        self.evaluate_stats_at(stats, Utc::now())
    }

    /// [`evaluate_stats`](Self::evaluate_stats) with an explicit clock.
    pub fn evaluate_stats_at(&self, stats: &PriceStats, now: DateTime<Utc>) -> Vec<Alert> {
        self.evaluate(RuleInput::Stats(stats), false, now)
    }

    /// Runs the enabled z-score rules for the result's symbol.
    pub fn evaluate_zscore(&self, zscore: &ZScoreResult) -> Vec<Alert> {
        self.evaluate_zscore_at(zscore, Utc::now())
    }

    /// [`evaluate_zscore`](Self::evaluate_zscore) with an explicit clock.
    pub fn evaluate_zscore_at(&self, zscore: &ZScoreResult, now: DateTime<Utc>) -> Vec<Alert> {
        self.evaluate(RuleInput::ZScore(zscore), true, now)
    }

    fn evaluate(&self, input: RuleInput<'_>, zscore_only: bool, now: DateTime<Utc>) -> Vec<Alert> {
        let symbol = input.symbol();
        let rules: Vec<AlertRule> = self
            .state
            .lock()
            .rules
            .iter()
            .map(|(_, rule)| rule)
            .filter(|rule| rule.enabled && rule.symbol == symbol)
            .filter(|rule| !zscore_only || rule.kind().is_zscore())
            .cloned()
            .collect();

        let mut fired = Vec::new();
        for rule in &rules {
            match rule.evaluate(input) {
                Ok(Some(candidate)) => {
                    if let Some(alert) = self.fire(candidate, now) {
                        fired.push(alert);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(symbol, kind = %rule.kind(), error = %e, "rule evaluation failed"),
            }
        }
        fired
    }

    fn fire(&self, candidate: AlertCandidate, now: DateTime<Utc>) -> Option<Alert> {
        let cooldown = self.config.cooldown();
        {
            let mut state = self.state.lock();
            let key = (candidate.kind, candidate.symbol.clone());
            if let Some(last) = state.cooldowns.get(&key)
                && now.signed_duration_since(*last) < cooldown
            {
                debug!(symbol = %candidate.symbol, kind = %candidate.kind, "alert suppressed by cooldown");
                return None;
            }
            state.cooldowns.insert(key, now);
        }

        let alert = Alert {
            severity: self
                .config
                .severity
                .classify(candidate.kind, candidate.triggered_value),
            symbol: candidate.symbol,
            timestamp: now,
            kind: candidate.kind,
            message: candidate.message,
            triggered_value: candidate.triggered_value,
        };

        self.notifier.notify(&alert);
        if let Some(store) = &self.store
            && let Err(e) = store.insert_alert(&alert)
        {
            warn!(store = store.name(), symbol = %alert.symbol, error = %e, "failed to store alert");
        }
        self.alert_count.fetch_add(1, Ordering::Relaxed);
        debug!(symbol = %alert.symbol, severity = %alert.severity, "alert fired");
        Some(alert)
    }
}
