//! Thread-safe analytics orchestrator.

use parking_lot::Mutex;
use quantstream_types::{RollingWindow, Tick};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{
    AdfResult, AdfTest, AnalyticsConfig, AnalyticsError, CorrelationCalculator, CorrelationMatrix,
    CorrelationMethod, CorrelationResult, PriceStats, RatioResult, RegressionCalculator,
    RegressionResult, SpreadCalculator, SpreadResult, ZScoreResult,
};

/// Engine-wide overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    /// Tracked symbols, sorted.
    pub symbols: Vec<String>,
    /// Number of tracked symbols.
    pub symbol_count: usize,
    /// Rolling window length.
    pub window_size: usize,
    /// Number of symbols with a statistics snapshot.
    pub stats_available: usize,
    /// Newest price per symbol.
    pub latest_prices: BTreeMap<String, f64>,
}

/// Price and size windows for one symbol.
#[derive(Debug)]
struct SymbolWindows {
    prices: RollingWindow<f64>,
    sizes: RollingWindow<f64>,
}

impl SymbolWindows {
    fn new(capacity: usize) -> Self {
        Self {
            prices: RollingWindow::new(capacity),
            sizes: RollingWindow::new(capacity),
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    windows: BTreeMap<String, SymbolWindows>,
    latest_stats: BTreeMap<String, PriceStats>,
}

impl EngineState {
    fn prices(&self, symbol: &str) -> Option<Vec<f64>> {
        self.windows.get(symbol).map(|w| w.prices.to_vec())
    }
}

/// Orchestrates the rolling-window calculators for every symbol.
///
/// One lock guards all windows and snapshots, so each [`update`] leaves the
/// price statistics, z-score and pair metrics consistent for that tick.
/// Getters return owned copies.
///
/// [`update`]: AnalyticsEngine::update
#[derive(Debug)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    correlation: CorrelationCalculator,
    regression: RegressionCalculator,
    spread: SpreadCalculator,
    adf: AdfTest,
    state: Mutex<EngineState>,
}

impl AnalyticsEngine {
    /// Creates an engine from configuration.
    #[must_use]
    pub fn new(config: AnalyticsConfig) -> Self {
        info!(
            window_size = config.window_size,
            correlation_min_periods = config.correlation_min_periods,
            adf_max_lag = config.adf_max_lag,
            "analytics engine initialized"
        );
        Self {
            correlation: CorrelationCalculator::new(config.correlation_min_periods),
            regression: RegressionCalculator::new(config.regression_min_periods),
            spread: SpreadCalculator::new(config.spread_min_periods),
            adf: AdfTest::from_config(&config),
            config,
            state: Mutex::new(EngineState::default()),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Folds a tick into its symbol's windows and recomputes its statistics.
    ///
    /// Returns the fresh snapshot, or `None` while the window holds fewer
    /// than two prices.
    pub fn update(&self, tick: &Tick) -> Option<PriceStats> {
        let mut state = self.state.lock();
        let capacity = self.config.window_size;
        let windows = state
            .windows
            .entry(tick.symbol.clone())
            .or_insert_with(|| SymbolWindows::new(capacity));
        windows.prices.push(tick.price);
        windows.sizes.push(tick.size);

        let prices = windows.prices.to_vec();
        let sizes = windows.sizes.to_vec();
        let stats = PriceStats::compute(
            &tick.symbol,
            tick.timestamp,
            &prices,
            &sizes,
            self.config.annualization_factor(),
        )?;
        state.latest_stats.insert(tick.symbol.clone(), stats.clone());
        Some(stats)
    }

    /// Returns the latest statistics snapshot for a symbol.
    #[must_use]
    pub fn get_stats(&self, symbol: &str) -> Option<PriceStats> {
        self.state.lock().latest_stats.get(symbol).cloned()
    }

    /// Returns the z-score of a symbol's newest price.
    #[must_use]
    pub fn get_zscore(&self, symbol: &str) -> Option<ZScoreResult> {
        self.state
            .lock()
            .latest_stats
            .get(symbol)
            .map(ZScoreResult::from_stats)
    }

    /// Returns every statistics snapshot keyed by symbol.
    #[must_use]
    pub fn get_all_stats(&self) -> BTreeMap<String, PriceStats> {
        self.state.lock().latest_stats.clone()
    }

    /// Returns every z-score keyed by symbol.
    #[must_use]
    pub fn get_all_zscores(&self) -> BTreeMap<String, ZScoreResult> {
        self.state
            .lock()
            .latest_stats
            .iter()
            .map(|(symbol, stats)| (symbol.clone(), ZScoreResult::from_stats(stats)))
            .collect()
    }

    /// Correlates two symbols.
    #[must_use]
    pub fn get_correlation(
        &self,
        symbol1: &str,
        symbol2: &str,
        method: CorrelationMethod,
    ) -> Option<CorrelationResult> {
        let (p1, p2) = self.pair_prices(symbol1, symbol2)?;
        no_result(
            "correlation",
            self.correlation
                .calculate(symbol1, &p1, symbol2, &p2, method),
        )
    }

    /// Correlates every unordered pair of tracked symbols once.
    ///
    /// Pairs without enough data are omitted.
    #[must_use]
    pub fn get_all_correlations(&self, method: CorrelationMethod) -> Vec<CorrelationResult> {
        self.correlations_of(&self.state.lock(), method)
    }

    /// Builds the Pearson correlation matrix over all tracked symbols.
    ///
    /// Labels and pair values come from the same snapshot. Returns `None`
    /// with fewer than two symbols.
    #[must_use]
    pub fn get_correlation_matrix(&self) -> Option<CorrelationMatrix> {
        let state = self.state.lock();
        if state.windows.len() < 2 {
            return None;
        }

        let mut matrix = CorrelationMatrix::identity(state.windows.keys().cloned().collect());
        for result in self.correlations_of(&state, CorrelationMethod::Pearson) {
            let i = matrix.symbols.iter().position(|s| *s == result.symbol1);
            let j = matrix.symbols.iter().position(|s| *s == result.symbol2);
            if let (Some(i), Some(j)) = (i, j) {
                matrix.values[i][j] = result.correlation;
                matrix.values[j][i] = result.correlation;
            }
        }
        Some(matrix)
    }

    fn correlations_of(
        &self,
        state: &EngineState,
        method: CorrelationMethod,
    ) -> Vec<CorrelationResult> {
        let series: Vec<(&String, Vec<f64>)> = state
            .windows
            .iter()
            .map(|(symbol, w)| (symbol, w.prices.to_vec()))
            .collect();

        let mut results = Vec::new();
        for (i, (s1, p1)) in series.iter().enumerate() {
            for (s2, p2) in &series[i + 1..] {
                if let Some(result) = no_result(
                    "correlation",
                    self.correlation.calculate(s1, p1, s2, p2, method),
                ) {
                    results.push(result);
                }
            }
        }
        results
    }

    /// Computes the hedged spread `symbol1 - hedge_ratio * symbol2`.
    #[must_use]
    pub fn get_spread(
        &self,
        symbol1: &str,
        symbol2: &str,
        hedge_ratio: f64,
    ) -> Option<SpreadResult> {
        let (p1, p2) = self.pair_prices(symbol1, symbol2)?;
        no_result(
            "spread",
            self.spread
                .calculate_spread(symbol1, &p1, symbol2, &p2, hedge_ratio),
        )
    }

    /// Computes the price ratio `symbol1 / symbol2`.
    #[must_use]
    pub fn get_normalized_spread(&self, symbol1: &str, symbol2: &str) -> Option<RatioResult> {
        let (p1, p2) = self.pair_prices(symbol1, symbol2)?;
        no_result(
            "ratio",
            self.spread.calculate_ratio(symbol1, &p1, symbol2, &p2),
        )
    }

    /// Regresses `symbol_y` on `symbol_x`.
    #[must_use]
    pub fn get_regression(&self, symbol_x: &str, symbol_y: &str) -> Option<RegressionResult> {
        let (px, py) = self.pair_prices(symbol_x, symbol_y)?;
        no_result(
            "regression",
            self.regression.calculate(symbol_x, &px, symbol_y, &py),
        )
    }

    /// Returns the OLS slope of `symbol_y` on `symbol_x`.
    #[must_use]
    pub fn get_hedge_ratio(&self, symbol_x: &str, symbol_y: &str) -> Option<f64> {
        self.get_regression(symbol_x, symbol_y).map(|r| r.beta)
    }

    /// Runs the ADF test on a symbol's price window.
    #[must_use]
    pub fn get_adf_test(&self, symbol: &str) -> Option<AdfResult> {
        let prices = self.state.lock().prices(symbol)?;
        no_result("adf", self.adf.run(symbol, &prices))
    }

    /// Runs the ADF test on the spread `symbol1 - hedge_ratio * symbol2`.
    ///
    /// Without an explicit ratio the OLS slope of `symbol1` on `symbol2` is
    /// used, which makes this an Engle-Granger cointegration check.
    #[must_use]
    pub fn get_spread_adf_test(
        &self,
        symbol1: &str,
        symbol2: &str,
        hedge_ratio: Option<f64>,
    ) -> Option<AdfResult> {
        let hedge_ratio = match hedge_ratio {
            Some(ratio) => ratio,
            None => self.get_hedge_ratio(symbol2, symbol1)?,
        };
        let (p1, p2) = self.pair_prices(symbol1, symbol2)?;
        let spread = no_result("spread", self.spread.spread_series(&p1, &p2, hedge_ratio))?;
        no_result(
            "adf",
            self.adf.run(&format!("{symbol1}-{symbol2}"), &spread),
        )
    }

    /// Returns the tracked symbols, sorted.
    #[must_use]
    pub fn get_symbols(&self) -> Vec<String> {
        self.state.lock().windows.keys().cloned().collect()
    }

    /// Returns an engine-wide overview.
    #[must_use]
    pub fn get_summary(&self) -> AnalyticsSummary {
        let state = self.state.lock();
        let symbols: Vec<String> = state.windows.keys().cloned().collect();
        let latest_prices = state
            .windows
            .iter()
            .filter_map(|(symbol, w)| w.prices.last().map(|p| (symbol.clone(), *p)))
            .collect();

        AnalyticsSummary {
            symbol_count: symbols.len(),
            symbols,
            window_size: self.config.window_size,
            stats_available: state.latest_stats.len(),
            latest_prices,
        }
    }

    /// Drops all state for one symbol, or for every symbol.
    pub fn clear(&self, symbol: Option<&str>) {
        let mut state = self.state.lock();
        match symbol {
            Some(symbol) => {
                state.windows.remove(symbol);
                state.latest_stats.remove(symbol);
            }
            None => {
                state.windows.clear();
                state.latest_stats.clear();
            }
        }
    }

    /// Copies both price windows under a single lock.
    fn pair_prices(&self, symbol1: &str, symbol2: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let state = self.state.lock();
        Some((state.prices(symbol1)?, state.prices(symbol2)?))
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

/// Converts a calculator error into "no result", logging why.
fn no_result<T>(metric: &'static str, result: Result<T, AnalyticsError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(AnalyticsError::InsufficientData { .. }) => None,
        Err(e) => {
            debug!(metric, error = %e, "metric unavailable");
            None
        }
    }
}
