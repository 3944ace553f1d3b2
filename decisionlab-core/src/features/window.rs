//! Indicator window configuration and clamping to short histories.

use serde::{Deserialize, Serialize};

/// Nominal indicator windows. Column names stay fixed whatever the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureWindows {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger: usize,
    pub bollinger_mult: f64,
    pub returns_short: usize,
    pub returns_long: usize,
    pub volatility: usize,
    pub volume: usize,
}

impl Default for FeatureWindows {
    fn default() -> Self {
        Self {
            sma_short: 7,
            sma_long: 21,
            rsi: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bollinger: 20,
            bollinger_mult: 2.0,
            returns_short: 1,
            returns_long: 7,
            volatility: 7,
            volume: 7,
        }
    }
}

/// Effective windows for one series length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bollinger: usize,
    pub returns_short: usize,
    pub returns_long: usize,
    pub volatility: usize,
    pub volume: usize,
}

impl FeatureWindows {
    /// Clamp every window to a history of `n` candles.
    ///
    /// Every window clamps to `n`. RSI additionally clamps to `n - 1`, since
    /// the first price change only exists at row 1. Returns and volatility
    /// keep their lag, so a history no longer than that lag leaves those
    /// columns empty and the rows are dropped downstream. Returns `None` for
    /// an empty series.
    pub fn plan(&self, n: usize) -> Option<WindowPlan> {
        if n == 0 {
            return None;
        }
        let diffs = n - 1;
        let clamp = |w: usize| w.min(n).max(1);
        Some(WindowPlan {
            sma_short: clamp(self.sma_short),
            sma_long: clamp(self.sma_long),
            rsi: self.rsi.min(diffs).max(2),
            macd_fast: clamp(self.macd_fast),
            macd_slow: clamp(self.macd_slow),
            macd_signal: clamp(self.macd_signal),
            bollinger: clamp(self.bollinger),
            returns_short: clamp(self.returns_short),
            returns_long: clamp(self.returns_long),
            volatility: self.volatility.min(n).max(2),
            volume: clamp(self.volume),
        })
    }
}
