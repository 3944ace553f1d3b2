//! Feature engineering: candle history in, a dense feature table out.
//!
//! The engine composes the indicators into eleven named columns, clamps every
//! window to the available history, patches indicator warmup gaps with
//! neutral values and drops rows that are still incomplete. The last row is
//! what the predictor sees.

pub mod window;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Candle;
use crate::indicators::{
    BollingerWidth, Indicator, Macd, MacdLine, Returns, Rsi, Sma, Volatility, VolumeRatio,
};

pub use window::{FeatureWindows, WindowPlan};

/// Number of model features.
pub const FEATURE_COUNT: usize = 11;

/// Feature columns in model order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "sma_7",
    "sma_21",
    "rsi_14",
    "macd",
    "macd_signal",
    "macd_diff",
    "bb_width",
    "returns_1",
    "returns_7",
    "volatility_7",
    "volume_ratio",
];

/// Feature values keyed by column name.
pub type FeatureMap = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("not enough data to compute features ({candles} candles, no complete row)")]
    InsufficientData { candles: usize },
}

/// Latest-row features in `FEATURE_COLUMNS` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        column_index(name).map(|i| self.0[i])
    }

    pub fn to_map(&self) -> FeatureMap {
        FEATURE_COLUMNS
            .iter()
            .zip(self.0.iter())
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }
}

/// Position of a feature in `FEATURE_COLUMNS`.
pub fn column_index(name: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == name)
}

/// One complete row of the feature table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: DateTime<Utc>,
    pub values: FeatureVector,
}

/// Dense feature table: only rows where every column is defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
    source_len: usize,
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Latest row as a model input vector.
    pub fn latest_vector(&self) -> Result<FeatureVector, FeatureError> {
        self.rows
            .last()
            .map(|row| row.values)
            .ok_or(FeatureError::InsufficientData {
                candles: self.source_len,
            })
    }

    /// Latest row keyed by name; empty when the table is empty.
    pub fn latest_map(&self) -> FeatureMap {
        self.rows
            .last()
            .map(|row| row.values.to_map())
            .unwrap_or_default()
    }
}

/// Builds feature tables from candle series.
#[derive(Debug, Clone, Default)]
pub struct FeatureEngine {
    windows: FeatureWindows,
}

impl FeatureEngine {
    pub fn new(windows: FeatureWindows) -> Self {
        Self { windows }
    }

    pub fn windows(&self) -> &FeatureWindows {
        &self.windows
    }

    /// Indicator set for one window plan, in `FEATURE_COLUMNS` order.
    fn indicators(&self, plan: &WindowPlan) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Sma::named(plan.sma_short, "sma_7")),
            Box::new(Sma::named(plan.sma_long, "sma_21")),
            Box::new(Rsi::named(plan.rsi, "rsi_14")),
            Box::new(Macd::new(plan.macd_fast, plan.macd_slow, plan.macd_signal, MacdLine::Line)),
            Box::new(Macd::new(plan.macd_fast, plan.macd_slow, plan.macd_signal, MacdLine::Signal)),
            Box::new(Macd::new(plan.macd_fast, plan.macd_slow, plan.macd_signal, MacdLine::Diff)),
            Box::new(BollingerWidth::new(plan.bollinger, self.windows.bollinger_mult)),
            Box::new(Returns::named(plan.returns_short, "returns_1")),
            Box::new(Returns::named(plan.returns_long, "returns_7")),
            Box::new(Volatility::named(plan.volatility, "volatility_7")),
            Box::new(VolumeRatio::new(plan.volume)),
        ]
    }

    /// Compute the dense feature table for a chronologically ordered series.
    pub fn compute(&self, candles: &[Candle]) -> FeatureTable {
        let n = candles.len();
        let Some(plan) = self.windows.plan(n) else {
            return FeatureTable {
                rows: Vec::new(),
                source_len: n,
            };
        };

        let columns: Vec<Vec<f64>> = self
            .indicators(&plan)
            .iter()
            .map(|indicator| {
                let mut series = indicator.compute(candles);
                if let Some(default) = neutral_default(indicator.name()) {
                    for v in series.iter_mut().filter(|v| v.is_nan()) {
                        *v = default;
                    }
                }
                series
            })
            .collect();

        let rows = (0..n)
            .filter_map(|i| {
                let mut values = [0.0; FEATURE_COUNT];
                for (slot, column) in values.iter_mut().zip(&columns) {
                    let v = column[i];
                    if !v.is_finite() {
                        return None;
                    }
                    *slot = v;
                }
                Some(FeatureRow {
                    timestamp: candles[i].timestamp,
                    values: FeatureVector(values),
                })
            })
            .collect();

        FeatureTable {
            rows,
            source_len: n,
        }
    }

    /// Convenience: latest vector straight from candles.
    pub fn latest_vector(&self, candles: &[Candle]) -> Result<FeatureVector, FeatureError> {
        self.compute(candles).latest_vector()
    }

    /// Convenience: latest map straight from candles.
    pub fn latest_map(&self, candles: &[Candle]) -> FeatureMap {
        self.compute(candles).latest_map()
    }
}

/// Neutral fill for indicator warmup gaps. Columns without one drop the row.
fn neutral_default(name: &str) -> Option<f64> {
    match name {
        "rsi_14" => Some(50.0),
        "macd" | "macd_signal" | "macd_diff" => Some(0.0),
        "bb_width" => Some(0.0),
        _ => None,
    }
}
