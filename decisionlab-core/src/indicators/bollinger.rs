//! Bollinger band width: spread of the bands normalized by close.
//!
//! - Middle: SMA(close, period)
//! - Upper/Lower: middle +/- mult * stddev(close, period)
//! - Width: (upper - lower) / close = 2 * mult * stddev / close
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct BollingerWidth {
    period: usize,
    multiplier: f64,
    name: String,
}

impl BollingerWidth {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: "bb_width".to_string(),
        }
    }
}

impl Indicator for BollingerWidth {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &candles[(i + 1 - self.period)..=i];
            if window.iter().any(|c| c.close.is_nan()) {
                continue;
            }

            let mean = window.iter().map(|c| c.close).sum::<f64>() / self.period as f64;
            let variance = window
                .iter()
                .map(|c| {
                    let diff = c.close - mean;
                    diff * diff
                })
                .sum::<f64>()
                / self.period as f64;
            let stddev = variance.sqrt();

            let upper = mean + self.multiplier * stddev;
            let lower = mean - self.multiplier * stddev;
            let close = candles[i].close;
            if close != 0.0 {
                result[i] = (upper - lower) / close;
            }
        }

        result
    }
}
