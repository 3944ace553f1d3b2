//! Percentage returns and their rolling volatility.
//!
//! Returns: close[t] / close[t - period] - 1. Lookback: period.
//! Volatility: rolling sample stddev (divide by N - 1) of the 1-period return.
//! Lookback: window (the first 1-period return sits at index 1).

use super::{closes, Indicator};
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Returns {
    period: usize,
    name: String,
}

impl Returns {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Returns period must be >= 1");
        Self {
            period,
            name: format!("returns_{period}"),
        }
    }

    pub fn named(period: usize, name: impl Into<String>) -> Self {
        assert!(period >= 1, "Returns period must be >= 1");
        Self {
            period,
            name: name.into(),
        }
    }
}

impl Indicator for Returns {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        pct_change(&closes(candles), self.period)
    }
}

/// Percentage change over `period` rows. Non-positive bases yield NaN.
pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    for i in period..n {
        let base = values[i - period];
        if base > 0.0 {
            result[i] = values[i] / base - 1.0;
        }
    }
    result
}

/// Rolling standard deviation with `ddof` degrees of freedom removed.
///
/// Any NaN inside the window yields NaN, as does a window no larger than `ddof`.
pub fn rolling_std(values: &[f64], window: usize, ddof: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 || window <= ddof || n < window {
        return result;
    }
    for i in (window - 1)..n {
        let slice = &values[(i + 1 - window)..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance =
            slice.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (window - ddof) as f64;
        result[i] = variance.sqrt();
    }
    result
}

#[derive(Debug, Clone)]
pub struct Volatility {
    window: usize,
    name: String,
}

impl Volatility {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "Volatility window must be >= 2");
        Self {
            window,
            name: format!("volatility_{window}"),
        }
    }

    pub fn named(window: usize, name: impl Into<String>) -> Self {
        assert!(window >= 2, "Volatility window must be >= 2");
        Self {
            window,
            name: name.into(),
        }
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        rolling_std(&pct_change(&closes(candles), 1), self.window, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn one_period_returns() {
        let candles = make_candles(&[100.0, 110.0, 99.0]);
        let result = Returns::new(1).compute(&candles);
        assert!(result[0].is_nan());
        assert_approx(result[1], 0.10, DEFAULT_EPSILON);
        assert_approx(result[2], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn multi_period_returns() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 105.0]);
        let result = Returns::new(3).compute(&candles);
        assert!(result[2].is_nan());
        assert_approx(result[3], 0.05, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_base_is_nan() {
        let result = pct_change(&[0.0, 1.0], 1);
        assert!(result[1].is_nan());
    }

    #[test]
    fn sample_std() {
        // (1, 2, 3, 4): mean 2.5, sample variance 5/3
        let result = rolling_std(&[1.0, 2.0, 3.0, 4.0], 4, 1);
        assert_approx(result[3], (5.0_f64 / 3.0).sqrt(), DEFAULT_EPSILON);
        assert!(result[2].is_nan());
    }

    #[test]
    fn volatility_needs_full_return_window() {
        let candles = make_candles(&[100.0, 102.0, 100.0, 102.0]);
        let result = Volatility::new(3).compute(&candles);
        // returns are NaN at 0, so the first full window ends at index 3
        assert!(result[2].is_nan());
        assert!(result[3] > 0.0);
    }

    #[test]
    fn constant_returns_zero_volatility() {
        let candles = make_candles(&[100.0, 100.0, 100.0, 100.0]);
        let result = Volatility::new(2).compute(&candles);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
    }
}
