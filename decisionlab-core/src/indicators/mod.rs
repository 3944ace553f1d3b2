//! Concrete indicator implementations.
//!
//! Indicators are pure functions: candle history in, numeric series out. Every
//! output series has the same length as its input; warmup positions are
//! `f64::NAN`. The FeatureEngine composes them into the feature table.
//!
//! Multi-series indicators (MACD) are exposed as separate named instances per
//! line, keeping the single-series `Indicator` trait unchanged.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod returns;
pub mod rsi;
pub mod sma;
pub mod volume;

pub use bollinger::BollingerWidth;
pub use macd::{Macd, MacdLine};
pub use returns::{Returns, Volatility};
pub use rsi::Rsi;
pub use sma::Sma;
pub use volume::VolumeRatio;

use crate::domain::Candle;

/// Trait for indicators.
///
/// Indicators take a full candle series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead guard
/// No indicator value at row t may depend on candles after t.
pub trait Indicator: Send + Sync {
    /// Feature-style name (e.g., "sma_7", "rsi_14").
    fn name(&self) -> &str;

    /// Number of rows needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Close prices of a candle series.
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Create synthetic candles from close prices for testing.
///
/// open = prev_close (or close for first candle), high/low = +/- 1.0 around
/// the body, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
