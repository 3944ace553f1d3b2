//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV candle as it arrives on the wire.
///
/// Prices and volume are decimals so the latest close can be used for order
/// sizing without a float round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleData {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl CandleData {
    /// Basic sanity check used by the boundary: positive prices, non-negative volume.
    pub fn is_sane(&self) -> bool {
        self.open > Decimal::ZERO
            && self.high > Decimal::ZERO
            && self.low > Decimal::ZERO
            && self.close > Decimal::ZERO
            && self.volume >= Decimal::ZERO
    }
}

/// Engine-side candle with `f64` fields, consumed by the indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Returns true if any OHLCV field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan()
            || self.high.is_nan()
            || self.low.is_nan()
            || self.close.is_nan()
            || self.volume.is_nan()
    }
}

impl From<&CandleData> for Candle {
    fn from(data: &CandleData) -> Self {
        let to_f64 = |d: Decimal| d.to_f64().unwrap_or(f64::NAN);
        Self {
            timestamp: data.timestamp,
            open: to_f64(data.open),
            high: to_f64(data.high),
            low: to_f64(data.low),
            close: to_f64(data.close),
            volume: to_f64(data.volume),
        }
    }
}

/// Select the candles of one symbol, stably sorted by timestamp.
///
/// Input order is preserved for equal timestamps, so an already ordered
/// series comes back unchanged.
pub fn series_for<'a>(candles: &'a [CandleData], symbol: &str) -> Vec<&'a CandleData> {
    let mut series: Vec<&CandleData> = candles.iter().filter(|c| c.symbol == symbol).collect();
    series.sort_by_key(|c| c.timestamp);
    series
}
