//! Deterministic synthetic candles for demos and tests.
//!
//! Each symbol gets its own RNG seeded from the BLAKE3 hash of its name, so
//! the same symbol always produces the same walk. Daily moves are uniform in
//! +/- 2%. Crypto trades every day, so weekends are not skipped.

use chrono::{DateTime, Duration, Utc};
use decisionlab_core::domain::CandleData;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Starting price for well-known symbols, 100 otherwise.
pub fn start_price(symbol: &str) -> f64 {
    match symbol {
        "BTC" => 42_000.0,
        "ETH" => 2_500.0,
        _ => 100.0,
    }
}

fn to_decimal(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .unwrap_or(Decimal::ZERO)
}

/// `days` daily candles for `symbol`, ending the day before `end`.
pub fn generate_candles(symbol: &str, days: usize, end: DateTime<Utc>) -> Vec<CandleData> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let start = end - Duration::days(days as i64);
    let mut price = start_price(symbol);
    let mut candles = Vec::with_capacity(days);

    for i in 0..days {
        let daily_return: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.005));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.005));
        let volume: f64 = rng.gen_range(100.0..10_000.0);

        candles.push(CandleData {
            symbol: symbol.to_string(),
            timestamp: start + Duration::days(i as i64),
            open: to_decimal(open, 2),
            high: to_decimal(high, 2),
            low: to_decimal(low, 2),
            close: to_decimal(close, 2),
            volume: to_decimal(volume, 4),
        });
        price = close;
    }
    candles
}

/// Candles for several symbols, grouped by symbol.
pub fn generate_universe(symbols: &[String], days: usize, end: DateTime<Utc>) -> Vec<CandleData> {
    symbols
        .iter()
        .flat_map(|s| generate_candles(s, days, end))
        .collect()
}
