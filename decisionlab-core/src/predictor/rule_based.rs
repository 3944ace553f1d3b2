//! Threshold heuristics used when no classifier is loaded.

use crate::domain::{Contribution, PredictedAction, Signal};
use crate::features::FeatureMap;
use crate::rules::count_fired;

const STRONG: f64 = 0.7;
const WEAK: f64 = 0.55;
const NEUTRAL: f64 = 0.5;

/// Pick an action from RSI, MACD histogram and the fired signal balance.
///
/// First matching rule wins:
/// 1. RSI below 35, or below 45 with a positive MACD diff: BUY 0.7
/// 2. RSI above 65, or above 55 with a negative MACD diff: SELL 0.7
/// 3. more bullish than bearish signals fired: BUY 0.55
/// 4. more bearish than bullish signals fired: SELL 0.55
/// 5. HOLD 0.5
pub fn decide(features: &FeatureMap, signals: &[Signal]) -> (PredictedAction, f64) {
    let rsi = features.get("rsi_14").copied().unwrap_or(50.0);
    let macd_diff = features.get("macd_diff").copied().unwrap_or(0.0);

    if rsi < 35.0 || (rsi < 45.0 && macd_diff > 0.0) {
        return (PredictedAction::Buy, STRONG);
    }
    if rsi > 65.0 || (rsi > 55.0 && macd_diff < 0.0) {
        return (PredictedAction::Sell, STRONG);
    }

    let bullish = count_fired(signals, Contribution::Bullish);
    let bearish = count_fired(signals, Contribution::Bearish);
    if bullish > bearish {
        (PredictedAction::Buy, WEAK)
    } else if bearish > bullish {
        (PredictedAction::Sell, WEAK)
    } else {
        (PredictedAction::Hold, NEUTRAL)
    }
}
