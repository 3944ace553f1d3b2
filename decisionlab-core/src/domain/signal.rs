//! Explanation signals and predicted actions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction a fired rule contributes toward the final action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Contribution {
    Bullish,
    Bearish,
    Neutral,
}

/// One evaluated rule for one feature. Produced fresh per prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Feature name, e.g. `rsi_14`.
    pub feature: String,
    /// Feature value rounded to 4 decimal places.
    pub value: f64,
    /// Human-readable rule, e.g. `<40 = oversold zone`.
    pub rule: String,
    pub fired: bool,
    pub contribution: Contribution,
}

impl Signal {
    pub fn is_fired(&self, contribution: Contribution) -> bool {
        self.fired && self.contribution == contribution
    }
}

/// Classifier output classes, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PredictedAction {
    Sell = 0,
    Hold = 1,
    Buy = 2,
}

impl PredictedAction {
    /// Class order used by classifier artifacts.
    pub const CLASSES: [PredictedAction; 3] = [Self::Sell, Self::Hold, Self::Buy];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::CLASSES.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
            Self::Buy => "BUY",
        }
    }
}

impl fmt::Display for PredictedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
