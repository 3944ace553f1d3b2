//! Signal rules: threshold checks over the latest feature map.
//!
//! Rules explain a prediction. They never change the feature values and are
//! evaluated in table order, so the emitted signal list is stable for a given
//! map.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Contribution, Signal};
use crate::features::FeatureMap;

/// Threshold comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
}

impl Comparator {
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Ge => value >= threshold,
            Self::Le => value <= threshold,
            Self::Eq => value == threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Eq => "=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRule {
    pub feature: String,
    pub comparator: Comparator,
    pub threshold: f64,
    pub contribution: Contribution,
    /// Rendered into `Signal::rule`.
    pub description: String,
}

impl SignalRule {
    pub fn new(
        feature: &str,
        comparator: Comparator,
        threshold: f64,
        contribution: Contribution,
        description: &str,
    ) -> Self {
        Self {
            feature: feature.to_string(),
            comparator,
            threshold,
            contribution,
            description: description.to_string(),
        }
    }

    pub fn evaluate(&self, value: f64) -> Signal {
        Signal {
            feature: self.feature.clone(),
            value: round4(value),
            rule: self.description.clone(),
            fired: self.comparator.apply(value, self.threshold),
            contribution: self.contribution,
        }
    }
}

/// Ordered rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<SignalRule>,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleTable {
    pub fn new(rules: Vec<SignalRule>) -> Self {
        Self { rules }
    }

    /// The built-in explanation rules.
    pub fn standard() -> Self {
        use Comparator::{Gt, Lt};
        use Contribution::{Bearish, Bullish, Neutral};
        Self::new(vec![
            SignalRule::new("rsi_14", Lt, 40.0, Bullish, "<40 = oversold zone"),
            SignalRule::new("rsi_14", Gt, 60.0, Bearish, ">60 = overbought zone"),
            SignalRule::new("macd_diff", Gt, 0.0, Bullish, ">0 = bullish crossover"),
            SignalRule::new("macd_diff", Lt, 0.0, Bearish, "<0 = bearish crossover"),
            SignalRule::new("returns_7", Gt, 0.02, Bullish, ">2% = uptrend"),
            SignalRule::new("returns_7", Lt, -0.02, Bearish, "<-2% = downtrend"),
            SignalRule::new("bb_width", Gt, 0.1, Neutral, ">10% = high volatility"),
            SignalRule::new("returns_1", Gt, 0.005, Bullish, ">0.5% = short-term momentum up"),
            SignalRule::new(
                "returns_1",
                Lt,
                -0.005,
                Bearish,
                "<-0.5% = short-term momentum down",
            ),
        ])
    }

    pub fn rules(&self) -> &[SignalRule] {
        &self.rules
    }

    /// Evaluate every rule whose feature is present, in table order.
    pub fn evaluate(&self, features: &FeatureMap) -> Vec<Signal> {
        self.rules
            .iter()
            .filter_map(|rule| features.get(&rule.feature).map(|&v| rule.evaluate(v)))
            .collect()
    }
}

/// Count of fired signals with the given contribution.
pub fn count_fired(signals: &[Signal], contribution: Contribution) -> usize {
    signals.iter().filter(|s| s.is_fired(contribution)).count()
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
