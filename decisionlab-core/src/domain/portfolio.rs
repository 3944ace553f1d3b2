//! Portfolio: read-only snapshot of cash and open positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current position in an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    #[serde(alias = "average_price")]
    pub average_price: Decimal,
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn market_value(&self, current_price: Decimal) -> Decimal {
        self.quantity * current_price
    }
}

/// Portfolio state supplied with each request. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioState {
    pub cash: Decimal,
    pub positions: Vec<Position>,
    #[serde(alias = "total_value")]
    pub total_value: Decimal,
}

impl PortfolioState {
    /// All-cash portfolio.
    pub fn cash_only(cash: Decimal) -> Self {
        Self {
            cash,
            positions: Vec::new(),
            total_value: cash,
        }
    }

    /// Get a position by symbol (if it exists and is not flat).
    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions
            .iter()
            .find(|p| p.symbol == symbol && !p.is_flat())
    }
}
