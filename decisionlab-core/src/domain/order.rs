//! Trade orders emitted by the orchestrator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of a trade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// A single sized order. Only constructed when sizing succeeded, so the
/// quantity is always positive and at least the minimum lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOrder {
    #[serde(alias = "asset_symbol")]
    pub asset_symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    #[serde(default, alias = "limit_price")]
    pub limit_price: Option<Decimal>,
}

impl TradeOrder {
    /// Market order (no limit price).
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            asset_symbol: symbol.into(),
            side,
            quantity,
            limit_price: None,
        }
    }

    /// Notional value at the given price.
    pub fn notional(&self, price: Decimal) -> Decimal {
        self.quantity * price
    }
}
