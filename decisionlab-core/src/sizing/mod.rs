//! Order sizing: confidence-scaled share of portfolio value.
//!
//! Sizers are portfolio-aware (they read total value) but do not decide the
//! side. The orchestrator decides BUY/SELL and asks the sizer how much.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("no usable price for {symbol}")]
    InvalidCandle { symbol: String },
    #[error("quantity {quantity} below minimum lot {min_lot}")]
    BelowMinimumLot { quantity: Decimal, min_lot: Decimal },
    #[error("confidence {0} cannot be sized")]
    InvalidConfidence(f64),
    #[error("order size overflowed")]
    Overflow,
}

/// `quantity = totalValue * base_fraction * min(confidence, cap) / price`,
/// rounded to `quantity_scale` places with banker's rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceSizer {
    pub base_fraction: Decimal,
    pub confidence_cap: f64,
    pub min_lot: Decimal,
    pub quantity_scale: u32,
}

impl Default for ConfidenceSizer {
    fn default() -> Self {
        Self {
            base_fraction: dec!(0.1),
            confidence_cap: 0.9,
            min_lot: dec!(0.00001),
            quantity_scale: 8,
        }
    }
}

impl ConfidenceSizer {
    /// Notional to commit for this confidence.
    pub fn trade_value(&self, total_value: Decimal, confidence: f64) -> Result<Decimal, OrderError> {
        if !confidence.is_finite() {
            return Err(OrderError::InvalidConfidence(confidence));
        }
        let capped = to_decimal(confidence.min(self.confidence_cap))?;
        total_value
            .checked_mul(self.base_fraction)
            .and_then(|v| v.checked_mul(capped))
            .ok_or(OrderError::Overflow)
    }

    /// Quantity to trade at `price`, or why no order should be placed.
    pub fn size(
        &self,
        symbol: &str,
        total_value: Decimal,
        confidence: f64,
        price: Decimal,
    ) -> Result<Decimal, OrderError> {
        if price <= Decimal::ZERO {
            return Err(OrderError::InvalidCandle {
                symbol: symbol.to_string(),
            });
        }
        let value = self.trade_value(total_value, confidence)?;
        let quantity = value
            .checked_div(price)
            .ok_or(OrderError::Overflow)?
            .round_dp(self.quantity_scale);
        if quantity < self.min_lot {
            return Err(OrderError::BelowMinimumLot {
                quantity,
                min_lot: self.min_lot,
            });
        }
        Ok(quantity)
    }

    pub fn name(&self) -> &str {
        "ConfidenceScaled"
    }
}

/// Decimal from the shortest float rendering, so 0.7 stays exactly 0.7.
fn to_decimal(value: f64) -> Result<Decimal, OrderError> {
    if !value.is_finite() {
        return Err(OrderError::InvalidConfidence(value));
    }
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .ok_or(OrderError::InvalidConfidence(value))
}
