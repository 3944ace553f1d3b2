//! Wire schema contract: request, response and health payloads.
//!
//! Field names are camelCase on the wire; snake_case aliases are accepted on
//! input. Decimals travel as strings. `schemaVersion` is echoed back unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{CandleData, PortfolioState, Signal, TradeOrder};

/// Schema version produced when a request does not carry one.
pub const SCHEMA_VERSION: &str = "1.0";

/// Model version reported when none is configured.
pub const DEFAULT_MODEL_VERSION: &str = "1.0.0";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn fresh_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Decision request from an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentContextRequest {
    #[serde(default = "default_schema_version", alias = "schema_version")]
    pub schema_version: String,
    #[serde(default = "fresh_request_id", alias = "request_id")]
    pub request_id: String,
    #[serde(alias = "agent_id")]
    pub agent_id: String,
    pub portfolio: PortfolioState,
    #[serde(default)]
    pub candles: Vec<CandleData>,
    /// Free-form notes from the agent. Carried, never interpreted.
    #[serde(default)]
    pub instructions: String,
}

impl AgentContextRequest {
    pub fn new(agent_id: impl Into<String>, portfolio: PortfolioState, candles: Vec<CandleData>) -> Self {
        Self {
            schema_version: default_schema_version(),
            request_id: fresh_request_id(),
            agent_id: agent_id.into(),
            portfolio,
            candles,
            instructions: String::new(),
        }
    }
}

/// Decision returned to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDecisionResponse {
    #[serde(alias = "schema_version")]
    pub schema_version: String,
    #[serde(alias = "model_version")]
    pub model_version: String,
    #[serde(alias = "request_id")]
    pub request_id: String,
    #[serde(alias = "agent_id")]
    pub agent_id: String,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    pub orders: Vec<TradeOrder>,
    pub signals: Vec<Signal>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_version: String,
    pub schema_version: String,
    pub cache_available: bool,
}

impl HealthResponse {
    pub fn healthy(model_loaded: bool, model_version: &str, cache_available: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            model_loaded,
            model_version: model_version.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            cache_available,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request failed validation: {}", errors.join("; "))]
pub struct ValidationError {
    pub errors: Vec<String>,
}

/// Boundary checks a request must pass before reaching the pipeline.
///
/// Collects every problem rather than stopping at the first.
pub fn validate_request(request: &AgentContextRequest) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if request.agent_id.trim().is_empty() {
        errors.push("agentId must not be empty".to_string());
    }
    let portfolio = &request.portfolio;
    if portfolio.total_value < Decimal::ZERO {
        errors.push(format!("portfolio.totalValue is negative ({})", portfolio.total_value));
    }
    if portfolio.cash < Decimal::ZERO {
        errors.push(format!("portfolio.cash is negative ({})", portfolio.cash));
    }
    for (i, position) in portfolio.positions.iter().enumerate() {
        if position.average_price < Decimal::ZERO {
            errors.push(format!("positions[{i}] ({}): negative averagePrice", position.symbol));
        }
    }
    for (i, candle) in request.candles.iter().enumerate() {
        if !candle.is_sane() {
            errors.push(format!(
                "candles[{i}] ({} @ {}): prices must be positive and volume non-negative",
                candle.symbol, candle.timestamp
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}
