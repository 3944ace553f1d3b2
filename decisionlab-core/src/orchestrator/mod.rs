//! Decision orchestrator: one request in, orders plus explanation out.
//!
//! Per tracked symbol, in configured order:
//!
//! 1. Select the symbol's candles (stable sort by timestamp)
//! 2. Skip when history is short or no complete feature row exists
//! 3. Predict; signals are kept whatever the action
//! 4. BUY/SELL only: size against total value and the latest close
//!
//! Skips and abandoned orders are logged, never surfaced as errors. A request
//! that yields nothing still gets a well-formed response.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{series_for, Candle, CandleData, OrderSide, PredictedAction, Signal, TradeOrder};
use crate::features::{FeatureEngine, FeatureWindows};
use crate::predictor::{PredictionResult, Predictor};
use crate::schema::{AgentContextRequest, AgentDecisionResponse, DEFAULT_MODEL_VERSION};
use crate::sizing::{ConfidenceSizer, OrderError};

pub const NO_SIGNALS_REASONING: &str = "No trading signals";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Tracked symbols, processed in this order.
    pub symbols: Vec<String>,
    /// Minimum candles per symbol before features are attempted.
    pub min_observations: usize,
    pub model_version: String,
    pub sizer: ConfidenceSizer,
    pub windows: FeatureWindows,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC".to_string(), "ETH".to_string()],
            min_observations: 7,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            sizer: ConfidenceSizer::default(),
            windows: FeatureWindows::default(),
        }
    }
}

/// Outcome for a single symbol that produced a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDecision {
    pub symbol: String,
    pub prediction: PredictionResult,
    pub order: Option<TradeOrder>,
}

impl AssetDecision {
    /// Reasoning fragment, present only when an order was produced.
    pub fn reasoning(&self) -> Option<String> {
        self.order.as_ref().map(|_| {
            format!(
                "{}: {} (confidence: {:.0}%)",
                self.symbol,
                self.prediction.action,
                self.prediction.confidence * 100.0
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct DecisionOrchestrator {
    config: OrchestratorConfig,
    features: FeatureEngine,
    predictor: Predictor,
}

impl DecisionOrchestrator {
    pub fn new(config: OrchestratorConfig, predictor: Predictor) -> Self {
        let features = FeatureEngine::new(config.windows.clone());
        Self {
            config,
            features,
            predictor,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn decide(&self, request: &AgentContextRequest) -> AgentDecisionResponse {
        self.decide_at(request, Utc::now())
    }

    /// Same as `decide` with a fixed generation timestamp.
    pub fn decide_at(&self, request: &AgentContextRequest, now: DateTime<Utc>) -> AgentDecisionResponse {
        let mut orders = Vec::new();
        let mut signals: Vec<Signal> = Vec::new();
        let mut fragments = Vec::new();

        for symbol in &self.config.symbols {
            let Some(decision) = self.evaluate_asset(symbol, &request.candles, request.portfolio.total_value)
            else {
                continue;
            };
            if let Some(fragment) = decision.reasoning() {
                fragments.push(fragment);
            }
            signals.extend(decision.prediction.signals);
            orders.extend(decision.order);
        }

        let reasoning = if fragments.is_empty() {
            NO_SIGNALS_REASONING.to_string()
        } else {
            fragments.join("; ")
        };

        AgentDecisionResponse {
            schema_version: request.schema_version.clone(),
            model_version: self.config.model_version.clone(),
            request_id: request.request_id.clone(),
            agent_id: request.agent_id.clone(),
            created_at: now,
            orders,
            signals,
            reasoning,
        }
    }

    /// Predict for one symbol. `None` when the symbol is skipped entirely.
    pub fn evaluate_asset(
        &self,
        symbol: &str,
        candles: &[CandleData],
        total_value: Decimal,
    ) -> Option<AssetDecision> {
        let series = series_for(candles, symbol);
        if series.len() < self.config.min_observations {
            debug!(
                symbol,
                observations = series.len(),
                required = self.config.min_observations,
                "skipping asset: not enough history"
            );
            return None;
        }

        let engine_candles: Vec<Candle> = series.iter().map(|c| Candle::from(*c)).collect();
        let table = self.features.compute(&engine_candles);
        let vector = match table.latest_vector() {
            Ok(v) => v,
            Err(e) => {
                debug!(symbol, error = %e, "skipping asset");
                return None;
            }
        };
        let prediction = self.predictor.predict(&vector, &table.latest_map());

        let side = match prediction.action {
            PredictedAction::Buy => OrderSide::Buy,
            PredictedAction::Sell => OrderSide::Sell,
            PredictedAction::Hold => {
                return Some(AssetDecision {
                    symbol: symbol.to_string(),
                    prediction,
                    order: None,
                })
            }
        };

        let price = series.last().map(|c| c.close).unwrap_or(Decimal::ZERO);
        let order = match self.size_order(symbol, side, total_value, prediction.confidence, price) {
            Ok(order) => Some(order),
            Err(e) => {
                debug!(symbol, action = %prediction.action, error = %e, "order abandoned");
                None
            }
        };

        Some(AssetDecision {
            symbol: symbol.to_string(),
            prediction,
            order,
        })
    }

    fn size_order(
        &self,
        symbol: &str,
        side: OrderSide,
        total_value: Decimal,
        confidence: f64,
        price: Decimal,
    ) -> Result<TradeOrder, OrderError> {
        let quantity = self.config.sizer.size(symbol, total_value, confidence, price)?;
        Ok(TradeOrder::market(symbol, side, quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PortfolioState;
    use crate::predictor::Classifier;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixed([f64; 3]);

    impl Classifier for Fixed {
        fn predict_proba(&self, _features: &[f64]) -> [f64; 3] {
            self.0
        }
    }

    fn candles(symbol: &str, closes: &[Decimal]) -> Vec<CandleData> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| CandleData {
                symbol: symbol.to_string(),
                timestamp: base + Duration::days(i as i64),
                open: close,
                high: close + dec!(1),
                low: close - dec!(1),
                close,
                volume: dec!(10),
            })
            .collect()
    }

    fn request(candles: Vec<CandleData>) -> AgentContextRequest {
        AgentContextRequest::new("agent", PortfolioState::cash_only(dec!(10000)), candles)
    }

    fn model(proba: [f64; 3]) -> DecisionOrchestrator {
        DecisionOrchestrator::new(
            OrchestratorConfig::default(),
            Predictor::with_classifier(Arc::new(Fixed(proba))),
        )
    }

    #[test]
    fn buy_order_sized_from_latest_close() {
        let closes = [dec!(47500), dec!(48000), dec!(49000), dec!(50000), dec!(49500), dec!(50500), dec!(49000), dec!(50000)];
        let orch = model([0.1, 0.2, 0.7]);
        let response = orch.decide(&request(candles("BTC", &closes)));
        assert_eq!(response.orders.len(), 1);
        let order = &response.orders[0];
        assert_eq!(order.asset_symbol, "BTC");
        assert_eq!(order.side, OrderSide::Buy);
        assert_eq!(order.quantity, dec!(0.014));
        assert_eq!(response.reasoning, "BTC: BUY (confidence: 70%)");
    }

    #[test]
    fn hold_emits_signals_only() {
        let closes: Vec<Decimal> = (0..10).map(|i| Decimal::from(100 + i)).collect();
        let orch = model([0.2, 0.6, 0.2]);
        let response = orch.decide(&request(candles("ETH", &closes)));
        assert!(response.orders.is_empty());
        assert!(!response.signals.is_empty());
        assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
    }

    #[test]
    fn short_history_is_skipped() {
        let closes: Vec<Decimal> = (0..7).map(|i| Decimal::from(100 + i)).collect();
        let orch = model([0.0, 0.0, 1.0]);
        let response = orch.decide(&request(candles("BTC", &closes)));
        assert!(response.orders.is_empty());
        assert!(response.signals.is_empty());
        assert_eq!(response.reasoning, NO_SIGNALS_REASONING);
    }

    #[test]
    fn untracked_symbols_ignored() {
        let closes: Vec<Decimal> = (0..30).map(|i| Decimal::from(100 + i)).collect();
        let orch = model([0.0, 0.0, 1.0]);
        let response = orch.decide(&request(candles("DOGE", &closes)));
        assert!(response.signals.is_empty());
    }

    #[test]
    fn symbols_processed_in_configured_order() {
        let closes: Vec<Decimal> = (0..10).map(|i| Decimal::from(100 + i)).collect();
        let mut all = candles("ETH", &closes);
        all.extend(candles("BTC", &closes));
        let orch = model([0.8, 0.1, 0.1]);
        let response = orch.decide(&request(all));
        let symbols: Vec<&str> = response.orders.iter().map(|o| o.asset_symbol.as_str()).collect();
        assert_eq!(symbols, ["BTC", "ETH"]);
        assert_eq!(
            response.reasoning,
            "BTC: SELL (confidence: 80%); ETH: SELL (confidence: 80%)"
        );
    }

    #[test]
    fn response_echoes_identifiers() {
        let mut req = request(Vec::new());
        req.schema_version = "0.9".into();
        req.request_id = "req-42".into();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let response = model([0.0, 1.0, 0.0]).decide_at(&req, now);
        assert_eq!(response.schema_version, "0.9");
        assert_eq!(response.request_id, "req-42");
        assert_eq!(response.agent_id, "agent");
        assert_eq!(response.model_version, DEFAULT_MODEL_VERSION);
        assert_eq!(response.created_at, now);
    }

    #[test]
    fn unordered_candles_use_latest_timestamp_for_price() {
        let closes = [dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(100), dec!(200)];
        let mut series = candles("BTC", &closes);
        series.reverse();
        let orch = model([0.0, 0.0, 1.0]);
        let response = orch.decide(&request(series));
        // capped confidence 0.9: 10000 * 0.1 * 0.9 / 200
        assert_eq!(response.orders[0].quantity, dec!(4.5));
    }
}
