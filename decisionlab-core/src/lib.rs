//! DecisionLab Core: features, signal rules, predictor and order orchestration.
//!
//! This crate holds the pure decision pipeline:
//! - Domain types (candles, portfolio snapshot, orders, signals)
//! - Indicators and the feature engine that composes them
//! - Explanation rules and the two predictor variants
//! - Confidence-scaled order sizing
//! - The orchestrator that ties one request to one response
//!
//! Nothing here does I/O beyond reading a model artifact. Caching, config and
//! logging setup live in `decisionlab-runner`.

pub mod domain;
pub mod features;
pub mod indicators;
pub mod orchestrator;
pub mod predictor;
pub mod rules;
pub mod schema;
pub mod sizing;

pub use features::{FeatureEngine, FeatureError, FeatureMap, FeatureVector, FEATURE_COLUMNS};
pub use orchestrator::{DecisionOrchestrator, OrchestratorConfig};
pub use predictor::{Classifier, ForestClassifier, ModelLoadError, PredictionResult, Predictor};
pub use rules::{RuleTable, SignalRule};
pub use schema::{AgentContextRequest, AgentDecisionResponse, HealthResponse, SCHEMA_VERSION};
pub use sizing::{ConfidenceSizer, OrderError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a service shares across worker threads
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::CandleData>();
        require_sync::<domain::CandleData>();
        require_send::<domain::Candle>();
        require_sync::<domain::Candle>();
        require_send::<domain::PortfolioState>();
        require_sync::<domain::PortfolioState>();
        require_send::<domain::TradeOrder>();
        require_sync::<domain::TradeOrder>();
        require_send::<domain::Signal>();
        require_sync::<domain::Signal>();

        // Pipeline stages
        require_send::<FeatureEngine>();
        require_sync::<FeatureEngine>();
        require_send::<RuleTable>();
        require_sync::<RuleTable>();
        require_send::<Predictor>();
        require_sync::<Predictor>();
        require_send::<ForestClassifier>();
        require_sync::<ForestClassifier>();
        require_send::<DecisionOrchestrator>();
        require_sync::<DecisionOrchestrator>();

        // Wire types
        require_send::<AgentContextRequest>();
        require_sync::<AgentContextRequest>();
        require_send::<AgentDecisionResponse>();
        require_sync::<AgentDecisionResponse>();
    }

    /// Architecture contract: signal rules see only the feature map.
    ///
    /// `RuleTable::evaluate` takes a `FeatureMap` and nothing else, so the
    /// explanation cannot depend on portfolio state or on the predictor
    /// variant. If this stops compiling, that contract changed.
    #[test]
    fn rule_evaluation_has_no_portfolio_parameter() {
        fn _check(rules: &RuleTable, features: &FeatureMap) -> Vec<domain::Signal> {
            rules.evaluate(features)
        }
    }

    /// Architecture contract: classifiers are usable as shared trait objects.
    #[test]
    fn classifier_is_object_safe() {
        fn _check(classifier: std::sync::Arc<dyn Classifier>, x: &FeatureVector) -> [f64; 3] {
            classifier.predict_proba(x.as_slice())
        }
    }
}
