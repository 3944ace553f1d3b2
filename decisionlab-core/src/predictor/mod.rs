//! Predictor: feature row in, action with confidence and explanation out.
//!
//! The variant is picked once at construction. A loaded classifier gives the
//! `ModelBacked` path; without one the `RuleBased` heuristics answer. Both
//! compute the same signal list first.

pub mod classifier;
pub mod rule_based;

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::{PredictedAction, Signal};
use crate::features::{FeatureMap, FeatureVector};
use crate::rules::RuleTable;

pub use classifier::{Classifier, ForestClassifier, ModelLoadError, Node, Tree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub action: PredictedAction,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone)]
pub enum Predictor {
    ModelBacked {
        classifier: Arc<dyn Classifier>,
        rules: RuleTable,
    },
    RuleBased {
        rules: RuleTable,
    },
}

impl Default for Predictor {
    fn default() -> Self {
        Self::rule_based()
    }
}

impl Predictor {
    pub fn rule_based() -> Self {
        Self::RuleBased {
            rules: RuleTable::standard(),
        }
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self::ModelBacked {
            classifier,
            rules: RuleTable::standard(),
        }
    }

    /// Load a forest artifact, falling back to rules when it is absent or bad.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            info!("no model configured, using rule-based predictor");
            return Self::rule_based();
        };
        match ForestClassifier::load(path) {
            Ok(forest) => {
                info!(
                    path = %path.display(),
                    trees = forest.tree_count(),
                    "loaded model artifact"
                );
                Self::with_classifier(Arc::new(forest))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "model load failed, using rule-based predictor");
                Self::rule_based()
            }
        }
    }

    pub fn is_model_loaded(&self) -> bool {
        matches!(self, Self::ModelBacked { .. })
    }

    fn rules(&self) -> &RuleTable {
        match self {
            Self::ModelBacked { rules, .. } | Self::RuleBased { rules } => rules,
        }
    }

    pub fn predict(&self, vector: &FeatureVector, map: &FeatureMap) -> PredictionResult {
        let signals = self.rules().evaluate(map);
        let (action, confidence) = match self {
            Self::ModelBacked { classifier, .. } => argmax(classifier.predict_proba(vector.as_slice())),
            Self::RuleBased { .. } => rule_based::decide(map, &signals),
        };
        PredictionResult {
            action,
            confidence: clamp_unit(confidence),
            signals,
        }
    }
}

/// Highest-probability class; the first maximum wins ties.
fn argmax(proba: [f64; 3]) -> (PredictedAction, f64) {
    let mut best = 0;
    for i in 1..proba.len() {
        if proba[i] > proba[best] {
            best = i;
        }
    }
    let action = PredictedAction::from_index(best).unwrap_or(PredictedAction::Hold);
    (action, proba[best])
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FEATURE_COLUMNS, FEATURE_COUNT};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fixed([f64; 3]);

    impl Classifier for Fixed {
        fn predict_proba(&self, _features: &[f64]) -> [f64; 3] {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl Classifier for Counting {
        fn predict_proba(&self, _features: &[f64]) -> [f64; 3] {
            self.0.fetch_add(1, Ordering::SeqCst);
            [0.2, 0.6, 0.2]
        }
    }

    fn inputs(rsi: f64) -> (FeatureVector, FeatureMap) {
        let mut values = [0.0; FEATURE_COUNT];
        values[2] = rsi;
        let vector = FeatureVector(values);
        let map = vector.to_map();
        (vector, map)
    }

    #[test]
    fn model_argmax_and_confidence() {
        let predictor = Predictor::with_classifier(Arc::new(Fixed([0.1, 0.2, 0.7])));
        let (v, m) = inputs(50.0);
        let result = predictor.predict(&v, &m);
        assert_eq!(result.action, PredictedAction::Buy);
        assert!((result.confidence - 0.7).abs() < 1e-12);
        assert_eq!(result.signals.len(), 9);
    }

    #[test]
    fn first_max_wins() {
        let predictor = Predictor::with_classifier(Arc::new(Fixed([0.4, 0.4, 0.2])));
        let (v, m) = inputs(50.0);
        assert_eq!(predictor.predict(&v, &m).action, PredictedAction::Sell);
    }

    #[test]
    fn confidence_is_clamped() {
        let predictor = Predictor::with_classifier(Arc::new(Fixed([0.0, 0.0, 1.5])));
        let (v, m) = inputs(50.0);
        assert_eq!(predictor.predict(&v, &m).confidence, 1.0);
    }

    #[test]
    fn model_called_once_per_prediction() {
        let counting = Arc::new(Counting::default());
        let predictor = Predictor::with_classifier(counting.clone());
        let (v, m) = inputs(50.0);
        predictor.predict(&v, &m);
        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rule_based_path() {
        let predictor = Predictor::rule_based();
        assert!(!predictor.is_model_loaded());
        let (v, m) = inputs(30.0);
        let result = predictor.predict(&v, &m);
        assert_eq!(result.action, PredictedAction::Buy);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn load_falls_back_without_artifact() {
        assert!(!Predictor::load(None).is_model_loaded());
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("model.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(!Predictor::load(Some(&bad)).is_model_loaded());
    }

    #[test]
    fn load_uses_valid_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = serde_json::json!({
            "classes": ["SELL", "HOLD", "BUY"],
            "features": FEATURE_COLUMNS,
            "trees": [{ "nodes": [{ "leaf": { "proba": [0.6, 0.3, 0.1] } }] }],
        });
        std::fs::write(&path, artifact.to_string()).unwrap();
        let predictor = Predictor::load(Some(&path));
        assert!(predictor.is_model_loaded());
        let (v, m) = inputs(30.0);
        // The model overrides what the heuristics would say.
        assert_eq!(predictor.predict(&v, &m).action, PredictedAction::Sell);
    }
}
