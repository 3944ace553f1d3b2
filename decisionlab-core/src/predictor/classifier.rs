//! Class-probability classifiers and the decision-forest artifact format.
//!
//! A forest artifact is JSON:
//!
//! ```json
//! {
//!   "classes": ["SELL", "HOLD", "BUY"],
//!   "features": ["sma_7", "sma_21", ...],
//!   "trees": [{ "nodes": [
//!     { "split": { "feature": 2, "threshold": 35.0, "left": 1, "right": 2 } },
//!     { "leaf": { "proba": [0.1, 0.2, 0.7] } },
//!     { "leaf": { "proba": [0.3, 0.5, 0.2] } }
//!   ]}]
//! }
//! ```
//!
//! Traversal starts at node 0 and goes left when `x[feature] <= threshold`.
//! Every child index must be greater than its parent's, so a walk always
//! terminates. A `ForestClassifier` only exists through `from_json`/`load`,
//! which validate the structure first.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PredictedAction;
use crate::features::{FEATURE_COLUMNS, FEATURE_COUNT};

/// Probability inference over `PredictedAction::CLASSES`.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Class probabilities in `[SELL, HOLD, BUY]` order.
    fn predict_proba(&self, features: &[f64]) -> [f64; 3];
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: [f64; 3],
    },
}

/// Leaf used when a walk leaves the tree.
const UNIFORM: [f64; 3] = [1.0 / 3.0; 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Walk from the root to a leaf. Indices only move forward, so the walk
    /// is bounded by the node count even on an unvalidated tree.
    fn leaf_for(&self, features: &[f64]) -> [f64; 3] {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { proba }) => return *proba,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().unwrap_or(f64::NAN);
                    // NaN compares false and goes right.
                    let next = if x <= *threshold { *left } else { *right };
                    if next <= index {
                        return UNIFORM;
                    }
                    index = next;
                }
                None => return UNIFORM,
            }
        }
    }

    fn validate(&mut self, tree_index: usize) -> Result<(), ModelLoadError> {
        let len = self.nodes.len();
        if len == 0 {
            return Err(invalid(format!("tree {tree_index} has no nodes")));
        }
        for (i, node) in self.nodes.iter_mut().enumerate() {
            match node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FEATURE_COUNT {
                        return Err(invalid(format!(
                            "tree {tree_index} node {i}: feature index {feature} out of range"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(invalid(format!(
                            "tree {tree_index} node {i}: non-finite threshold"
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= len {
                            return Err(invalid(format!(
                                "tree {tree_index} node {i}: bad child index {child}"
                            )));
                        }
                    }
                }
                Node::Leaf { proba } => {
                    if proba.iter().any(|p| !p.is_finite() || *p < 0.0) {
                        return Err(invalid(format!(
                            "tree {tree_index} node {i}: negative or non-finite probability"
                        )));
                    }
                    let total: f64 = proba.iter().sum();
                    if total <= 0.0 {
                        return Err(invalid(format!(
                            "tree {tree_index} node {i}: all-zero distribution"
                        )));
                    }
                    for p in proba.iter_mut() {
                        *p /= total;
                    }
                }
            }
        }
        Ok(())
    }
}

/// On-disk form, parsed before validation.
#[derive(Deserialize)]
struct ForestArtifact {
    classes: Vec<String>,
    features: Vec<String>,
    trees: Vec<Tree>,
}

/// Averaging ensemble of decision trees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForestClassifier {
    classes: Vec<String>,
    features: Vec<String>,
    trees: Vec<Tree>,
}

impl ForestClassifier {
    pub fn from_json(json: &str) -> Result<Self, ModelLoadError> {
        let artifact: ForestArtifact = serde_json::from_str(json)?;
        let mut forest = Self {
            classes: artifact.classes,
            features: artifact.features,
            trees: artifact.trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Check structure and normalize leaves in place.
    fn validate(&mut self) -> Result<(), ModelLoadError> {
        let expected: Vec<&str> = PredictedAction::CLASSES.iter().map(|c| c.as_str()).collect();
        if self.classes != expected {
            return Err(invalid(format!(
                "classes must be {expected:?}, got {:?}",
                self.classes
            )));
        }
        if self.features != FEATURE_COLUMNS {
            return Err(invalid(format!(
                "features must be {FEATURE_COLUMNS:?}, got {:?}",
                self.features
            )));
        }
        if self.trees.is_empty() {
            return Err(invalid("forest has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter_mut().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for ForestClassifier {
    fn predict_proba(&self, features: &[f64]) -> [f64; 3] {
        let mut sum = [0.0; 3];
        for tree in &self.trees {
            let leaf = tree.leaf_for(features);
            for (s, p) in sum.iter_mut().zip(leaf) {
                *s += p;
            }
        }
        let n = self.trees.len() as f64;
        sum.map(|s| s / n)
    }
}

fn invalid(message: String) -> ModelLoadError {
    ModelLoadError::Invalid(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artifact(trees: serde_json::Value) -> String {
        json!({
            "classes": ["SELL", "HOLD", "BUY"],
            "features": FEATURE_COLUMNS,
            "trees": trees,
        })
        .to_string()
    }

    fn rsi_stump() -> serde_json::Value {
        json!([{ "nodes": [
            { "split": { "feature": 2, "threshold": 35.0, "left": 1, "right": 2 } },
            { "leaf": { "proba": [1.0, 2.0, 7.0] } },
            { "leaf": { "proba": [0.3, 0.5, 0.2] } }
        ]}])
    }

    fn features_with_rsi(rsi: f64) -> [f64; FEATURE_COUNT] {
        let mut x = [0.0; FEATURE_COUNT];
        x[2] = rsi;
        x
    }

    #[test]
    fn stump_routes_and_normalizes() {
        let forest = ForestClassifier::from_json(&artifact(rsi_stump())).unwrap();
        let low = forest.predict_proba(&features_with_rsi(30.0));
        assert!((low[2] - 0.7).abs() < 1e-12);
        assert!((low.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        let high = forest.predict_proba(&features_with_rsi(50.0));
        assert!((high[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn threshold_goes_left() {
        let forest = ForestClassifier::from_json(&artifact(rsi_stump())).unwrap();
        let at = forest.predict_proba(&features_with_rsi(35.0));
        assert!((at[2] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn forest_averages_trees() {
        let trees = json!([
            { "nodes": [{ "leaf": { "proba": [1.0, 0.0, 0.0] } }] },
            { "nodes": [{ "leaf": { "proba": [0.0, 0.0, 1.0] } }] }
        ]);
        let forest = ForestClassifier::from_json(&artifact(trees)).unwrap();
        assert_eq!(forest.tree_count(), 2);
        assert_eq!(forest.predict_proba(&[0.0; FEATURE_COUNT]), [0.5, 0.0, 0.5]);
    }

    #[test]
    fn rejects_wrong_classes() {
        let json = json!({
            "classes": ["BUY", "HOLD", "SELL"],
            "features": FEATURE_COLUMNS,
            "trees": rsi_stump(),
        })
        .to_string();
        assert!(matches!(
            ForestClassifier::from_json(&json),
            Err(ModelLoadError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_reordered_features() {
        let mut features: Vec<&str> = FEATURE_COLUMNS.to_vec();
        features.swap(0, 1);
        let json = json!({
            "classes": ["SELL", "HOLD", "BUY"],
            "features": features,
            "trees": rsi_stump(),
        })
        .to_string();
        assert!(matches!(
            ForestClassifier::from_json(&json),
            Err(ModelLoadError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_empty_forest_and_tree() {
        assert!(ForestClassifier::from_json(&artifact(json!([]))).is_err());
        assert!(ForestClassifier::from_json(&artifact(json!([{ "nodes": [] }]))).is_err());
    }

    #[test]
    fn rejects_backward_child() {
        let trees = json!([{ "nodes": [
            { "leaf": { "proba": [1.0, 0.0, 0.0] } },
            { "split": { "feature": 0, "threshold": 1.0, "left": 0, "right": 0 } }
        ]}]);
        assert!(ForestClassifier::from_json(&artifact(trees)).is_err());

        let self_loop = json!([{ "nodes": [
            { "split": { "feature": 0, "threshold": 1.0, "left": 0, "right": 1 } },
            { "leaf": { "proba": [1.0, 0.0, 0.0] } }
        ]}]);
        assert!(ForestClassifier::from_json(&artifact(self_loop)).is_err());
    }

    #[test]
    fn rejects_bad_feature_index_and_leaves() {
        let oob = json!([{ "nodes": [
            { "split": { "feature": 11, "threshold": 1.0, "left": 1, "right": 2 } },
            { "leaf": { "proba": [1.0, 0.0, 0.0] } },
            { "leaf": { "proba": [1.0, 0.0, 0.0] } }
        ]}]);
        assert!(ForestClassifier::from_json(&artifact(oob)).is_err());

        let negative = json!([{ "nodes": [{ "leaf": { "proba": [-0.1, 0.6, 0.5] } }] }]);
        assert!(ForestClassifier::from_json(&artifact(negative)).is_err());

        let zero = json!([{ "nodes": [{ "leaf": { "proba": [0.0, 0.0, 0.0] } }] }]);
        assert!(ForestClassifier::from_json(&artifact(zero)).is_err());
    }

    #[test]
    fn unvalidated_tree_walk_terminates() {
        let backward = Tree {
            nodes: vec![
                Node::Split { feature: 0, threshold: 1.0, left: 0, right: 0 },
                Node::Leaf { proba: [1.0, 0.0, 0.0] },
            ],
        };
        assert_eq!(backward.leaf_for(&[0.0; FEATURE_COUNT]), UNIFORM);

        let dangling = Tree {
            nodes: vec![Node::Split { feature: 0, threshold: 1.0, left: 5, right: 9 }],
        };
        assert_eq!(dangling.leaf_for(&[0.0; FEATURE_COUNT]), UNIFORM);
        assert_eq!(Tree { nodes: Vec::new() }.leaf_for(&[]), UNIFORM);
    }

    #[test]
    fn serialized_forest_reloads_through_validation() {
        let forest = ForestClassifier::from_json(&artifact(rsi_stump())).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let reloaded = ForestClassifier::from_json(&json).unwrap();
        assert_eq!(reloaded.trees[0].nodes().len(), 3);
        let x = features_with_rsi(30.0);
        for (a, b) in reloaded.predict_proba(&x).iter().zip(forest.predict_proba(&x)) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(
            ForestClassifier::from_json("not json"),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ForestClassifier::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ModelLoadError::Io { .. }));
    }
}
